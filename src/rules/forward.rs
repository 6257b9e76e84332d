//! Oracle to T-SQL rules, in application order.

use super::scan::{
	self, depth_zero_matches, enclosing_select, fixpoint, mask, replace_code, replace_spans,
	scope_end, scope_start,
};
use super::{BuiltinRule, RuleContext, detect, entities, formats};
use crate::warning::WarningCategory;
use regex::Regex;
use std::sync::LazyLock;

/// Comment placed in front of every REGEXP_* call.
pub const REGEXP_MARKER: &str = "/* WARNING: Requires SQL Server 2025+ for REGEXP functions. For older SQL Server: rewrite with LIKE/PATINDEX or CLR. */";

pub const RULES: &[BuiltinRule] = &[
	BuiltinRule {
		name: "decode_html_entities",
		apply: entities::decode_html_entities,
	},
	BuiltinRule {
		name: "detect_unsupported",
		apply: detect::detect_oracle,
	},
	BuiltinRule {
		name: "nvl",
		apply: nvl,
	},
	BuiltinRule {
		name: "nvl2",
		apply: nvl2,
	},
	BuiltinRule {
		name: "decode",
		apply: decode,
	},
	BuiltinRule {
		name: "current_datetime",
		apply: current_datetime,
	},
	BuiltinRule {
		name: "concatenation",
		apply: concatenation,
	},
	BuiltinRule {
		name: "cast_types",
		apply: cast_types,
	},
	BuiltinRule {
		name: "trunc",
		apply: trunc,
	},
	BuiltinRule {
		name: "date_functions",
		apply: date_functions,
	},
	BuiltinRule {
		name: "conversion_functions",
		apply: conversion_functions,
	},
	BuiltinRule {
		name: "string_functions",
		apply: string_functions,
	},
	BuiltinRule {
		name: "listagg",
		apply: listagg,
	},
	BuiltinRule {
		name: "aggregates",
		apply: aggregates,
	},
	BuiltinRule {
		name: "regexp_functions",
		apply: regexp_functions,
	},
	BuiltinRule {
		name: "set_operators",
		apply: set_operators,
	},
	BuiltinRule {
		name: "from_dual",
		apply: from_dual,
	},
	BuiltinRule {
		name: "rownum_limit",
		apply: rownum_limit,
	},
	BuiltinRule {
		name: "fetch_first",
		apply: fetch_first,
	},
];

static SYSDATE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bSYSDATE\b").expect("valid SYSDATE pattern"));

static SYSTIMESTAMP: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bSYSTIMESTAMP\b").expect("valid SYSTIMESTAMP pattern"));

static SYS_GUID: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bSYS_GUID\s*\(\s*\)").expect("valid SYS_GUID pattern"));

static CAST_TARGET: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)^(.*\S)\s+AS\s+(.+)$").expect("valid CAST pattern"));

static INTEGER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^-?\d+$").expect("valid integer pattern"));

static DISTINCT_ARG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)^DISTINCT\s+(.+)$").expect("valid DISTINCT pattern"));

static DESCENDING: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bDESC$").expect("valid DESC pattern"));

static OVER_AHEAD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^\s*OVER\b").expect("valid OVER pattern"));

static REGEXP_CALL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\bREGEXP_(?:LIKE|SUBSTR|REPLACE|INSTR|COUNT)\b").expect("valid REGEXP pattern")
});

static MINUS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bMINUS\b").expect("valid MINUS pattern"));

static FROM_DUAL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\s*\bFROM\s+DUAL\b").expect("valid FROM DUAL pattern"));

static ROWNUM_LEADING: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\bWHERE\s+ROWNUM\s*(?:(<=?)\s*(\d+)|=\s*1)\s+AND\b")
		.expect("valid ROWNUM pattern")
});

static ROWNUM_TERM: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\s+AND\s+ROWNUM\s*(?:(<=?)\s*(\d+)|=\s*1)\b").expect("valid ROWNUM pattern")
});

static ROWNUM_ONLY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\s*\bWHERE\s+ROWNUM\s*(?:(<=?)\s*(\d+)|=\s*1)\b")
		.expect("valid ROWNUM pattern")
});

static ROWNUM: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bROWNUM\b").expect("valid ROWNUM pattern"));

static OR_WORD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bOR\b").expect("valid OR pattern"));

static LOGIC_AHEAD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^\s*(?:AND|OR)\b").expect("valid AND/OR pattern"));

static TOP_AHEAD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^\s+TOP\b").expect("valid TOP pattern"));

static FETCH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)(\s*)\bFETCH\s+(?:FIRST|NEXT)\s+(\d+)\s+ROWS?\s+ONLY\b")
		.expect("valid FETCH pattern")
});

static OFFSET_BEFORE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bOFFSET\s+\d+\s+ROWS?\s*$").expect("valid OFFSET pattern"));

static ORDER_BY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").expect("valid ORDER BY pattern"));

fn nvl(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	scan::rename_calls(sql, "NVL", "ISNULL")
}

fn nvl2(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	scan::rewrite_calls(sql, "NVL2", |call| match call.args.as_slice() {
		[value, if_set, if_null] => Some(format!(
			"CASE WHEN {value} IS NOT NULL THEN {if_set} ELSE {if_null} END"
		)),
		_ => None,
	})
}

fn decode(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	scan::rewrite_calls(sql, "DECODE", |call| {
		let (expr, rest) = call.args.split_first()?;
		if rest.len() < 2 {
			return None;
		}

		let mut case = String::from("CASE");
		for pair in rest.chunks_exact(2) {
			let (search, result) = (&pair[0], &pair[1]);
			if search.eq_ignore_ascii_case("NULL") {
				case.push_str(&format!(" WHEN {expr} IS NULL THEN {result}"));
			} else {
				case.push_str(&format!(" WHEN {expr} = {search} THEN {result}"));
			}
		}
		if rest.len() % 2 == 1
			&& let Some(default) = rest.last()
		{
			case.push_str(&format!(" ELSE {default}"));
		}
		case.push_str(" END");
		Some(case)
	})
}

fn current_datetime(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	let sql = replace_code(sql, &SYSDATE, "GETDATE()");
	let sql = replace_code(&sql, &SYSTIMESTAMP, "SYSDATETIME()");
	replace_code(&sql, &SYS_GUID, "NEWID()")
}

fn concatenation(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	scan::map_code(sql, |code| code.replace("||", "+"))
}

fn cast_types(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	scan::rewrite_calls(sql, "CAST", |call| {
		let [arg] = call.args.as_slice() else {
			return None;
		};
		let caps = CAST_TARGET.captures(arg)?;
		let mapped = formats::oracle_type_to_tsql(&caps[2])?;
		Some(format!("CAST({} AS {mapped})", &caps[1]))
	})
}

fn trunc(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	scan::rewrite_calls(sql, "TRUNC", |call| match call.args.as_slice() {
		[value] => Some(format!("CAST({value} AS DATE)")),
		[value, unit] if INTEGER.is_match(unit) => Some(format!("ROUND({value}, {unit}, 1)")),
		[value, unit] => {
			let Some(mask) = scan::unquote(unit) else {
				ctx.warn(
					WarningCategory::DateFormat,
					format!("TRUNC with a computed format ({unit}) cannot be converted automatically."),
				);
				return None;
			};
			match mask.trim().to_ascii_uppercase().as_str() {
				"DD" | "DDD" | "J" => Some(format!("CAST({value} AS DATE)")),
				"MM" | "MON" | "MONTH" | "RM" => {
					Some(format!("DATEFROMPARTS(YEAR({value}), MONTH({value}), 1)"))
				}
				"YYYY" | "SYYYY" | "YYY" | "YY" | "Y" | "YEAR" | "SYEAR" => {
					Some(format!("DATEFROMPARTS(YEAR({value}), 1, 1)"))
				}
				_ => {
					ctx.warn(
						WarningCategory::DateFormat,
						format!("TRUNC with format '{mask}' has no direct T-SQL equivalent. Manual conversion required."),
					);
					None
				}
			}
		}
		_ => None,
	})
}

fn date_functions(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let sql = scan::rewrite_calls(sql, "ADD_MONTHS", |call| match call.args.as_slice() {
		[date, months] => Some(format!("DATEADD(MONTH, {months}, {date})")),
		_ => None,
	});
	let sql = scan::rewrite_calls(&sql, "MONTHS_BETWEEN", |call| match call.args.as_slice() {
		[later, earlier] => {
			ctx.warn_once(
				WarningCategory::DateArithmetic,
				"MONTHS_BETWEEN converted to DATEDIFF(MONTH, ...), which counts month boundaries and returns an integer. Verify fractional month logic.",
			);
			Some(format!("DATEDIFF(MONTH, {earlier}, {later})"))
		}
		_ => None,
	});
	scan::rename_calls(&sql, "LAST_DAY", "EOMONTH")
}

fn conversion_functions(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let sql = scan::rewrite_calls(sql, "TO_CHAR", |call| match call.args.as_slice() {
		[value] => Some(format!("CAST({value} AS VARCHAR(4000))")),
		[value, format] => {
			let Some(mask) = scan::unquote(format) else {
				ctx.warn(
					WarningCategory::DateFormat,
					format!("TO_CHAR with a computed format ({format}) cannot be converted automatically."),
				);
				return None;
			};
			if formats::is_numeric_mask(mask) {
				ctx.warn(
					WarningCategory::DateFormat,
					format!("TO_CHAR number format '{mask}' converted to FORMAT(). Verify rounding and padding."),
				);
				return Some(format!(
					"FORMAT({value}, '{}')",
					formats::oracle_number_mask_to_net(mask)
				));
			}
			Some(format!(
				"FORMAT({value}, '{}')",
				formats::oracle_date_mask_to_net(mask)
			))
		}
		_ => {
			ctx.warn(
				WarningCategory::DateFormat,
				"TO_CHAR with NLS parameters cannot be converted automatically.",
			);
			None
		}
	});

	let sql = scan::rewrite_calls(&sql, "TO_DATE", |call| match call.args.as_slice() {
		[value] => Some(format!("CAST({value} AS DATETIME)")),
		[value, format, ..] => {
			let style = scan::unquote(format).and_then(formats::convert_style);
			if let Some(style) = style {
				return Some(format!("CONVERT(DATETIME, {value}, {style})"));
			}
			ctx.warn(
				WarningCategory::DateFormat,
				format!("TO_DATE format {format} has no matching CONVERT style. Converted to TRY_CAST; verify the input format."),
			);
			Some(format!("TRY_CAST({value} AS DATETIME)"))
		}
		_ => None,
	});

	scan::rewrite_calls(&sql, "TO_NUMBER", |call| match call.args.as_slice() {
		[value] => Some(format!("CAST({value} AS DECIMAL(38, 10))")),
		[value, ..] => {
			ctx.warn(
				WarningCategory::DateFormat,
				"TO_NUMBER format mask dropped. Converted to TRY_CAST; verify the input format.",
			);
			Some(format!("TRY_CAST({value} AS DECIMAL(38, 10))"))
		}
		_ => None,
	})
}

fn string_functions(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let sql = scan::rewrite_calls(sql, "SUBSTR", |call| match call.args.as_slice() {
		[_, _, _] => Some(format!("SUBSTRING({})", call.inner)),
		[text, start] => Some(format!("SUBSTRING({text}, {start}, LEN({text}))")),
		_ => None,
	});
	let sql = scan::rewrite_calls(&sql, "INSTR", |call| match call.args.as_slice() {
		[text, needle] => Some(format!("CHARINDEX({needle}, {text})")),
		[text, needle, start] => Some(format!("CHARINDEX({needle}, {text}, {start})")),
		[_, _, _, _, ..] => {
			ctx.warn(
				WarningCategory::Unsupported,
				"INSTR with an occurrence argument has no CHARINDEX equivalent. Manual conversion required.",
			);
			None
		}
		_ => None,
	});
	let sql = scan::rename_calls(&sql, "LENGTHB", "DATALENGTH");
	scan::rename_calls(&sql, "LENGTH", "LEN")
}

fn listagg(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let placeholder = ctx.source_table_placeholder;

	scan::rewrite_calls_with_tail(sql, "LISTAGG", |call| {
		let (expr, separator) = match call.args.as_slice() {
			[expr] => (expr.as_str(), "''"),
			[expr, separator] => (expr.as_str(), separator.as_str()),
			_ => return None,
		};
		let (order, consumed) = match scan::within_group(call.tail) {
			Some((order, consumed)) => (Some(order), consumed),
			None => (None, 0),
		};

		let Some(caps) = DISTINCT_ARG.captures(expr) else {
			let mut agg = format!("STRING_AGG({expr}, {separator})");
			if let Some(order) = order {
				agg.push_str(&format!(" WITHIN GROUP (ORDER BY {order})"));
			}
			return Some((agg, consumed));
		};

		let value = caps[1].trim();
		let column = if scan::is_identifier_path(value) {
			value.rsplit('.').next().unwrap_or("val")
		} else {
			"val"
		};
		let direction = match order {
			Some(order) if DESCENDING.is_match(&order) => " DESC",
			_ => "",
		};

		ctx.warn(
			WarningCategory::ListaggDistinct,
			format!(
				"LISTAGG(DISTINCT ...) has no direct T-SQL equivalent. A STRING_AGG subquery skeleton was generated: replace {placeholder} with the source table and add the correlation to the outer query."
			),
		);
		Some((
			format!(
				"(SELECT STRING_AGG(dv.{column}, {separator}) WITHIN GROUP (ORDER BY dv.{column}{direction}) FROM (SELECT DISTINCT {value} AS {column} FROM {placeholder} WHERE 1 = 1 /* correlate with the outer query */) AS dv)"
			),
			consumed,
		))
	})
}

fn aggregates(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	const RENAMES: &[(&str, &str)] = &[
		("STDDEV_POP", "STDEVP"),
		("STDDEV_SAMP", "STDEV"),
		("STDDEV", "STDEV"),
		("VAR_POP", "VARP"),
		("VAR_SAMP", "VAR"),
		("VARIANCE", "VAR"),
	];

	let mut sql = sql.to_string();
	for (from, to) in RENAMES {
		sql = scan::rename_calls(&sql, from, to);
	}

	scan::rewrite_calls(&sql, "MEDIAN", |call| {
		let [value] = call.args.as_slice() else {
			return None;
		};
		ctx.warn_once(
			WarningCategory::Aggregation,
			"MEDIAN converted to PERCENTILE_CONT(0.5), which is a window function in T-SQL. Rework GROUP BY queries accordingly.",
		);
		let over = if OVER_AHEAD.is_match(call.tail) { "" } else { " OVER ()" };
		Some(format!(
			"PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY {value}){over}"
		))
	})
}

fn regexp_functions(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let mut found = false;
	let out = replace_spans(sql, &REGEXP_CALL, |original, caps| {
		let name = caps.get(0)?;
		found = true;
		if original[..name.start()].trim_end().ends_with(REGEXP_MARKER) {
			return None;
		}
		Some(format!("{REGEXP_MARKER} {}", &original[name.range()]))
	});

	if found {
		ctx.warn_once(
			WarningCategory::RegexpLike,
			"REGEXP functions require SQL Server 2025 or later. On older versions rewrite them with LIKE, PATINDEX or CLR functions.",
		);
	}
	out
}

fn set_operators(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	replace_code(sql, &MINUS, "EXCEPT")
}

fn from_dual(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	replace_spans(sql, &FROM_DUAL, |_, _| Some(String::new()))
}

/// Insert ` TOP n` after the SELECT heading the query block at `pos`.
///
/// Returns `None` when that SELECT already has a TOP clause or no SELECT
/// encloses `pos`.
fn insert_top(sql: &str, pos: usize, limit: u64) -> Option<String> {
	let masked = mask(sql);
	let at = enclosing_select(&masked, pos)?;
	if TOP_AHEAD.is_match(&masked[at..]) {
		return None;
	}
	let mut out = sql.to_string();
	out.insert_str(at, &format!(" TOP {limit}"));
	Some(out)
}

fn rownum_limit(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let out = fixpoint(sql.to_string(), |current| rownum_step(current, ctx));

	if ROWNUM.is_match(&mask(&out)) {
		ctx.warn(
			WarningCategory::RowLimit,
			"ROWNUM could not be converted to TOP and was replaced with ROW_NUMBER() OVER (ORDER BY (SELECT NULL)). Manual review required.",
		);
		return replace_code(&out, &ROWNUM, "ROW_NUMBER() OVER (ORDER BY (SELECT NULL))");
	}
	out
}

/// Move one `ROWNUM` filter into a TOP clause.
fn rownum_step(sql: &str, ctx: &mut RuleContext<'_>) -> Option<String> {
	let masked = mask(sql);
	let forms: [(&Regex, &str, Option<&Regex>); 3] = [
		(&*ROWNUM_LEADING, "WHERE", None),
		(&*ROWNUM_TERM, "", None),
		(&*ROWNUM_ONLY, "", Some(&*LOGIC_AHEAD)),
	];

	for (pattern, keep, stop) in forms {
		for caps in pattern.captures_iter(&masked) {
			let Some(whole) = caps.get(0) else {
				continue;
			};
			if stop.is_some_and(|stop| stop.is_match(&masked[whole.end()..])) {
				continue;
			}
			// AND binds tighter than OR, so the filter only limits one branch.
			let start = scope_start(&masked, whole.start());
			let end = scope_end(&masked, whole.start());
			if !depth_zero_matches(&masked, start, end, &OR_WORD).is_empty() {
				continue;
			}

			let limit = match (caps.get(1), caps.get(2)) {
				(Some(op), Some(n)) => {
					let Ok(n) = n.as_str().parse::<u64>() else {
						continue;
					};
					if op.as_str() == "<" { n.saturating_sub(1) } else { n }
				}
				_ => 1,
			};

			let mut next = sql.to_string();
			next.replace_range(whole.range(), keep);
			match insert_top(&next, whole.start(), limit) {
				Some(done) => return Some(done),
				None => ctx.warn_once(
					WarningCategory::RowLimit,
					"ROWNUM filter found in a SELECT that already has TOP. Manual review required.",
				),
			}
		}
	}

	None
}

fn fetch_first(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	fixpoint(sql.to_string(), |current| fetch_step(current, ctx))
}

fn fetch_step(sql: &str, ctx: &mut RuleContext<'_>) -> Option<String> {
	let masked = mask(sql);

	for caps in FETCH_FIRST.captures_iter(&masked) {
		let (Some(whole), Some(space), Some(count)) = (caps.get(0), caps.get(1), caps.get(2)) else {
			continue;
		};
		let fetch = space.end();
		if OFFSET_BEFORE.is_match(&masked[..fetch]) {
			continue;
		}
		let Ok(limit) = count.as_str().parse::<u64>() else {
			continue;
		};

		let scope = scope_start(&masked, fetch);
		if !depth_zero_matches(&masked, scope, fetch, &ORDER_BY).is_empty() {
			let mut next = sql.to_string();
			next.replace_range(
				fetch..whole.end(),
				&format!("OFFSET 0 ROWS FETCH NEXT {limit} ROWS ONLY"),
			);
			return Some(next);
		}

		let mut next = sql.to_string();
		next.replace_range(whole.range(), "");
		match insert_top(&next, whole.start(), limit) {
			Some(done) => return Some(done),
			None => ctx.warn_once(
				WarningCategory::RowLimit,
				"FETCH FIRST found in a SELECT that already has TOP. Manual review required.",
			),
		}
	}

	None
}
