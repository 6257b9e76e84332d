//! T-SQL to Oracle rules, in application order.

use super::scan::{
	self, depth_zero_matches, fixpoint, mask, replace_code, replace_spans, scope_end,
};
use super::{BuiltinRule, RuleContext, detect, entities, formats};
use crate::warning::WarningCategory;
use regex::Regex;
use std::sync::LazyLock;

pub const RULES: &[BuiltinRule] = &[
	BuiltinRule {
		name: "decode_html_entities",
		apply: entities::decode_html_entities,
	},
	BuiltinRule {
		name: "detect_tsql_only",
		apply: detect::detect_tsql,
	},
	BuiltinRule {
		name: "top_to_rownum",
		apply: top_to_rownum,
	},
	BuiltinRule {
		name: "current_datetime",
		apply: current_datetime,
	},
	BuiltinRule {
		name: "null_functions",
		apply: null_functions,
	},
	BuiltinRule {
		name: "concatenation",
		apply: concatenation,
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
		name: "string_agg",
		apply: string_agg,
	},
	BuiltinRule {
		name: "aggregates",
		apply: aggregates,
	},
	BuiltinRule {
		name: "set_operators",
		apply: set_operators,
	},
	BuiltinRule {
		name: "offset_fetch",
		apply: offset_fetch,
	},
	BuiltinRule {
		name: "bracket_identifiers",
		apply: bracket_identifiers,
	},
	BuiltinRule {
		name: "table_hints",
		apply: table_hints,
	},
	BuiltinRule {
		name: "from_dual",
		apply: from_dual,
	},
];

static TOP_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\bSELECT(\s+(?:DISTINCT|ALL))?\s+TOP\s*(?:\(\s*(\d+)\s*\)|(\d+))\s+")
		.expect("valid TOP pattern")
});

static TOP_MODIFIER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^(?:PERCENT|WITH\s+TIES)\b").expect("valid TOP modifier pattern"));

static WHERE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("valid WHERE pattern"));

static OR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bOR\b").expect("valid OR pattern"));

static FROM: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bFROM\b").expect("valid FROM pattern"));

static SELECT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bSELECT\b").expect("valid SELECT pattern"));

static SET_OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\b(?:UNION|INTERSECT|EXCEPT|MINUS)\b").expect("valid set operator pattern")
});

/// Clauses that end a WHERE body.
static AFTER_WHERE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?i)\b(?:GROUP\s+BY|HAVING|ORDER\s+BY|UNION|INTERSECT|EXCEPT|MINUS|OFFSET|FETCH)\b",
	)
	.expect("valid clause pattern")
});

/// Clauses a FROM must precede.
static AFTER_FROM: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\b(?:WHERE|GROUP\s+BY|HAVING|ORDER\s+BY)\b").expect("valid clause pattern")
});

static ORDER_OR_GROUP: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\b(?:ORDER|GROUP)\s+BY\b").expect("valid ORDER BY pattern"));

static GETDATE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bGETDATE\s*\(\s*\)").expect("valid GETDATE pattern"));

static SYSDATETIME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\bSYSDATETIME\s*\(\s*\)").expect("valid SYSDATETIME pattern")
});

static GETUTCDATE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bGETUTCDATE\s*\(\s*\)").expect("valid GETUTCDATE pattern"));

static NEWID: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bNEWID\s*\(\s*\)").expect("valid NEWID pattern"));

static PLUS_BY_LITERAL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"'\s*\+|\+\s*'").expect("valid concatenation pattern"));

static CAST_TARGET: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)^(.*\S)\s+AS\s+(.+)$").expect("valid CAST pattern"));

static YEAR_OF: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)^YEAR\s*\((.+)\)$").expect("valid YEAR pattern"));

static MONTH_OF: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)^MONTH\s*\((.+)\)$").expect("valid MONTH pattern"));

static DATE_TYPE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^(?:DATE|DATETIME|DATETIME2(?:\s*\(\s*\d+\s*\))?|SMALLDATETIME)$")
		.expect("valid date type pattern")
});

static CHAR_TYPE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^N?(?:VAR)?CHAR(?:\s*\(\s*(?:\d+|MAX)\s*\))?$").expect("valid char type pattern")
});

static EMPTY_OVER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^\s*OVER\s*\(\s*\)").expect("valid OVER pattern"));

static EXCEPT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bEXCEPT\b").expect("valid EXCEPT pattern"));

static OFFSET_ZERO_FETCH: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\bOFFSET\s+0\s+ROWS?\s+FETCH\s+(?:NEXT|FIRST)\s+(\d+)\s+ROWS?\s+ONLY\b")
		.expect("valid OFFSET FETCH pattern")
});

static BRACKETED: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("valid bracket pattern"));

static TABLE_HINT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?i)\s*\bWITH\s*\(\s*(?:NOLOCK|READUNCOMMITTED|READCOMMITTED|READPAST|ROWLOCK|PAGLOCK|TABLOCKX?|UPDLOCK|XLOCK|HOLDLOCK|NOWAIT|SERIALIZABLE|REPEATABLEREAD|INDEX)\b[^()]*(?:\([^()]*\)[^()]*)*\)|\s*\(\s*NOLOCK\s*\)",
	)
	.expect("valid table hint pattern")
});

static QUERY_OPTION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\s*\bOPTION\s*\([^()]*(?:\([^()]*\)[^()]*)*\)").expect("valid OPTION pattern")
});

fn top_to_rownum(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	fixpoint(sql.to_string(), |current| top_step(current, ctx))
}

/// Turn one `SELECT TOP n` into a ROWNUM filter on the same query block.
fn top_step(sql: &str, ctx: &mut RuleContext<'_>) -> Option<String> {
	let masked = mask(sql);

	for caps in TOP_CLAUSE.captures_iter(&masked) {
		let Some(whole) = caps.get(0) else {
			continue;
		};
		if TOP_MODIFIER.is_match(&masked[whole.end()..]) {
			continue;
		}
		let Some(limit) = caps.get(2).or_else(|| caps.get(3)) else {
			continue;
		};

		let keyword = &sql[whole.start()..whole.start() + "SELECT".len()];
		let distinct = caps.get(1).map_or("", |m| &sql[m.range()]);
		let head = format!("{keyword}{distinct} ");

		let mut next = sql.to_string();
		next.replace_range(whole.range(), &head);
		let body = whole.start() + head.len();

		let next_masked = mask(&next);
		let end = scope_end(&next_masked, body);
		if !depth_zero_matches(&next_masked, body, end, &ORDER_OR_GROUP).is_empty() {
			ctx.warn_once(
				WarningCategory::RowLimit,
				"TOP converted to ROWNUM with ORDER BY. Results may differ - consider using a subquery or FETCH FIRST n ROWS ONLY.",
			);
		}

		return Some(add_rownum_filter(&next, body, limit.as_str()));
	}

	None
}

/// Add `ROWNUM <= limit` to the WHERE clause of the query block whose
/// select list starts at `body`, creating the clause if needed.
fn add_rownum_filter(sql: &str, body: usize, limit: &str) -> String {
	let masked = mask(sql);
	let end = scope_end(&masked, body);
	let block_end = depth_zero_matches(&masked, body, end, &SET_OPERATOR)
		.first()
		.map_or(end, |op| op.start);
	let mut out = sql.to_string();

	if let Some(clause) = depth_zero_matches(&masked, body, block_end, &WHERE).first() {
		let cond_start = clause.end;
		let cond_end = depth_zero_matches(&masked, cond_start, block_end, &AFTER_WHERE)
			.first()
			.map_or(block_end, |next| next.start);
		let condition = &sql[cond_start..cond_end];
		let kept = condition.trim_end_matches(|c: char| c.is_whitespace() || c == ';');
		let trailing = &condition[kept.len()..];

		if depth_zero_matches(&masked, cond_start, cond_start + kept.len(), &OR).is_empty() {
			out.insert_str(cond_start, &format!(" ROWNUM <= {limit} AND"));
		} else {
			out.replace_range(
				cond_start..cond_end,
				&format!(" ROWNUM <= {limit} AND ({}){trailing}", kept.trim_start()),
			);
		}
		return out;
	}

	if let Some(clause) = depth_zero_matches(&masked, body, end, &AFTER_WHERE).first() {
		let before = masked[..clause.start].trim_end().len();
		let space = &sql[before..clause.start];
		if space.is_empty() {
			out.insert_str(clause.start, &format!(" WHERE ROWNUM <= {limit} "));
		} else {
			out.insert_str(before, &format!("{space}WHERE ROWNUM <= {limit}"));
		}
		return out;
	}

	let content_end = body
		+ sql[body..block_end]
			.trim_end_matches(|c: char| c.is_whitespace() || c == ';')
			.len();
	let separator = if sql[body..content_end].contains('\n') { "\n" } else { " " };
	out.insert_str(content_end, &format!("{separator}WHERE ROWNUM <= {limit}"));
	out
}

fn current_datetime(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	let sql = replace_code(sql, &GETDATE, "SYSDATE");
	let sql = replace_code(&sql, &SYSDATETIME, "SYSTIMESTAMP");
	let sql = replace_code(&sql, &GETUTCDATE, "SYS_EXTRACT_UTC(SYSTIMESTAMP)");
	replace_code(&sql, &NEWID, "SYS_GUID()")
}

fn null_functions(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	let sql = scan::rename_calls(sql, "ISNULL", "NVL");
	scan::rewrite_calls(&sql, "IIF", |call| match call.args.as_slice() {
		[condition, then, otherwise] => Some(format!(
			"CASE WHEN {condition} THEN {then} ELSE {otherwise} END"
		)),
		_ => None,
	})
}

fn concatenation(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let sql = scan::rewrite_calls(sql, "CONCAT", |call| {
		(call.args.len() >= 2).then(|| format!("({})", call.args.join(" || ")))
	});
	let sql = replace_spans(&sql, &PLUS_BY_LITERAL, |original, caps| {
		let plus = caps.get(0)?;
		Some(original[plus.range()].replacen('+', "||", 1))
	});

	let masked = mask(&sql);
	if masked.contains('+') && masked.contains('\'') {
		ctx.warn(
			WarningCategory::Concatenation,
			"Operator (+) left between non-literal operands. If it concatenates strings, replace it with (||); verify numeric additions are not affected.",
		);
	}
	sql
}

fn date_functions(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let sql = scan::rewrite_calls(sql, "CAST", |call| {
		let [arg] = call.args.as_slice() else {
			return None;
		};
		let caps = CAST_TARGET.captures(arg)?;
		let (value, ty) = (&caps[1], caps[2].trim());
		if ty.eq_ignore_ascii_case("DATE") {
			return Some(format!("TRUNC({value})"));
		}
		let mapped = formats::tsql_type_to_oracle(ty)?;
		Some(format!("CAST({value} AS {mapped})"))
	});

	let sql = scan::rewrite_calls(&sql, "DATEFROMPARTS", |call| {
		let [year, month, day] = call.args.as_slice() else {
			return None;
		};
		let date = YEAR_OF.captures(year)?.get(1)?.as_str().trim().to_string();
		if day != "1" {
			return None;
		}
		if month == "1" {
			return Some(format!("TRUNC({date}, 'YYYY')"));
		}
		let month_of = MONTH_OF.captures(month)?;
		(month_of[1].trim() == date).then(|| format!("TRUNC({date}, 'MM')"))
	});

	let sql = scan::rewrite_calls(&sql, "DATEADD", |call| {
		let [unit, amount, date] = call.args.as_slice() else {
			return None;
		};
		let converted = match unit.to_ascii_uppercase().as_str() {
			"MONTH" | "MM" | "M" => format!("ADD_MONTHS({date}, {amount})"),
			"YEAR" | "YYYY" | "YY" => format!("ADD_MONTHS({date}, 12 * ({amount}))"),
			"DAY" | "DD" | "D" => format!("({date} + {amount})"),
			"WEEK" | "WK" | "WW" => format!("({date} + 7 * ({amount}))"),
			"HOUR" | "HH" => format!("({date} + ({amount}) / 24)"),
			"MINUTE" | "MI" | "N" => format!("({date} + ({amount}) / 1440)"),
			"SECOND" | "SS" | "S" => format!("({date} + ({amount}) / 86400)"),
			_ => {
				ctx.warn(
					WarningCategory::DateArithmetic,
					format!("DATEADD({unit}, ...) has no direct Oracle equivalent. Manual conversion required."),
				);
				return None;
			}
		};
		Some(converted)
	});

	let sql = scan::rewrite_calls(&sql, "DATEDIFF", |call| {
		let [unit, start, finish] = call.args.as_slice() else {
			return None;
		};
		match unit.to_ascii_uppercase().as_str() {
			"MONTH" | "MM" | "M" => {
				ctx.warn_once(
					WarningCategory::DateArithmetic,
					"DATEDIFF(MONTH, ...) converted to MONTHS_BETWEEN, which returns fractional months. Wrap it in TRUNC() if whole months are required.",
				);
				Some(format!("MONTHS_BETWEEN({finish}, {start})"))
			}
			"DAY" | "DD" | "D" => Some(format!("(TRUNC({finish}) - TRUNC({start}))")),
			_ => {
				ctx.warn(
					WarningCategory::DateArithmetic,
					format!("DATEDIFF({unit}, ...) has no direct Oracle equivalent. Manual conversion required."),
				);
				None
			}
		}
	});

	scan::rewrite_calls(&sql, "EOMONTH", |call| match call.args.as_slice() {
		[date] => Some(format!("LAST_DAY({date})")),
		[date, months] => Some(format!("LAST_DAY(ADD_MONTHS({date}, {months}))")),
		_ => None,
	})
}

fn conversion_functions(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let sql = scan::rewrite_calls(sql, "CONVERT", |call| {
		let (ty, value, style) = match call.args.as_slice() {
			[ty, value] => (ty, value, None),
			[ty, value, style] => (ty, value, Some(style)),
			_ => return None,
		};
		let mask = match style {
			Some(style) => match style.parse().ok().and_then(formats::style_mask) {
				Some(mask) => Some(mask),
				None => {
					ctx.warn(
						WarningCategory::DateFormat,
						format!("CONVERT style {style} has no known Oracle format mask. Manual conversion required."),
					);
					return None;
				}
			},
			None => None,
		};

		let function = if DATE_TYPE.is_match(ty) {
			"TO_DATE"
		} else if CHAR_TYPE.is_match(ty) {
			"TO_CHAR"
		} else {
			ctx.warn(
				WarningCategory::Unsupported,
				format!("CONVERT to {ty} has no direct Oracle equivalent. Manual conversion required."),
			);
			return None;
		};
		Some(match mask {
			Some(mask) => format!("{function}({value}, '{mask}')"),
			None => format!("{function}({value})"),
		})
	});

	scan::rewrite_calls(&sql, "FORMAT", |call| {
		let [value, format] = call.args.as_slice() else {
			ctx.warn(
				WarningCategory::DateFormat,
				"FORMAT with a culture argument cannot be converted automatically.",
			);
			return None;
		};
		let Some(mask) = scan::unquote(format) else {
			ctx.warn(
				WarningCategory::DateFormat,
				format!("FORMAT with a computed format ({format}) cannot be converted automatically."),
			);
			return None;
		};
		let oracle = if formats::is_net_numeric_mask(mask) {
			formats::net_number_mask_to_oracle(mask)
		} else {
			formats::net_mask_to_oracle(mask)
		};
		Some(format!("TO_CHAR({value}, '{oracle}')"))
	})
}

fn string_functions(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	let sql = scan::rename_calls(sql, "SUBSTRING", "SUBSTR");
	let sql = scan::rewrite_calls(&sql, "CHARINDEX", |call| match call.args.as_slice() {
		[needle, text] => Some(format!("INSTR({text}, {needle})")),
		[needle, text, start] => Some(format!("INSTR({text}, {needle}, {start})")),
		_ => None,
	});
	let sql = scan::rename_calls(&sql, "DATALENGTH", "LENGTHB");
	scan::rename_calls(&sql, "LEN", "LENGTH")
}

fn string_agg(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	scan::rewrite_calls_with_tail(sql, "STRING_AGG", |call| {
		let [value, separator] = call.args.as_slice() else {
			return None;
		};
		Some(match scan::within_group(call.tail) {
			Some((order, consumed)) => (
				format!("LISTAGG({value}, {separator}) WITHIN GROUP (ORDER BY {order})"),
				consumed,
			),
			None => (
				format!("LISTAGG({value}, {separator}) WITHIN GROUP (ORDER BY {value})"),
				0,
			),
		})
	})
}

fn aggregates(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	const RENAMES: &[(&str, &str)] = &[
		("STDEVP", "STDDEV_POP"),
		("STDEV", "STDDEV"),
		("VARP", "VAR_POP"),
		("VAR", "VARIANCE"),
	];

	let mut sql = sql.to_string();
	for (from, to) in RENAMES {
		sql = scan::rename_calls(&sql, from, to);
	}

	// PERCENTILE_CONT(0.5) ... OVER () is how a plain median is spelled.
	scan::rewrite_calls_with_tail(&sql, "PERCENTILE_CONT", |call| {
		if call.args.len() != 1 || call.args[0] != "0.5" {
			return None;
		}
		let (order, consumed) = scan::within_group(call.tail)?;
		let over = EMPTY_OVER.find(&call.tail[consumed..])?;
		if order.contains(',') || order.to_ascii_uppercase().ends_with("DESC") {
			return None;
		}
		Some((format!("MEDIAN({order})"), consumed + over.end()))
	})
}

fn set_operators(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	replace_code(sql, &EXCEPT, "MINUS")
}

fn offset_fetch(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	replace_spans(sql, &OFFSET_ZERO_FETCH, |original, caps| {
		let count = caps.get(1)?;
		Some(format!("FETCH FIRST {} ROWS ONLY", &original[count.range()]))
	})
}

fn bracket_identifiers(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let mut found = false;
	let out = replace_spans(sql, &BRACKETED, |original, caps| {
		let name = caps.get(1)?;
		found = true;
		Some(format!("\"{}\"", &original[name.range()]))
	});

	if found {
		ctx.warn_once(
			WarningCategory::Identifier,
			"Bracketed identifiers converted to double-quoted identifiers, which are case-sensitive in Oracle. Verify identifier case.",
		);
	}
	out
}

fn table_hints(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let mut found = false;
	let out = replace_spans(sql, &TABLE_HINT, |_, _| {
		found = true;
		Some(String::new())
	});
	let out = replace_spans(&out, &QUERY_OPTION, |_, _| {
		found = true;
		Some(String::new())
	});

	if found {
		ctx.warn_once(
			WarningCategory::TableHint,
			"Table hints and OPTION clauses were removed. Oracle expresses optimizer hints as /*+ ... */ comments.",
		);
	}
	out
}

fn from_dual(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	let masked = mask(sql);
	let mut inserts: Vec<(usize, &str)> = Vec::new();

	for select in SELECT.find_iter(&masked) {
		let body = select.end();
		let end = scope_end(&masked, body);
		let block_end = depth_zero_matches(&masked, body, end, &SET_OPERATOR)
			.first()
			.map_or(end, |op| op.start);
		if !depth_zero_matches(&masked, body, block_end, &FROM).is_empty() {
			continue;
		}

		match depth_zero_matches(&masked, body, block_end, &AFTER_FROM).first() {
			Some(clause) => inserts.push((clause.start, "FROM DUAL ")),
			None => {
				let content_end = body
					+ sql[body..block_end]
						.trim_end_matches(|c: char| c.is_whitespace() || c == ';')
						.len();
				inserts.push((content_end, " FROM DUAL"));
			}
		}
	}

	// Rightmost first so earlier offsets stay valid.
	inserts.sort_by(|a, b| b.0.cmp(&a.0));
	let mut out = sql.to_string();
	for (at, text) in inserts {
		out.insert_str(at, text);
	}
	out
}
