//! Detection passes. These never edit the query; they only report
//! constructs that the rewrite rules deliberately leave for a human.

use super::RuleContext;
use super::scan::{mask, matching_paren};
use crate::warning::WarningCategory;
use regex::Regex;
use std::sync::LazyLock;

struct Check {
	pattern: Regex,
	category: WarningCategory,
	message: &'static str,
}

impl Check {
	fn new(pattern: &str, category: WarningCategory, message: &'static str) -> Self {
		Check {
			pattern: Regex::new(pattern).expect("valid detection pattern"),
			category,
			message,
		}
	}
}

static ORACLE_CHECKS: LazyLock<Vec<Check>> = LazyLock::new(|| {
	vec![
		Check::new(
			r"(?i)\bCONNECT\s+BY\b|\bSTART\s+WITH\b|\bSYS_CONNECT_BY_PATH\b",
			WarningCategory::Hierarchical,
			"CONNECT BY detected. Hierarchical queries require manual conversion using CTEs or recursive queries.",
		),
		Check::new(
			r"(?i)\+\s*\d+\s*/\s*24\b|\bINTERVAL\b",
			WarningCategory::DateArithmetic,
			"Complex date arithmetic detected. Verify DATEADD() conversion is semantically correct.",
		),
		Check::new(
			r"\(\s*\+\s*\)",
			WarningCategory::OuterJoin,
			"Oracle outer join operator (+) detected. Rewrite the join with LEFT or RIGHT OUTER JOIN.",
		),
		Check::new(
			r"(?i)\bROWID\b",
			WarningCategory::Pseudocolumn,
			"ROWID has no T-SQL equivalent. Use the table's primary key instead.",
		),
		Check::new(
			r"(?i)\.\s*(?:NEXTVAL|CURRVAL)\b",
			WarningCategory::Sequence,
			"Sequence access (.NEXTVAL/.CURRVAL) must be rewritten as NEXT VALUE FOR <sequence>.",
		),
		Check::new(
			r"(?i)\bFETCH\s+(?:FIRST|NEXT)\s+\d+\s+PERCENT\b|\bROWS?\s+WITH\s+TIES\b",
			WarningCategory::RowLimit,
			"FETCH FIRST with PERCENT or WITH TIES needs manual conversion to TOP ... PERCENT / WITH TIES.",
		),
		Check::new(
			r"(?i)\bKEEP\s*\(\s*DENSE_RANK\b",
			WarningCategory::Aggregation,
			"KEEP (DENSE_RANK FIRST/LAST ...) has no T-SQL equivalent. Rewrite with ROW_NUMBER() or FIRST_VALUE().",
		),
		Check::new(
			r"(?i)\b(?:UN)?PIVOT\s*\(",
			WarningCategory::Unsupported,
			"PIVOT/UNPIVOT syntax differs between Oracle and T-SQL. Manual review required.",
		),
	]
});

static TSQL_CHECKS: LazyLock<Vec<Check>> = LazyLock::new(|| {
	vec![
		Check::new(
			r"@@?[A-Za-z_]\w*",
			WarningCategory::TsqlOnly,
			"T-SQL variables (@name) must be replaced with Oracle bind variables (:name).",
		),
		Check::new(
			r"(?:^|[\s,(])##?[A-Za-z_]\w*",
			WarningCategory::TsqlOnly,
			"Temporary tables (#name) must be replaced with global temporary tables or a WITH clause.",
		),
		Check::new(
			r"(?i)\bTOP\s*(?:\(\s*\d+\s*\)|\d+)\s+(?:PERCENT|WITH\s+TIES)\b",
			WarningCategory::RowLimit,
			"TOP ... PERCENT / WITH TIES needs manual conversion to FETCH FIRST ... PERCENT / WITH TIES.",
		),
		Check::new(
			r"(?i)\b(?:CROSS|OUTER)\s+APPLY\b",
			WarningCategory::Unsupported,
			"CROSS/OUTER APPLY requires Oracle 12c or later. Verify the target version or rewrite with LATERAL.",
		),
		Check::new(
			r"(?i)\bTRY_(?:CAST|CONVERT)\s*\(",
			WarningCategory::Unsupported,
			"TRY_CAST/TRY_CONVERT have no direct Oracle equivalent. Use CAST(... DEFAULT NULL ON CONVERSION ERROR) on Oracle 12.2 or later.",
		),
	]
});

static ROWNUM: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bROWNUM\b").expect("valid ROWNUM pattern"));

static ORDER_BY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").expect("valid ORDER BY pattern"));

static SUBQUERY_OPEN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\(\s*SELECT\b").expect("valid subquery pattern"));

static WHERE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("valid WHERE pattern"));

static TUPLE_IN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\([^()]*,[^()]*\)\s*(?:NOT\s+)?IN\s*\(").expect("valid tuple pattern")
});

static TRAILING_WORD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(\w+)\s*$").expect("valid word pattern"));

/// Words after which a parenthesised list is a row value, not call arguments.
const CONDITION_KEYWORDS: &[&str] = &["WHERE", "AND", "OR", "NOT", "ON", "WHEN", "HAVING"];

fn run_checks(masked: &str, checks: &[Check], ctx: &mut RuleContext<'_>) {
	for check in checks {
		if check.pattern.is_match(masked) {
			ctx.warn_once(check.category, check.message);
		}
	}
}

/// Warn about Oracle constructs that are not rewritten automatically.
pub fn detect_oracle(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let masked = mask(sql);

	run_checks(&masked, &ORACLE_CHECKS, ctx);
	if ROWNUM.is_match(&masked) && ORDER_BY.is_match(&masked) {
		ctx.warn_once(
			WarningCategory::RowLimit,
			"ROWNUM used with ORDER BY. Manual review required - results may differ. Consider using ROW_NUMBER() OVER(ORDER BY ...) instead.",
		);
	}
	if has_subquery_with_where(&masked) {
		ctx.warn_once(
			WarningCategory::CorrelatedSubquery,
			"Possible correlated subquery detected. Verify query logic after conversion.",
		);
	}
	if has_tuple_membership(&masked) {
		ctx.warn_once(
			WarningCategory::TupleMembership,
			"Tuple membership test ((a, b) IN (...)) is not supported in T-SQL. Rewrite with EXISTS or a JOIN.",
		);
	}

	sql.to_string()
}

/// Warn about T-SQL constructs that have no Oracle rewrite.
pub fn detect_tsql(sql: &str, ctx: &mut RuleContext<'_>) -> String {
	let masked = mask(sql);
	run_checks(&masked, &TSQL_CHECKS, ctx);
	sql.to_string()
}

fn has_subquery_with_where(masked: &str) -> bool {
	SUBQUERY_OPEN.find_iter(masked).any(|open| {
		matching_paren(masked, open.start())
			.is_some_and(|close| WHERE.is_match(&masked[open.start()..close]))
	})
}

fn has_tuple_membership(masked: &str) -> bool {
	TUPLE_IN.find_iter(masked).any(|m| {
		match TRAILING_WORD.captures(&masked[..m.start()]) {
			// `f(a, b) IN (...)` is a function call, not a row value.
			Some(caps) => CONDITION_KEYWORDS
				.iter()
				.any(|kw| caps[1].eq_ignore_ascii_case(kw)),
			None => true,
		}
	})
}
