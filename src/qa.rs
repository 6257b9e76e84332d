//! Post-conversion checks on T-SQL output.
//!
//! The checklist looks for things the rewriter should have removed and for
//! skeletons that still need a human, then renders a plain-text report.

use crate::rules::forward::REGEXP_MARKER;
use crate::rules::scan::{mask, mask_comments};
use crate::warning::{Warning, WarningCategory};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

const HTML_ENTITIES: &[&str] = &["&gt;", "&lt;", "&amp;", "&quot;", "&apos;", "&nbsp;"];

const ORACLE_FUNCTIONS: &[&str] = &[
	"NVL", "NVL2", "DECODE", "TRUNC", "ADD_MONTHS", "SUBSTR", "INSTR", "TO_CHAR", "TO_DATE",
	"LISTAGG",
];

const ORACLE_KEYWORDS: &[&str] = &["SYSDATE", "SYSTIMESTAMP", "ROWNUM"];

static ORACLE_CALL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!(r"(?i)\b({})\s*\(", ORACLE_FUNCTIONS.join("|")))
		.expect("valid Oracle function pattern")
});

static ORACLE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!(r"(?i)\b({})\b", ORACLE_KEYWORDS.join("|")))
		.expect("valid Oracle keyword pattern")
});

static STRING_AGG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bSTRING_AGG\s*\(").expect("valid STRING_AGG pattern"));

static DISTINCT_DERIVED_SET: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?is)SELECT\s+STRING_AGG.*?FROM\s*\(\s*SELECT\s+DISTINCT\b")
		.expect("valid derived set pattern")
});

static REGEXP_CALL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\bREGEXP_(?:LIKE|SUBSTR|REPLACE|INSTR|COUNT)\s*\(").expect("valid REGEXP pattern")
});

static SELECT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)\bSELECT\b").expect("valid SELECT pattern"));

/// How bad a failed check is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
	Ok,
	Warning,
	Critical,
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Severity::Ok => "OK",
			Severity::Warning => "WARNING",
			Severity::Critical => "CRITICAL",
		})
	}
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
	pub name: &'static str,
	pub passed: bool,
	/// `Ok` for passing checks.
	pub severity: Severity,
	pub message: String,
	/// What the user has to do by hand.
	pub action: Option<String>,
}

impl CheckResult {
	fn pass(name: &'static str, message: impl Into<String>) -> Self {
		CheckResult {
			name,
			passed: true,
			severity: Severity::Ok,
			message: message.into(),
			action: None,
		}
	}

	fn fail(name: &'static str, severity: Severity, message: impl Into<String>) -> Self {
		CheckResult {
			name,
			passed: false,
			severity,
			message: message.into(),
			action: None,
		}
	}

	fn with_action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	/// `STRING AGG DISTINCT` for `string_agg_distinct`.
	fn title(&self) -> String {
		self.name.to_ascii_uppercase().replace('_', " ")
	}
}

/// All check results for one converted query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaReport {
	pub checks: Vec<CheckResult>,
}

impl QaReport {
	pub fn total(&self) -> usize {
		self.checks.len()
	}

	pub fn passed(&self) -> usize {
		self.checks.iter().filter(|c| c.passed).count()
	}

	pub fn critical_failures(&self) -> usize {
		self.failures(Severity::Critical)
	}

	pub fn warning_failures(&self) -> usize {
		self.failures(Severity::Warning)
	}

	fn failures(&self, severity: Severity) -> usize {
		self.checks
			.iter()
			.filter(|c| !c.passed && c.severity == severity)
			.count()
	}

	/// PASS unless a critical check failed.
	pub fn overall_pass(&self) -> bool {
		self.critical_failures() == 0
	}

	pub fn ready_for_execution(&self) -> bool {
		self.critical_failures() == 0 && self.warning_failures() == 0
	}
}

impl fmt::Display for QaReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let rule = "=".repeat(80);
		writeln!(f, "{rule}")?;
		writeln!(f, "QA CHECKLIST REPORT")?;
		writeln!(f, "{rule}")?;

		for check in &self.checks {
			let status = if check.passed { "PASS" } else { "FAIL" };
			writeln!(f)?;
			writeln!(f, "[{status}] {}", check.title())?;
			writeln!(f, "    Status: {}", check.severity)?;
			writeln!(f, "    {}", check.message)?;
			if let Some(action) = &check.action {
				writeln!(f, "    ACTION: {action}")?;
			}
		}

		writeln!(f)?;
		writeln!(f, "{rule}")?;
		writeln!(f, "SUMMARY")?;
		writeln!(f, "{rule}")?;
		writeln!(f, "Total Checks: {}", self.total())?;
		writeln!(f, "Passed: {}", self.passed())?;
		writeln!(f, "Critical Failures: {}", self.critical_failures())?;
		writeln!(f, "Warnings: {}", self.warning_failures())?;
		writeln!(f)?;
		writeln!(
			f,
			"Overall Status: {}",
			if self.overall_pass() { "PASS" } else { "FAIL" }
		)?;
		writeln!(
			f,
			"Ready for SQL Server execution: {}",
			if self.ready_for_execution() {
				"YES"
			} else {
				"NO (manual fixes required)"
			}
		)?;
		write!(f, "{rule}")
	}
}

/// Run every check against a converted T-SQL query.
pub fn run_checklist(converted: &str, warnings: &[Warning], placeholder: &str) -> QaReport {
	let masked = mask(converted);
	// Entity decoding skips comments but not literals.
	let uncommented = mask_comments(converted);

	QaReport {
		checks: vec![
			check_html_entities(&uncommented),
			check_oracle_functions(&masked),
			check_string_agg_distinct(converted, &masked, placeholder),
			check_regexp(converted, &masked, warnings),
			check_syntax(&uncommented, &masked),
		],
	}
}

fn check_html_entities(uncommented: &str) -> CheckResult {
	let found: Vec<&str> = HTML_ENTITIES
		.iter()
		.copied()
		.filter(|entity| uncommented.contains(entity))
		.collect();

	if found.is_empty() {
		CheckResult::pass("html_entities", "No HTML entities remain")
	} else {
		CheckResult::fail(
			"html_entities",
			Severity::Critical,
			format!("Found HTML entities: {}", found.join(", ")),
		)
	}
}

fn check_oracle_functions(masked: &str) -> CheckResult {
	let seen: Vec<String> = ORACLE_CALL
		.captures_iter(masked)
		.chain(ORACLE_KEYWORD.captures_iter(masked))
		.map(|caps| caps[1].to_ascii_uppercase())
		.collect();
	let mut found: Vec<&str> = ORACLE_FUNCTIONS
		.iter()
		.chain(ORACLE_KEYWORDS)
		.copied()
		.filter(|name| seen.iter().any(|s| s == name))
		.collect();
	if masked.contains("||") {
		found.push("||");
	}

	if found.is_empty() {
		CheckResult::pass("oracle_functions", "All Oracle functions converted")
	} else {
		CheckResult::fail(
			"oracle_functions",
			Severity::Critical,
			format!("Oracle functions still present: {}", found.join(", ")),
		)
	}
}

fn check_string_agg_distinct(converted: &str, masked: &str, placeholder: &str) -> CheckResult {
	const NAME: &str = "string_agg_distinct";

	if !STRING_AGG.is_match(masked) {
		return CheckResult::pass(NAME, "No STRING_AGG in query (N/A)");
	}
	if !DISTINCT_DERIVED_SET.is_match(masked) {
		return CheckResult::pass(NAME, "STRING_AGG found (non-DISTINCT or already correct)");
	}
	if converted.contains(placeholder) {
		return CheckResult::fail(
			NAME,
			Severity::Warning,
			format!(
				"STRING_AGG DISTINCT pattern found but requires manual fix (replace {placeholder} placeholder)"
			),
		)
		.with_action(format!(
			"Replace {placeholder} with the actual table or CTE and add the WHERE correlation"
		));
	}
	CheckResult::pass(NAME, "STRING_AGG DISTINCT uses a derived set")
}

fn check_regexp(converted: &str, masked: &str, warnings: &[Warning]) -> CheckResult {
	const NAME: &str = "regexp_like";

	if !REGEXP_CALL.is_match(masked) {
		return CheckResult::pass(NAME, "No REGEXP functions in query (N/A)");
	}

	let has_warning = warnings
		.iter()
		.any(|w| w.category == WarningCategory::RegexpLike);
	let has_marker = converted.contains(REGEXP_MARKER);

	match (has_warning, has_marker) {
		(true, true) => CheckResult::pass(NAME, "REGEXP functions carry the version warning"),
		(true, false) => CheckResult::fail(
			NAME,
			Severity::Warning,
			"REGEXP functions found but the version comment is missing",
		),
		(false, _) => CheckResult::fail(
			NAME,
			Severity::Warning,
			"REGEXP functions found but missing version warning",
		),
	}
}

fn check_syntax(uncommented: &str, masked: &str) -> CheckResult {
	let mut issues = Vec::new();

	if uncommented.contains("&gt;") || uncommented.contains("&lt;") {
		issues.push("HTML entities in operators".to_string());
	}

	let open = masked.matches('(').count();
	let close = masked.matches(')').count();
	if open != close {
		issues.push(format!("Unbalanced parentheses: {open} open, {close} close"));
	}

	if !SELECT.is_match(masked) {
		issues.push("Missing SELECT keyword".to_string());
	}

	if issues.is_empty() {
		CheckResult::pass("syntax", "Basic syntax checks passed")
	} else {
		CheckResult::fail(
			"syntax",
			Severity::Critical,
			format!("Syntax issues: {}", issues.join("; ")),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::convert::{Direction, convert};

	fn check<'a>(report: &'a QaReport, name: &str) -> &'a CheckResult {
		report
			.checks
			.iter()
			.find(|c| c.name == name)
			.unwrap_or_else(|| panic!("no check named {name}"))
	}

	#[test]
	fn test_clean_conversion_passes() {
		let result = convert(
			"SELECT NVL(name, 'x'), SYSDATE FROM emp WHERE ROWNUM <= 5",
			Direction::OracleToTsql,
		);
		let report = run_checklist(&result.query, &result.warnings, "<source_table>");
		assert_eq!(report.total(), 5);
		assert_eq!(report.passed(), 5);
		assert!(report.overall_pass());
		assert!(report.ready_for_execution());
	}

	#[test]
	fn test_leftover_entities_and_functions_fail() {
		let report = run_checklist("SELECT NVL(a, b) FROM t WHERE a &gt; 1", &[], "<source_table>");
		assert!(!check(&report, "html_entities").passed);
		assert!(!check(&report, "oracle_functions").passed);
		assert!(!check(&report, "syntax").passed);
		assert_eq!(report.critical_failures(), 3);
		assert!(!report.overall_pass());
	}

	#[test]
	fn test_entities_in_comments_ignored() {
		let result = convert("SELECT a FROM t -- a &gt; b\nWHERE a &gt; 1", Direction::OracleToTsql);
		assert_eq!(result.query, "SELECT a FROM t -- a &gt; b\nWHERE a > 1");

		let report = run_checklist(&result.query, &result.warnings, "<source_table>");
		assert!(check(&report, "html_entities").passed);
		assert!(check(&report, "syntax").passed);
		assert_eq!(report.critical_failures(), 0);
		assert!(report.overall_pass());
	}

	#[test]
	fn test_leftover_functions_listed_once_in_order() {
		let report = run_checklist(
			"SELECT TO_CHAR(d), nvl(a, 0), NVL(b, 0), ROWNUM FROM t",
			&[],
			"<source_table>",
		);
		assert_eq!(
			check(&report, "oracle_functions").message,
			"Oracle functions still present: NVL, TO_CHAR, ROWNUM"
		);
	}

	#[test]
	fn test_oracle_names_in_comments_and_literals_ignored() {
		let report = run_checklist(
			"SELECT 'NVL(' AS label, a FROM t -- was NVL(a) || b",
			&[],
			"<source_table>",
		);
		assert!(check(&report, "oracle_functions").passed);
		assert!(check(&report, "syntax").passed);
	}

	#[test]
	fn test_string_agg_skeleton_needs_manual_fix() {
		let result = convert(
			"SELECT LISTAGG(DISTINCT code, ',') WITHIN GROUP (ORDER BY code) FROM t",
			Direction::OracleToTsql,
		);
		let report = run_checklist(&result.query, &result.warnings, "<source_table>");
		let agg = check(&report, "string_agg_distinct");
		assert!(!agg.passed);
		assert_eq!(agg.severity, Severity::Warning);
		assert!(agg.action.is_some());
		assert!(report.overall_pass());
		assert!(!report.ready_for_execution());
	}

	#[test]
	fn test_regexp_requires_warning_and_marker() {
		let result = convert("SELECT a FROM t WHERE REGEXP_LIKE(a, '^x')", Direction::OracleToTsql);
		let report = run_checklist(&result.query, &result.warnings, "<source_table>");
		assert!(check(&report, "regexp_like").passed);

		let bare = run_checklist("SELECT a FROM t WHERE REGEXP_LIKE(a, '^x')", &[], "<source_table>");
		assert!(!check(&bare, "regexp_like").passed);
	}

	#[test]
	fn test_report_rendering() {
		let report = run_checklist("SELECT a FROM t", &[], "<source_table>");
		let text = report.to_string();
		assert!(text.starts_with(&"=".repeat(80)));
		assert!(text.contains("QA CHECKLIST REPORT"));
		assert!(text.contains("[PASS] STRING AGG DISTINCT"));
		assert!(text.contains("Total Checks: 5"));
		assert!(text.contains("Overall Status: PASS"));
	}
}
