#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but replacement requires nightly

use predicates::prelude::*;
use std::fs;

fn ora2tsql_cmd() -> assert_cmd::Command {
	let mut cmd = assert_cmd::Command::cargo_bin("ora2tsql").unwrap();
	cmd.env("ORA2TSQL_NO_USER_CONFIG", "1");
	cmd
}

// ============================================================================
// CLI flag tests
// ============================================================================

#[test]
fn test_help_flag() {
	ora2tsql_cmd()
		.arg("--help")
		.assert()
		.success()
		.stdout(predicate::str::contains("rewriting Oracle SELECT queries"));
}

#[test]
fn test_version_flag() {
	ora2tsql_cmd()
		.arg("--version")
		.assert()
		.success()
		.stdout(predicate::str::contains("ora2tsql"));
}

#[test]
fn test_no_args_shows_help() {
	ora2tsql_cmd()
		.assert()
		.failure()
		.stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_query_and_file_conflict() {
	ora2tsql_cmd()
		.args(["-q", "SELECT 1 FROM DUAL", "-f", "query.sql"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Conversion tests
// ============================================================================

#[test]
fn test_convert_query_without_warnings() {
	ora2tsql_cmd()
		.args(["--no-config", "-q", "SELECT SYSDATE FROM DUAL"])
		.assert()
		.success()
		.stdout("SELECT GETDATE()\n");
}

#[test]
fn test_convert_query_prints_warning_block() {
	ora2tsql_cmd()
		.args([
			"--no-config",
			"-q",
			"SELECT id FROM emp START WITH mgr IS NULL CONNECT BY PRIOR id = mgr",
		])
		.assert()
		.success()
		.stdout(predicate::str::contains("CONVERSION WARNINGS"))
		.stdout(predicate::str::contains("WARNING [HIERARCHICAL]"))
		.stdout(predicate::str::contains("CONVERTED QUERY"));
}

#[test]
fn test_no_warnings_flag() {
	ora2tsql_cmd()
		.args([
			"--no-config",
			"--no-warnings",
			"-q",
			"SELECT id FROM emp CONNECT BY PRIOR id = mgr",
		])
		.assert()
		.success()
		.stdout(predicate::str::contains("CONVERSION WARNINGS").not())
		.stdout(predicate::str::contains("CONNECT BY"));
}

#[test]
fn test_reverse_conversion() {
	ora2tsql_cmd()
		.args([
			"--no-config",
			"-r",
			"-q",
			"SELECT TOP 5 ISNULL(name, 'Unknown'), GETDATE() FROM employees",
		])
		.assert()
		.success()
		.stdout("SELECT NVL(name, 'Unknown'), SYSDATE FROM employees WHERE ROWNUM <= 5\n");
}

#[test]
fn test_invalid_input_is_not_an_error() {
	ora2tsql_cmd()
		.args(["--no-config", "-q", "DELETE FROM emp"])
		.assert()
		.success()
		.stdout(predicate::str::contains("WARNING [INVALID_INPUT]"))
		.stdout(predicate::str::contains("DELETE FROM emp"));
}

#[test]
fn test_convert_from_file_to_file() {
	let temp_dir = tempfile::tempdir().unwrap();
	let input = temp_dir.path().join("input.sql");
	let output = temp_dir.path().join("out").join("output.sql");
	fs::write(&input, "SELECT NVL(a, 0) FROM t WHERE ROWNUM <= 3").unwrap();

	ora2tsql_cmd()
		.arg("--no-config")
		.arg("-f")
		.arg(&input)
		.arg("-o")
		.arg(&output)
		.assert()
		.success()
		.stdout(predicate::str::contains("Output written to"));

	let converted = fs::read_to_string(&output).unwrap();
	assert_eq!(converted, "SELECT TOP 3 ISNULL(a, 0) FROM t");
}

#[test]
fn test_missing_input_file() {
	let temp_dir = tempfile::tempdir().unwrap();

	ora2tsql_cmd()
		.arg("--no-config")
		.arg("-f")
		.arg(temp_dir.path().join("missing.sql"))
		.assert()
		.failure()
		.stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_query_from_stdin() {
	ora2tsql_cmd()
		.args(["--no-config", "-f", "-"])
		.write_stdin("SELECT LENGTH(name) FROM emp")
		.assert()
		.success()
		.stdout("SELECT LEN(name) FROM emp\n");
}

// ============================================================================
// --check tests
// ============================================================================

#[test]
fn test_check_passes_clean_conversion() {
	ora2tsql_cmd()
		.args(["--no-config", "--check", "-q", "SELECT NVL(a, 0) FROM t"])
		.assert()
		.success()
		.stdout(predicate::str::contains("QA CHECKLIST REPORT"))
		.stdout(predicate::str::contains("Overall Status: PASS"));
}

#[test]
fn test_check_fails_on_leftover_oracle_function() {
	// INSTR with an occurrence argument is left in place.
	ora2tsql_cmd()
		.args([
			"--no-config",
			"--check",
			"-q",
			"SELECT INSTR(s, 'a', 1, 2) FROM t",
		])
		.assert()
		.code(1)
		.stdout(predicate::str::contains("Overall Status: FAIL"));
}

// ============================================================================
// Configuration tests
// ============================================================================

#[test]
fn test_custom_rules_and_placeholder_from_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join(".ora2tsql.toml"),
		r#"
root = true
source-table-placeholder = "dbo.jobs"

[[rules]]
name = "schema"
direction = "oracle-to-tsql"
substitution = 's/\bHR\./dbo./gi'

[[rules]]
name = "audit"
detect = '\bPKG_AUDIT\.'
warning = "Audit calls must be removed."
"#,
	)
	.unwrap();

	ora2tsql_cmd()
		.args([
			"-q",
			"SELECT LISTAGG(DISTINCT job, ',') WITHIN GROUP (ORDER BY job), pkg_audit.tag(id) FROM hr.emp",
		])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("FROM dbo.jobs"))
		.stdout(predicate::str::contains("FROM dbo.emp"))
		.stdout(predicate::str::contains("WARNING [CUSTOM]: Audit calls must be removed."));
}

#[test]
fn test_suppress_warnings_from_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join(".ora2tsql.toml"),
		"root = true\nsuppress-warnings = [\"HIERARCHICAL\"]\n",
	)
	.unwrap();

	ora2tsql_cmd()
		.args(["-q", "SELECT id FROM emp CONNECT BY PRIOR id = mgr"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("CONVERSION WARNINGS").not());
}

#[test]
fn test_invalid_config_fails_conversion() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(temp_dir.path().join(".ora2tsql.toml"), "invalid toml [[[").unwrap();

	ora2tsql_cmd()
		.args(["-q", "SELECT 1 FROM DUAL"])
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("Failed to load configuration"));
}

// ============================================================================
// --init tests
// ============================================================================

#[test]
fn test_init_creates_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config_path = temp_dir.path().join(".ora2tsql.toml");

	ora2tsql_cmd()
		.arg("--init")
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Created .ora2tsql.toml"));

	let content = fs::read_to_string(&config_path).unwrap();
	assert!(content.contains("root = true"));
	assert!(content.contains("[[rules]]"));
}

#[test]
fn test_init_fails_if_exists() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config_path = temp_dir.path().join(".ora2tsql.toml");
	fs::write(&config_path, "# existing").unwrap();

	ora2tsql_cmd()
		.arg("--init")
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_init_force_overwrites() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config_path = temp_dir.path().join(".ora2tsql.toml");
	fs::write(&config_path, "# existing").unwrap();

	ora2tsql_cmd()
		.args(["--init", "--force"])
		.current_dir(temp_dir.path())
		.assert()
		.success();

	let content = fs::read_to_string(&config_path).unwrap();
	assert!(content.contains("root = true"));
}

// ============================================================================
// config subcommand tests
// ============================================================================

#[test]
fn test_config_validate_valid_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join(".ora2tsql.toml"),
		r#"
root = true

[[rules]]
substitution = "s/foo/bar/g"
"#,
	)
	.unwrap();

	ora2tsql_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("valid"));
}

#[test]
fn test_config_validate_invalid_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(temp_dir.path().join(".ora2tsql.toml"), "invalid toml [[[").unwrap();

	ora2tsql_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.failure();
}

#[test]
fn test_config_validate_bad_regex() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join(".ora2tsql.toml"),
		"root = true\n\n[[rules]]\nsubstitution = \"s/[oops/x/\"\n",
	)
	.unwrap();

	ora2tsql_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("Invalid regex"));
}

#[test]
fn test_config_show_displays_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join(".ora2tsql.toml"),
		r#"
root = true

[[rules]]
name = "audit"
detect = "pkg_audit"
warning = "no audit"
"#,
	)
	.unwrap();

	ora2tsql_cmd()
		.args(["config", "show"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Rule 1: audit"))
		.stdout(predicate::str::contains("detect: pkg_audit"));
}
