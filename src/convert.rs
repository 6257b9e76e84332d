//! The conversion entry points.
//!
//! A conversion runs the built-in rules for a direction in their fixed
//! order, then any configured custom rules, and returns the rewritten
//! query together with the warnings raised along the way. It never fails:
//! input that is empty or not a SELECT comes back unchanged with an
//! `INVALID_INPUT` warning.

use crate::config::MergedConfig;
use crate::error::Result;
use crate::rules::scan::mask;
use crate::rules::{CompiledRule, RuleContext, builtin_rules, compile_rules};
use crate::warning::{Warning, WarningCategory};
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::LazyLock;

/// Table name used in generated subquery skeletons unless configured.
pub const DEFAULT_SOURCE_TABLE_PLACEHOLDER: &str = "<source_table>";

static QUERY_HEAD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^(?:SELECT|WITH)\b").expect("valid query head pattern"));

/// Which dialect is the source of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Direction {
	#[serde(rename = "oracle-to-tsql", alias = "forward")]
	OracleToTsql,
	#[serde(rename = "tsql-to-oracle", alias = "reverse")]
	TsqlToOracle,
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Direction::OracleToTsql => f.write_str("oracle-to-tsql"),
			Direction::TsqlToOracle => f.write_str("tsql-to-oracle"),
		}
	}
}

/// The result of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
	pub query: String,
	pub warnings: Vec<Warning>,
}

impl Conversion {
	pub fn into_parts(self) -> (String, Vec<Warning>) {
		(self.query, self.warnings)
	}
}

/// Built-in rules plus the custom rules and settings from configuration.
#[derive(Debug)]
pub struct Converter {
	custom_rules: Vec<CompiledRule>,
	source_table_placeholder: String,
	suppress_warnings: Vec<WarningCategory>,
}

impl Default for Converter {
	fn default() -> Self {
		Converter::new()
	}
}

impl Converter {
	/// A converter with only the built-in rules.
	pub fn new() -> Self {
		Converter {
			custom_rules: Vec::new(),
			source_table_placeholder: DEFAULT_SOURCE_TABLE_PLACEHOLDER.to_string(),
			suppress_warnings: Vec::new(),
		}
	}

	/// Compile the custom rules and settings of a merged configuration.
	pub fn from_config(config: &MergedConfig) -> Result<Self> {
		Ok(Converter {
			custom_rules: compile_rules(config)?,
			source_table_placeholder: config
				.source_table_placeholder
				.clone()
				.unwrap_or_else(|| DEFAULT_SOURCE_TABLE_PLACEHOLDER.to_string()),
			suppress_warnings: config.suppress_warnings.clone(),
		})
	}

	pub fn source_table_placeholder(&self) -> &str {
		&self.source_table_placeholder
	}

	/// Rewrite `query` from the source dialect of `direction`.
	pub fn convert(&self, query: &str, direction: Direction) -> Conversion {
		let mut ctx = RuleContext::new(&self.source_table_placeholder);

		let sql = if let Some(message) = invalid_input(query) {
			ctx.warn(WarningCategory::InvalidInput, message);
			query.to_string()
		} else {
			self.run_rules(query, direction, &mut ctx)
		};

		let total = ctx.warnings.len();
		let warnings: Vec<Warning> = ctx
			.warnings
			.into_iter()
			.filter(|w| !self.suppress_warnings.contains(&w.category))
			.collect();
		info!(
			"Converted query ({direction}): {} warning(s), {} suppressed",
			warnings.len(),
			total - warnings.len()
		);

		Conversion {
			query: sql,
			warnings,
		}
	}

	fn run_rules(&self, query: &str, direction: Direction, ctx: &mut RuleContext<'_>) -> String {
		let mut sql = query.to_string();

		for rule in builtin_rules(direction) {
			let next = (rule.apply)(&sql, ctx);
			if next != sql {
				debug!("Rule {} rewrote the query", rule.name);
				sql = next;
			}
		}

		for rule in self.custom_rules.iter().filter(|r| r.applies_to(direction)) {
			let next = rule.apply(&sql, ctx);
			if next != sql {
				debug!(
					"Custom rule {} from {} rewrote the query",
					rule.display_name(),
					rule.source.display()
				);
				sql = next;
			}
		}

		sql
	}
}

/// Convert with the built-in rules only.
pub fn convert(query: &str, direction: Direction) -> Conversion {
	Converter::new().convert(query, direction)
}

/// Why `query` cannot be converted, if it cannot.
fn invalid_input(query: &str) -> Option<&'static str> {
	let masked = mask(query);
	let head = masked.trim_start_matches(|c: char| c.is_whitespace() || c == '(');

	if head.trim().is_empty() {
		return Some("Empty query: nothing to convert.");
	}
	if !QUERY_HEAD.is_match(head) {
		return Some(
			"Query does not appear to be a SELECT statement. Only SELECT queries are supported.",
		);
	}
	None
}
