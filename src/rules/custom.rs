use super::RuleContext;
use super::rewriter::Substitution;
use super::scan::mask;
use crate::config::types::{MergedConfig, Rule, RuleWithSource};
use crate::convert::Direction;
use crate::error::{Ora2TsqlError, Result};
use crate::warning::WarningCategory;
use regex::{Regex, RegexBuilder};
use std::path::PathBuf;

/// What a configured rule does once compiled.
#[derive(Debug)]
pub enum RuleAction {
	/// Rewrite the query text.
	Substitute(Substitution),

	/// Raise a warning when the pattern occurs outside literals and comments.
	Detect { pattern: Regex, warning: String },
}

/// A compiled user rule ready to run after the built-in rules.
#[derive(Debug)]
pub struct CompiledRule {
	/// The original rule.
	pub rule: Rule,

	pub action: RuleAction,

	/// Source config path (for debugging).
	pub source: PathBuf,
}

impl CompiledRule {
	/// Compile a rule from a RuleWithSource.
	pub fn from_rule_with_source(rws: &RuleWithSource) -> Result<Self> {
		let rule = &rws.rule;
		let action = match (&rule.substitution, &rule.detect) {
			(Some(substitution), None) => RuleAction::Substitute(Substitution::parse(substitution)?),
			(None, Some(detect)) => RuleAction::Detect {
				pattern: compile_detect_regex(detect)?,
				warning: rule.warning.clone().ok_or_else(|| Ora2TsqlError::MissingField {
					rule: rule.display_name(),
					field: "warning".to_string(),
				})?,
			},
			(Some(_), Some(_)) => {
				return Err(Ora2TsqlError::MutuallyExclusive {
					rule: rule.display_name(),
					option1: "substitution".to_string(),
					option2: "detect".to_string(),
				});
			}
			(None, None) => {
				return Err(Ora2TsqlError::MissingField {
					rule: rule.display_name(),
					field: "substitution or detect".to_string(),
				});
			}
		};

		Ok(CompiledRule {
			rule: rule.clone(),
			action,
			source: rws.source.clone(),
		})
	}

	/// Rules without a direction run both ways.
	pub fn applies_to(&self, direction: Direction) -> bool {
		self.rule.direction.is_none_or(|d| d == direction)
	}

	pub fn display_name(&self) -> String {
		self.rule.display_name()
	}

	/// Run this rule against the query.
	pub fn apply(&self, sql: &str, ctx: &mut RuleContext<'_>) -> String {
		match &self.action {
			RuleAction::Substitute(substitution) => substitution.apply(sql),
			RuleAction::Detect { pattern, warning } => {
				if pattern.is_match(&mask(sql)) {
					ctx.warn_once(WarningCategory::Custom, warning.as_str());
				}
				sql.to_string()
			}
		}
	}
}

/// Detection patterns are case-insensitive, like SQL keywords.
fn compile_detect_regex(pattern: &str) -> Result<Regex> {
	RegexBuilder::new(pattern)
		.case_insensitive(true)
		.build()
		.map_err(|source| Ora2TsqlError::InvalidRegex {
			pattern: pattern.to_string(),
			source,
		})
}

/// Compile all rules in a merged config.
pub fn compile_rules(config: &MergedConfig) -> Result<Vec<CompiledRule>> {
	config
		.rules
		.iter()
		.map(CompiledRule::from_rule_with_source)
		.collect()
}
