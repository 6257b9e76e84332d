//! Rewrite rules for ora2tsql.
//!
//! This module handles:
//! - The ordered built-in rule lists for each direction
//! - The detection pass that only emits warnings
//! - User-defined substitutions and detections from configuration

pub mod custom;
pub mod detect;
pub mod entities;
pub mod formats;
pub mod forward;
pub mod reverse;
pub mod rewriter;
pub mod scan;

pub use custom::{CompiledRule, RuleAction, compile_rules};
pub use rewriter::Substitution;

use crate::convert::Direction;
use crate::warning::{Warning, WarningCategory};

/// State threaded through the rules of a single conversion.
#[derive(Debug)]
pub struct RuleContext<'a> {
	/// Warnings in the order they were raised.
	pub warnings: Vec<Warning>,

	/// Table name written into generated subquery skeletons.
	pub source_table_placeholder: &'a str,
}

impl<'a> RuleContext<'a> {
	pub fn new(source_table_placeholder: &'a str) -> Self {
		RuleContext {
			warnings: Vec::new(),
			source_table_placeholder,
		}
	}

	pub fn warn(&mut self, category: WarningCategory, message: impl Into<String>) {
		self.warnings.push(Warning::new(category, message));
	}

	/// Like [`warn`](Self::warn), but drops exact duplicates.
	pub fn warn_once(&mut self, category: WarningCategory, message: impl Into<String>) {
		let warning = Warning::new(category, message);
		if !self.warnings.contains(&warning) {
			self.warnings.push(warning);
		}
	}
}

/// A built-in rewrite step.
pub type RuleFn = fn(&str, &mut RuleContext<'_>) -> String;

/// A named built-in rule.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinRule {
	pub name: &'static str,
	pub apply: RuleFn,
}

/// The fixed rule sequence for a direction. Order is significant.
pub fn builtin_rules(direction: Direction) -> &'static [BuiltinRule] {
	match direction {
		Direction::OracleToTsql => forward::RULES,
		Direction::TsqlToOracle => reverse::RULES,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_warn_once_drops_duplicates() {
		let mut ctx = RuleContext::new("<source_table>");
		ctx.warn_once(WarningCategory::RowLimit, "a");
		ctx.warn_once(WarningCategory::RowLimit, "a");
		ctx.warn_once(WarningCategory::RowLimit, "b");
		ctx.warn(WarningCategory::RowLimit, "b");
		assert_eq!(ctx.warnings.len(), 3);
	}

	#[test]
	fn test_both_directions_decode_entities_first() {
		for direction in [Direction::OracleToTsql, Direction::TsqlToOracle] {
			let rules = builtin_rules(direction);
			assert_eq!(rules[0].name, "decode_html_entities");
		}
	}

	#[test]
	fn test_rule_names_are_unique() {
		for direction in [Direction::OracleToTsql, Direction::TsqlToOracle] {
			let mut names: Vec<_> = builtin_rules(direction).iter().map(|r| r.name).collect();
			let total = names.len();
			names.sort_unstable();
			names.dedup();
			assert_eq!(names.len(), total);
		}
	}
}
