use crate::convert::Direction;
use crate::error::Ora2TsqlError;
use crate::warning::WarningCategory;
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration from a `.ora2tsql.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
	/// If true, stop the directory cascade and jump directly to the user config.
	#[serde(default)]
	pub root: bool,

	/// Table name used in generated subquery skeletons, e.g. the
	/// LISTAGG(DISTINCT ...) rewrite. Defaults to `<source_table>`.
	#[serde(default)]
	pub source_table_placeholder: Option<String>,

	/// Warning categories to drop from conversion output.
	#[serde(default)]
	pub suppress_warnings: Vec<WarningCategory>,

	/// Extra rules that run after the built-in rules, in file order.
	#[serde(default)]
	pub rules: Vec<Rule>,
}

/// A user-defined rewrite or detection rule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Rule {
	/// Name shown in logs and `config show`.
	pub name: Option<String>,

	/// Restrict the rule to one direction. Unset means both.
	pub direction: Option<Direction>,

	/// Regex substitution applied to the query (mutually exclusive with detect).
	/// Format: "s/pattern/replacement/" with optional `g` and `i` flags.
	pub substitution: Option<String>,

	/// Regex that raises `warning` when it matches outside literals and comments.
	pub detect: Option<String>,

	/// Warning message for a detect rule.
	pub warning: Option<String>,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

/// Merged configuration from multiple config files in the cascade.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
	/// All rules from all configs, in cascade order.
	pub rules: Vec<RuleWithSource>,

	/// The most specific placeholder setting in the cascade.
	pub source_table_placeholder: Option<String>,

	/// Union of suppressed categories across the cascade.
	pub suppress_warnings: Vec<WarningCategory>,
}

/// A rule with its source config path for debugging/display.
#[derive(Debug, Clone)]
pub struct RuleWithSource {
	/// The rule itself.
	pub rule: Rule,

	/// The config file this rule came from.
	pub source: PathBuf,
}

impl Rule {
	pub fn display_name(&self) -> String {
		self.name.clone().unwrap_or_else(|| "<unnamed>".to_string())
	}

	/// Validate that exactly one action is set and that detect rules carry a message.
	pub fn validate(&self) -> Result<(), Ora2TsqlError> {
		match (&self.substitution, &self.detect) {
			(Some(_), Some(_)) => Err(Ora2TsqlError::MutuallyExclusive {
				rule: self.display_name(),
				option1: "substitution".to_string(),
				option2: "detect".to_string(),
			}),
			(None, None) => Err(Ora2TsqlError::MissingField {
				rule: self.display_name(),
				field: "substitution or detect".to_string(),
			}),
			(None, Some(_)) if self.warning.is_none() => Err(Ora2TsqlError::MissingField {
				rule: self.display_name(),
				field: "warning".to_string(),
			}),
			_ => Ok(()),
		}
	}
}

impl Config {
	/// Validate all rules in this config.
	pub fn validate(&self) -> Result<(), Ora2TsqlError> {
		for rule in &self.rules {
			rule.validate()?;
		}
		Ok(())
	}
}
