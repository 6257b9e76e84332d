use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedConfig, MergedConfig, RuleWithSource};
use crate::error::{Ora2TsqlError, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// Name of the per-directory config file.
pub const CONFIG_FILE_NAME: &str = ".ora2tsql.toml";

/// If truthy, the user config in the home directory is never read.
pub const NO_USER_CONFIG_ENV: &str = "ORA2TSQL_NO_USER_CONFIG";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.ora2tsql.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.ora2tsql.toml (unless disabled)
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = start_dir.to_path_buf();

	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			debug!("Loading config {}", config_path.display());
			let config = parse_config_file(&config_path)?;
			let is_root = config.root;

			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if is_root {
				break;
			}
		}

		if let Some(parent) = current_dir.parent() {
			current_dir = parent.to_path_buf();
		} else {
			break;
		}
	}

	if let Some(user_config) = load_user_config(&configs)? {
		configs.push(user_config);
	}

	Ok(configs)
}

/// Load the user's ~/.ora2tsql.toml if it exists and isn't disabled.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	if is_env_truthy(NO_USER_CONFIG_ENV) {
		debug!("User config disabled by {NO_USER_CONFIG_ENV}");
		return Ok(None);
	}

	let user_config_path = user_config_path()?;

	// The upward walk already picked it up when running under $HOME.
	if existing_configs.iter().any(|c| c.path == user_config_path) {
		return Ok(None);
	}

	if user_config_path.exists() {
		debug!("Loading user config {}", user_config_path.display());
		let config = parse_config_file(&user_config_path)?;
		Ok(Some(LoadedConfig {
			config,
			path: user_config_path,
		}))
	} else {
		Ok(None)
	}
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var_name: &str) -> bool {
	match std::env::var(var_name) {
		Ok(value) => {
			let lower = value.to_lowercase();
			!value.is_empty() && lower != "0" && lower != "false" && lower != "no"
		}
		Err(_) => false,
	}
}

/// Merge multiple configs into a single effective config.
///
/// Rules are collected in cascade order. The most specific file that sets
/// `source-table-placeholder` wins; suppressed categories accumulate.
pub fn merge_configs(configs: &[LoadedConfig]) -> MergedConfig {
	let mut merged = MergedConfig::default();

	for loaded in configs {
		for rule in &loaded.config.rules {
			merged.rules.push(RuleWithSource {
				rule: rule.clone(),
				source: loaded.path.clone(),
			});
		}

		if merged.source_table_placeholder.is_none() {
			merged.source_table_placeholder = loaded.config.source_table_placeholder.clone();
		}

		for category in &loaded.config.suppress_warnings {
			if !merged.suppress_warnings.contains(category) {
				merged.suppress_warnings.push(*category);
			}
		}
	}

	merged
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_merged_config(start_dir: &Path) -> Result<MergedConfig> {
	let configs = discover_configs(start_dir)?;
	Ok(merge_configs(&configs))
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(Ora2TsqlError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::types::{Config, Rule};
	use crate::warning::WarningCategory;
	use std::fs;
	use tempfile::TempDir;

	fn loaded(config: Config, path: &str) -> LoadedConfig {
		LoadedConfig {
			config,
			path: PathBuf::from(path),
		}
	}

	#[test]
	fn test_is_env_truthy() {
		// SAFETY: These env var operations are safe in single-threaded test context
		unsafe {
			std::env::remove_var("TEST_ORA2TSQL_ENV_1");
			assert!(!is_env_truthy("TEST_ORA2TSQL_ENV_1"));

			std::env::set_var("TEST_ORA2TSQL_ENV_2", "");
			assert!(!is_env_truthy("TEST_ORA2TSQL_ENV_2"));

			std::env::set_var("TEST_ORA2TSQL_ENV_3", "0");
			assert!(!is_env_truthy("TEST_ORA2TSQL_ENV_3"));

			std::env::set_var("TEST_ORA2TSQL_ENV_4", "FALSE");
			assert!(!is_env_truthy("TEST_ORA2TSQL_ENV_4"));

			std::env::set_var("TEST_ORA2TSQL_ENV_5", "no");
			assert!(!is_env_truthy("TEST_ORA2TSQL_ENV_5"));

			std::env::set_var("TEST_ORA2TSQL_ENV_6", "1");
			assert!(is_env_truthy("TEST_ORA2TSQL_ENV_6"));

			std::env::set_var("TEST_ORA2TSQL_ENV_7", "yes");
			assert!(is_env_truthy("TEST_ORA2TSQL_ENV_7"));

			for i in 1..=7 {
				std::env::remove_var(format!("TEST_ORA2TSQL_ENV_{i}"));
			}
		}
	}

	#[test]
	fn test_user_config_path() {
		let path = user_config_path().unwrap();
		assert!(path.ends_with(".ora2tsql.toml"));
	}

	#[test]
	fn test_merge_placeholder_most_specific_wins() {
		let inner = Config {
			source_table_placeholder: Some("inner_table".to_string()),
			..Default::default()
		};
		let outer = Config {
			source_table_placeholder: Some("outer_table".to_string()),
			..Default::default()
		};
		let merged = merge_configs(&[
			loaded(Config::default(), "/a/b/c/.ora2tsql.toml"),
			loaded(inner, "/a/b/.ora2tsql.toml"),
			loaded(outer, "/a/.ora2tsql.toml"),
		]);
		assert_eq!(
			merged.source_table_placeholder,
			Some("inner_table".to_string())
		);
	}

	#[test]
	fn test_merge_unions_suppressed_categories_and_keeps_rule_order() {
		let inner = Config {
			suppress_warnings: vec![WarningCategory::RowLimit],
			rules: vec![Rule {
				name: Some("inner".to_string()),
				substitution: Some("s/a/b/".to_string()),
				..Default::default()
			}],
			..Default::default()
		};
		let outer = Config {
			suppress_warnings: vec![WarningCategory::RowLimit, WarningCategory::Custom],
			rules: vec![Rule {
				name: Some("outer".to_string()),
				substitution: Some("s/b/c/".to_string()),
				..Default::default()
			}],
			..Default::default()
		};
		let merged = merge_configs(&[loaded(inner, "/x/.ora2tsql.toml"), loaded(outer, "/.ora2tsql.toml")]);

		assert_eq!(
			merged.suppress_warnings,
			vec![WarningCategory::RowLimit, WarningCategory::Custom]
		);
		let names: Vec<_> = merged.rules.iter().map(|r| r.rule.display_name()).collect();
		assert_eq!(names, vec!["inner", "outer"]);
		assert_eq!(merged.rules[1].source, PathBuf::from("/.ora2tsql.toml"));
	}

	#[test]
	fn test_discover_stops_at_root_config() {
		let temp_dir = TempDir::new().unwrap();
		let project = temp_dir.path().join("project");
		let nested = project.join("queries").join("reports");
		fs::create_dir_all(&nested).unwrap();

		fs::write(
			temp_dir.path().join(CONFIG_FILE_NAME),
			"source-table-placeholder = \"outside\"\n",
		)
		.unwrap();
		fs::write(
			project.join(CONFIG_FILE_NAME),
			"root = true\nsource-table-placeholder = \"project\"\n",
		)
		.unwrap();
		fs::write(
			nested.join(CONFIG_FILE_NAME),
			"suppress-warnings = [\"HIERARCHICAL\"]\n",
		)
		.unwrap();

		let configs = discover_configs(&nested).unwrap();
		let local: Vec<_> = configs
			.iter()
			.filter(|c| c.path.starts_with(temp_dir.path()))
			.collect();
		assert_eq!(local.len(), 2);
		assert_eq!(local[0].path, nested.join(CONFIG_FILE_NAME));
		assert_eq!(local[1].path, project.join(CONFIG_FILE_NAME));
	}
}
