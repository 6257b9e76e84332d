use std::path::PathBuf;

/// Library-level structured errors for ora2tsql.
///
/// Conversion itself never fails; these cover configuration and file I/O.
/// The CLI binary wraps them with `anyhow` for context chains.
#[derive(Debug, thiserror::Error)]
pub enum Ora2TsqlError {
	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid regex pattern in rule: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Invalid substitution `{input}`: {reason}")]
	InvalidSubstitution { input: String, reason: String },

	#[error("Mutually exclusive options in rule {rule}: {option1} and {option2}")]
	MutuallyExclusive {
		rule: String,
		option1: String,
		option2: String,
	},

	#[error("Rule {rule} is missing required field: {field}")]
	MissingField { rule: String, field: String },

	#[error("Failed to read SQL file: {path}")]
	FileReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write SQL file: {path}")]
	FileWriteError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using Ora2TsqlError.
pub type Result<T> = std::result::Result<T, Ora2TsqlError>;
