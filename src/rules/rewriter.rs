use crate::error::{Ora2TsqlError, Result};
use regex::{Regex, RegexBuilder};

/// Parsed substitution command (sed-like syntax).
#[derive(Debug)]
pub struct Substitution {
	/// The pattern to match.
	pub pattern: Regex,

	/// The replacement string. `$1` / `${name}` refer to capture groups.
	pub replacement: String,

	/// Whether to replace all occurrences (global flag).
	pub global: bool,
}

impl Substitution {
	/// Parse a substitution string in sed-like format, e.g.
	/// `s/pattern/replacement/` or `s|pattern|replacement|gi`.
	///
	/// Flags: `g` replaces every match, `i` matches case-insensitively.
	pub fn parse(input: &str) -> Result<Self> {
		let invalid = |reason: &str| Ora2TsqlError::InvalidSubstitution {
			input: input.to_string(),
			reason: reason.to_string(),
		};

		let mut chars = input.chars();
		if chars.next() != Some('s') {
			return Err(invalid("substitution must start with 's'"));
		}
		let Some(delimiter) = chars.next() else {
			return Err(invalid("substitution is too short"));
		};
		if delimiter.is_alphanumeric() || delimiter == '\\' || delimiter.is_whitespace() {
			return Err(invalid("delimiter must be a punctuation character"));
		}

		let parts = split_by_delimiter(chars.as_str(), delimiter);
		if parts.len() < 2 {
			return Err(invalid("substitution must have a pattern and a replacement"));
		}
		if parts.len() > 3 {
			return Err(invalid("unescaped delimiter after the flags"));
		}

		let pattern_str = &parts[0];
		if pattern_str.is_empty() {
			return Err(invalid("pattern is empty"));
		}
		let replacement = parts[1].clone();
		let flags = parts.get(2).map_or("", String::as_str);

		let mut global = false;
		let mut case_insensitive = false;
		for flag in flags.chars() {
			match flag {
				'g' => global = true,
				'i' => case_insensitive = true,
				other => return Err(invalid(&format!("unknown flag '{other}'"))),
			}
		}

		let pattern = RegexBuilder::new(pattern_str)
			.case_insensitive(case_insensitive)
			.build()
			.map_err(|source| Ora2TsqlError::InvalidRegex {
				pattern: pattern_str.to_string(),
				source,
			})?;

		Ok(Substitution {
			pattern,
			replacement,
			global,
		})
	}

	/// Apply this substitution to a string.
	pub fn apply(&self, input: &str) -> String {
		if self.global {
			self.pattern
				.replace_all(input, self.replacement.as_str())
				.into_owned()
		} else {
			self.pattern
				.replace(input, self.replacement.as_str())
				.into_owned()
		}
	}
}

/// Split a string by a delimiter, respecting backslash escapes.
fn split_by_delimiter(input: &str, delimiter: char) -> Vec<String> {
	let mut parts = Vec::new();
	let mut current = String::new();
	let mut chars = input.chars().peekable();

	while let Some(c) = chars.next() {
		if c == '\\' && chars.peek() == Some(&delimiter) {
			// An escaped delimiter is literal text.
			current.push(delimiter);
			chars.next();
		} else if c == delimiter {
			parts.push(std::mem::take(&mut current));
		} else {
			current.push(c);
		}
	}

	// A trailing delimiter leaves an empty flag list, which is fine.
	parts.push(current);
	parts
}
