use super::RuleContext;
use super::scan::map_outside_comments;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity pattern")
});

/// Decode HTML entities left behind by copying queries out of web pages
/// and ticket systems. Comments are left untouched.
///
/// Decoding is a single pass, so `&amp;lt;` becomes `&lt;` and no further.
pub fn decode_html_entities(sql: &str, _ctx: &mut RuleContext<'_>) -> String {
	map_outside_comments(sql, |text| {
		ENTITY
			.replace_all(text, |caps: &Captures<'_>| match decode_entity(&caps[1]) {
				Some(c) => c.to_string(),
				None => caps[0].to_string(),
			})
			.into_owned()
	})
}

fn decode_entity(name: &str) -> Option<char> {
	if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
		return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
	}
	if let Some(decimal) = name.strip_prefix('#') {
		return decimal.parse::<u32>().ok().and_then(char::from_u32);
	}

	match name.to_ascii_lowercase().as_str() {
		"gt" => Some('>'),
		"lt" => Some('<'),
		"amp" => Some('&'),
		"quot" => Some('"'),
		"apos" => Some('\''),
		// A non-breaking space is not whitespace to SQL Server.
		"nbsp" => Some(' '),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn decode(sql: &str) -> String {
		let mut ctx = RuleContext::new("<source_table>");
		decode_html_entities(sql, &mut ctx)
	}

	#[test]
	fn test_decodes_comparison_operators() {
		assert_eq!(
			decode("SELECT * FROM t WHERE a &gt;= 1 AND b &lt;&gt; 2"),
			"SELECT * FROM t WHERE a >= 1 AND b <> 2"
		);
	}

	#[test]
	fn test_decodes_quotes_and_numeric_entities() {
		assert_eq!(
			decode("SELECT &apos;A&#39;s&#x27; FROM t WHERE c = &quot;X&quot;"),
			"SELECT 'A's' FROM t WHERE c = \"X\""
		);
	}

	#[test]
	fn test_single_pass() {
		assert_eq!(decode("SELECT 'a &amp;lt; b'"), "SELECT 'a &lt; b'");
	}

	#[test]
	fn test_comments_preserved() {
		assert_eq!(
			decode("SELECT 1 -- keep &gt;\nFROM t /* &amp; */ WHERE x &gt; 0"),
			"SELECT 1 -- keep &gt;\nFROM t /* &amp; */ WHERE x > 0"
		);
	}

	#[test]
	fn test_unknown_entity_left_alone() {
		assert_eq!(decode("SELECT '&bogus;'"), "SELECT '&bogus;'");
	}

	#[test]
	fn test_nbsp_becomes_space() {
		assert_eq!(decode("SELECT&nbsp;1"), "SELECT 1");
	}
}
