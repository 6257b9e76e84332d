//! Lexical helpers shared by the rewrite rules.
//!
//! Nothing here parses SQL. The scanner only separates code from string
//! literals, quoted identifiers and comments, so that rules can match
//! against a same-length "masked" copy of the query and splice their
//! replacements back into the original text by byte offset.

use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

/// Upper bound on passes for rules that repeat until the text stops changing.
const MAX_PASSES: usize = 64;

static SELECT_HEAD: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\bSELECT\b(?:\s+(?:DISTINCT|ALL)\b)?").expect("valid SELECT pattern")
});

static WITHIN_GROUP_HEAD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^\s*WITHIN\s+GROUP\s*\(").expect("valid WITHIN GROUP pattern"));

static ORDER_BY_HEAD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^ORDER\s+BY\s+").expect("valid ORDER BY pattern"));

static IDENTIFIER_PATH: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[A-Za-z_][\w$#]*(?:\.[A-Za-z_][\w$#]*)*$").expect("valid identifier pattern")
});

/// What a run of query text is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
	Code,
	/// `'...'` with `''` escapes.
	Literal,
	/// `"..."`.
	Identifier,
	/// `-- ...` up to the newline, or `/* ... */`.
	Comment,
}

/// A byte range of the query and its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
	pub kind: SegmentKind,
	pub start: usize,
	pub end: usize,
}

/// Split a query into code, literal, identifier and comment segments.
///
/// Unterminated literals and comments run to the end of the text. All
/// boundaries fall on ASCII delimiters, so they are valid `str` indices.
pub fn segments(sql: &str) -> Vec<Segment> {
	let bytes = sql.as_bytes();
	let mut out = Vec::new();
	let mut code_start = 0;
	let mut i = 0;

	while i < bytes.len() {
		let (kind, end) = match bytes[i] {
			b'\'' => (SegmentKind::Literal, quoted_end(bytes, i, b'\'')),
			b'"' => (SegmentKind::Identifier, quoted_end(bytes, i, b'"')),
			b'-' if bytes.get(i + 1) == Some(&b'-') => (SegmentKind::Comment, line_end(bytes, i)),
			b'/' if bytes.get(i + 1) == Some(&b'*') => (SegmentKind::Comment, block_end(bytes, i)),
			_ => {
				i += 1;
				continue;
			}
		};

		if code_start < i {
			out.push(Segment {
				kind: SegmentKind::Code,
				start: code_start,
				end: i,
			});
		}
		out.push(Segment {
			kind,
			start: i,
			end,
		});
		i = end;
		code_start = end;
	}

	if code_start < bytes.len() {
		out.push(Segment {
			kind: SegmentKind::Code,
			start: code_start,
			end: bytes.len(),
		});
	}

	out
}

fn quoted_end(bytes: &[u8], start: usize, quote: u8) -> usize {
	let mut i = start + 1;
	while i < bytes.len() {
		if bytes[i] == quote {
			if bytes.get(i + 1) == Some(&quote) {
				i += 2;
				continue;
			}
			return i + 1;
		}
		i += 1;
	}
	bytes.len()
}

fn line_end(bytes: &[u8], start: usize) -> usize {
	bytes[start..]
		.iter()
		.position(|&b| b == b'\n')
		.map_or(bytes.len(), |offset| start + offset)
}

fn block_end(bytes: &[u8], start: usize) -> usize {
	let mut i = start + 2;
	while i + 1 < bytes.len() {
		if bytes[i] == b'*' && bytes[i + 1] == b'/' {
			return i + 2;
		}
		i += 1;
	}
	bytes.len()
}

/// Same-length copy of `sql` where comments and the contents of literals
/// and quoted identifiers are blanked with spaces.
///
/// Quote characters are kept so rules can still tell where a literal sits.
pub fn mask(sql: &str) -> String {
	let mut out = String::with_capacity(sql.len());

	for seg in segments(sql) {
		let text = &sql[seg.start..seg.end];
		match seg.kind {
			SegmentKind::Code => out.push_str(text),
			SegmentKind::Comment => out.push_str(&" ".repeat(text.len())),
			SegmentKind::Literal | SegmentKind::Identifier => {
				let quote = text.as_bytes()[0];
				let closed = text.len() >= 2 && text.as_bytes()[text.len() - 1] == quote;
				out.push(quote as char);
				out.push_str(&" ".repeat(text.len() - 1 - usize::from(closed)));
				if closed {
					out.push(quote as char);
				}
			}
		}
	}

	out
}

/// Rebuild `sql`, passing the segments selected by `select` through `f`.
fn map_segments(
	sql: &str,
	select: impl Fn(SegmentKind) -> bool,
	mut f: impl FnMut(&str) -> String,
) -> String {
	let mut out = String::with_capacity(sql.len());
	for seg in segments(sql) {
		let text = &sql[seg.start..seg.end];
		if select(seg.kind) {
			out.push_str(&f(text));
		} else {
			out.push_str(text);
		}
	}
	out
}

/// Apply `f` to code segments only.
pub fn map_code(sql: &str, f: impl FnMut(&str) -> String) -> String {
	map_segments(sql, |kind| kind == SegmentKind::Code, f)
}

/// Apply `f` to everything except comments.
pub fn map_outside_comments(sql: &str, f: impl FnMut(&str) -> String) -> String {
	map_segments(sql, |kind| kind != SegmentKind::Comment, f)
}

/// Same-length copy of `sql` with only the comments blanked.
pub fn mask_comments(sql: &str) -> String {
	map_segments(sql, |kind| kind == SegmentKind::Comment, |text| " ".repeat(text.len()))
}

/// Regex replace restricted to code segments.
pub fn replace_code(sql: &str, pattern: &Regex, replacement: &str) -> String {
	map_code(sql, |code| pattern.replace_all(code, replacement).into_owned())
}

/// Replace matches of `pattern` found in the masked query.
///
/// `f` receives the original text and the captures taken from the masked
/// copy (offsets are shared). Returning `None` keeps the match as-is.
/// Matches are spliced rightmost first so earlier offsets stay valid.
pub fn replace_spans(
	sql: &str,
	pattern: &Regex,
	mut f: impl FnMut(&str, &Captures<'_>) -> Option<String>,
) -> String {
	let masked = mask(sql);
	let found: Vec<Captures<'_>> = pattern.captures_iter(&masked).collect();
	let mut out = sql.to_string();

	for caps in found.iter().rev() {
		let Some(whole) = caps.get(0) else {
			continue;
		};
		if let Some(replacement) = f(sql, caps) {
			out.replace_range(whole.range(), &replacement);
		}
	}

	out
}

/// A located `NAME(...)` call.
#[derive(Debug)]
pub struct Call<'a> {
	/// Offset of the function name.
	pub start: usize,
	/// Offset just past the closing parenthesis.
	pub end: usize,
	/// Raw text between the parentheses.
	pub inner: &'a str,
	/// Top-level arguments, trimmed.
	pub args: Vec<String>,
	/// Everything after the closing parenthesis.
	pub tail: &'a str,
}

fn call_pattern(name: &str) -> Regex {
	Regex::new(&format!(r"(?i)\b{}\s*\(", regex::escape(name)))
		.expect("escaped function name is a valid pattern")
}

/// Rewrite every `name(...)` call, innermost first.
///
/// `f` returns the replacement and how many bytes of `call.tail` it
/// absorbed, or `None` to leave the call alone. Calls are visited from the
/// rightmost start offset leftwards, so a call nested inside another call's
/// arguments is always rewritten before its parent sees it.
pub fn rewrite_calls_with_tail(
	sql: &str,
	name: &str,
	mut f: impl FnMut(&Call<'_>) -> Option<(String, usize)>,
) -> String {
	let pattern = call_pattern(name);
	let mut out = sql.to_string();
	let mut limit = out.len() + 1;

	loop {
		let masked = mask(&out);
		let Some(found) = pattern
			.find_iter(&masked)
			.filter(|m| m.start() < limit)
			.last()
		else {
			break;
		};
		limit = found.start();

		let open = found.end() - 1;
		let Some(close) = matching_paren(&masked, open) else {
			continue;
		};

		let call = Call {
			start: found.start(),
			end: close + 1,
			inner: &out[open + 1..close],
			args: split_args(&out, &masked, open, close),
			tail: &out[close + 1..],
		};

		if let Some((replacement, consumed)) = f(&call) {
			let span = call.start..call.end + consumed;
			out.replace_range(span, &replacement);
		}
	}

	out
}

/// Rewrite every `name(...)` call, innermost first.
pub fn rewrite_calls(
	sql: &str,
	name: &str,
	mut f: impl FnMut(&Call<'_>) -> Option<String>,
) -> String {
	rewrite_calls_with_tail(sql, name, |call| f(call).map(|replacement| (replacement, 0)))
}

/// Rename `from(...)` to `to(...)`, keeping the argument text verbatim.
pub fn rename_calls(sql: &str, from: &str, to: &str) -> String {
	rewrite_calls(sql, from, |call| Some(format!("{to}({})", call.inner)))
}

/// Offset of the `)` closing the `(` at `open`.
pub fn matching_paren(masked: &str, open: usize) -> Option<usize> {
	let mut depth = 0usize;
	for (i, b) in masked.bytes().enumerate().skip(open) {
		match b {
			b'(' => depth += 1,
			b')' => {
				depth = depth.saturating_sub(1);
				if depth == 0 {
					return Some(i);
				}
			}
			_ => {}
		}
	}
	None
}

/// Split the text between `open` and `close` on top-level commas.
pub fn split_args(sql: &str, masked: &str, open: usize, close: usize) -> Vec<String> {
	let mut args = Vec::new();
	let mut depth = 0usize;
	let mut piece_start = open + 1;

	for (offset, b) in masked[open + 1..close].bytes().enumerate() {
		let i = open + 1 + offset;
		match b {
			b'(' => depth += 1,
			b')' => depth = depth.saturating_sub(1),
			b',' if depth == 0 => {
				args.push(sql[piece_start..i].trim().to_string());
				piece_start = i + 1;
			}
			_ => {}
		}
	}

	let last = sql[piece_start..close].trim();
	if !last.is_empty() || !args.is_empty() {
		args.push(last.to_string());
	}
	args
}

/// Start of the query block containing `pos`: just past the nearest
/// unmatched `(`, or 0 at top level.
pub fn scope_start(masked: &str, pos: usize) -> usize {
	let bytes = masked.as_bytes();
	let mut depth = 0usize;
	for i in (0..pos).rev() {
		match bytes[i] {
			b')' => depth += 1,
			b'(' => {
				if depth == 0 {
					return i + 1;
				}
				depth -= 1;
			}
			_ => {}
		}
	}
	0
}

/// End of the query block containing `pos`: the nearest unmatched `)`, or
/// the end of the text.
pub fn scope_end(masked: &str, pos: usize) -> usize {
	let bytes = masked.as_bytes();
	let mut depth = 0usize;
	for (i, &b) in bytes.iter().enumerate().skip(pos) {
		match b {
			b'(' => depth += 1,
			b')' => {
				if depth == 0 {
					return i;
				}
				depth -= 1;
			}
			_ => {}
		}
	}
	masked.len()
}

fn depth_between(masked: &str, from: usize, to: usize) -> isize {
	masked[from..to].bytes().fold(0, |depth, b| match b {
		b'(' => depth + 1,
		b')' => depth - 1,
		_ => depth,
	})
}

/// Matches of `pattern` within `start..end` that are not nested in
/// parentheses opened inside that range.
pub fn depth_zero_matches(
	masked: &str,
	start: usize,
	end: usize,
	pattern: &Regex,
) -> Vec<Range<usize>> {
	pattern
		.find_iter(&masked[start..end])
		.filter(|m| depth_between(masked, start, start + m.start()) == 0)
		.map(|m| start + m.start()..start + m.end())
		.collect()
}

/// Offset just past the `SELECT [DISTINCT|ALL]` heading the query block
/// that contains `pos`.
pub fn enclosing_select(masked: &str, pos: usize) -> Option<usize> {
	let start = scope_start(masked, pos);
	depth_zero_matches(masked, start, pos, &SELECT_HEAD)
		.last()
		.map(|range| range.end)
}

/// Repeat `step` until it returns `None` or stops changing the text.
pub fn fixpoint(sql: String, mut step: impl FnMut(&str) -> Option<String>) -> String {
	let mut current = sql;
	for _ in 0..MAX_PASSES {
		match step(&current) {
			Some(next) if next != current => current = next,
			_ => break,
		}
	}
	current
}

/// Parse a trailing `WITHIN GROUP (ORDER BY ...)` clause.
///
/// Returns the ORDER BY list and the number of bytes of `tail` the clause
/// spans.
pub fn within_group(tail: &str) -> Option<(String, usize)> {
	let masked = mask(tail);
	let head = WITHIN_GROUP_HEAD.find(&masked)?;
	let open = head.end() - 1;
	let close = matching_paren(&masked, open)?;
	let inner = tail[open + 1..close].trim();
	let order = ORDER_BY_HEAD.replace(inner, "").trim().to_string();
	Some((order, close + 1))
}

/// The contents of a single-quoted literal, or `None` for anything else.
pub fn unquote(text: &str) -> Option<&str> {
	text.strip_prefix('\'')?.strip_suffix('\'')
}

/// True for `name`, `alias.name` and `schema.table.name`.
pub fn is_identifier_path(text: &str) -> bool {
	IDENTIFIER_PATH.is_match(text)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_segments_classify_literals_and_comments() {
		let sql = "SELECT 'a''b', \"Col\" -- note\nFROM t /* x */";
		let kinds: Vec<_> = segments(sql).iter().map(|s| s.kind).collect();
		assert_eq!(
			kinds,
			vec![
				SegmentKind::Code,
				SegmentKind::Literal,
				SegmentKind::Code,
				SegmentKind::Identifier,
				SegmentKind::Code,
				SegmentKind::Comment,
				SegmentKind::Code,
				SegmentKind::Comment,
			]
		);
	}

	#[test]
	fn test_mask_keeps_length_and_quotes() {
		let sql = "SELECT 'NVL(x)' -- NVL(y)\nFROM t";
		let masked = mask(sql);
		assert_eq!(masked.len(), sql.len());
		assert_eq!(masked, "SELECT '      '          \nFROM t");
	}

	#[test]
	fn test_mask_unterminated_literal() {
		let masked = mask("SELECT 'abc");
		assert_eq!(masked, "SELECT '   ");
	}

	#[test]
	fn test_mask_comments_keeps_literals() {
		let sql = "SELECT '&gt;' /* &gt; */ FROM t -- x\n";
		let masked = mask_comments(sql);
		assert_eq!(masked.len(), sql.len());
		assert_eq!(masked, format!("SELECT '&gt;' {} FROM t {}\n", " ".repeat(10), " ".repeat(4)));
	}

	#[test]
	fn test_map_code_skips_literals() {
		let out = map_code("a || 'x || y' || b", |code| code.replace("||", "+"));
		assert_eq!(out, "a + 'x || y' + b");
	}

	#[test]
	fn test_split_args_respects_nesting_and_quotes() {
		let sql = "F(a, G(b, c), 'd,e')";
		let masked = mask(sql);
		let close = matching_paren(&masked, 1).unwrap();
		assert_eq!(close, sql.len() - 1);
		assert_eq!(split_args(sql, &masked, 1, close), vec!["a", "G(b, c)", "'d,e'"]);
	}

	#[test]
	fn test_split_args_empty_call() {
		let sql = "F()";
		let masked = mask(sql);
		assert!(split_args(sql, &masked, 1, 2).is_empty());
	}

	#[test]
	fn test_rewrite_calls_innermost_first() {
		let out = rewrite_calls("F(F(a, b), c)", "F", |call| {
			Some(format!("G[{}]", call.args.join("|")))
		});
		assert_eq!(out, "G[G[a|b]|c]");
	}

	#[test]
	fn test_rewrite_calls_skips_literals_and_longer_names() {
		let out = rename_calls("SELECT NVL(a, 'NVL(b)'), MY_NVL(c) FROM t", "NVL", "ISNULL");
		assert_eq!(out, "SELECT ISNULL(a, 'NVL(b)'), MY_NVL(c) FROM t");
	}

	#[test]
	fn test_rewrite_calls_with_tail_consumes_clause() {
		let out = rewrite_calls_with_tail("X(a) WITHIN GROUP (ORDER BY a) AS c", "X", |call| {
			let (order, consumed) = within_group(call.tail)?;
			Some((format!("Y({order})"), consumed))
		});
		assert_eq!(out, "Y(a) AS c");
	}

	#[test]
	fn test_enclosing_select_uses_nearest_block() {
		let sql = "SELECT a FROM (SELECT DISTINCT b FROM t WHERE x) s";
		let masked = mask(sql);
		let pos = sql.find("WHERE").unwrap();
		let at = enclosing_select(&masked, pos).unwrap();
		assert_eq!(&sql[..at], "SELECT a FROM (SELECT DISTINCT");

		let outer = sql.find(" s").unwrap() + 1;
		assert_eq!(enclosing_select(&masked, outer), Some("SELECT".len()));
	}

	#[test]
	fn test_scope_bounds() {
		let sql = "SELECT (SELECT 1 FROM t) FROM u";
		let masked = mask(sql);
		let inner = sql.find("1").unwrap();
		assert_eq!(scope_start(&masked, inner), 8);
		assert_eq!(scope_end(&masked, inner), sql.find(')').unwrap());
		assert_eq!(scope_end(&masked, 0), sql.len());
	}

	#[test]
	fn test_fixpoint_stops_when_stable() {
		let out = fixpoint("aaaa".to_string(), |s| Some(s.replacen("aa", "a", 1)));
		assert_eq!(out, "a");
	}

	#[test]
	fn test_unquote() {
		assert_eq!(unquote("'MM'"), Some("MM"));
		assert_eq!(unquote("MM"), None);
	}

	#[test]
	fn test_identifier_path() {
		assert!(is_identifier_path("d.dx_code"));
		assert!(!is_identifier_path("UPPER(x)"));
	}
}
