//! Format masks, CONVERT styles and data type names that differ between
//! the two dialects.

use regex::Regex;
use std::sync::LazyLock;

/// Oracle datetime format tokens and their .NET `FORMAT()` equivalents.
/// Longer tokens come first so `MONTH` wins over `MON` and `MM`.
const DATE_TOKENS: &[(&str, &str)] = &[
	("YYYY", "yyyy"),
	("MONTH", "MMMM"),
	("HH24", "HH"),
	("HH12", "hh"),
	("YYY", "yyy"),
	("MON", "MMM"),
	("DAY", "dddd"),
	("FF3", "fff"),
	("YY", "yy"),
	("MM", "MM"),
	("DY", "ddd"),
	("DD", "dd"),
	("HH", "hh"),
	("MI", "mm"),
	("SS", "ss"),
	("FF", "fffffff"),
	("AM", "tt"),
	("PM", "tt"),
	("FM", ""),
];

/// .NET tokens back to Oracle. Case matters on this side: `MM` is month
/// and `mm` is minutes.
const NET_TOKENS: &[(&str, &str)] = &[
	("yyyy", "YYYY"),
	("MMMM", "MONTH"),
	("dddd", "DAY"),
	("fffffff", "FF"),
	("yyy", "YYY"),
	("MMM", "MON"),
	("ddd", "DY"),
	("fff", "FF3"),
	("yy", "YY"),
	("MM", "MM"),
	("dd", "DD"),
	("HH", "HH24"),
	("hh", "HH12"),
	("mm", "MI"),
	("ss", "SS"),
	("tt", "AM"),
];

/// Oracle masks that map onto a SQL Server `CONVERT` style number.
const CONVERT_STYLES: &[(&str, u16)] = &[
	("MM/DD/YYYY", 101),
	("YYYY.MM.DD", 102),
	("DD/MM/YYYY", 103),
	("DD.MM.YYYY", 104),
	("DD-MM-YYYY", 105),
	("DD MON YYYY", 106),
	("MON DD, YYYY", 107),
	("HH24:MI:SS", 108),
	("MM-DD-YYYY", 110),
	("YYYY/MM/DD", 111),
	("YYYYMMDD", 112),
	("YYYY-MM-DD HH24:MI:SS", 120),
	("YYYY-MM-DD", 23),
];

static TSQL_NUMERIC_TYPE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^(?:DECIMAL|NUMERIC)\s*(\(.*\))?$").expect("valid numeric type pattern")
});

static ORACLE_NUMBER_TYPE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^NUMBER\s*(\(.*\))?$").expect("valid NUMBER pattern"));

static ORACLE_CHAR_TYPE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^(N?)VARCHAR2\s*\(\s*(\d+)(?:\s+(?:BYTE|CHAR))?\s*\)$")
		.expect("valid VARCHAR2 pattern")
});

static TSQL_CHAR_TYPE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^(N?)VARCHAR\s*\(\s*(\d+|MAX)\s*\)$").expect("valid VARCHAR pattern")
});

fn translate_tokens(mask: &str, tokens: &[(&str, &str)], fold_case: bool) -> String {
	let mut out = String::with_capacity(mask.len());
	let mut rest = mask;

	'outer: while !rest.is_empty() {
		for (from, to) in tokens {
			let head = rest.get(..from.len());
			let hit = match head {
				Some(head) if fold_case => head.eq_ignore_ascii_case(from),
				Some(head) => head == *from,
				None => false,
			};
			if hit {
				out.push_str(to);
				rest = &rest[from.len()..];
				continue 'outer;
			}
		}
		let Some(c) = rest.chars().next() else {
			break;
		};
		out.push(c);
		rest = &rest[c.len_utf8()..];
	}

	out
}

/// Translate an Oracle datetime mask such as `DD-MON-YYYY HH24:MI` into a
/// .NET format string.
pub fn oracle_date_mask_to_net(mask: &str) -> String {
	translate_tokens(mask, DATE_TOKENS, true)
}

/// Translate a .NET format string into an Oracle datetime mask.
pub fn net_mask_to_oracle(mask: &str) -> String {
	translate_tokens(mask, NET_TOKENS, false)
}

/// True for masks made only of numeric placeholders, e.g. `FM999,990.00`.
pub fn is_numeric_mask(mask: &str) -> bool {
	let body = strip_fill_mode(mask);
	!body.is_empty()
		&& body.contains(['9', '0'])
		&& body.chars().all(|c| matches!(c, '9' | '0' | ',' | '.' | '$'))
}

/// Translate an Oracle numeric mask into a .NET custom numeric format.
pub fn oracle_number_mask_to_net(mask: &str) -> String {
	strip_fill_mode(mask).replace('9', "#")
}

/// True for .NET custom numeric formats such as `#,##0.00`.
pub fn is_net_numeric_mask(mask: &str) -> bool {
	mask.contains(['#', '0']) && mask.chars().all(|c| matches!(c, '#' | '0' | ',' | '.'))
}

/// Translate a .NET custom numeric format into an Oracle number mask.
pub fn net_number_mask_to_oracle(mask: &str) -> String {
	format!("FM{}", mask.replace('#', "9"))
}

fn strip_fill_mode(mask: &str) -> &str {
	mask.strip_prefix("FM")
		.or_else(|| mask.strip_prefix("fm"))
		.unwrap_or(mask)
}

/// `CONVERT` style for an Oracle `TO_DATE` mask.
pub fn convert_style(mask: &str) -> Option<u16> {
	let mask = mask.trim();
	CONVERT_STYLES
		.iter()
		.find(|(oracle, _)| oracle.eq_ignore_ascii_case(mask))
		.map(|(_, style)| *style)
}

/// Oracle mask for a SQL Server `CONVERT` style.
pub fn style_mask(style: u16) -> Option<&'static str> {
	CONVERT_STYLES
		.iter()
		.find(|(_, s)| *s == style)
		.map(|(oracle, _)| *oracle)
}

/// T-SQL spelling of an Oracle data type used in `CAST`.
///
/// `DATE` is deliberately absent: it means different things in the two
/// dialects and the TRUNC rule already produces `CAST(x AS DATE)`.
pub fn oracle_type_to_tsql(ty: &str) -> Option<String> {
	let ty = ty.trim();
	if let Some(caps) = ORACLE_CHAR_TYPE.captures(ty) {
		return Some(format!("{}VARCHAR({})", &caps[1], &caps[2]));
	}
	if let Some(caps) = ORACLE_NUMBER_TYPE.captures(ty) {
		return Some(match caps.get(1) {
			Some(precision) => format!("DECIMAL{}", precision.as_str()),
			None => "FLOAT".to_string(),
		});
	}

	let mapped = match ty.to_ascii_uppercase().as_str() {
		"CLOB" => "VARCHAR(MAX)",
		"NCLOB" => "NVARCHAR(MAX)",
		"BLOB" => "VARBINARY(MAX)",
		"TIMESTAMP" => "DATETIME2",
		"BINARY_DOUBLE" => "FLOAT",
		"BINARY_FLOAT" => "REAL",
		_ => return None,
	};
	Some(mapped.to_string())
}

/// Oracle spelling of a T-SQL data type used in `CAST`.
pub fn tsql_type_to_oracle(ty: &str) -> Option<String> {
	let ty = ty.trim();
	if let Some(caps) = TSQL_CHAR_TYPE.captures(ty) {
		let national = &caps[1];
		return Some(if caps[2].eq_ignore_ascii_case("MAX") {
			format!("{national}CLOB")
		} else {
			format!("{national}VARCHAR2({})", &caps[2])
		});
	}
	if let Some(caps) = TSQL_NUMERIC_TYPE.captures(ty) {
		return Some(format!(
			"NUMBER{}",
			caps.get(1).map_or("", |precision| precision.as_str())
		));
	}

	let upper = ty.to_ascii_uppercase();
	let mapped = match upper.as_str() {
		"VARBINARY(MAX)" => "BLOB",
		"BIT" => "NUMBER(1)",
		"TINYINT" => "NUMBER(3)",
		"SMALLINT" => "NUMBER(5)",
		"INT" | "INTEGER" => "NUMBER(10)",
		"BIGINT" => "NUMBER(19)",
		"REAL" => "BINARY_FLOAT",
		"DATETIME" | "SMALLDATETIME" => "TIMESTAMP",
		_ if upper.starts_with("DATETIME2") => "TIMESTAMP",
		_ => return None,
	};
	Some(mapped.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_date_mask_to_net() {
		assert_eq!(oracle_date_mask_to_net("YYYY-MM-DD"), "yyyy-MM-dd");
		assert_eq!(
			oracle_date_mask_to_net("DD-MON-YYYY HH24:MI:SS"),
			"dd-MMM-yyyy HH:mm:ss"
		);
		assert_eq!(oracle_date_mask_to_net("fmMonth dd"), "MMMM dd");
	}

	#[test]
	fn test_net_mask_to_oracle() {
		assert_eq!(net_mask_to_oracle("yyyy-MM-dd HH:mm:ss"), "YYYY-MM-DD HH24:MI:SS");
		assert_eq!(net_mask_to_oracle("dd-MMM-yyyy"), "DD-MON-YYYY");
	}

	#[test]
	fn test_numeric_masks() {
		assert!(is_numeric_mask("FM999,990.00"));
		assert!(!is_numeric_mask("YYYY"));
		assert!(!is_numeric_mask("FM"));
		assert_eq!(oracle_number_mask_to_net("FM999,990.00"), "###,##0.00");
		assert!(is_net_numeric_mask("###,##0.00"));
		assert!(!is_net_numeric_mask("yyyy"));
		assert_eq!(net_number_mask_to_oracle("###,##0.00"), "FM999,990.00");
	}

	#[test]
	fn test_convert_styles() {
		assert_eq!(convert_style("yyyy-mm-dd"), Some(23));
		assert_eq!(convert_style("MM/DD/YYYY"), Some(101));
		assert_eq!(convert_style("DD-MON-RR"), None);
		assert_eq!(style_mask(120), Some("YYYY-MM-DD HH24:MI:SS"));
		assert_eq!(style_mask(999), None);
	}

	#[test]
	fn test_oracle_types() {
		assert_eq!(oracle_type_to_tsql("VARCHAR2(50 CHAR)").as_deref(), Some("VARCHAR(50)"));
		assert_eq!(oracle_type_to_tsql("NVARCHAR2(10)").as_deref(), Some("NVARCHAR(10)"));
		assert_eq!(oracle_type_to_tsql("NUMBER(10, 2)").as_deref(), Some("DECIMAL(10, 2)"));
		assert_eq!(oracle_type_to_tsql("NUMBER").as_deref(), Some("FLOAT"));
		assert_eq!(oracle_type_to_tsql("clob").as_deref(), Some("VARCHAR(MAX)"));
		assert_eq!(oracle_type_to_tsql("DATE"), None);
		assert_eq!(oracle_type_to_tsql("VARCHAR(10)"), None);
	}

	#[test]
	fn test_tsql_types() {
		assert_eq!(tsql_type_to_oracle("VARCHAR(50)").as_deref(), Some("VARCHAR2(50)"));
		assert_eq!(tsql_type_to_oracle("NVARCHAR(MAX)").as_deref(), Some("NCLOB"));
		assert_eq!(tsql_type_to_oracle("DECIMAL(10, 2)").as_deref(), Some("NUMBER(10, 2)"));
		assert_eq!(tsql_type_to_oracle("int").as_deref(), Some("NUMBER(10)"));
		assert_eq!(tsql_type_to_oracle("DATETIME2(3)").as_deref(), Some("TIMESTAMP"));
		assert_eq!(tsql_type_to_oracle("DATE"), None);
	}
}
