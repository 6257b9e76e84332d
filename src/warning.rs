use serde::Deserialize;
use std::fmt;

/// What kind of construct a warning is about.
///
/// Config files refer to categories by their display name, e.g.
/// `suppress-warnings = ["CORRELATED_SUBQUERY"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCategory {
	InvalidInput,
	Hierarchical,
	RowLimit,
	DateArithmetic,
	DateFormat,
	CorrelatedSubquery,
	TupleMembership,
	OuterJoin,
	ListaggDistinct,
	RegexpLike,
	Concatenation,
	Aggregation,
	Pseudocolumn,
	Sequence,
	Identifier,
	TableHint,
	TsqlOnly,
	Unsupported,
	Custom,
}

impl WarningCategory {
	pub fn as_str(&self) -> &'static str {
		match self {
			WarningCategory::InvalidInput => "INVALID_INPUT",
			WarningCategory::Hierarchical => "HIERARCHICAL",
			WarningCategory::RowLimit => "ROW_LIMIT",
			WarningCategory::DateArithmetic => "DATE_ARITHMETIC",
			WarningCategory::DateFormat => "DATE_FORMAT",
			WarningCategory::CorrelatedSubquery => "CORRELATED_SUBQUERY",
			WarningCategory::TupleMembership => "TUPLE_MEMBERSHIP",
			WarningCategory::OuterJoin => "OUTER_JOIN",
			WarningCategory::ListaggDistinct => "LISTAGG_DISTINCT",
			WarningCategory::RegexpLike => "REGEXP_LIKE",
			WarningCategory::Concatenation => "CONCATENATION",
			WarningCategory::Aggregation => "AGGREGATION",
			WarningCategory::Pseudocolumn => "PSEUDOCOLUMN",
			WarningCategory::Sequence => "SEQUENCE",
			WarningCategory::Identifier => "IDENTIFIER",
			WarningCategory::TableHint => "TABLE_HINT",
			WarningCategory::TsqlOnly => "TSQL_ONLY",
			WarningCategory::Unsupported => "UNSUPPORTED",
			WarningCategory::Custom => "CUSTOM",
		}
	}
}

impl fmt::Display for WarningCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A non-fatal advisory produced during a single conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
	pub category: WarningCategory,
	pub message: String,
}

impl Warning {
	pub fn new(category: WarningCategory, message: impl Into<String>) -> Self {
		Warning {
			category,
			message: message.into(),
		}
	}
}

impl fmt::Display for Warning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "WARNING [{}]: {}", self.category, self.message)
	}
}
