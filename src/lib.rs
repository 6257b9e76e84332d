//! ora2tsql - rewrite Oracle SELECT queries as T-SQL (Azure SQL / SQL Server) and back.
//!
//! This library provides the core functionality for ora2tsql, including:
//! - The ordered rewrite rules for each direction
//! - Warnings for constructs that need a human
//! - Configuration file parsing and cascade discovery
//! - Custom substitution and detection rules
//! - A QA checklist for converted queries
//!
//! # Example
//!
//! ```
//! use ora2tsql::{Direction, convert};
//!
//! let (query, warnings) = convert("SELECT SYSDATE FROM DUAL", Direction::OracleToTsql).into_parts();
//! assert_eq!(query, "SELECT GETDATE()");
//! assert!(warnings.is_empty());
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod qa;
pub mod rules;
pub mod sqlfile;
pub mod warning;

pub use convert::{Conversion, Converter, DEFAULT_SOURCE_TABLE_PLACEHOLDER, Direction, convert};
pub use error::{Ora2TsqlError, Result};
pub use warning::{Warning, WarningCategory};
