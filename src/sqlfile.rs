use crate::error::{Ora2TsqlError, Result};
use std::path::Path;

/// Read a query from a `.sql` file.
pub fn read_sql_file(path: &Path) -> Result<String> {
	std::fs::read_to_string(path).map_err(|source| Ora2TsqlError::FileReadError {
		path: path.to_path_buf(),
		source,
	})
}

/// Write a query to a file, creating missing parent directories.
pub fn write_sql_file(path: &Path, sql: &str) -> Result<()> {
	let write_error = |source| Ora2TsqlError::FileWriteError {
		path: path.to_path_buf(),
		source,
	};

	if let Some(parent) = path.parent()
		&& !parent.as_os_str().is_empty()
	{
		std::fs::create_dir_all(parent).map_err(write_error)?;
	}
	std::fs::write(path, sql).map_err(write_error)
}

/// True for paths ending in `.sql`, in any case.
pub fn is_sql_file(path: &Path) -> bool {
	path.extension()
		.is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_write_then_read_creates_directories() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("out").join("converted.sql");

		write_sql_file(&path, "SELECT GETDATE()").unwrap();
		assert_eq!(read_sql_file(&path).unwrap(), "SELECT GETDATE()");
	}

	#[test]
	fn test_read_missing_file() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("missing.sql");

		match read_sql_file(&path).unwrap_err() {
			Ora2TsqlError::FileReadError { path: failed, .. } => assert_eq!(failed, path),
			other => panic!("Expected FileReadError, got {other:?}"),
		}
	}

	#[test]
	fn test_is_sql_file() {
		assert!(is_sql_file(Path::new("query.sql")));
		assert!(is_sql_file(Path::new("dir/QUERY.SQL")));
		assert!(!is_sql_file(Path::new("query.txt")));
		assert!(!is_sql_file(Path::new("sql")));
	}
}
