/// Starter `.ora2tsql.toml` written by `ora2tsql --init`.
pub fn init_template() -> &'static str {
	r#"# ora2tsql configuration
#
# Files named .ora2tsql.toml are read from the current directory upwards,
# then from ~/.ora2tsql.toml. Set ORA2TSQL_NO_USER_CONFIG=1 to skip the
# home directory file.

# Stop looking in parent directories.
root = true

# Table name written into generated subquery skeletons, such as the
# rewrite of LISTAGG(DISTINCT ...).
# source-table-placeholder = "<source_table>"

# Warning categories to drop from the output.
# suppress-warnings = ["CORRELATED_SUBQUERY"]

# Extra rules run after the built-in rules, in file order.
# `direction` is "oracle-to-tsql" or "tsql-to-oracle"; omit it for both.

# [[rules]]
# name = "schema-prefix"
# direction = "oracle-to-tsql"
# substitution = 's/\bHR\./dbo./gi'

# [[rules]]
# name = "audit-package"
# detect = '\bPKG_AUDIT\.'
# warning = "Calls to PKG_AUDIT have no counterpart on SQL Server. Remove or replace them."
"#
}
