//! Conversion from SQLite's loose declarations to relational type names.
//!
//! SQLite keeps whatever type text a column was declared with. The analyzer
//! expects the relational names it knows how to map, so declarations are
//! lowercased, stripped of size suffixes and renamed where SQLite spells a
//! type differently.

/// Type name used for result columns that have no declared type
/// (expressions, literals, aggregates).
pub(crate) const UNTYPED_COLUMN: &str = "sql_variant";

/// Normalizes a declared column type.
///
/// # Examples
///
/// ```
/// use entity_schema_sqlite::normalize_decl_type;
///
/// assert_eq!(normalize_decl_type("INTEGER"), "bigint");
/// assert_eq!(normalize_decl_type("NVARCHAR(50)"), "nvarchar");
/// assert_eq!(normalize_decl_type("Decimal (10, 2)"), "decimal");
/// assert_eq!(normalize_decl_type("double precision"), "float");
/// assert_eq!(normalize_decl_type("datetime"), "datetime");
/// ```
pub fn normalize_decl_type(decl_type: &str) -> String {
    let lower = decl_type.trim().to_lowercase();
    let base = match lower.find('(') {
        Some(open) => lower[..open].trim_end(),
        None => lower.as_str(),
    };

    match base {
        "integer" => "bigint",
        "boolean" | "bool" => "bit",
        "blob" => "varbinary",
        "double" | "double precision" => "float",
        "clob" => "text",
        other => other,
    }
    .to_string()
}

/// Extracts the database path from a connection string.
///
/// Either a bare path or `key=value` pairs separated by `;` with a
/// `Data Source` key.
///
/// # Examples
///
/// ```
/// use entity_schema_sqlite::database_path;
///
/// assert_eq!(database_path("app.db"), Some("app.db"));
/// assert_eq!(database_path("Data Source=/tmp/app.db;Mode=ReadOnly"), Some("/tmp/app.db"));
/// assert_eq!(database_path("Mode=ReadOnly"), None);
/// assert_eq!(database_path(""), None);
/// ```
pub fn database_path(connection_string: &str) -> Option<&str> {
    let trimmed = connection_string.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed.contains('=') {
        return Some(trimmed);
    }

    trimmed
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| {
            let key = key.trim();
            key.eq_ignore_ascii_case("data source") || key.eq_ignore_ascii_case("datasource")
        })
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
