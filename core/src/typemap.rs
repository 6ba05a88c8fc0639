//! Mapping between relational type names, canonical [`DbType`]s and host
//! type names.
//!
//! All three lookups are total: unknown relational names fall back to
//! `string` / [`DbType::AnsiString`], and unknown host names map to `None`.

use crate::types::DbType;

/// Suffix that marks a nullable host type (`int?`).
pub const NULLABLE_MARKER: char = '?';

/// Host type used for parameters whose type could not be inferred.
pub const OBJECT_HOST_TYPE: &str = "object";

/// Host type for a relational type name, as declared by the catalog.
///
/// Value types get the nullable marker when `is_nullable` is set. Binary and
/// string-like results never do, whatever the column says.
///
/// # Examples
///
/// ```
/// use entity_schema_core::relational_to_host_type;
///
/// assert_eq!(relational_to_host_type("int", false), "int");
/// assert_eq!(relational_to_host_type("datetime2", true), "DateTime?");
/// assert_eq!(relational_to_host_type("varbinary", true), "byte[]");
/// assert_eq!(relational_to_host_type("nvarchar", true), "string");
/// assert_eq!(relational_to_host_type("geography", false), "string");
/// ```
pub fn relational_to_host_type(sql_type: &str, is_nullable: bool) -> String {
    let (host, allow_nullable) = match sql_type {
        "bigint" => ("long", true),
        "smallint" => ("short", true),
        "int" => ("int", true),
        "uniqueidentifier" => ("Guid", true),
        "smalldatetime" | "datetime" | "datetime2" | "date" => ("DateTime", true),
        "time" => ("TimeSpan", true),
        "datetimeoffset" => ("DateTimeOffset", true),
        "float" | "real" => ("double", true),
        "numeric" | "smallmoney" | "decimal" | "money" => ("decimal", true),
        "tinyint" => ("byte", true),
        "bit" => ("bool", true),
        "image" | "binary" | "varbinary" | "timestamp" => ("byte[]", false),
        _ => ("string", false),
    };

    if is_nullable && allow_nullable {
        format!("{host}{NULLABLE_MARKER}")
    } else {
        host.to_string()
    }
}

/// Canonical type for a relational type name. Nullability plays no part.
///
/// # Examples
///
/// ```
/// use entity_schema_core::{DbType, relational_to_db_type};
///
/// assert_eq!(relational_to_db_type("nvarchar"), DbType::String);
/// assert_eq!(relational_to_db_type("money"), DbType::Currency);
/// assert_eq!(relational_to_db_type("hierarchyid"), DbType::AnsiString);
/// ```
pub fn relational_to_db_type(sql_type: &str) -> DbType {
    match sql_type {
        "varchar" | "text" => DbType::AnsiString,
        "nvarchar" | "nchar" | "ntext" | "sql_variant" | "sysname" => DbType::String,
        "int" => DbType::Int32,
        "uniqueidentifier" => DbType::Guid,
        "datetime" | "datetime2" | "smalldatetime" | "date" => DbType::DateTime,
        "time" => DbType::Time,
        "datetimeoffset" => DbType::DateTimeOffset,
        "bigint" => DbType::Int64,
        "binary" | "image" | "timestamp" | "varbinary" => DbType::Binary,
        "bit" => DbType::Boolean,
        "char" => DbType::AnsiStringFixedLength,
        "decimal" | "numeric" => DbType::Decimal,
        "float" => DbType::Double,
        "money" | "smallmoney" => DbType::Currency,
        "real" => DbType::Single,
        "smallint" => DbType::Int16,
        "tinyint" => DbType::Byte,
        "xml" => DbType::Xml,
        _ => DbType::AnsiString,
    }
}

/// Canonical type for a host type name, used to read inline type hints.
///
/// A trailing nullable marker is ignored. Returns `None` when the name is
/// not a known host type, which callers treat as "not a type hint".
///
/// # Examples
///
/// ```
/// use entity_schema_core::{DbType, host_type_to_db_type};
///
/// assert_eq!(host_type_to_db_type("int?"), Some(DbType::Int32));
/// assert_eq!(host_type_to_db_type("Int64"), Some(DbType::Int64));
/// assert_eq!(host_type_to_db_type("byte[]"), Some(DbType::Binary));
/// assert_eq!(host_type_to_db_type("customerId"), None);
/// ```
pub fn host_type_to_db_type(sys_type: &str) -> Option<DbType> {
    let db_type = match sys_type.trim_end_matches(NULLABLE_MARKER) {
        "byte" | "Byte" => DbType::Byte,
        "sbyte" | "SByte" => DbType::SByte,
        "short" | "Int16" => DbType::Int16,
        "ushort" | "UInt16" => DbType::UInt16,
        "int" | "Int32" => DbType::Int32,
        "uint" | "UInt32" => DbType::UInt32,
        "long" | "Int64" => DbType::Int64,
        "ulong" | "UInt64" => DbType::UInt64,
        "float" => DbType::Single,
        "double" | "Double" => DbType::Double,
        "decimal" | "Decimal" => DbType::Decimal,
        "bool" | "Boolean" => DbType::Boolean,
        "string" | "String" => DbType::String,
        "char" | "Char" => DbType::StringFixedLength,
        "Guid" => DbType::Guid,
        "DateTime" => DbType::DateTime,
        "DateTimeOffset" => DbType::DateTimeOffset,
        "byte[]" => DbType::Binary,
        _ => return None,
    };
    Some(db_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types_take_nullable_marker() {
        for sql in [
            "bigint",
            "smallint",
            "int",
            "uniqueidentifier",
            "date",
            "time",
            "datetimeoffset",
            "real",
            "money",
            "tinyint",
            "bit",
        ] {
            let host = relational_to_host_type(sql, true);
            assert!(host.ends_with('?'), "{sql} -> {host}");
            assert_eq!(host.trim_end_matches('?'), relational_to_host_type(sql, false));
        }
    }

    #[test]
    fn test_reference_types_never_nullable() {
        for sql in ["image", "binary", "varbinary", "timestamp", "nvarchar", "xml", ""] {
            assert!(!relational_to_host_type(sql, true).ends_with('?'), "{sql}");
        }
    }

    #[test]
    fn test_relational_names_are_case_sensitive() {
        assert_eq!(relational_to_host_type("INT", false), "string");
        assert_eq!(relational_to_db_type("INT"), DbType::AnsiString);
    }

    #[test]
    fn test_fixed_length_and_text_types() {
        assert_eq!(relational_to_db_type("char"), DbType::AnsiStringFixedLength);
        assert_eq!(relational_to_db_type("text"), DbType::AnsiString);
        assert_eq!(relational_to_db_type("ntext"), DbType::String);
        assert_eq!(relational_to_db_type("real"), DbType::Single);
        assert_eq!(relational_to_db_type("float"), DbType::Double);
    }

    #[test]
    fn test_host_hint_recognition() {
        assert_eq!(host_type_to_db_type("float"), Some(DbType::Single));
        assert_eq!(host_type_to_db_type("char?"), Some(DbType::StringFixedLength));
        assert_eq!(host_type_to_db_type("UInt32"), Some(DbType::UInt32));
        assert_eq!(host_type_to_db_type(""), None);
        assert_eq!(host_type_to_db_type("guid"), None);
        assert_eq!(host_type_to_db_type("object"), None);
    }
}
