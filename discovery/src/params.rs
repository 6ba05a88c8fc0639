//! Placeholder scanning for ad-hoc SQL text.
//!
//! A placeholder is an `@name` directly after `=` (optionally one space in
//! between). It may carry a type hint in a trailing comment:
//!
//! ```sql
//! SELECT * FROM Customer WHERE Id = @id /* dsl:int */ AND Name =@name
//! ```

use std::sync::LazyLock;

use entity_schema_core::{DbType, OBJECT_HOST_TYPE, SpParam, host_type_to_db_type};
use regex::Regex;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"= ?(@\w*)(?:\s*/\*\s*dsl:(\w*\??))?").expect("static regex must compile")
});

/// A placeholder found in SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// The placeholder as written, including `@`.
    pub token: String,
    /// The parameter recorded for it.
    pub param: SpParam,
}

/// Finds every distinct placeholder in `sql`, in order of first appearance.
///
/// The stored parameter name is the placeholder without `@`, except when that
/// name (lowercased) is itself a host type name; then the `@` is kept so the
/// generated parameter stays a legal identifier. A recognized `dsl:` hint
/// sets the host and canonical types; otherwise the parameter is an
/// `object` bound as `String`.
///
/// # Examples
///
/// ```
/// use entity_schema_core::DbType;
/// use entity_schema_discovery::scan_placeholders;
///
/// let found = scan_placeholders("SELECT * FROM T WHERE a = @id /* dsl:int? */ AND b =@int");
/// assert_eq!(found[0].token, "@id");
/// assert_eq!(found[0].param.name, "id");
/// assert_eq!(found[0].param.sys_type, "int?");
/// assert_eq!(found[0].param.db_type, DbType::Int32);
///
/// assert_eq!(found[1].param.name, "@int");
/// assert_eq!(found[1].param.sys_type, "object");
/// assert_eq!(found[1].param.db_type, DbType::String);
/// ```
pub fn scan_placeholders(sql: &str) -> Vec<Placeholder> {
    let mut found: Vec<Placeholder> = Vec::new();

    for caps in PLACEHOLDER_RE.captures_iter(sql) {
        let Some(token) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if found.iter().any(|p| p.token == token) {
            continue;
        }

        let bare = token.trim_start_matches('@');
        let name = if host_type_to_db_type(&bare.to_lowercase()).is_some() {
            format!("@{bare}")
        } else {
            bare.to_string()
        };

        let hint = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let param = match host_type_to_db_type(hint) {
            Some(db_type) => SpParam::new(&name, hint, db_type),
            None => SpParam::new(&name, OBJECT_HOST_TYPE, DbType::String),
        };

        found.push(Placeholder {
            token: token.to_string(),
            param,
        });
    }

    found
}
