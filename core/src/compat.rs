//! Column compatibility between an entity and an analyzed query.
//!
//! [`check_compatibility`] explains how a query's result columns differ from
//! the columns an entity declares. [`set_columns`] makes the entity adopt a
//! query's columns.
//!
//! # Example
//!
//! ```
//! use entity_schema_core::*;
//!
//! let mut entity = Entity::new("Customer");
//! let metadata = Metadata {
//!     parameters: Vec::new(),
//!     columns: vec![
//!         Column::new("Id", "int", DbType::Int32),
//!         Column::new("Name", "string", DbType::String),
//!     ],
//! };
//!
//! assert!(set_columns(&mut entity, &metadata));
//! assert!(!set_columns(&mut entity, &metadata));
//! assert!(check_compatibility(&entity, &metadata, false).is_empty());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Entity, Metadata, Property};

/// One way a query's result differs from its entity's columns.
///
/// The `Display` form is the message shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// The query returns a column the entity does not declare.
    #[error("additional column: {sys_type} {name}")]
    AdditionalColumn { name: String, sys_type: String },
    /// Both declare the column but with different host types.
    #[error("column '{name}' is of type '{actual}' instead of '{expected}'")]
    TypeMismatch {
        name: String,
        actual: String,
        expected: String,
    },
    /// The entity declares a column the query does not return.
    #[error("missing column: {type_name} {name}")]
    MissingColumn { name: String, type_name: String },
}

/// Lists the discrepancies between `entity`'s properties and the columns in
/// `metadata`.
///
/// Columns are walked in order and each is matched against the first
/// not-yet-matched property with the same name (case-sensitive). Properties
/// left unmatched at the end are reported as missing, in declaration order.
/// With `break_on_first_error`, at most one discrepancy is returned.
///
/// # Examples
///
/// ```
/// use entity_schema_core::*;
///
/// let mut entity = Entity::new("Customer");
/// entity.properties.push(Property::new("Id", "int", "Int32"));
/// entity.properties.push(Property::new("Name", "string", "String"));
///
/// let metadata = Metadata {
///     parameters: Vec::new(),
///     columns: vec![
///         Column::new("Id", "int", DbType::Int32),
///         Column::new("Name", "int", DbType::Int32),
///         Column::new("Extra", "string", DbType::String),
///     ],
/// };
///
/// let found: Vec<String> = check_compatibility(&entity, &metadata, false)
///     .iter()
///     .map(ToString::to_string)
///     .collect();
/// assert_eq!(
///     found,
///     [
///         "column 'Name' is of type 'int' instead of 'string'",
///         "additional column: string Extra",
///     ]
/// );
/// ```
pub fn check_compatibility(
    entity: &Entity,
    metadata: &Metadata,
    break_on_first_error: bool,
) -> Vec<Discrepancy> {
    let mut found = Vec::new();
    let mut unmatched: Vec<&Property> = entity.properties.iter().collect();

    for column in &metadata.columns {
        let Some(index) = unmatched.iter().position(|p| p.name == column.name) else {
            found.push(Discrepancy::AdditionalColumn {
                name: column.name.clone(),
                sys_type: column.sys_type.clone(),
            });
            if break_on_first_error {
                return found;
            }
            continue;
        };

        let property = unmatched.remove(index);
        if property.type_name != column.sys_type {
            found.push(Discrepancy::TypeMismatch {
                name: column.name.clone(),
                actual: column.sys_type.clone(),
                expected: property.type_name.clone(),
            });
            if break_on_first_error {
                return found;
            }
        }
    }

    for property in unmatched {
        found.push(Discrepancy::MissingColumn {
            name: property.name.clone(),
            type_name: property.type_name.clone(),
        });
        if break_on_first_error {
            break;
        }
    }

    found
}

/// Replaces `entity`'s properties with one property per column of
/// `metadata`, if they differ.
///
/// The comparison is positional over name, host type and canonical type, so
/// reordering columns counts as a change. Returns whether the properties
/// were replaced; when they were not, the existing properties are left as
/// they are.
pub fn set_columns(entity: &mut Entity, metadata: &Metadata) -> bool {
    let changed = entity.properties.len() != metadata.columns.len()
        || entity
            .properties
            .iter()
            .zip(&metadata.columns)
            .any(|(property, column)| {
                property.name != column.name
                    || property.type_name != column.sys_type
                    || property.db_type != column.db_type
            });

    if changed {
        entity.properties = metadata.columns.iter().map(Property::from_column).collect();
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, DbType};

    fn entity(props: &[(&str, &str)]) -> Entity {
        let mut entity = Entity::new("E");
        for (name, ty) in props {
            entity.properties.push(Property::new(name, ty, "String"));
        }
        entity
    }

    fn metadata(cols: &[(&str, &str)]) -> Metadata {
        Metadata {
            parameters: Vec::new(),
            columns: cols
                .iter()
                .map(|(name, ty)| Column::new(name, ty, DbType::String))
                .collect(),
        }
    }

    fn messages(found: &[Discrepancy]) -> Vec<String> {
        found.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_missing_column() {
        let e = entity(&[("Id", "int"), ("Name", "string")]);
        let md = metadata(&[("Id", "int")]);
        assert_eq!(
            messages(&check_compatibility(&e, &md, false)),
            ["missing column: string Name"]
        );
    }

    #[test]
    fn test_column_order_then_leftovers() {
        let e = entity(&[("A", "int"), ("B", "int"), ("C", "int")]);
        let md = metadata(&[("X", "int"), ("B", "long")]);
        assert_eq!(
            messages(&check_compatibility(&e, &md, false)),
            [
                "additional column: int X",
                "column 'B' is of type 'long' instead of 'int'",
                "missing column: int A",
                "missing column: int C",
            ]
        );
    }

    #[test]
    fn test_break_on_first_error_returns_one() {
        let e = entity(&[("A", "int"), ("B", "int")]);
        let md = metadata(&[("X", "int")]);
        let found = check_compatibility(&e, &md, true);
        assert_eq!(messages(&found), ["additional column: int X"]);

        let md = metadata(&[("A", "int")]);
        let found = check_compatibility(&e, &md, true);
        assert_eq!(messages(&found), ["missing column: int B"]);
    }

    #[test]
    fn test_duplicate_column_names_match_in_order() {
        let e = entity(&[("Id", "int"), ("Id", "long")]);
        let md = metadata(&[("Id", "int"), ("Id", "long")]);
        assert!(check_compatibility(&e, &md, false).is_empty());

        let md = metadata(&[("Id", "long"), ("Id", "int")]);
        assert_eq!(
            messages(&check_compatibility(&e, &md, false)),
            [
                "column 'Id' is of type 'long' instead of 'int'",
                "column 'Id' is of type 'int' instead of 'long'",
            ]
        );
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let e = entity(&[("id", "int")]);
        let md = metadata(&[("Id", "int")]);
        assert_eq!(
            messages(&check_compatibility(&e, &md, false)),
            ["additional column: int Id", "missing column: int id"]
        );
    }

    #[test]
    fn test_set_columns_is_idempotent() {
        let mut e = Entity::new("E");
        let md = metadata(&[("Id", "int"), ("Name", "string?")]);

        assert!(set_columns(&mut e, &md));
        let after_first = e.properties.clone();
        assert!(!set_columns(&mut e, &md));
        assert_eq!(e.properties, after_first);
        assert!(e.properties[1].is_nullable());
    }

    #[test]
    fn test_set_columns_detects_reorder_and_db_type() {
        let mut e = Entity::new("E");
        set_columns(&mut e, &metadata(&[("A", "int"), ("B", "int")]));
        assert!(set_columns(&mut e, &metadata(&[("B", "int"), ("A", "int")])));
        assert_eq!(e.properties[0].name, "B");

        let mut md = metadata(&[("B", "int"), ("A", "int")]);
        md.columns[0].db_type = DbType::Int32.to_string();
        assert!(set_columns(&mut e, &md));
        assert_eq!(e.properties[0].db_type, "Int32");
    }

    #[test]
    fn test_set_columns_to_empty() {
        let mut e = entity(&[("A", "int")]);
        assert!(set_columns(&mut e, &Metadata::default()));
        assert!(e.properties.is_empty());
    }
}
