//! Structural validation of a [`DataModel`].
//!
//! Documents can be edited by hand or produced by older tools, so a loaded
//! model may break the invariants the editing operations keep. Validation
//! reports every problem it finds instead of stopping at the first.
//!
//! # Examples
//!
//! ```
//! use entity_schema_core::*;
//!
//! let mut model = DataModel::new();
//! model.add_entity("Customer", 0, 0).unwrap();
//! assert!(validate_model(&model).is_empty());
//!
//! // Columns without any reader query to back them
//! model.entities[0].properties.push(Property::new("Id", "int", "Int32"));
//! let errors = validate_model(&model);
//! assert_eq!(errors, vec![ValidationError::ColumnsWithoutReader("Customer".into())]);
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::naming::make_safe_name;
use crate::types::{DbType, Entity};
use crate::DataModel;

/// Model validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Entity name is empty.
    #[error("entity name cannot be empty")]
    EmptyEntityName,
    /// Two entities share a name.
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),
    /// Entity name is not a valid identifier.
    #[error("entity name is not a valid identifier: {0}")]
    UnsafeEntityName(String),
    /// Two properties of one entity share a name.
    #[error("duplicate column '{property}' in entity '{entity}'")]
    DuplicateProperty { entity: String, property: String },
    /// A property's canonical type is not a known [`DbType`].
    #[error("column '{property}' in entity '{entity}' has unknown db type '{db_type}'")]
    UnknownDbType {
        entity: String,
        property: String,
        db_type: String,
    },
    /// Two queries of one entity share a name.
    #[error("duplicate query '{query}' in entity '{entity}'")]
    DuplicateQuery { entity: String, query: String },
    /// Query name is not a valid identifier.
    #[error("query name in entity '{entity}' is not a valid identifier: {query}")]
    UnsafeQueryName { entity: String, query: String },
    /// The entity declares columns but owns no reader query.
    #[error("entity '{0}' declares columns but has no reader query")]
    ColumnsWithoutReader(String),
}

/// Validates every entity of the model.
pub fn validate_model(model: &DataModel) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for entity in &model.entities {
        let name = entity.name.as_str();
        if name.is_empty() {
            errors.push(ValidationError::EmptyEntityName);
            continue;
        }
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateEntity(name.to_string()));
        }
        if make_safe_name(name) != name {
            errors.push(ValidationError::UnsafeEntityName(name.to_string()));
        }
        errors.extend(validate_entity(entity));
    }

    errors
}

fn validate_entity(entity: &Entity) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen: HashSet<&str> = HashSet::new();
    for property in &entity.properties {
        if !seen.insert(property.name.as_str()) {
            errors.push(ValidationError::DuplicateProperty {
                entity: entity.name.clone(),
                property: property.name.clone(),
            });
        }
        if property.db_type.parse::<DbType>().is_err() {
            errors.push(ValidationError::UnknownDbType {
                entity: entity.name.clone(),
                property: property.name.clone(),
                db_type: property.db_type.clone(),
            });
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for query in &entity.queries {
        if !seen.insert(query.name.as_str()) {
            errors.push(ValidationError::DuplicateQuery {
                entity: entity.name.clone(),
                query: query.name.clone(),
            });
        }
        if query.name.is_empty() || make_safe_name(&query.name) != query.name {
            errors.push(ValidationError::UnsafeQueryName {
                entity: entity.name.clone(),
                query: query.name.clone(),
            });
        }
    }

    if !entity.properties.is_empty() && !entity.has_reader_query() {
        errors.push(ValidationError::ColumnsWithoutReader(entity.name.clone()));
    }

    errors
}
