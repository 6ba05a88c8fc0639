//! Core model types, type mapping and column compatibility.
//!
//! This crate defines the in-memory model of entities backed by SQL queries:
//!
//! - [`Entity`]: a named record shape with ordered [`Property`] columns and
//!   the [`Query`]s that fill it.
//! - [`Query`]: SQL text or a stored-procedure call with its [`SpParam`]
//!   parameters.
//! - [`Metadata`]: the parameters and result [`Column`]s reported by schema
//!   analysis of one command.
//! - [`DataModel`]: every entity of one document plus its connection and
//!   dialog settings.
//!
//! Type mapping ([`relational_to_host_type`], [`relational_to_db_type`],
//! [`host_type_to_db_type`]) converts between relational type names, the
//! canonical [`DbType`] enumeration and host type names.
//!
//! Compatibility ([`check_compatibility`], [`set_columns`]) keeps an entity's
//! columns consistent with the queries bound to it.
//!
//! # Example
//!
//! ```
//! use entity_schema_core::*;
//!
//! let mut model = DataModel::new();
//! let customer = model.add_entity("Customer", 20, 20).unwrap();
//!
//! let metadata = Metadata {
//!     parameters: vec![SpParam::new("id", "int", DbType::Int32)],
//!     columns: vec![
//!         Column::new(
//!             "Id",
//!             &relational_to_host_type("int", false),
//!             relational_to_db_type("int"),
//!         ),
//!         Column::new(
//!             "Name",
//!             &relational_to_host_type("nvarchar", true),
//!             relational_to_db_type("nvarchar"),
//!         ),
//!     ],
//! };
//!
//! assert!(set_columns(customer, &metadata));
//! customer
//!     .add_query(
//!         Query::new(
//!             "GetById",
//!             "SELECT Id, Name FROM Customer WHERE Id = @id",
//!             CommandType::Text,
//!             ExecuteMethod::Reader,
//!         )
//!         .with_parameters(metadata.parameters.clone()),
//!     )
//!     .unwrap();
//!
//! assert!(check_compatibility(customer, &metadata, false).is_empty());
//! assert!(validate_model(&model).is_empty());
//! ```

mod compat;
mod model;
mod naming;
mod typemap;
mod types;
mod validate;

pub use compat::{Discrepancy, check_compatibility, set_columns};
pub use model::{
    ConnectionRegistry, ConnectionSettings, ConnectionStorage, DEFAULT_DIALOG_HEIGHT,
    DEFAULT_DIALOG_WIDTH, DataModel, ModelError, Result,
};
pub use naming::{deduplicate_columns, deduplicate_names, make_safe_name};
pub use typemap::{
    NULLABLE_MARKER, OBJECT_HOST_TYPE, host_type_to_db_type, relational_to_db_type,
    relational_to_host_type,
};
pub use types::*;
pub use validate::{ValidationError, validate_model};
