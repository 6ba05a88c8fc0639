//! Document persistence and connection configuration for entity schemas.
//!
//! This crate reads and writes the XML document that stores a
//! [`DataModel`](entity_schema_core::DataModel), and provides a YAML-backed
//! [`ConnectionRegistry`](entity_schema_core::ConnectionRegistry).
//!
//! # Quick start
//!
//! ```no_run
//! use entity_schema_db::{ConnectionConfig, load, save};
//!
//! let config = ConnectionConfig::load_or_default("connections.yml").unwrap();
//! let mut model = load("customers.dsl").unwrap();
//! model.add_entity("Customer", 20, 20).unwrap();
//! let connection = model.resolve_connection_string(&config);
//! save(&model, "customers.dsl").unwrap();
//! ```

mod config;
mod document;
mod error;

pub use config::ConnectionConfig;
pub use document::{load, read_document, reload, save, write_document};
pub use error::{DocumentError, Result};
