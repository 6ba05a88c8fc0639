//! Schema analysis and entity reconciliation.
//!
//! This crate asks a database what a command looks like and keeps entities
//! consistent with the answers.
//!
//! # Main entry points
//!
//! - [`SchemaAnalyzer::get_metadata`]: parameters and result columns of SQL
//!   text or a stored procedure.
//! - [`SchemaAnalyzer::list_stored_procedures`]: user stored procedures.
//! - [`Reconciler`]: add, edit, refresh and delete queries while keeping
//!   each entity's columns in line with its Reader queries.
//!
//! Databases plug in through the [`SchemaDriver`] and [`CatalogConnection`]
//! traits; `entity-schema-sqlite` provides one.
//!
//! # Example
//!
//! ```
//! use entity_schema_core::{CommandType, ExecuteMethod, Entity};
//! use entity_schema_discovery::{
//!     BoundParameter, CatalogConnection, ColumnRow, DriverError, ParameterRow, ProcedureRow,
//!     QueryDraft, Reconciler, SchemaAnalyzer, SchemaDriver,
//! };
//!
//! struct Fixed;
//! struct FixedConn;
//!
//! impl SchemaDriver for Fixed {
//!     type Connection = FixedConn;
//!     fn connect(&self, _: &str) -> Result<FixedConn, DriverError> {
//!         Ok(FixedConn)
//!     }
//! }
//!
//! impl CatalogConnection for FixedConn {
//!     fn procedures(&self) -> Result<Vec<ProcedureRow>, DriverError> {
//!         Ok(Vec::new())
//!     }
//!     fn procedure_parameters(&self, _: &str) -> Result<Vec<ParameterRow>, DriverError> {
//!         Ok(Vec::new())
//!     }
//!     fn describe(
//!         &self,
//!         _: &str,
//!         _: CommandType,
//!         _: &[BoundParameter],
//!     ) -> Result<Vec<ColumnRow>, DriverError> {
//!         Ok(vec![ColumnRow {
//!             name: "Id".into(),
//!             data_type_name: "int".into(),
//!             allow_null: false,
//!         }])
//!     }
//! }
//!
//! let analyzer = SchemaAnalyzer::new(Fixed, "unused");
//! let reconciler = Reconciler::new(&analyzer);
//!
//! let mut entity = Entity::new("Customer");
//! let report = reconciler
//!     .add_query(
//!         &mut entity,
//!         QueryDraft::new(
//!             "GetAll",
//!             "SELECT Id FROM Customer",
//!             CommandType::Text,
//!             ExecuteMethod::Reader,
//!         ),
//!         |_, _| true,
//!     )
//!     .unwrap();
//!
//! assert!(report.columns_changed);
//! assert_eq!(entity.properties[0].type_name, "int");
//! ```

mod analyzer;
mod driver;
mod error;
pub mod output;
mod params;
mod reconcile;
mod report;

pub use analyzer::SchemaAnalyzer;
pub use driver::{
    BoundParameter, CatalogConnection, ColumnRow, ParameterRow, ProcedureRow, SchemaDriver,
};
pub use error::{AnalysisError, DriverError, Result};
pub use params::{Placeholder, scan_placeholders};
pub use reconcile::{QueryDraft, Reconciler};
pub use report::{QueryFailure, ReconcileReport};
