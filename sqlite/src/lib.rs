//! SQLite driver for entity schema analysis.
//!
//! [`SqliteDriver`] implements the
//! [`SchemaDriver`](entity_schema_discovery::SchemaDriver) seam with
//! `rusqlite`. Commands are prepared but never run, so only syntax and
//! schema are checked.
//!
//! SQLite has no stored procedures: the procedure catalog is always empty
//! and describing a stored procedure fails. Declared column types are
//! normalized with [`normalize_decl_type`], and every result column is
//! reported nullable.
//!
//! # Quick start
//!
//! ```no_run
//! use entity_schema_core::CommandType;
//! use entity_schema_discovery::SchemaAnalyzer;
//! use entity_schema_sqlite::SqliteDriver;
//!
//! let analyzer = SchemaAnalyzer::new(SqliteDriver::new(), "app.db");
//! let metadata = analyzer
//!     .get_metadata("SELECT Id, Name FROM Customer WHERE Id = @id", CommandType::Text)
//!     .unwrap();
//! println!("{} columns", metadata.columns.len());
//! ```

mod convert;
mod driver;
mod error;

pub use convert::{database_path, normalize_decl_type};
pub use driver::{SqliteConnection, SqliteDriver};
pub use error::{Result, SqliteError};
