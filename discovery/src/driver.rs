//! The seam between schema analysis and a concrete database.
//!
//! A driver only has to answer three catalog questions. Everything else
//! (type mapping, name sanitizing, placeholder scanning) happens in the
//! analyzer, so drivers stay thin.

use entity_schema_core::{CommandType, DbType};

use crate::error::DriverError;

/// Opens connections from a connection string.
pub trait SchemaDriver {
    type Connection: CatalogConnection;

    fn connect(&self, connection_string: &str) -> Result<Self::Connection, DriverError>;
}

/// An open connection that can answer catalog and describe requests.
///
/// Dropping the connection releases it.
pub trait CatalogConnection {
    /// All routines in the catalog.
    fn procedures(&self) -> Result<Vec<ProcedureRow>, DriverError>;

    /// Declared parameters of one stored procedure, in any order.
    fn procedure_parameters(&self, procedure: &str) -> Result<Vec<ParameterRow>, DriverError>;

    /// Result columns of a command, without running it for data.
    ///
    /// Every parameter is bound as a null of its canonical type.
    fn describe(
        &self,
        command_text: &str,
        command_type: CommandType,
        parameters: &[BoundParameter],
    ) -> Result<Vec<ColumnRow>, DriverError>;
}

/// One row of the routine catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureRow {
    /// `PROCEDURE` or `FUNCTION`.
    pub routine_type: String,
    pub name: String,
}

impl ProcedureRow {
    pub fn procedure(name: &str) -> Self {
        Self {
            routine_type: "PROCEDURE".to_string(),
            name: name.to_string(),
        }
    }
}

/// One declared stored-procedure parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRow {
    pub ordinal: i32,
    /// Name as declared, usually with its `@` sigil.
    pub name: String,
    /// Relational type name (`int`, `nvarchar`, ...).
    pub data_type: String,
    /// `IN`, `OUT` or `INOUT`.
    pub mode: String,
}

/// One column of a described result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    /// Column name as reported; may be empty for computed columns.
    pub name: String,
    /// Relational type name.
    pub data_type_name: String,
    pub allow_null: bool,
}

/// A parameter to bind as a typed null before describing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParameter {
    pub name: String,
    pub db_type: DbType,
}
