//! Turns commands into [`Metadata`] by asking the database.

use entity_schema_core::{
    Column, CommandType, Metadata, SpParam, deduplicate_columns, make_safe_name,
    relational_to_db_type, relational_to_host_type,
};
use tracing::debug;

use crate::driver::{BoundParameter, CatalogConnection, ColumnRow, SchemaDriver};
use crate::error::{AnalysisError, Result};
use crate::params::scan_placeholders;

/// Routine type of stored procedures in the catalog.
const PROCEDURE_ROUTINE: &str = "PROCEDURE";
/// Prefix of system procedures, which are never listed.
const SYSTEM_PROCEDURE_PREFIX: &str = "sp_";
/// Parameter mode of bidirectional parameters.
const INOUT_MODE: &str = "INOUT";

/// Schema analyzer bound to one connection string.
///
/// Every call opens its own connection and drops it before returning.
#[derive(Debug, Clone)]
pub struct SchemaAnalyzer<D> {
    driver: D,
    connection_string: String,
}

impl<D: SchemaDriver> SchemaAnalyzer<D> {
    pub fn new(driver: D, connection_string: impl Into<String>) -> Self {
        Self {
            driver,
            connection_string: connection_string.into(),
        }
    }

    fn connect(&self) -> Result<D::Connection> {
        debug!(driver = std::any::type_name::<D>(), "opening connection");
        Ok(self.driver.connect(&self.connection_string)?)
    }

    /// Lists user stored procedures, sorted by name.
    ///
    /// Functions and names starting with `sp_` are skipped.
    pub fn list_stored_procedures(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut names: Vec<String> = conn
            .procedures()?
            .into_iter()
            .filter(|row| {
                row.routine_type == PROCEDURE_ROUTINE
                    && !row.name.starts_with(SYSTEM_PROCEDURE_PREFIX)
            })
            .map(|row| row.name)
            .collect();
        names.sort();
        debug!(count = names.len(), "listed stored procedures");
        Ok(names)
    }

    /// Describes the parameters and result columns of a command.
    ///
    /// # Errors
    ///
    /// Any driver failure is returned as [`AnalysisError::Driver`] with the
    /// driver's message; no partial metadata is produced.
    pub fn get_metadata(&self, command_text: &str, command_type: CommandType) -> Result<Metadata> {
        if command_text.trim().is_empty() {
            return Err(AnalysisError::EmptyCommand);
        }

        let conn = self.connect()?;
        let (parameters, bound) = match command_type {
            CommandType::StoredProcedure => procedure_parameters(&conn, command_text)?,
            CommandType::Text => text_parameters(command_text),
        };
        debug!(
            command_type = %command_type,
            parameters = parameters.len(),
            "bound parameters"
        );

        let rows = conn.describe(command_text, command_type, &bound)?;
        let columns = build_columns(rows);
        debug!(columns = columns.len(), "described result columns");

        Ok(Metadata {
            parameters,
            columns,
        })
    }
}

fn procedure_parameters<C: CatalogConnection>(
    conn: &C,
    procedure: &str,
) -> Result<(Vec<SpParam>, Vec<BoundParameter>)> {
    let mut rows = conn.procedure_parameters(procedure)?;
    rows.sort_by_key(|row| row.ordinal);

    let parameters: Vec<SpParam> = rows
        .iter()
        .map(|row| SpParam {
            name: row.name.replace('@', ""),
            sys_type: relational_to_host_type(&row.data_type, false),
            db_type: relational_to_db_type(&row.data_type),
            is_output: row.mode == INOUT_MODE,
        })
        .collect();

    let bound = parameters
        .iter()
        .map(|p| BoundParameter {
            name: p.name.clone(),
            db_type: p.db_type,
        })
        .collect();

    Ok((parameters, bound))
}

fn text_parameters(sql: &str) -> (Vec<SpParam>, Vec<BoundParameter>) {
    scan_placeholders(sql)
        .into_iter()
        .map(|placeholder| {
            let bound = BoundParameter {
                name: placeholder.token,
                db_type: placeholder.param.db_type,
            };
            (placeholder.param, bound)
        })
        .unzip()
}

fn build_columns(rows: Vec<ColumnRow>) -> Vec<Column> {
    let mut columns: Vec<Column> = rows
        .into_iter()
        .map(|row| Column {
            name: make_safe_name(&row.name),
            sys_type: relational_to_host_type(&row.data_type_name, row.allow_null),
            db_type: relational_to_db_type(&row.data_type_name).to_string(),
            is_nullable: row.allow_null,
        })
        .collect();
    deduplicate_columns(&mut columns);
    columns
}
