//! [`SchemaDriver`] implementation over `rusqlite`.

use entity_schema_core::CommandType;
use entity_schema_discovery::{
    BoundParameter, CatalogConnection, ColumnRow, DriverError, ParameterRow, ProcedureRow,
    SchemaDriver,
};
use rusqlite::types::Null;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::convert::{UNTYPED_COLUMN, database_path, normalize_decl_type};
use crate::error::{Result, SqliteError};

const NO_PROCEDURES: &str = "SQLite does not support stored procedures";

/// Opens SQLite databases read-only.
///
/// The connection string is a file path, or `Data Source=<path>`.
/// Databases that do not exist are not created.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        Self
    }

    fn open(&self, connection_string: &str) -> Result<SqliteConnection> {
        let path = database_path(connection_string)
            .ok_or(SqliteError::Unsupported("connection string names no database"))?;
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!(path, "opened sqlite database");
        Ok(SqliteConnection { conn })
    }
}

impl SchemaDriver for SqliteDriver {
    type Connection = SqliteConnection;

    fn connect(
        &self,
        connection_string: &str,
    ) -> std::result::Result<SqliteConnection, DriverError> {
        Ok(self.open(connection_string)?)
    }
}

/// An open, read-only SQLite connection.
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    /// Prepares `sql` and reads its result columns.
    ///
    /// The statement is never stepped, so nothing is read or written.
    fn describe_text(&self, sql: &str, parameters: &[BoundParameter]) -> Result<Vec<ColumnRow>> {
        let mut stmt = self.conn.prepare(sql)?;

        for param in parameters {
            match stmt.parameter_index(&param.name)? {
                Some(index) => stmt.raw_bind_parameter(index, Null)?,
                None => debug!(parameter = %param.name, "placeholder not present in statement"),
            }
        }

        let columns = stmt
            .columns()
            .into_iter()
            .map(|column| ColumnRow {
                name: column.name().to_string(),
                data_type_name: column
                    .decl_type()
                    .map(normalize_decl_type)
                    .unwrap_or_else(|| UNTYPED_COLUMN.to_string()),
                // Prepared statements expose no NOT NULL information.
                allow_null: true,
            })
            .collect();

        Ok(columns)
    }
}

impl CatalogConnection for SqliteConnection {
    fn procedures(&self) -> std::result::Result<Vec<ProcedureRow>, DriverError> {
        Ok(Vec::new())
    }

    fn procedure_parameters(
        &self,
        _procedure: &str,
    ) -> std::result::Result<Vec<ParameterRow>, DriverError> {
        Err(DriverError::new(NO_PROCEDURES))
    }

    fn describe(
        &self,
        command_text: &str,
        command_type: CommandType,
        parameters: &[BoundParameter],
    ) -> std::result::Result<Vec<ColumnRow>, DriverError> {
        match command_type {
            CommandType::StoredProcedure => Err(DriverError::new(NO_PROCEDURES)),
            CommandType::Text => Ok(self.describe_text(command_text, parameters)?),
        }
    }
}
