//! A scripted in-memory database for analyzer and reconciler tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use entity_schema_core::CommandType;
use entity_schema_discovery::{
    BoundParameter, CatalogConnection, ColumnRow, DriverError, ParameterRow, ProcedureRow,
    SchemaDriver,
};

#[derive(Default)]
pub struct Script {
    pub procedures: Vec<ProcedureRow>,
    pub parameters: HashMap<String, Vec<ParameterRow>>,
    pub results: HashMap<String, Result<Vec<ColumnRow>, String>>,
    pub connect_error: Option<String>,
    pub connections: usize,
    pub open: usize,
    pub described: Vec<(String, CommandType, Vec<BoundParameter>)>,
}

/// Driver whose answers are set up by the test.
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    script: Rc<RefCell<Script>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the result columns for a command: `(name, type, allow_null)`.
    pub fn returns(&self, command: &str, columns: &[(&str, &str, bool)]) -> &Self {
        let rows = columns
            .iter()
            .map(|(name, ty, allow_null)| ColumnRow {
                name: name.to_string(),
                data_type_name: ty.to_string(),
                allow_null: *allow_null,
            })
            .collect();
        self.script
            .borrow_mut()
            .results
            .insert(command.to_string(), Ok(rows));
        self
    }

    pub fn fails(&self, command: &str, message: &str) -> &Self {
        self.script
            .borrow_mut()
            .results
            .insert(command.to_string(), Err(message.to_string()));
        self
    }

    pub fn procedure(&self, routine_type: &str, name: &str) -> &Self {
        self.script.borrow_mut().procedures.push(ProcedureRow {
            routine_type: routine_type.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Declares a procedure parameter: `(ordinal, name, type, mode)`.
    pub fn parameter(&self, procedure: &str, row: (i32, &str, &str, &str)) -> &Self {
        let (ordinal, name, data_type, mode) = row;
        self.script
            .borrow_mut()
            .parameters
            .entry(procedure.to_string())
            .or_default()
            .push(ParameterRow {
                ordinal,
                name: name.to_string(),
                data_type: data_type.to_string(),
                mode: mode.to_string(),
            });
        self
    }

    pub fn refuse_connections(&self, message: &str) {
        self.script.borrow_mut().connect_error = Some(message.to_string());
    }

    pub fn connections(&self) -> usize {
        self.script.borrow().connections
    }

    pub fn open_connections(&self) -> usize {
        self.script.borrow().open
    }

    pub fn described(&self) -> Vec<(String, CommandType, Vec<BoundParameter>)> {
        self.script.borrow().described.clone()
    }
}

pub struct ScriptedConnection {
    script: Rc<RefCell<Script>>,
}

impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        self.script.borrow_mut().open -= 1;
    }
}

impl SchemaDriver for ScriptedDriver {
    type Connection = ScriptedConnection;

    fn connect(&self, _connection_string: &str) -> Result<ScriptedConnection, DriverError> {
        let mut script = self.script.borrow_mut();
        if let Some(message) = &script.connect_error {
            return Err(DriverError::new(message.clone()));
        }
        script.connections += 1;
        script.open += 1;
        Ok(ScriptedConnection {
            script: Rc::clone(&self.script),
        })
    }
}

impl CatalogConnection for ScriptedConnection {
    fn procedures(&self) -> Result<Vec<ProcedureRow>, DriverError> {
        Ok(self.script.borrow().procedures.clone())
    }

    fn procedure_parameters(&self, procedure: &str) -> Result<Vec<ParameterRow>, DriverError> {
        Ok(self
            .script
            .borrow()
            .parameters
            .get(procedure)
            .cloned()
            .unwrap_or_default())
    }

    fn describe(
        &self,
        command_text: &str,
        command_type: CommandType,
        parameters: &[BoundParameter],
    ) -> Result<Vec<ColumnRow>, DriverError> {
        let mut script = self.script.borrow_mut();
        script
            .described
            .push((command_text.to_string(), command_type, parameters.to_vec()));
        match script.results.get(command_text) {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(message)) => Err(DriverError::new(message.clone())),
            None => Err(DriverError::new(format!(
                "Invalid object name '{command_text}'."
            ))),
        }
    }
}
