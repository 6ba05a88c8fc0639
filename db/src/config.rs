//! YAML-backed connection string registry.
//!
//! # Example YAML
//!
//! ```yaml
//! connections:
//!   Main: app.db
//!   Reporting: /var/lib/reports.db
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;

use entity_schema_core::ConnectionRegistry;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Named connection strings, persisted as YAML.
///
/// # Examples
///
/// ```
/// use entity_schema_core::{ConnectionRegistry, DataModel};
/// use entity_schema_db::ConnectionConfig;
///
/// let mut config = ConnectionConfig::default();
/// config.add_connection_string("Main", "app.db");
///
/// let mut model = DataModel::new();
/// model.connection.name = "Main".into();
/// assert_eq!(model.resolve_connection_string(&config).as_deref(), Some("app.db"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub connections: BTreeMap<String, String>,
}

impl ConnectionConfig {
    /// Loads the registry from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DocumentError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DocumentError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields an empty registry.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(path) {
            Err(crate::DocumentError::IoError(e)) if e.kind() == ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Saves the registry as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.connections.get(name).map(String::as_str)
    }
}

impl ConnectionRegistry for ConnectionConfig {
    fn connection_strings(&self) -> BTreeMap<String, String> {
        self.connections.clone()
    }

    fn add_connection_string(&mut self, name: &str, connection_string: &str) {
        self.connections
            .entry(name.to_string())
            .or_insert_with(|| connection_string.to_string());
    }

    fn update_connection_string(&mut self, name: &str, connection_string: &str) {
        if let Some(value) = self.connections.get_mut(name) {
            *value = connection_string.to_string();
        }
    }
}
