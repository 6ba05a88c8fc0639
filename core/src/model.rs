//! The document-level model: entities plus connection and dialog settings.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming::make_safe_name;
use crate::types::{Entity, ParseValueError};

/// Default width of the add-query dialog, in pixels.
pub const DEFAULT_DIALOG_WIDTH: u32 = 406;
/// Default height of the add-query dialog, in pixels.
pub const DEFAULT_DIALOG_HEIGHT: u32 = 371;

/// Errors raised by model editing operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("an entity named '{0}' already exists")]
    DuplicateEntity(String),
    #[error("entity '{entity}' already has a query named '{query}'")]
    DuplicateQuery { entity: String, query: String },
    #[error("entity not found: {0}")]
    EntityNotFound(String),
    #[error("query '{query}' not found in entity '{entity}'")]
    QueryNotFound { entity: String, query: String },
}

/// Convenience alias for results with [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;

/// Where generated code looks up the connection string at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectionStorage {
    /// Web/app configuration file.
    WebConfig,
    /// Application settings.
    #[default]
    Settings,
}

impl ConnectionStorage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WebConfig => "webconfig",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for ConnectionStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStorage {
    type Err = ParseValueError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "webconfig" => Ok(Self::WebConfig),
            "settings" => Ok(Self::Settings),
            other => Err(ParseValueError {
                kind: "connection storage",
                value: other.to_string(),
            }),
        }
    }
}

/// The connection a document was built against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Registry name, possibly dotted (`Properties.Settings.Default.Main`).
    pub name: String,
    /// Connection string captured when the document was last saved.
    pub connection_string: String,
    pub storage: ConnectionStorage,
}

impl ConnectionSettings {
    /// The last dotted segment of [`name`](Self::name).
    ///
    /// # Examples
    ///
    /// ```
    /// use entity_schema_core::ConnectionSettings;
    ///
    /// let mut settings = ConnectionSettings::default();
    /// settings.name = "Properties.Settings.Default.Main".into();
    /// assert_eq!(settings.short_name(), "Main");
    /// settings.name = "Main".into();
    /// assert_eq!(settings.short_name(), "Main");
    /// ```
    pub fn short_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot) => &self.name[dot + 1..],
            None => &self.name,
        }
    }
}

/// A registry of named connection strings owned by the host environment.
pub trait ConnectionRegistry {
    /// All known connection strings by name.
    fn connection_strings(&self) -> BTreeMap<String, String>;

    /// Registers a new connection string.
    fn add_connection_string(&mut self, name: &str, connection_string: &str);

    /// Replaces the value of an existing connection string.
    fn update_connection_string(&mut self, name: &str, connection_string: &str);
}

/// All entities of one open document.
///
/// The model is discarded and rebuilt on every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModel {
    pub entities: Vec<Entity>,
    pub connection: ConnectionSettings,
    pub dialog_width: u32,
    pub dialog_height: u32,
    /// Connection string that wins over everything else. Never persisted.
    #[serde(skip)]
    pub connection_override: Option<String>,
}

impl Default for DataModel {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            connection: ConnectionSettings::default(),
            dialog_width: DEFAULT_DIALOG_WIDTH,
            dialog_height: DEFAULT_DIALOG_HEIGHT,
            connection_override: None,
        }
    }
}

impl DataModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_index(&self, name: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.name == name)
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name == name)
    }

    /// Looks up an entity, failing with [`ModelError::EntityNotFound`].
    pub fn require_entity_mut(&mut self, name: &str) -> Result<&mut Entity> {
        self.entity_mut(name)
            .ok_or_else(|| ModelError::EntityNotFound(name.to_string()))
    }

    /// Adds an empty entity at the given position.
    ///
    /// # Examples
    ///
    /// ```
    /// use entity_schema_core::{DataModel, ModelError};
    ///
    /// let mut model = DataModel::new();
    /// model.add_entity("order line", 10, 10).unwrap();
    /// assert!(model.entity("order_line").is_some());
    ///
    /// let err = model.add_entity("order-line", 50, 50).unwrap_err();
    /// assert_eq!(err, ModelError::DuplicateEntity("order_line".into()));
    /// ```
    pub fn add_entity(&mut self, name: &str, x: i32, y: i32) -> Result<&mut Entity> {
        let entity = Entity::new(name).at(x, y);
        if self.entity_index(&entity.name).is_some() {
            return Err(ModelError::DuplicateEntity(entity.name));
        }
        self.entities.push(entity);
        let last = self.entities.len() - 1;
        Ok(&mut self.entities[last])
    }

    pub fn remove_entity(&mut self, name: &str) -> Option<Entity> {
        let index = self.entity_index(name)?;
        Some(self.entities.remove(index))
    }

    /// Renames an entity.
    ///
    /// The new name is sanitized first. Returns `false` and keeps the old
    /// name when the entity does not exist or another entity already uses
    /// the new name.
    pub fn rename_entity(&mut self, current: &str, new_name: &str) -> bool {
        let new_name = make_safe_name(new_name);
        if new_name == current || self.entity_index(&new_name).is_some() {
            return false;
        }
        match self.entity_mut(current) {
            Some(entity) => {
                entity.name = new_name;
                true
            }
            None => false,
        }
    }

    /// Resolves the connection string to analyze against.
    ///
    /// The override wins; then the registry entry named by the document;
    /// then the value stored in the document. Empty strings count as unset.
    pub fn resolve_connection_string(&self, registry: &dyn ConnectionRegistry) -> Option<String> {
        if let Some(value) = self.connection_override.as_ref().filter(|v| !v.is_empty()) {
            return Some(value.clone());
        }
        if !self.connection.name.is_empty() {
            if let Some(value) = registry.connection_strings().remove(&self.connection.name) {
                return Some(value);
            }
        }
        Some(self.connection.connection_string.clone()).filter(|v| !v.is_empty())
    }

    /// Compares everything that is persisted, ignoring presentation flags.
    pub fn same_persisted_state(&self, other: &Self) -> bool {
        self.connection == other.connection
            && self.dialog_width == other.dialog_width
            && self.dialog_height == other.dialog_height
            && self.entities.len() == other.entities.len()
            && self.entities.iter().zip(&other.entities).all(|(a, b)| {
                a.name == b.name
                    && a.x == b.x
                    && a.y == b.y
                    && a.properties == b.properties
                    && a.queries.len() == b.queries.len()
                    && a.queries
                        .iter()
                        .zip(&b.queries)
                        .all(|(qa, qb)| qa.same_persisted_state(qb))
            })
    }
}
