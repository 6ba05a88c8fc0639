//! Model type definitions for entities, their columns and their queries.
//!
//! The types here are plain data. Mutations that must keep an invariant
//! (unique names, column replacement, reader-query removal) go through the
//! methods on [`Entity`] and [`DataModel`](crate::DataModel) or through the
//! functions in the `compat` module.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming::make_safe_name;
use crate::typemap::NULLABLE_MARKER;

/// Version written to the root element of every persisted document.
pub const DOCUMENT_VERSION: &str = "1.0";

/// A stored string that does not name a known variant.
///
/// Returned by the [`FromStr`] implementations of [`DbType`],
/// [`CommandType`] and [`ExecuteMethod`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseValueError {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

impl ParseValueError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Canonical, database-portable type used to bind parameters and tag columns.
///
/// The variant names are also the persisted string form.
///
/// # Examples
///
/// ```
/// use entity_schema_core::DbType;
///
/// let parsed: DbType = "Int32".parse().unwrap();
/// assert_eq!(parsed, DbType::Int32);
/// assert_eq!(DbType::AnsiStringFixedLength.to_string(), "AnsiStringFixedLength");
/// assert!("Int33".parse::<DbType>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DbType {
    AnsiString,
    Binary,
    Byte,
    Boolean,
    Currency,
    Date,
    DateTime,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    Object,
    SByte,
    Single,
    #[default]
    String,
    Time,
    UInt16,
    UInt32,
    UInt64,
    VarNumeric,
    AnsiStringFixedLength,
    StringFixedLength,
    Xml,
    DateTime2,
    DateTimeOffset,
}

impl DbType {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 27] = [
        Self::AnsiString,
        Self::Binary,
        Self::Byte,
        Self::Boolean,
        Self::Currency,
        Self::Date,
        Self::DateTime,
        Self::Decimal,
        Self::Double,
        Self::Guid,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Object,
        Self::SByte,
        Self::Single,
        Self::String,
        Self::Time,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::VarNumeric,
        Self::AnsiStringFixedLength,
        Self::StringFixedLength,
        Self::Xml,
        Self::DateTime2,
        Self::DateTimeOffset,
    ];

    /// Returns the persisted name of this type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnsiString => "AnsiString",
            Self::Binary => "Binary",
            Self::Byte => "Byte",
            Self::Boolean => "Boolean",
            Self::Currency => "Currency",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::Decimal => "Decimal",
            Self::Double => "Double",
            Self::Guid => "Guid",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Object => "Object",
            Self::SByte => "SByte",
            Self::Single => "Single",
            Self::String => "String",
            Self::Time => "Time",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::VarNumeric => "VarNumeric",
            Self::AnsiStringFixedLength => "AnsiStringFixedLength",
            Self::StringFixedLength => "StringFixedLength",
            Self::Xml => "Xml",
            Self::DateTime2 => "DateTime2",
            Self::DateTimeOffset => "DateTimeOffset",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbType {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseValueError::new("db type", s))
    }
}

/// How a query's command text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CommandType {
    /// Ad-hoc SQL statement.
    #[default]
    Text,
    /// Name of a stored procedure.
    StoredProcedure,
}

impl CommandType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::StoredProcedure => "StoredProcedure",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Text" => Ok(Self::Text),
            "StoredProcedure" => Ok(Self::StoredProcedure),
            other => Err(ParseValueError::new("command type", other)),
        }
    }
}

/// How a query is executed by generated code.
///
/// Only [`Reader`](ExecuteMethod::Reader) queries return rows that must
/// match the owning entity's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExecuteMethod {
    #[default]
    Reader,
    Scalar,
    NonQuery,
}

impl ExecuteMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reader => "Reader",
            Self::Scalar => "Scalar",
            Self::NonQuery => "NonQuery",
        }
    }
}

impl fmt::Display for ExecuteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecuteMethod {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Reader" => Ok(Self::Reader),
            "Scalar" => Ok(Self::Scalar),
            "NonQuery" => Ok(Self::NonQuery),
            other => Err(ParseValueError::new("execute method", other)),
        }
    }
}

/// A parameter of a SQL statement or stored procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpParam {
    /// Parameter name without the `@` sigil.
    pub name: String,
    /// Host type name (e.g. `int`, `string?`, `object`).
    pub sys_type: String,
    /// Canonical type used when binding.
    pub db_type: DbType,
    /// Whether the parameter is bidirectional.
    pub is_output: bool,
}

impl SpParam {
    pub fn new(name: &str, sys_type: &str, db_type: DbType) -> Self {
        Self {
            name: name.to_string(),
            sys_type: sys_type.to_string(),
            db_type,
            is_output: false,
        }
    }

    /// Marks the parameter as an output parameter.
    pub fn output(mut self) -> Self {
        self.is_output = true;
        self
    }
}

/// One result column reported by schema analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub sys_type: String,
    /// Canonical type in its string form.
    pub db_type: String,
    pub is_nullable: bool,
}

impl Column {
    pub fn new(name: &str, sys_type: &str, db_type: DbType) -> Self {
        Self {
            name: name.to_string(),
            sys_type: sys_type.to_string(),
            db_type: db_type.to_string(),
            is_nullable: sys_type.ends_with(NULLABLE_MARKER),
        }
    }
}

/// Parameters and result columns of one analyzed command.
///
/// Produced fresh by every analysis call and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub parameters: Vec<SpParam>,
    pub columns: Vec<Column>,
}

/// A typed column declared on an entity.
///
/// # Examples
///
/// ```
/// use entity_schema_core::Property;
///
/// let id = Property::new("Id", "int", "Int32");
/// assert!(!id.is_nullable());
///
/// let born = Property::new("Born", "DateTime?", "DateTime");
/// assert!(born.is_nullable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    /// Host type name, suffixed with `?` when nullable.
    pub type_name: String,
    /// Canonical type in its string form.
    pub db_type: String,
}

impl Property {
    pub fn new(name: &str, type_name: &str, db_type: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            db_type: db_type.to_string(),
        }
    }

    /// Builds the property that exactly describes `column`.
    pub fn from_column(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            type_name: column.sys_type.clone(),
            db_type: column.db_type.clone(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.type_name.ends_with(NULLABLE_MARKER)
    }
}

/// A SQL statement or stored-procedure call bound to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Method name for the generated code; unique within the entity.
    pub name: String,
    pub command_text: String,
    pub command_type: CommandType,
    pub execute_method: ExecuteMethod,
    pub parameters: Vec<SpParam>,
    /// The last analysis of this query failed or its result no longer fits
    /// the entity. Persisted.
    #[serde(default)]
    pub show_error: bool,
    /// The last analysis succeeded. Cleared by the presentation layer.
    #[serde(skip)]
    pub show_ok: bool,
    #[serde(skip)]
    pub is_selected: bool,
}

impl Query {
    /// Creates a query; `name` is passed through
    /// [`make_safe_name`](crate::make_safe_name).
    pub fn new(
        name: &str,
        command_text: &str,
        command_type: CommandType,
        execute_method: ExecuteMethod,
    ) -> Self {
        Self {
            name: make_safe_name(name),
            command_text: command_text.to_string(),
            command_type,
            execute_method,
            parameters: Vec::new(),
            show_error: false,
            show_ok: false,
            is_selected: false,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<SpParam>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn is_reader(&self) -> bool {
        self.execute_method == ExecuteMethod::Reader
    }

    /// Flags the query as passing its last check.
    pub fn mark_ok(&mut self) {
        self.show_error = false;
        self.show_ok = true;
    }

    /// Flags the query as failing its last check.
    pub fn mark_error(&mut self) {
        self.show_error = true;
        self.show_ok = false;
    }

    /// Two queries are equal for persistence purposes when everything except
    /// the presentation-only flags matches.
    pub fn same_persisted_state(&self, other: &Self) -> bool {
        self.name == other.name
            && self.command_text == other.command_text
            && self.command_type == other.command_type
            && self.execute_method == other.execute_method
            && self.parameters == other.parameters
            && self.show_error == other.show_error
    }
}

/// A named record shape with its columns and the queries that fill it.
///
/// # Examples
///
/// ```
/// use entity_schema_core::{CommandType, Entity, ExecuteMethod, Query};
///
/// let mut entity = Entity::new("1st customer");
/// assert_eq!(entity.name, "_1st_customer");
///
/// entity
///     .add_query(Query::new("GetAll", "SELECT 1", CommandType::Text, ExecuteMethod::Reader))
///     .unwrap();
/// let duplicate = Query::new("GetAll", "SELECT 2", CommandType::Text, ExecuteMethod::Reader);
/// assert!(entity.add_query(duplicate).is_err());
/// assert!(entity.has_reader_query());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub properties: Vec<Property>,
    pub queries: Vec<Query>,
}

impl Entity {
    /// Creates an empty entity; `name` is sanitized.
    pub fn new(name: &str) -> Self {
        Self {
            name: make_safe_name(name),
            ..Self::default()
        }
    }

    /// Sets the layout position.
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn query_index(&self, name: &str) -> Option<usize> {
        self.queries.iter().position(|q| q.name == name)
    }

    pub fn query(&self, name: &str) -> Option<&Query> {
        self.queries.iter().find(|q| q.name == name)
    }

    pub fn query_mut(&mut self, name: &str) -> Option<&mut Query> {
        self.queries.iter_mut().find(|q| q.name == name)
    }

    pub fn reader_queries(&self) -> impl Iterator<Item = &Query> {
        self.queries.iter().filter(|q| q.is_reader())
    }

    pub fn has_reader_query(&self) -> bool {
        self.queries.iter().any(Query::is_reader)
    }

    /// Appends a query, rejecting a name already used by a sibling.
    pub fn add_query(&mut self, query: Query) -> crate::Result<&mut Query> {
        if self.query_index(&query.name).is_some() {
            return Err(crate::ModelError::DuplicateQuery {
                entity: self.name.clone(),
                query: query.name,
            });
        }
        self.queries.push(query);
        let last = self.queries.len() - 1;
        Ok(&mut self.queries[last])
    }

    /// Removes the query at `index`.
    ///
    /// When no reader query remains afterwards the entity's columns become
    /// undefined and its properties are cleared.
    pub fn remove_query(&mut self, index: usize) -> Option<Query> {
        if index >= self.queries.len() {
            return None;
        }
        let removed = self.queries.remove(index);
        if !self.has_reader_query() {
            self.properties.clear();
        }
        Some(removed)
    }

    /// Renames a query.
    ///
    /// The new name is sanitized first. Returns `false` and keeps the old
    /// name when the query does not exist or a sibling already uses the
    /// new name.
    pub fn rename_query(&mut self, current: &str, new_name: &str) -> bool {
        let new_name = make_safe_name(new_name);
        if new_name == current || self.query_index(&new_name).is_some() {
            return false;
        }
        match self.query_mut(current) {
            Some(query) => {
                query.name = new_name;
                true
            }
            None => false,
        }
    }
}
