//! XML persistence of a [`DataModel`].
//!
//! The document layout is:
//!
//! ```text
//! DsLight(version="1.0")
//!   ConnectionString(name, connectionString, storage="webconfig"|"settings")
//!   AddQueryDialog(width, height)
//!   Entities
//!     Entity(name, x, y)
//!       Properties
//!         Property(type, name, dbType)*
//!       Queries
//!         Query(name, method, command, type, error?)*
//!           Parameters
//!             Parameter(name, dbType, sysType, output?)*
//! ```
//!
//! `error` and `output` are presence flags. Presentation-only query flags
//! are never written.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use entity_schema_core::{
    ConnectionSettings, ConnectionStorage, DOCUMENT_VERSION, DataModel, Entity, Property, Query,
    SpParam,
};
use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use roxmltree::Node;
use tracing::{debug, info};

use crate::error::{DocumentError, Result};

const ROOT: &str = "DsLight";

/// Parses a document from its XML text.
///
/// Names are taken verbatim; they are not re-sanitized.
///
/// # Errors
///
/// Returns [`XmlParseError`](DocumentError::XmlParseError) for malformed XML,
/// [`UnexpectedRoot`](DocumentError::UnexpectedRoot) when the root is not
/// `DsLight`, and [`MissingAttribute`](DocumentError::MissingAttribute) or
/// [`InvalidValue`](DocumentError::InvalidValue) for incomplete elements.
///
/// # Examples
///
/// ```
/// use entity_schema_db::read_document;
///
/// let model = read_document(
///     r#"<DsLight version="1.0">
///          <Entities>
///            <Entity name="Customer" x="10" y="20" />
///          </Entities>
///        </DsLight>"#,
/// )
/// .unwrap();
/// assert_eq!(model.entities[0].name, "Customer");
/// assert_eq!(model.dialog_width, 406);
/// ```
pub fn read_document(content: &str) -> Result<DataModel> {
    let doc = roxmltree::Document::parse(content)?;
    let root = doc.root_element();
    if !root.has_tag_name(ROOT) {
        return Err(DocumentError::UnexpectedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let mut model = DataModel::new();

    if let Some(node) = elements(root, "ConnectionString").next() {
        model.connection = ConnectionSettings {
            name: node.attribute("name").unwrap_or_default().to_string(),
            connection_string: node
                .attribute("connectionString")
                .unwrap_or_default()
                .to_string(),
            storage: match node.attribute("storage") {
                Some("webconfig") => ConnectionStorage::WebConfig,
                _ => ConnectionStorage::Settings,
            },
        };
    }

    if let Some(node) = elements(root, "AddQueryDialog").next() {
        if node.attribute("width").is_some() {
            model.dialog_width = parsed(node, "AddQueryDialog", "width")?;
        }
        if node.attribute("height").is_some() {
            model.dialog_height = parsed(node, "AddQueryDialog", "height")?;
        }
    }

    for entities in elements(root, "Entities") {
        for node in elements(entities, "Entity") {
            model.entities.push(read_entity(node)?);
        }
    }

    Ok(model)
}

fn read_entity(node: Node<'_, '_>) -> Result<Entity> {
    let mut entity = Entity {
        name: required(node, "Entity", "name")?,
        x: parsed(node, "Entity", "x")?,
        y: parsed(node, "Entity", "y")?,
        ..Entity::default()
    };

    for properties in elements(node, "Properties") {
        for prop in elements(properties, "Property") {
            entity.properties.push(Property {
                name: required(prop, "Property", "name")?,
                type_name: required(prop, "Property", "type")?,
                db_type: required(prop, "Property", "dbType")?,
            });
        }
    }

    for queries in elements(node, "Queries") {
        for query in elements(queries, "Query") {
            entity.queries.push(read_query(query)?);
        }
    }

    Ok(entity)
}

fn read_query(node: Node<'_, '_>) -> Result<Query> {
    let mut query = Query::new(
        "",
        &required(node, "Query", "command")?,
        parsed(node, "Query", "type")?,
        parsed(node, "Query", "method")?,
    );
    query.name = required(node, "Query", "name")?;
    query.show_error = node.attribute("error").is_some();

    for params in elements(node, "Parameters") {
        for param in elements(params, "Parameter") {
            query.parameters.push(SpParam {
                name: required(param, "Parameter", "name")?,
                sys_type: required(param, "Parameter", "sysType")?,
                db_type: parsed(param, "Parameter", "dbType")?,
                is_output: param.attribute("output").is_some(),
            });
        }
    }

    Ok(query)
}

fn elements<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.has_tag_name(tag))
}

fn required(node: Node<'_, '_>, element: &'static str, attribute: &'static str) -> Result<String> {
    node.attribute(attribute)
        .map(str::to_string)
        .ok_or(DocumentError::MissingAttribute { element, attribute })
}

fn parsed<T: FromStr>(
    node: Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<T> {
    let raw = required(node, element, attribute)?;
    raw.parse().map_err(|_| DocumentError::InvalidValue {
        element,
        attribute,
        value: raw,
    })
}

/// Serializes the model to indented XML.
///
/// # Errors
///
/// Returns [`XmlWriteError`](DocumentError::XmlWriteError) if a value holds
/// a character XML cannot represent, or if the writer fails.
pub fn write_document(model: &DataModel) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let mut root = BytesStart::new(ROOT);
    push(&mut root, "version", DOCUMENT_VERSION)?;
    write(&mut writer, Event::Start(root))?;

    let mut connection = BytesStart::new("ConnectionString");
    push(&mut connection, "name", &model.connection.name)?;
    push(
        &mut connection,
        "connectionString",
        &model.connection.connection_string,
    )?;
    push(&mut connection, "storage", model.connection.storage.as_str())?;
    write(&mut writer, Event::Empty(connection))?;

    let mut dialog = BytesStart::new("AddQueryDialog");
    push(&mut dialog, "width", &model.dialog_width.to_string())?;
    push(&mut dialog, "height", &model.dialog_height.to_string())?;
    write(&mut writer, Event::Empty(dialog))?;

    open(&mut writer, "Entities")?;
    for entity in &model.entities {
        write_entity(&mut writer, entity)?;
    }
    close(&mut writer, "Entities")?;

    close(&mut writer, ROOT)?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| DocumentError::XmlWriteError(e.to_string()))
}

fn write_entity(writer: &mut Writer<Vec<u8>>, entity: &Entity) -> Result<()> {
    let mut node = BytesStart::new("Entity");
    push(&mut node, "name", &entity.name)?;
    push(&mut node, "x", &entity.x.to_string())?;
    push(&mut node, "y", &entity.y.to_string())?;
    write(writer, Event::Start(node))?;

    open(writer, "Properties")?;
    for prop in &entity.properties {
        let mut node = BytesStart::new("Property");
        push(&mut node, "type", &prop.type_name)?;
        push(&mut node, "name", &prop.name)?;
        push(&mut node, "dbType", &prop.db_type)?;
        write(writer, Event::Empty(node))?;
    }
    close(writer, "Properties")?;

    open(writer, "Queries")?;
    for query in &entity.queries {
        let mut node = BytesStart::new("Query");
        push(&mut node, "name", &query.name)?;
        push(&mut node, "method", query.execute_method.as_str())?;
        push(&mut node, "command", &query.command_text)?;
        push(&mut node, "type", query.command_type.as_str())?;
        if query.show_error {
            push(&mut node, "error", "error")?;
        }
        write(writer, Event::Start(node))?;

        open(writer, "Parameters")?;
        for param in &query.parameters {
            let mut node = BytesStart::new("Parameter");
            push(&mut node, "name", &param.name)?;
            push(&mut node, "dbType", param.db_type.as_str())?;
            push(&mut node, "sysType", &param.sys_type)?;
            if param.is_output {
                push(&mut node, "output", "output")?;
            }
            write(writer, Event::Empty(node))?;
        }
        close(writer, "Parameters")?;

        close(writer, "Query")?;
    }
    close(writer, "Queries")?;

    close(writer, "Entity")
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| DocumentError::XmlWriteError(e.to_string()))
}

fn open(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(name)))
}

fn close(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    write(writer, Event::End(BytesEnd::new(name)))
}

/// Adds an attribute whose line breaks and tabs survive re-parsing.
///
/// Parsers normalize literal whitespace in attribute values to spaces, so
/// multi-line command text is written with character references. Characters
/// XML 1.0 cannot carry at all are rejected.
fn push(element: &mut BytesStart<'_>, key: &str, value: &str) -> Result<()> {
    if let Some(c) = value.chars().find(|&c| !is_xml_char(c)) {
        return Err(DocumentError::XmlWriteError(format!(
            "attribute '{key}' contains U+{:04X}, which XML cannot represent",
            u32::from(c)
        )));
    }

    let escaped = quick_xml::escape::escape(value)
        .replace('\r', "&#xD;")
        .replace('\n', "&#xA;")
        .replace('\t', "&#x9;");
    element.push_attribute(Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(escaped.into_bytes()),
    });
    Ok(())
}

/// The `Char` production of XML 1.0.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t'
            | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Loads the document at `path`.
///
/// A missing file yields a fresh, empty model.
///
/// # Errors
///
/// Returns [`IoError`](DocumentError::IoError) when the file exists but
/// cannot be read, and any error of [`read_document`].
pub fn load(path: impl AsRef<Path>) -> Result<DataModel> {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "document not found, starting empty");
            return Ok(DataModel::new());
        }
        Err(e) => return Err(e.into()),
    };

    let model = read_document(&content)?;
    info!(
        path = %path.display(),
        entities = model.entities.len(),
        "loaded document"
    );
    Ok(model)
}

/// Replaces `model` with the document at `path`.
///
/// The connection override carries over. On error `model` is left exactly
/// as it was.
pub fn reload(model: &mut DataModel, path: impl AsRef<Path>) -> Result<()> {
    let mut fresh = load(path)?;
    fresh.connection_override = model.connection_override.take();
    *model = fresh;
    Ok(())
}

/// Writes the model to `path`, replacing any existing file.
pub fn save(model: &DataModel, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let content = write_document(model)?;
    std::fs::write(path, content)?;
    info!(
        path = %path.display(),
        entities = model.entities.len(),
        "saved document"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_schema_core::{CommandType, DbType, ExecuteMethod};

    fn sample() -> DataModel {
        let mut model = DataModel::new();
        model.connection = ConnectionSettings {
            name: "Main".into(),
            connection_string: "Data Source=app.db".into(),
            storage: ConnectionStorage::WebConfig,
        };
        model.dialog_width = 500;

        let entity = model.add_entity("Customer", 15, -4).unwrap();
        entity.properties.push(Property::new("Id", "int", "Int32"));
        entity
            .properties
            .push(Property::new("Name", "string?", "String"));

        let mut query = Query::new(
            "GetById",
            "SELECT Id, Name\nFROM Customer\r\nWHERE Id = @id AND Name <> '\"x\"'",
            CommandType::Text,
            ExecuteMethod::Reader,
        )
        .with_parameters(vec![
            SpParam::new("id", "int", DbType::Int32),
            SpParam::new("total", "decimal", DbType::Decimal).output(),
        ]);
        query.show_error = true;
        entity.add_query(query).unwrap();
        model
    }

    #[test]
    fn test_write_then_read_is_equal() {
        let model = sample();
        let xml = write_document(&model).unwrap();
        let back = read_document(&xml).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_flags_are_presence_attributes() {
        let xml = write_document(&sample()).unwrap();
        assert!(xml.contains(r#"error="error""#));
        assert!(xml.contains(r#"output="output""#));
        assert!(xml.contains(r#"storage="webconfig""#));
        assert!(xml.contains(r#"<DsLight version="1.0">"#));
        assert!(xml.contains("&#xA;"));
    }

    #[test]
    fn test_transient_flags_not_written() {
        let mut model = sample();
        let query = &mut model.entities[0].queries[0];
        query.show_error = false;
        query.show_ok = true;
        query.is_selected = true;

        let back = read_document(&write_document(&model).unwrap()).unwrap();
        let query = &back.entities[0].queries[0];
        assert!(!query.show_error);
        assert!(!query.show_ok);
        assert!(!query.is_selected);
    }

    #[test]
    fn test_unknown_storage_means_settings() {
        let model = read_document(
            r#"<DsLight version="1.0"><ConnectionString name="a" connectionString="b" storage="other"/></DsLight>"#,
        )
        .unwrap();
        assert_eq!(model.connection.storage, ConnectionStorage::Settings);
        assert_eq!(model.connection.name, "a");
    }

    #[test]
    fn test_missing_attribute_is_reported() {
        let err = read_document(
            r#"<DsLight><Entities><Entity name="A" x="1"/></Entities></DsLight>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DocumentError::MissingAttribute {
                element: "Entity",
                attribute: "y"
            }
        ));
    }

    #[test]
    fn test_invalid_enum_value_is_reported() {
        let err = read_document(
            r#"<DsLight><Entities><Entity name="A" x="1" y="2"><Queries>
                 <Query name="Q" method="Stream" command="SELECT 1" type="Text"/>
               </Queries></Entity></Entities></DsLight>"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "<Query> has an invalid 'method' value: Stream"
        );
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let err = read_document("<Model/>").unwrap_err();
        assert!(matches!(err, DocumentError::UnexpectedRoot(name) if name == "Model"));
    }

    #[test]
    fn test_names_are_not_resanitized() {
        let model = read_document(
            r#"<DsLight><Entities><Entity name="my entity" x="0" y="0"/></Entities></DsLight>"#,
        )
        .unwrap();
        assert_eq!(model.entities[0].name, "my entity");
    }
}
