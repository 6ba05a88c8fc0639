use std::path::Path;

use entity_schema_core::{
    CommandType, ConnectionRegistry, DataModel, DbType, ExecuteMethod, Property, Query, SpParam,
};
use entity_schema_db::{ConnectionConfig, DocumentError, load, reload, save};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn two_entity_model() -> DataModel {
    let mut model = DataModel::new();
    model.connection.name = "Main".into();
    model.connection.connection_string = "app.db".into();

    let customer = model.add_entity("Customer", 20, 20).unwrap();
    customer.properties.push(Property::new("Id", "long", "Int64"));
    customer
        .properties
        .push(Property::new("Name", "string?", "String"));
    customer
        .add_query(
            Query::new(
                "GetByName",
                "SELECT Id, Name\n  FROM Customer\n WHERE Name = @name /* dsl:string */",
                CommandType::Text,
                ExecuteMethod::Reader,
            )
            .with_parameters(vec![SpParam::new("name", "string", DbType::String)]),
        )
        .unwrap();
    customer
        .add_query(Query::new(
            "Purge",
            "DELETE FROM Customer",
            CommandType::Text,
            ExecuteMethod::NonQuery,
        ))
        .unwrap();

    let order = model.add_entity("Order", 300, 40).unwrap();
    let mut proc = Query::new(
        "GetOrders",
        "usp_GetOrders",
        CommandType::StoredProcedure,
        ExecuteMethod::Reader,
    )
    .with_parameters(vec![
        SpParam::new("customerId", "long", DbType::Int64),
        SpParam::new("count", "int", DbType::Int32).output(),
    ]);
    proc.show_error = true;
    order.add_query(proc).unwrap();

    model
}

fn write_file(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn test_save_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.dsl");

    let model = two_entity_model();
    save(&model, &path).unwrap();
    let loaded = load(&path).unwrap();

    assert_eq!(loaded, model);
    assert!(loaded.same_persisted_state(&model));
}

#[test]
fn test_roundtrip_ignores_transient_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.dsl");

    let mut model = two_entity_model();
    model.entities[0].queries[0].show_ok = true;
    model.entities[0].queries[0].is_selected = true;
    model.connection_override = Some("override.db".into());
    save(&model, &path).unwrap();

    let loaded = load(&path).unwrap();
    assert!(loaded.same_persisted_state(&model));
    assert!(!loaded.entities[0].queries[0].show_ok);
    assert!(loaded.connection_override.is_none());
}

#[test]
fn test_multiline_command_text_survives() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.dsl");

    let model = two_entity_model();
    save(&model, &path).unwrap();

    let loaded = load(&path).unwrap();
    assert_eq!(
        loaded.entities[0].queries[0].command_text,
        "SELECT Id, Name\n  FROM Customer\n WHERE Name = @name /* dsl:string */"
    );
}

// ---------------------------------------------------------------------------
// Missing and broken documents
// ---------------------------------------------------------------------------

#[test]
fn test_missing_document_gives_fresh_model() {
    let dir = tempfile::tempdir().unwrap();
    let model = load(dir.path().join("absent.dsl")).unwrap();
    assert_eq!(model, DataModel::new());
}

#[test]
fn test_parse_failure_preserves_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.dsl");
    write_file(&path, "<DsLight><Entities><Entity name=");

    let mut model = two_entity_model();
    let before = model.clone();
    let err = reload(&mut model, &path).unwrap_err();

    assert!(matches!(err, DocumentError::XmlParseError(_)));
    assert_eq!(model, before);
}

#[test]
fn test_reload_keeps_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.dsl");
    save(&two_entity_model(), &path).unwrap();

    let mut model = DataModel::new();
    model.connection_override = Some("override.db".into());
    reload(&mut model, &path).unwrap();

    assert_eq!(model.entities.len(), 2);
    assert_eq!(model.connection_override.as_deref(), Some("override.db"));
}

#[test]
fn test_reads_document_without_optional_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("minimal.dsl");
    write_file(
        &path,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<DsLight version="1.0">
  <Entities>
    <Entity name="Customer" x="1" y="2">
      <Queries>
        <Query name="GetAll" method="Reader" command="SELECT * FROM Customer" type="Text" />
      </Queries>
    </Entity>
  </Entities>
</DsLight>"#,
    );

    let model = load(&path).unwrap();
    assert_eq!(model.dialog_width, 406);
    assert_eq!(model.dialog_height, 371);
    assert!(model.connection.name.is_empty());
    assert!(model.entities[0].properties.is_empty());
    assert_eq!(model.entities[0].queries[0].name, "GetAll");
}

#[test]
fn test_unrepresentable_character_fails_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers.dsl");
    let mut model = two_entity_model();
    save(&model, &path).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    model.entities[0].queries[1].command_text = "SELECT 1 -- \u{1}".into();
    let err = entity_schema_db::write_document(&model).unwrap_err();
    assert!(matches!(err, DocumentError::XmlWriteError(_)));
    assert!(err.to_string().contains("U+0001"));

    let err = save(&model, &path).unwrap_err();
    assert!(matches!(err, DocumentError::XmlWriteError(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

    model.entities[0].queries[1].command_text = "SELECT '\u{FFFE}'".into();
    assert!(save(&model, &path).is_err());
    assert!(load(&path).is_ok());
}

// ---------------------------------------------------------------------------
// Connection registry
// ---------------------------------------------------------------------------

#[test]
fn test_registry_feeds_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("connections.yml");

    let mut config = ConnectionConfig::default();
    config.add_connection_string("Main", "registry.db");
    config.save(&path).unwrap();

    let config = ConnectionConfig::load(&path).unwrap();
    let model = two_entity_model();
    assert_eq!(
        model.resolve_connection_string(&config).as_deref(),
        Some("registry.db")
    );
}
