mod support;

use entity_schema_core::{CommandType, DbType};
use entity_schema_discovery::{AnalysisError, SchemaAnalyzer};
use support::ScriptedDriver;

fn analyzer(driver: &ScriptedDriver) -> SchemaAnalyzer<ScriptedDriver> {
    SchemaAnalyzer::new(driver.clone(), "Server=test")
}

// ---------------------------------------------------------------------------
// Stored procedure listing
// ---------------------------------------------------------------------------

#[test]
fn test_lists_user_procedures_sorted() {
    let driver = ScriptedDriver::new();
    driver
        .procedure("PROCEDURE", "usp_Orders")
        .procedure("FUNCTION", "fn_Total")
        .procedure("PROCEDURE", "sp_helpdb")
        .procedure("PROCEDURE", "Customers")
        .procedure("PROCEDURE", "usp_Archive");

    let names = analyzer(&driver).list_stored_procedures().unwrap();
    assert_eq!(names, ["Customers", "usp_Archive", "usp_Orders"]);
    assert_eq!(driver.open_connections(), 0);
}

#[test]
fn test_listing_reports_connection_failure() {
    let driver = ScriptedDriver::new();
    driver.refuse_connections("Login failed for user 'app'.");

    let err = analyzer(&driver).list_stored_procedures().unwrap_err();
    assert_eq!(err.to_string(), "Login failed for user 'app'.");
}

// ---------------------------------------------------------------------------
// Stored procedure metadata
// ---------------------------------------------------------------------------

#[test]
fn test_procedure_parameters_in_ordinal_order() {
    let driver = ScriptedDriver::new();
    driver
        .parameter("usp_Orders", (2, "@count", "int", "INOUT"))
        .parameter("usp_Orders", (1, "@customerId", "bigint", "IN"))
        .returns(
            "usp_Orders",
            &[("OrderId", "int", false), ("Placed", "datetime", true)],
        );

    let metadata = analyzer(&driver)
        .get_metadata("usp_Orders", CommandType::StoredProcedure)
        .unwrap();

    let params: Vec<(&str, &str, DbType, bool)> = metadata
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.sys_type.as_str(), p.db_type, p.is_output))
        .collect();
    assert_eq!(
        params,
        [
            ("customerId", "long", DbType::Int64, false),
            ("count", "int", DbType::Int32, true),
        ]
    );

    assert_eq!(metadata.columns[1].sys_type, "DateTime?");

    let described = driver.described();
    assert_eq!(described.len(), 1);
    let bound: Vec<&str> = described[0].2.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(bound, ["customerId", "count"]);
}

#[test]
fn test_procedure_parameters_not_nullable_marked() {
    let driver = ScriptedDriver::new();
    driver
        .parameter("usp_Find", (1, "@born", "datetime", "IN"))
        .returns("usp_Find", &[]);

    let metadata = analyzer(&driver)
        .get_metadata("usp_Find", CommandType::StoredProcedure)
        .unwrap();
    assert_eq!(metadata.parameters[0].sys_type, "DateTime");
    assert!(metadata.columns.is_empty());
}

// ---------------------------------------------------------------------------
// SQL text metadata
// ---------------------------------------------------------------------------

#[test]
fn test_text_binds_placeholders_as_typed_nulls() {
    let sql = "SELECT Id, Name FROM Customer WHERE Id = @id /* dsl:int */ AND Name =@name";
    let driver = ScriptedDriver::new();
    driver.returns(sql, &[("Id", "int", false), ("Name", "nvarchar", true)]);

    let metadata = analyzer(&driver)
        .get_metadata(sql, CommandType::Text)
        .unwrap();

    assert_eq!(metadata.parameters.len(), 2);
    assert_eq!(metadata.parameters[0].sys_type, "int");
    assert_eq!(metadata.parameters[1].sys_type, "object");

    let described = driver.described();
    let bound: Vec<(&str, DbType)> = described[0]
        .2
        .iter()
        .map(|b| (b.name.as_str(), b.db_type))
        .collect();
    assert_eq!(bound, [("@id", DbType::Int32), ("@name", DbType::String)]);

    assert_eq!(metadata.columns[1].sys_type, "string");
    assert!(metadata.columns[1].is_nullable);
}

#[test]
fn test_columns_are_sanitized_and_deduplicated() {
    let sql = "SELECT 1, 2, a.Id, b.Id, [first name] FROM a JOIN b ON a.x = b.x";
    let driver = ScriptedDriver::new();
    driver.returns(
        sql,
        &[
            ("", "int", false),
            ("", "int", false),
            ("Id", "int", false),
            ("Id", "bigint", false),
            ("first name", "varchar", true),
        ],
    );

    let metadata = analyzer(&driver)
        .get_metadata(sql, CommandType::Text)
        .unwrap();
    let names: Vec<&str> = metadata.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Column1", "Column2", "Id", "Id1", "first_name"]);
    assert_eq!(metadata.columns[4].db_type, "AnsiString");
}

#[test]
fn test_driver_failure_carries_message() {
    let driver = ScriptedDriver::new();
    driver.fails("SELECT * FROM Nope", "Invalid object name 'Nope'.");

    let err = analyzer(&driver)
        .get_metadata("SELECT * FROM Nope", CommandType::Text)
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid object name 'Nope'.");
    assert!(matches!(err, AnalysisError::Driver(_)));
    assert_eq!(driver.open_connections(), 0);
}

#[test]
fn test_empty_command_is_rejected_without_connecting() {
    let driver = ScriptedDriver::new();
    let err = analyzer(&driver)
        .get_metadata("   ", CommandType::Text)
        .unwrap_err();
    assert_eq!(err, AnalysisError::EmptyCommand);
    assert_eq!(driver.connections(), 0);
}

#[test]
fn test_each_call_uses_its_own_connection() {
    let driver = ScriptedDriver::new();
    driver.returns("SELECT 1", &[("", "int", false)]);
    let analyzer = analyzer(&driver);

    analyzer.get_metadata("SELECT 1", CommandType::Text).unwrap();
    analyzer.get_metadata("SELECT 1", CommandType::Text).unwrap();
    analyzer.list_stored_procedures().unwrap();

    assert_eq!(driver.connections(), 3);
    assert_eq!(driver.open_connections(), 0);
}
