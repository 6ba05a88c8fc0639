use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use entity_schema_core::{
    CommandType, ConnectionRegistry, DataModel, Discrepancy, ExecuteMethod, check_compatibility,
    validate_model,
};
use entity_schema_db::ConnectionConfig;
use entity_schema_discovery::output::{
    OutputFormat, format_discrepancies, format_metadata, format_procedures, format_report,
};
use entity_schema_discovery::{QueryDraft, ReconcileReport, Reconciler, SchemaAnalyzer};
use entity_schema_sqlite::SqliteDriver;

const DEFAULT_CONFIG: &str = "connections.yaml";

/// CLI-specific command type enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliCommandType {
    Text,
    StoredProcedure,
}

impl From<CliCommandType> for CommandType {
    fn from(value: CliCommandType) -> Self {
        match value {
            CliCommandType::Text => Self::Text,
            CliCommandType::StoredProcedure => Self::StoredProcedure,
        }
    }
}

/// CLI-specific execute method enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliExecuteMethod {
    Reader,
    Scalar,
    NonQuery,
}

impl From<CliExecuteMethod> for ExecuteMethod {
    fn from(value: CliExecuteMethod) -> Self {
        match value {
            CliExecuteMethod::Reader => Self::Reader,
            CliExecuteMethod::Scalar => Self::Scalar,
            CliExecuteMethod::NonQuery => Self::NonQuery,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "entity-schema")]
#[command(about = "Inspect SQLite schemas and keep entity documents in sync with their queries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the stored procedures of a database.
    Procs(ProcsArgs),
    /// Describe the parameters and result columns of a command.
    Describe(DescribeArgs),
    /// Check whether a command's result fits an entity.
    Check(CheckArgs),
    /// Report structural problems in a document.
    Validate(ValidateArgs),
    /// Add an empty entity to a document.
    AddEntity(AddEntityArgs),
    /// Add a query to an entity.
    AddQuery(AddQueryArgs),
    /// Change a query's name, command or kind and re-analyze it.
    EditQuery(EditQueryArgs),
    /// Re-analyze one query or every query of an entity.
    Refresh(RefreshArgs),
    /// Remove a query from an entity.
    DeleteQuery(DeleteQueryArgs),
    /// Manage the named connection strings.
    Connections(ConnectionsArgs),
}

#[derive(Debug, Args)]
struct ConnectionArgs {
    /// Connection string that wins over the document and the registry.
    #[arg(long)]
    connection: Option<String>,
    /// Connection registry YAML file.
    #[arg(long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct ProcsArgs {
    /// Document whose connection is used.
    #[arg(long)]
    document: Option<PathBuf>,
    #[command(flatten)]
    conn: ConnectionArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct DescribeArgs {
    /// SQL text or stored procedure name.
    command_text: String,
    /// How the command text is interpreted.
    #[arg(long, default_value = "text")]
    command_type: CliCommandType,
    /// Document whose connection is used.
    #[arg(long)]
    document: Option<PathBuf>,
    #[command(flatten)]
    conn: ConnectionArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Document file.
    document: PathBuf,
    /// Entity to check against.
    #[arg(long)]
    entity: String,
    /// SQL text or stored procedure name.
    command_text: String,
    /// How the command text is interpreted.
    #[arg(long, default_value = "text")]
    command_type: CliCommandType,
    /// Stop at the first discrepancy.
    #[arg(long)]
    first_only: bool,
    #[command(flatten)]
    conn: ConnectionArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Document file.
    document: PathBuf,
}

#[derive(Debug, Args)]
struct AddEntityArgs {
    /// Document file. Created when missing.
    document: PathBuf,
    /// Entity name.
    name: String,
    /// Horizontal position on the design surface.
    #[arg(long, default_value_t = 0)]
    x: i32,
    /// Vertical position on the design surface.
    #[arg(long, default_value_t = 0)]
    y: i32,
}

#[derive(Debug, Args)]
struct AddQueryArgs {
    /// Document file.
    document: PathBuf,
    /// Entity receiving the query.
    #[arg(long)]
    entity: String,
    /// Query name.
    #[arg(long)]
    name: String,
    /// SQL text or stored procedure name.
    command_text: String,
    /// How the command text is interpreted.
    #[arg(long, default_value = "text")]
    command_type: CliCommandType,
    /// How the query is executed.
    #[arg(long, default_value = "reader")]
    execute_method: CliExecuteMethod,
    /// Replace the entity columns without asking when the result does not fit.
    #[arg(long)]
    yes: bool,
    #[command(flatten)]
    conn: ConnectionArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct EditQueryArgs {
    /// Document file.
    document: PathBuf,
    /// Entity owning the query.
    #[arg(long)]
    entity: String,
    /// Query to edit.
    #[arg(long)]
    query: String,
    /// New query name.
    #[arg(long)]
    name: Option<String>,
    /// New SQL text or stored procedure name.
    #[arg(long)]
    command_text: Option<String>,
    /// New command type.
    #[arg(long)]
    command_type: Option<CliCommandType>,
    /// New execute method.
    #[arg(long)]
    execute_method: Option<CliExecuteMethod>,
    #[command(flatten)]
    conn: ConnectionArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct RefreshArgs {
    /// Document file.
    document: PathBuf,
    /// Entity to refresh.
    #[arg(long)]
    entity: String,
    /// Only refresh this query.
    #[arg(long)]
    query: Option<String>,
    #[command(flatten)]
    conn: ConnectionArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct DeleteQueryArgs {
    /// Document file.
    document: PathBuf,
    /// Entity owning the query.
    #[arg(long)]
    entity: String,
    /// Query to delete.
    #[arg(long)]
    query: String,
}

#[derive(Debug, Args)]
struct ConnectionsArgs {
    /// Connection registry YAML file.
    #[arg(long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    #[command(subcommand)]
    operation: ConnectionsOperation,
}

#[derive(Debug, Subcommand)]
enum ConnectionsOperation {
    /// List registered connection strings.
    List,
    /// Register a new connection string. Existing names are left alone.
    Add { name: String, connection_string: String },
    /// Replace the value of a registered connection string.
    Update { name: String, connection_string: String },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Procs(args) => run_procs(args),
        Command::Describe(args) => run_describe(args),
        Command::Check(args) => run_check(args),
        Command::Validate(args) => run_validate(args),
        Command::AddEntity(args) => run_add_entity(args),
        Command::AddQuery(args) => run_add_query(args),
        Command::EditQuery(args) => run_edit_query(args),
        Command::Refresh(args) => run_refresh(args),
        Command::DeleteQuery(args) => run_delete_query(args),
        Command::Connections(args) => run_connections(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_procs(args: ProcsArgs) -> Result<(), String> {
    let model = match &args.document {
        Some(path) => load_document(path)?,
        None => DataModel::new(),
    };
    let analyzer = open_analyzer(model, &args.conn)?;
    let names = analyzer
        .list_stored_procedures()
        .map_err(|e| e.to_string())?;
    print!("{}", format_procedures(&names, args.format)?);
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<(), String> {
    let model = match &args.document {
        Some(path) => load_document(path)?,
        None => DataModel::new(),
    };
    let analyzer = open_analyzer(model, &args.conn)?;
    let metadata = analyzer
        .get_metadata(&args.command_text, args.command_type.into())
        .map_err(|e| e.to_string())?;
    print!("{}", format_metadata(&metadata, args.format)?);
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let model = load_document(&args.document)?;
    let entity = model
        .entity(&args.entity)
        .cloned()
        .ok_or_else(|| format!("entity not found: {}", args.entity))?;
    let analyzer = open_analyzer(model, &args.conn)?;
    let metadata = analyzer
        .get_metadata(&args.command_text, args.command_type.into())
        .map_err(|e| e.to_string())?;

    let found = check_compatibility(&entity, &metadata, args.first_only);
    if found.is_empty() {
        println!("compatible with entity '{}'", entity.name);
        return Ok(());
    }
    print!("{}", format_discrepancies(&found, args.format)?);
    Err(format!(
        "{} discrepancy(ies) with entity '{}'",
        found.len(),
        entity.name
    ))
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let model = load_document(&args.document)?;
    let problems = validate_model(&model);
    if problems.is_empty() {
        println!(
            "Validated {} entity(ies) in '{}'.",
            model.entities.len(),
            args.document.display()
        );
        return Ok(());
    }
    for problem in &problems {
        println!("{problem}");
    }
    Err(format!("{} problem(s) found", problems.len()))
}

fn run_add_entity(args: AddEntityArgs) -> Result<(), String> {
    let mut model = load_document(&args.document)?;
    let name = model
        .add_entity(&args.name, args.x, args.y)
        .map_err(|e| e.to_string())?
        .name
        .clone();
    save_document(&model, &args.document)?;
    println!("Added entity '{name}'.");
    Ok(())
}

fn run_add_query(args: AddQueryArgs) -> Result<(), String> {
    let mut model = load_document(&args.document)?;
    let mut entity = take_entity(&model, &args.entity)?;
    let analyzer = open_analyzer(model.clone(), &args.conn)?;
    let reconciler = Reconciler::new(&analyzer);

    let draft = QueryDraft::new(
        &args.name,
        &args.command_text,
        args.command_type.into(),
        args.execute_method.into(),
    );
    let yes = args.yes;
    let report = reconciler
        .add_query(&mut entity, draft, |query, found| {
            yes || confirm_replace(query, found)
        })
        .map_err(|e| e.to_string())?;

    print!("{}", format_report(&report, args.format)?);
    if report.accepted {
        store_entity(&mut model, entity)?;
        save_document(&model, &args.document)?;
    }
    Ok(())
}

fn run_edit_query(args: EditQueryArgs) -> Result<(), String> {
    let mut model = load_document(&args.document)?;
    let mut entity = take_entity(&model, &args.entity)?;
    let current = entity
        .query(&args.query)
        .ok_or_else(|| format!("query '{}' not found in entity '{}'", args.query, entity.name))?;

    let draft = QueryDraft {
        name: args.name.unwrap_or_else(|| current.name.clone()),
        command_text: args
            .command_text
            .unwrap_or_else(|| current.command_text.clone()),
        command_type: args
            .command_type
            .map_or(current.command_type, CommandType::from),
        execute_method: args
            .execute_method
            .map_or(current.execute_method, ExecuteMethod::from),
    };

    let analyzer = open_analyzer(model.clone(), &args.conn)?;
    let report = Reconciler::new(&analyzer)
        .edit_query(&mut entity, &args.query, draft)
        .map_err(|e| e.to_string())?;

    print!("{}", format_report(&report, args.format)?);
    store_entity(&mut model, entity)?;
    save_document(&model, &args.document)
}

fn run_refresh(args: RefreshArgs) -> Result<(), String> {
    let mut model = load_document(&args.document)?;
    let mut entity = take_entity(&model, &args.entity)?;
    let analyzer = open_analyzer(model.clone(), &args.conn)?;
    let reconciler = Reconciler::new(&analyzer);

    let report: ReconcileReport = match &args.query {
        Some(query) => reconciler
            .refresh_query(&mut entity, query)
            .map_err(|e| e.to_string())?,
        None => reconciler.refresh_entity(&mut entity),
    };

    print!("{}", format_report(&report, args.format)?);
    store_entity(&mut model, entity)?;
    save_document(&model, &args.document)
}

fn run_delete_query(args: DeleteQueryArgs) -> Result<(), String> {
    let mut model = load_document(&args.document)?;
    let entity = model
        .require_entity_mut(&args.entity)
        .map_err(|e| e.to_string())?;
    let index = entity.query_index(&args.query).ok_or_else(|| {
        format!(
            "query '{}' not found in entity '{}'",
            args.query, args.entity
        )
    })?;
    let removed = entity.remove_query(index);
    let cleared = entity.properties.is_empty();

    save_document(&model, &args.document)?;
    if let Some(query) = removed {
        println!("Deleted query '{}'.", query.name);
    }
    if cleared {
        println!("Entity '{}' has no properties left.", args.entity);
    }
    Ok(())
}

fn run_connections(args: ConnectionsArgs) -> Result<(), String> {
    let mut config = ConnectionConfig::load_or_default(&args.config).map_err(|e| {
        format!(
            "Failed to read connections from '{}': {e}",
            args.config.display()
        )
    })?;

    match args.operation {
        ConnectionsOperation::List => {
            for (name, value) in config.connection_strings() {
                println!("{name}\t{value}");
            }
            return Ok(());
        }
        ConnectionsOperation::Add {
            name,
            connection_string,
        } => {
            if config.get(&name).is_some() {
                return Err(format!("connection '{name}' already exists"));
            }
            config.add_connection_string(&name, &connection_string);
            println!("Added connection '{name}'.");
        }
        ConnectionsOperation::Update {
            name,
            connection_string,
        } => {
            if config.get(&name).is_none() {
                return Err(format!("connection not found: {name}"));
            }
            config.update_connection_string(&name, &connection_string);
            println!("Updated connection '{name}'.");
        }
    }

    config.save(&args.config).map_err(|e| {
        format!(
            "Failed to write connections to '{}': {e}",
            args.config.display()
        )
    })
}

fn load_document(path: &Path) -> Result<DataModel, String> {
    entity_schema_db::load(path)
        .map_err(|e| format!("Failed to load '{}': {e}", path.display()))
}

fn save_document(model: &DataModel, path: &Path) -> Result<(), String> {
    entity_schema_db::save(model, path)
        .map_err(|e| format!("Failed to write '{}': {e}", path.display()))
}

/// Resolves the connection for `model` and builds an analyzer over it.
fn open_analyzer(
    mut model: DataModel,
    conn: &ConnectionArgs,
) -> Result<SchemaAnalyzer<SqliteDriver>, String> {
    let config = ConnectionConfig::load_or_default(&conn.config).map_err(|e| {
        format!(
            "Failed to read connections from '{}': {e}",
            conn.config.display()
        )
    })?;
    model.connection_override = conn.connection.clone();
    let connection_string = model
        .resolve_connection_string(&config)
        .ok_or("no connection string: pass --connection or set one in the document")?;
    Ok(SchemaAnalyzer::new(SqliteDriver::new(), connection_string))
}

fn take_entity(model: &DataModel, name: &str) -> Result<entity_schema_core::Entity, String> {
    model
        .entity(name)
        .cloned()
        .ok_or_else(|| format!("entity not found: {name}"))
}

fn store_entity(model: &mut DataModel, entity: entity_schema_core::Entity) -> Result<(), String> {
    let slot = model
        .require_entity_mut(&entity.name)
        .map_err(|e| e.to_string())?;
    *slot = entity;
    Ok(())
}

/// Asks on stdin whether the entity columns should be replaced.
fn confirm_replace(query: &str, found: &[Discrepancy]) -> bool {
    let mut stderr = std::io::stderr();
    let _ = writeln!(
        stderr,
        "The result of query '{query}' does not match the entity columns:"
    );
    for discrepancy in found {
        let _ = writeln!(stderr, "  {discrepancy}");
    }
    let _ = write!(stderr, "Replace the entity columns? [y/N] ");
    let _ = stderr.flush();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes_accepts_short_and_long_forms() {
        assert!(is_yes("y\n"));
        assert!(is_yes("  YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn test_cli_command_type_conversion() {
        assert_eq!(
            CommandType::from(CliCommandType::StoredProcedure),
            CommandType::StoredProcedure
        );
        assert_eq!(
            ExecuteMethod::from(CliExecuteMethod::NonQuery),
            ExecuteMethod::NonQuery
        );
    }

    #[test]
    fn test_cli_parses_add_query() {
        let cli = Cli::try_parse_from([
            "entity-schema",
            "add-query",
            "model.xml",
            "--entity",
            "Customer",
            "--name",
            "GetAll",
            "SELECT * FROM Customer",
            "--yes",
        ])
        .unwrap();
        match cli.command {
            Command::AddQuery(args) => {
                assert!(args.yes);
                assert!(matches!(args.execute_method, CliExecuteMethod::Reader));
                assert_eq!(args.conn.config, PathBuf::from(DEFAULT_CONFIG));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
