use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use sqlite_driver::catalog::{self, PhysicalColumn};
use sqlite_driver::{Command as SqlCommand, DriverConfig, Query, is_identifier};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sqlite-driver")]
#[command(about = "Inspect SQLite databases managed by the record mapper")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List user tables.
    Tables(DbArgs),
    /// Show the physical columns of a table.
    Columns(TableArgs),
    /// Count the rows of a table.
    Count(TableArgs),
    /// Print rows of a table as JSON lines.
    Dump(DumpArgs),
}

#[derive(Debug, Args)]
struct DbArgs {
    /// SQLite database file.
    #[arg(long)]
    db: PathBuf,
}

#[derive(Debug, Args)]
struct TableArgs {
    /// SQLite database file.
    #[arg(long)]
    db: PathBuf,
    /// Table name.
    #[arg(long)]
    table: String,
}

#[derive(Debug, Args)]
struct DumpArgs {
    /// SQLite database file.
    #[arg(long)]
    db: PathBuf,
    /// Table name.
    #[arg(long)]
    table: String,
    /// Maximum number of rows to print.
    #[arg(long)]
    limit: Option<u32>,
    /// Number of rows to skip.
    #[arg(long)]
    offset: Option<u32>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Tables(args) => run_tables(args),
        Command::Columns(args) => run_columns(args),
        Command::Count(args) => run_count(args),
        Command::Dump(args) => run_dump(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn open(db: &Path) -> Result<Connection, String> {
    if !db.exists() {
        return Err(format!("Database '{}' does not exist", db.display()));
    }
    DriverConfig::new(db)
        .connect()
        .map_err(|e| format!("Failed to open database '{}': {e}", db.display()))
}

/// Rejects names that are not identifiers or not tables in `conn`.
fn checked_columns(conn: &Connection, table: &str) -> Result<Vec<PhysicalColumn>, String> {
    if !is_identifier(table) {
        return Err(format!("Invalid table name '{table}'"));
    }
    let columns = catalog::table_columns(conn, table)
        .map_err(|e| format!("Failed to read columns of '{table}': {e}"))?;
    if columns.is_empty() {
        return Err(format!("Table '{table}' does not exist"));
    }
    Ok(columns)
}

fn run_tables(args: DbArgs) -> Result<(), String> {
    let conn = open(&args.db)?;
    let names =
        catalog::table_names(&conn).map_err(|e| format!("Failed to list tables: {e}"))?;
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn run_columns(args: TableArgs) -> Result<(), String> {
    let conn = open(&args.db)?;
    let columns = checked_columns(&conn, &args.table)?;
    for column in columns {
        let mut line = format!("{}\t{}\t{}", column.cid, column.name, column.declared_type);
        if column.primary_key {
            line.push_str("\tPRIMARY KEY");
        }
        if column.not_null {
            line.push_str("\tNOT NULL");
        }
        println!("{line}");
    }
    Ok(())
}

fn run_count(args: TableArgs) -> Result<(), String> {
    let conn = open(&args.db)?;
    checked_columns(&conn, &args.table)?;
    let mut cursor = SqlCommand::new()
        .count(&args.table)
        .query(&conn)
        .map_err(|e| format!("Failed to count rows: {e}"))?;
    let count = match cursor.next() {
        Some(row) => row.int64(0).map_err(|e| e.to_string())?,
        None => 0,
    };
    println!("{count}");
    Ok(())
}

fn run_dump(args: DumpArgs) -> Result<(), String> {
    let conn = open(&args.db)?;
    let columns = checked_columns(&conn, &args.table)?;

    let mut query = Query::new();
    query.limit = args.limit;
    query.offset = args.offset;
    let command = SqlCommand::new().select(&args.table).apply(&query);
    debug!(sql = %command.render(), "Dumping table");

    let cursor = command
        .query(&conn)
        .map_err(|e| format!("Failed to read '{}': {e}", args.table))?;
    for row in cursor {
        let mut object = serde_json::Map::new();
        for column in &columns {
            let cell = row.raw(column.cid).map_err(|e| e.to_string())?;
            object.insert(column.name.clone(), to_json(cell));
        }
        let line = serde_json::to_string(&object)
            .map_err(|e| format!("Failed to serialize row: {e}"))?;
        println!("{line}");
    }
    Ok(())
}

fn to_json(value: &SqlValue) -> serde_json::Value {
    match value {
        SqlValue::Null => serde_json::Value::Null,
        SqlValue::Integer(v) => serde_json::Value::from(*v),
        SqlValue::Real(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        SqlValue::Text(v) => serde_json::Value::String(v.clone()),
        SqlValue::Blob(bytes) => serde_json::Value::from(bytes.clone()),
    }
}
