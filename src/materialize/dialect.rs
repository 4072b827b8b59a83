//! SQL rendering per connection dialect.
//!
//! Identifiers are always quoted. Column types are looked up in the engine's
//! dialect and then translated into the connection's dialect, so a DDL
//! statement never carries a spelling the connection does not understand.

use seed_gen::{translate_native, Dialect, SchemaSpec, SqlValue, TableSpec};
use std::fmt::Write as _;

/// Quote an identifier for `dialect`, doubling embedded quote characters
pub fn quote_ident(dialect: Dialect, name: &str) -> String {
    match dialect {
        Dialect::MySql | Dialect::MariaDb => format!("`{}`", name.replace('`', "``")),
        Dialect::Postgres | Dialect::DuckDb => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

/// Bind placeholder for the 1-based parameter `index`
pub fn placeholder(dialect: Dialect, index: usize) -> String {
    match dialect {
        Dialect::Postgres => format!("${}", index),
        Dialect::MySql | Dialect::MariaDb | Dialect::DuckDb => "?".to_string(),
    }
}

/// How a dialect creates a database only when it is missing
#[derive(Debug, Clone, PartialEq)]
pub enum CreateDatabase {
    /// Run `exists_sql` with the name bound as the only parameter; when it
    /// returns no rows, run `create_sql`.
    CheckThenCreate {
        exists_sql: String,
        create_sql: String,
    },
    /// A single statement that is a no-op when the database exists
    IfNotExists(String),
}

pub fn create_database(dialect: Dialect, name: &str) -> CreateDatabase {
    let quoted = quote_ident(dialect, name);
    match dialect {
        Dialect::Postgres => CreateDatabase::CheckThenCreate {
            exists_sql: format!(
                "SELECT 1 FROM pg_database WHERE datname = {}",
                placeholder(dialect, 1)
            ),
            create_sql: format!("CREATE DATABASE {}", quoted),
        },
        Dialect::MySql | Dialect::MariaDb => {
            CreateDatabase::IfNotExists(format!("CREATE DATABASE IF NOT EXISTS {}", quoted))
        }
        Dialect::DuckDb => CreateDatabase::CheckThenCreate {
            exists_sql: format!(
                "SELECT 1 FROM information_schema.schemata \
                 WHERE catalog_name = current_database() AND schema_name = {}",
                placeholder(dialect, 1)
            ),
            create_sql: format!("CREATE SCHEMA {}", quoted),
        },
    }
}

fn sequence_name(database: &str, table: &str) -> String {
    format!("{}.{}_id_seq", database, table)
}

/// Statements that must run before the table's `CREATE TABLE`
pub fn key_prelude(dialect: Dialect, database: &str, table: &str) -> Vec<String> {
    match dialect {
        Dialect::DuckDb => vec![format!(
            "CREATE SEQUENCE IF NOT EXISTS {}.{}",
            quote_ident(dialect, database),
            quote_ident(dialect, &format!("{}_id_seq", table))
        )],
        Dialect::Postgres | Dialect::MySql | Dialect::MariaDb => Vec::new(),
    }
}

/// Column definition of the engine-managed surrogate key
pub fn surrogate_key(dialect: Dialect, database: &str, table: &str) -> String {
    let id = quote_ident(dialect, seed_gen::ID_COLUMN);
    match dialect {
        Dialect::Postgres => format!("{} SERIAL PRIMARY KEY", id),
        Dialect::MySql | Dialect::MariaDb => format!("{} INT AUTO_INCREMENT PRIMARY KEY", id),
        Dialect::DuckDb => format!(
            "{} INTEGER PRIMARY KEY DEFAULT nextval('{}')",
            id,
            sequence_name(database, table)
        ),
    }
}

/// Error for a column whose type has no spelling on the connection
#[derive(Debug, Clone, PartialEq)]
pub struct UnmappedType {
    pub column: String,
    pub spelling: String,
}

/// Render `CREATE TABLE IF NOT EXISTS` for `table`.
///
/// Types are spelled by `engine` and translated into `conn` before emission.
pub fn create_table_sql(
    engine: Dialect,
    conn: Dialect,
    database: &str,
    table: &TableSpec,
) -> Result<String, UnmappedType> {
    let mut defs = Vec::with_capacity(table.columns.len());
    defs.push(surrogate_key(conn, database, &table.name));

    for (name, ty) in table.value_columns() {
        let engine_spelling = engine.native_type(ty);
        let spelling =
            translate_native(engine, conn, engine_spelling).ok_or_else(|| UnmappedType {
                column: name.to_string(),
                spelling: engine_spelling.to_string(),
            })?;
        defs.push(format!("{} {}", quote_ident(conn, name), spelling));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(conn, &table.name),
        defs.join(", ")
    ))
}

/// Parameterized INSERT over the table's value columns
pub fn insert_sql(dialect: Dialect, table: &TableSpec) -> String {
    let mut columns = Vec::new();
    let mut params = Vec::new();
    for (i, (name, _)) in table.value_columns().enumerate() {
        columns.push(quote_ident(dialect, name));
        params.push(placeholder(dialect, i + 1));
    }
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(dialect, &table.name),
        columns.join(", "),
        params.join(", ")
    )
}

pub fn count_rows_sql(dialect: Dialect, table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(dialect, table))
}

/// INSERT with the values inlined as literals. Preview output only.
pub fn insert_literal_sql(dialect: Dialect, table: &TableSpec, values: &[SqlValue]) -> String {
    let columns: Vec<String> = table
        .value_columns()
        .map(|(name, _)| quote_ident(dialect, name))
        .collect();
    let literals: Vec<String> = values.iter().map(|v| v.to_literal(dialect)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        quote_ident(dialect, &table.name),
        columns.join(", "),
        literals.join(", ")
    )
}

/// Full DDL script for a schema, one statement per line
pub fn schema_ddl(
    engine: Dialect,
    conn: Dialect,
    database: &str,
    schema: &SchemaSpec,
) -> Result<String, UnmappedType> {
    let mut out = String::new();
    for table in &schema.tables {
        for stmt in key_prelude(conn, database, &table.name) {
            let _ = writeln!(out, "{};", stmt);
        }
        let _ = writeln!(out, "{};", create_table_sql(engine, conn, database, table)?);
    }
    Ok(out)
}
