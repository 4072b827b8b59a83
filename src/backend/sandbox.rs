//! Embedded DuckDB backend.
//!
//! A single DuckDB instance (file or in-memory) stands in for every engine.
//! Each database name becomes a DuckDB schema and each document collection a
//! one-column table of JSON text. Scoped SQL connections run inside an implicit
//! transaction that is opened on first use; admin connections autocommit.

use super::{
    BackendResult, BulkWriteOutcome, Connector, Document, DocumentAdmin, DocumentStore,
    SqlConnection,
};
use crate::config::EngineTarget;
use crate::error::BackendError;
use crate::materialize::dialect::quote_ident;
use chrono::{Datelike, NaiveDate};
use duckdb::types::{TimeUnit, Value, ValueRef};
use duckdb::{params_from_iter, Connection};
use seed_gen::{Dialect, SqlValue};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Location string selecting an in-memory instance
pub const IN_MEMORY: &str = ":memory:";

/// [`Connector`] backed by one embedded DuckDB instance
pub struct SandboxConnector {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SandboxConnector {
    pub fn open(path: &Path) -> BackendResult<Self> {
        let conn = Connection::open(path).map_err(|e| {
            BackendError::Connect(format!("failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> BackendResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BackendError::Connect(format!("failed to open in-memory sandbox: {}", e)))?;
        Ok(Self { conn, path: None })
    }

    /// Open a file path, or an in-memory instance for `:memory:`
    pub fn from_location(location: &str) -> BackendResult<Self> {
        if location == IN_MEMORY {
            Self::open_in_memory()
        } else {
            Self::open(Path::new(location))
        }
    }

    pub fn is_durable(&self) -> bool {
        self.path.is_some()
    }

    fn fresh_connection(&self, target: &EngineTarget) -> BackendResult<Connection> {
        debug!(
            label = %target.label(),
            host = %target.host,
            port = target.port,
            "opening sandbox connection"
        );
        self.conn
            .try_clone()
            .map_err(|e| BackendError::Connect(e.to_string()))
    }
}

impl Connector for SandboxConnector {
    fn open_admin(&self, target: &EngineTarget) -> BackendResult<Box<dyn SqlConnection>> {
        let conn = self.fresh_connection(target)?;
        Ok(Box::new(SandboxConnection {
            conn,
            scoped: false,
            in_transaction: false,
        }))
    }

    fn open_scoped(
        &self,
        target: &EngineTarget,
        database: &str,
    ) -> BackendResult<Box<dyn SqlConnection>> {
        let conn = self.fresh_connection(target)?;
        let catalog = current_catalog(&conn)?;
        let sql = format!(
            "USE {}.{}",
            quote_ident(Dialect::DuckDb, &catalog),
            quote_ident(Dialect::DuckDb, database)
        );
        conn.execute_batch(&sql)
            .map_err(|e| BackendError::Connect(format!("cannot use database {}: {}", database, e)))?;
        Ok(Box::new(SandboxConnection {
            conn,
            scoped: true,
            in_transaction: false,
        }))
    }

    fn open_document_admin(&self, target: &EngineTarget) -> BackendResult<Box<dyn DocumentAdmin>> {
        let conn = self.fresh_connection(target)?;
        Ok(Box::new(SandboxDocumentAdmin { conn }))
    }

    fn open_document_store(
        &self,
        target: &EngineTarget,
        database: &str,
    ) -> BackendResult<Box<dyn DocumentStore>> {
        let conn = self.fresh_connection(target)?;
        Ok(Box::new(SandboxDocumentStore {
            conn,
            database: database.to_string(),
            durable: self.is_durable(),
        }))
    }
}

fn current_catalog(conn: &Connection) -> BackendResult<String> {
    conn.query_row("SELECT current_database()", [], |row| row.get::<_, String>(0))
        .map_err(|e| BackendError::Connect(e.to_string()))
}

/// SQL connection over a cloned DuckDB handle
pub struct SandboxConnection {
    conn: Connection,
    scoped: bool,
    in_transaction: bool,
}

impl SandboxConnection {
    fn begin_if_needed(&mut self) -> BackendResult<()> {
        if self.scoped && !self.in_transaction {
            self.conn.execute_batch("BEGIN TRANSACTION")?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

impl SqlConnection for SandboxConnection {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> BackendResult<usize> {
        self.begin_if_needed()?;
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| BackendError::statement(sql, e))?;
        stmt.execute(params_from_iter(params.iter().map(to_duck_value)))
            .map_err(|e| BackendError::statement(sql, e))
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> BackendResult<Vec<Vec<SqlValue>>> {
        self.begin_if_needed()?;
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| BackendError::statement(sql, e))?;
        let mut rows = stmt
            .query(params_from_iter(params.iter().map(to_duck_value)))
            .map_err(|e| BackendError::statement(sql, e))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| BackendError::statement(sql, e))? {
            let column_count = row.as_ref().column_count();
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value = row.get_ref(i).map_err(|e| BackendError::statement(sql, e))?;
                values.push(from_duck_value(value));
            }
            out.push(values);
        }
        Ok(out)
    }

    fn commit(&mut self) -> BackendResult<()> {
        if self.in_transaction {
            self.conn.execute_batch("COMMIT")?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn close(mut self: Box<Self>) -> BackendResult<()> {
        if self.in_transaction {
            self.in_transaction = false;
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

impl Drop for SandboxConnection {
    fn drop(&mut self) {
        if self.in_transaction {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

/// Document admin: databases are schemas
pub struct SandboxDocumentAdmin {
    conn: Connection,
}

impl DocumentAdmin for SandboxDocumentAdmin {
    fn database_names(&mut self) -> BackendResult<Vec<String>> {
        let sql = "SELECT schema_name FROM information_schema.schemata \
                   WHERE catalog_name = current_database() ORDER BY schema_name";
        let mut stmt = self.conn.prepare(sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn create_database(&mut self, name: &str) -> BackendResult<()> {
        let sql = format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_ident(Dialect::DuckDb, name)
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|e| BackendError::statement(&sql, e))
    }

    fn close(self: Box<Self>) -> BackendResult<()> {
        Ok(())
    }
}

/// Document store: collections are `(doc VARCHAR)` tables inside the schema
pub struct SandboxDocumentStore {
    conn: Connection,
    database: String,
    durable: bool,
}

impl SandboxDocumentStore {
    fn qualified(&self, collection: &str) -> String {
        format!(
            "{}.{}",
            quote_ident(Dialect::DuckDb, &self.database),
            quote_ident(Dialect::DuckDb, collection)
        )
    }
}

impl DocumentStore for SandboxDocumentStore {
    fn collection_names(&mut self) -> BackendResult<Vec<String>> {
        let sql = "SELECT table_name FROM information_schema.tables \
                   WHERE table_catalog = current_database() AND table_schema = ? \
                   ORDER BY table_name";
        let mut stmt = self.conn.prepare(sql)?;
        let names = stmt
            .query_map([self.database.as_str()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn create_collection(&mut self, name: &str) -> BackendResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (doc VARCHAR NOT NULL)",
            self.qualified(name)
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|e| BackendError::statement(&sql, e))
    }

    fn insert_many(
        &mut self,
        collection: &str,
        docs: &[Document],
    ) -> BackendResult<BulkWriteOutcome> {
        let sql = format!("INSERT INTO {} (doc) VALUES (?)", self.qualified(collection));
        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .map_err(|e| BackendError::statement(&sql, e))?;

        let mut outcome = BulkWriteOutcome::default();
        for (index, doc) in docs.iter().enumerate() {
            let encoded = match serde_json::to_string(doc) {
                Ok(encoded) => encoded,
                Err(e) => {
                    outcome.failures.push(format!("document {}: {}", index, e));
                    continue;
                }
            };
            match stmt.execute([encoded]) {
                Ok(_) => outcome.inserted += 1,
                Err(e) => outcome.failures.push(format!("document {}: {}", index, e)),
            }
        }
        Ok(outcome)
    }

    fn count_documents(&mut self, collection: &str) -> BackendResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.qualified(collection));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| BackendError::statement(&sql, e))?;
        Ok(count.max(0) as u64)
    }

    fn sync(&mut self) -> BackendResult<()> {
        if self.durable {
            self.conn
                .execute_batch("CHECKPOINT")
                .map_err(|e| BackendError::statement("CHECKPOINT", e))?;
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> BackendResult<()> {
        Ok(())
    }
}

fn to_duck_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Int(n) => Value::BigInt(*n),
        SqlValue::Float(f) => Value::Double(*f),
        SqlValue::String(s) => Value::Text(s.clone()),
        SqlValue::Bool(b) => Value::Boolean(*b),
        SqlValue::Date(d) => Value::Date32(d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
        SqlValue::Timestamp(ts) => {
            Value::Timestamp(TimeUnit::Microsecond, ts.and_utc().timestamp_micros())
        }
        SqlValue::Bytes(b) => Value::Blob(b.clone()),
        SqlValue::Json(doc) => Value::Text(doc.to_string()),
    }
}

fn from_duck_value(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Boolean(b) => SqlValue::Bool(b),
        ValueRef::TinyInt(n) => SqlValue::Int(n.into()),
        ValueRef::SmallInt(n) => SqlValue::Int(n.into()),
        ValueRef::Int(n) => SqlValue::Int(n.into()),
        ValueRef::BigInt(n) => SqlValue::Int(n),
        ValueRef::UTinyInt(n) => SqlValue::Int(n.into()),
        ValueRef::USmallInt(n) => SqlValue::Int(n.into()),
        ValueRef::UInt(n) => SqlValue::Int(n.into()),
        ValueRef::HugeInt(n) => i64::try_from(n)
            .map(SqlValue::Int)
            .unwrap_or_else(|_| SqlValue::String(n.to_string())),
        ValueRef::UBigInt(n) => i64::try_from(n)
            .map(SqlValue::Int)
            .unwrap_or_else(|_| SqlValue::String(n.to_string())),
        ValueRef::Float(f) => SqlValue::Float(f.into()),
        ValueRef::Double(f) => SqlValue::Float(f),
        ValueRef::Text(s) => SqlValue::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => SqlValue::Bytes(b.to_vec()),
        ValueRef::Date32(days) => {
            NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_DAYS_FROM_CE + days)
                .map(SqlValue::Date)
                .unwrap_or(SqlValue::Int(days.into()))
        }
        ValueRef::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            chrono::DateTime::from_timestamp_micros(micros)
                .map(|dt| SqlValue::Timestamp(dt.naive_utc()))
                .unwrap_or(SqlValue::Int(raw))
        }
        other => SqlValue::String(format!("{:?}", other)),
    }
}
