//! In-memory recording backend for materializer and orchestrator tests.
//!
//! Understands just enough of the statements the seeder emits to track
//! databases, tables, committed rows and collections, and records every
//! statement it sees so tests can check ordering and commit boundaries.

#![allow(dead_code)]

use db_seeder::backend::{
    BackendResult, BulkWriteOutcome, Connector, Document, DocumentAdmin, DocumentStore,
    SqlConnection,
};
use db_seeder::config::EngineTarget;
use db_seeder::error::BackendError;
use seed_gen::{Dialect, SqlValue};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct FakeDatabase {
    /// Table name -> CREATE TABLE statement
    pub ddl: BTreeMap<String, String>,
    /// Table name -> committed row count
    pub rows: BTreeMap<String, u64>,
    /// Collection name -> stored document count
    pub collections: BTreeMap<String, u64>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    /// Database name -> contents, per target label
    pub servers: HashMap<String, BTreeMap<String, FakeDatabase>>,
    /// Every statement, commit and close, in order, per target label
    pub log: HashMap<String, Vec<String>>,
    /// Targets whose connections cannot be opened
    pub unreachable: HashSet<String>,
    /// Statements containing this text fail
    pub fail_on: Option<String>,
    /// Documents silently dropped by every bulk insert
    pub drop_documents: u64,
    pub create_database_calls: usize,
    pub sync_calls: usize,
}

impl FakeState {
    pub fn databases(&self, label: &str) -> Vec<String> {
        self.servers
            .get(label)
            .map(|dbs| dbs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn database(&self, label: &str, name: &str) -> Option<&FakeDatabase> {
        self.servers.get(label).and_then(|dbs| dbs.get(name))
    }

    pub fn log(&self, label: &str) -> &[String] {
        self.log.get(label).map(Vec::as_slice).unwrap_or(&[])
    }
}

type Shared = Rc<RefCell<FakeState>>;

#[derive(Clone, Default)]
pub struct FakeConnector {
    pub state: Shared,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable(self, label: &str) -> Self {
        self.state.borrow_mut().unreachable.insert(label.to_string());
        self
    }

    pub fn failing_on(self, fragment: &str) -> Self {
        self.state.borrow_mut().fail_on = Some(fragment.to_string());
        self
    }

    pub fn dropping_documents(self, n: u64) -> Self {
        self.state.borrow_mut().drop_documents = n;
        self
    }

    fn check_reachable(&self, target: &EngineTarget) -> BackendResult<()> {
        if self.state.borrow().unreachable.contains(&target.label()) {
            return Err(BackendError::Connect(format!(
                "{}:{} refused the connection",
                target.host, target.port
            )));
        }
        Ok(())
    }
}

fn unquote(name: &str) -> String {
    name.trim_matches(|c| c == '"' || c == '`').to_string()
}

/// Identifier following `prefix`, up to the next space or parenthesis
fn ident_after(sql: &str, prefix: &str) -> Option<String> {
    let rest = sql.strip_prefix(prefix)?;
    let end = rest.find([' ', '(']).unwrap_or(rest.len());
    Some(unquote(&rest[..end]))
}

pub struct FakeSqlConnection {
    state: Shared,
    label: String,
    dialect: Dialect,
    database: Option<String>,
    pending_rows: HashMap<String, u64>,
}

impl FakeSqlConnection {
    fn record(&self, entry: String) {
        self.state
            .borrow_mut()
            .log
            .entry(self.label.clone())
            .or_default()
            .push(entry);
    }
}

impl SqlConnection for FakeSqlConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> BackendResult<usize> {
        self.record(sql.to_string());
        let mut state = self.state.borrow_mut();
        if let Some(fragment) = &state.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(BackendError::statement(sql, "injected failure"));
            }
        }

        if let Some(rest) = sql.strip_prefix("CREATE DATABASE IF NOT EXISTS ") {
            state.create_database_calls += 1;
            let name = unquote(rest);
            let server = state.servers.entry(self.label.clone()).or_default();
            if server.contains_key(&name) {
                return Ok(0);
            }
            server.insert(name, FakeDatabase::default());
            return Ok(1);
        }
        if let Some(rest) = sql.strip_prefix("CREATE DATABASE ") {
            state.create_database_calls += 1;
            let name = unquote(rest);
            let server = state.servers.entry(self.label.clone()).or_default();
            if server.contains_key(&name) {
                return Err(BackendError::statement(sql, "database already exists"));
            }
            server.insert(name, FakeDatabase::default());
            return Ok(1);
        }

        let database = self
            .database
            .clone()
            .ok_or_else(|| BackendError::statement(sql, "no database selected"))?;

        if let Some(table) = ident_after(sql, "CREATE TABLE IF NOT EXISTS ") {
            let db = state
                .servers
                .entry(self.label.clone())
                .or_default()
                .entry(database)
                .or_default();
            db.ddl.entry(table.clone()).or_insert_with(|| sql.to_string());
            db.rows.entry(table).or_insert(0);
            return Ok(0);
        }
        if let Some(table) = ident_after(sql, "INSERT INTO ") {
            let known = state
                .database(&self.label, &database)
                .is_some_and(|db| db.ddl.contains_key(&table));
            if !known {
                return Err(BackendError::statement(sql, "relation does not exist"));
            }
            if params.iter().any(|p| matches!(p, SqlValue::Null)) {
                return Err(BackendError::statement(sql, "unexpected NULL"));
            }
            *self.pending_rows.entry(table).or_insert(0) += 1;
            return Ok(1);
        }
        Ok(0)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> BackendResult<Vec<Vec<SqlValue>>> {
        self.record(sql.to_string());
        let state = self.state.borrow();

        if sql.contains("FROM pg_database") || sql.contains("information_schema.schemata") {
            let exists = match params.first() {
                Some(SqlValue::String(name)) => state
                    .servers
                    .get(&self.label)
                    .is_some_and(|dbs| dbs.contains_key(name)),
                _ => false,
            };
            return Ok(if exists {
                vec![vec![SqlValue::Int(1)]]
            } else {
                Vec::new()
            });
        }
        if let Some(table) = ident_after(sql, "SELECT COUNT(*) FROM ") {
            let count = self
                .database
                .as_ref()
                .and_then(|db| state.database(&self.label, db))
                .and_then(|db| db.rows.get(&table).copied())
                .ok_or_else(|| BackendError::statement(sql, "relation does not exist"))?;
            return Ok(vec![vec![SqlValue::Int(count as i64)]]);
        }
        Err(BackendError::statement(sql, "unsupported query"))
    }

    fn commit(&mut self) -> BackendResult<()> {
        self.record("COMMIT".to_string());
        let Some(database) = self.database.clone() else {
            return Ok(());
        };
        let mut state = self.state.borrow_mut();
        let db = state
            .servers
            .entry(self.label.clone())
            .or_default()
            .entry(database)
            .or_default();
        for (table, n) in self.pending_rows.drain() {
            *db.rows.entry(table).or_insert(0) += n;
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> BackendResult<()> {
        self.record("CLOSE".to_string());
        Ok(())
    }
}

pub struct FakeDocumentAdmin {
    state: Shared,
    label: String,
}

impl DocumentAdmin for FakeDocumentAdmin {
    fn database_names(&mut self) -> BackendResult<Vec<String>> {
        Ok(self.state.borrow().databases(&self.label))
    }

    fn create_database(&mut self, name: &str) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        state.create_database_calls += 1;
        state
            .servers
            .entry(self.label.clone())
            .or_default()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    fn close(self: Box<Self>) -> BackendResult<()> {
        Ok(())
    }
}

pub struct FakeDocumentStore {
    state: Shared,
    label: String,
    database: String,
}

impl FakeDocumentStore {
    fn with_db<T>(&self, f: impl FnOnce(&mut FakeDatabase) -> T) -> T {
        let mut state = self.state.borrow_mut();
        let db = state
            .servers
            .entry(self.label.clone())
            .or_default()
            .entry(self.database.clone())
            .or_default();
        f(db)
    }
}

impl DocumentStore for FakeDocumentStore {
    fn collection_names(&mut self) -> BackendResult<Vec<String>> {
        Ok(self.with_db(|db| db.collections.keys().cloned().collect()))
    }

    fn create_collection(&mut self, name: &str) -> BackendResult<()> {
        self.with_db(|db| {
            db.collections.entry(name.to_string()).or_insert(0);
        });
        Ok(())
    }

    fn insert_many(
        &mut self,
        collection: &str,
        docs: &[Document],
    ) -> BackendResult<BulkWriteOutcome> {
        let dropped = self.state.borrow().drop_documents.min(docs.len() as u64);
        let stored = docs.len() as u64 - dropped;
        self.with_db(|db| {
            *db.collections.entry(collection.to_string()).or_insert(0) += stored;
        });
        Ok(BulkWriteOutcome {
            inserted: stored,
            failures: (0..dropped).map(|i| format!("document {} rejected", i)).collect(),
        })
    }

    fn count_documents(&mut self, collection: &str) -> BackendResult<u64> {
        Ok(self.with_db(|db| db.collections.get(collection).copied().unwrap_or(0)))
    }

    fn sync(&mut self) -> BackendResult<()> {
        self.state.borrow_mut().sync_calls += 1;
        Ok(())
    }

    fn close(self: Box<Self>) -> BackendResult<()> {
        Ok(())
    }
}

impl Connector for FakeConnector {
    fn open_admin(&self, target: &EngineTarget) -> BackendResult<Box<dyn SqlConnection>> {
        self.check_reachable(target)?;
        Ok(Box::new(FakeSqlConnection {
            state: self.state.clone(),
            label: target.label(),
            dialect: target.engine.dialect().unwrap_or(Dialect::Postgres),
            database: None,
            pending_rows: HashMap::new(),
        }))
    }

    fn open_scoped(
        &self,
        target: &EngineTarget,
        database: &str,
    ) -> BackendResult<Box<dyn SqlConnection>> {
        self.check_reachable(target)?;
        let exists = self
            .state
            .borrow()
            .database(&target.label(), database)
            .is_some();
        if !exists {
            return Err(BackendError::Connect(format!(
                "database {} does not exist",
                database
            )));
        }
        Ok(Box::new(FakeSqlConnection {
            state: self.state.clone(),
            label: target.label(),
            dialect: target.engine.dialect().unwrap_or(Dialect::Postgres),
            database: Some(database.to_string()),
            pending_rows: HashMap::new(),
        }))
    }

    fn open_document_admin(&self, target: &EngineTarget) -> BackendResult<Box<dyn DocumentAdmin>> {
        self.check_reachable(target)?;
        Ok(Box::new(FakeDocumentAdmin {
            state: self.state.clone(),
            label: target.label(),
        }))
    }

    fn open_document_store(
        &self,
        target: &EngineTarget,
        database: &str,
    ) -> BackendResult<Box<dyn DocumentStore>> {
        self.check_reachable(target)?;
        Ok(Box::new(FakeDocumentStore {
            state: self.state.clone(),
            label: target.label(),
            database: database.to_string(),
        }))
    }
}
