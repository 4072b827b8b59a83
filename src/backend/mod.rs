//! Connection capabilities the seeder consumes.
//!
//! Establishing a transport under a security posture belongs to whoever
//! implements [`Connector`]. The seeder only issues blocking statements and
//! commits over what it is handed.

pub mod sandbox;

pub use sandbox::SandboxConnector;

use crate::config::EngineTarget;
use crate::error::BackendError;
use seed_gen::{Dialect, SqlValue};
use serde_json::{Map, Value as JsonValue};

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// A document as handed to [`DocumentStore::insert_many`]
pub type Document = Map<String, JsonValue>;

/// Blocking SQL connection, either administrative or scoped to one database
pub trait SqlConnection {
    fn dialect(&self) -> Dialect;

    /// Execute one statement with bound parameters, returning affected rows
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> BackendResult<usize>;

    /// Execute a query and fetch every row
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> BackendResult<Vec<Vec<SqlValue>>>;

    fn commit(&mut self) -> BackendResult<()>;

    /// Release the connection. Uncommitted work is rolled back.
    fn close(self: Box<Self>) -> BackendResult<()>;
}

/// Administrative connection to a document engine
pub trait DocumentAdmin {
    fn database_names(&mut self) -> BackendResult<Vec<String>>;

    fn create_database(&mut self, name: &str) -> BackendResult<()>;

    fn close(self: Box<Self>) -> BackendResult<()>;
}

/// Outcome of an unordered bulk insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkWriteOutcome {
    pub inserted: u64,
    /// Per-document failures; unrelated documents are still written
    pub failures: Vec<String>,
}

/// Document store scoped to one database
pub trait DocumentStore {
    fn collection_names(&mut self) -> BackendResult<Vec<String>>;

    fn create_collection(&mut self, name: &str) -> BackendResult<()>;

    /// Insert without stopping at the first failing document
    fn insert_many(&mut self, collection: &str, docs: &[Document])
        -> BackendResult<BulkWriteOutcome>;

    fn count_documents(&mut self, collection: &str) -> BackendResult<u64>;

    /// Flush writes to durable storage
    fn sync(&mut self) -> BackendResult<()>;

    fn close(self: Box<Self>) -> BackendResult<()>;
}

/// Opens connections for a target
pub trait Connector {
    fn open_admin(&self, target: &EngineTarget) -> BackendResult<Box<dyn SqlConnection>>;

    fn open_scoped(
        &self,
        target: &EngineTarget,
        database: &str,
    ) -> BackendResult<Box<dyn SqlConnection>>;

    fn open_document_admin(&self, target: &EngineTarget) -> BackendResult<Box<dyn DocumentAdmin>>;

    fn open_document_store(
        &self,
        target: &EngineTarget,
        database: &str,
    ) -> BackendResult<Box<dyn DocumentStore>>;
}
