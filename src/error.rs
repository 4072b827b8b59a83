//! Error taxonomy for seeding runs.

use seed_gen::SchemaGenerationError;
use std::fmt;
use thiserror::Error;

/// Failure reported by a connection backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("statement failed: {message}\n  SQL: {sql}")]
    Statement { sql: String, message: String },

    #[error("connection is closed")]
    Disconnected,

    #[error("duckdb: {0}")]
    DuckDb(#[from] duckdb::Error),
}

impl BackendError {
    pub fn statement(sql: &str, message: impl fmt::Display) -> Self {
        BackendError::Statement {
            sql: sql.to_string(),
            message: message.to_string(),
        }
    }

    /// True when the failure means the connection itself is gone
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BackendError::Connect(_) | BackendError::Disconnected)
    }
}

/// Step of a materialization a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    CreateDatabase,
    Ddl,
    Dml,
    Verify,
    Close,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Connect => write!(f, "connect"),
            Phase::CreateDatabase => write!(f, "create-database"),
            Phase::Ddl => write!(f, "ddl"),
            Phase::Dml => write!(f, "dml"),
            Phase::Verify => write!(f, "verify"),
            Phase::Close => write!(f, "close"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SeedError {
    /// Cannot reach the engine, or the connection dropped. Fatal for the target.
    #[error("[{target}] {phase} failed on {database}: {source}")]
    Connectivity {
        target: String,
        database: String,
        phase: Phase,
        #[source]
        source: BackendError,
    },

    /// Internal invariant violation. Aborts the whole run.
    #[error("[{target}] schema generation failed for {database}: {source}")]
    SchemaGeneration {
        target: String,
        database: String,
        #[source]
        source: SchemaGenerationError,
    },

    /// A DDL or DML statement failed. Fatal for the database.
    #[error("[{target}] {phase} failed on {database}: {source}")]
    Materialization {
        target: String,
        database: String,
        phase: Phase,
        #[source]
        source: BackendError,
    },

    /// Fewer documents persisted than were inserted
    #[error(
        "[{target}] {database}.{collection}: expected at least {expected} documents, found {actual} ({} missing)",
        expected.saturating_sub(*actual)
    )]
    Verification {
        target: String,
        database: String,
        collection: String,
        expected: u64,
        actual: u64,
    },
}

impl SeedError {
    /// Classify a backend failure: lost connections are connectivity errors,
    /// everything else is a failed statement.
    pub fn from_backend(target: &str, database: &str, phase: Phase, source: BackendError) -> Self {
        if source.is_connectivity() || phase == Phase::Connect {
            SeedError::Connectivity {
                target: target.to_string(),
                database: database.to_string(),
                phase,
                source,
            }
        } else {
            SeedError::Materialization {
                target: target.to_string(),
                database: database.to_string(),
                phase,
                source,
            }
        }
    }

    pub fn schema_generation(target: &str, database: &str, source: SchemaGenerationError) -> Self {
        SeedError::SchemaGeneration {
            target: target.to_string(),
            database: database.to_string(),
            source,
        }
    }

    /// Missing documents for a verification failure
    pub fn shortfall(&self) -> Option<u64> {
        match self {
            SeedError::Verification {
                expected, actual, ..
            } => Some(expected.saturating_sub(*actual)),
            _ => None,
        }
    }

    /// Whether this error stops processing of the remaining databases of a target
    pub fn aborts_target(&self) -> bool {
        matches!(
            self,
            SeedError::Connectivity { .. } | SeedError::SchemaGeneration { .. }
        )
    }

    /// Whether this error stops the whole run
    pub fn aborts_run(&self) -> bool {
        matches!(self, SeedError::SchemaGeneration { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("invalid knob {name}: {reason}")]
    InvalidKnob { name: &'static str, reason: String },

    #[error("invalid database prefix {0:?}: must match ^[a-z_][a-z0-9_]*$")]
    InvalidPrefix(String),

    #[error("no targets configured")]
    NoTargets,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortfall() {
        let err = SeedError::Verification {
            target: "mongo/plain".into(),
            database: "docs_1".into(),
            collection: "abcdefgh_1".into(),
            expected: 500,
            actual: 480,
        };
        assert_eq!(err.shortfall(), Some(20));
        assert!(err.to_string().contains("20 missing"));
        assert!(!err.aborts_target());
    }

    #[test]
    fn test_backend_classification() {
        let lost = SeedError::from_backend("pg/tls", "db_1", Phase::Dml, BackendError::Disconnected);
        assert!(matches!(lost, SeedError::Connectivity { .. }));
        assert!(lost.aborts_target());

        let failed = SeedError::from_backend(
            "pg/tls",
            "db_1",
            Phase::Ddl,
            BackendError::statement("CREATE TABLE x", "syntax error"),
        );
        assert!(matches!(failed, SeedError::Materialization { .. }));
        assert!(!failed.aborts_target());
        assert!(failed.to_string().contains("CREATE TABLE x"));
    }

    #[test]
    fn test_schema_generation_names_target_and_database() {
        let err = SeedError::schema_generation(
            "postgres/tls",
            "pg_1",
            SchemaGenerationError::InvalidRange {
                what: "table",
                min: 0,
                max: 0,
            },
        );
        let message = err.to_string();
        assert!(message.contains("postgres/tls"), "{}", message);
        assert!(message.contains("pg_1"), "{}", message);
        assert!(err.aborts_target());
        assert!(err.aborts_run());
    }
}
