//! Seed relational and document databases with randomized, schema-valid data.
//!
//! Schemas and values come from the `seed_gen` crate. This crate turns them
//! into databases: it renders dialect-specific SQL, drives connections through
//! the [`backend::Connector`] trait and reports per-target outcomes.
//!
//! # Example
//!
//! ```no_run
//! use db_seeder::backend::SandboxConnector;
//! use db_seeder::config::{EngineTarget, Knobs, SecurityVariant};
//! use db_seeder::orchestrator::Seeder;
//! use seed_gen::EngineKind;
//!
//! let connector = SandboxConnector::open_in_memory().unwrap();
//! let targets = vec![EngineTarget::new(EngineKind::Postgres, SecurityVariant::Tls, "pg")];
//! let report = Seeder::new(connector, Knobs::default()).run(&targets);
//! assert!(report.is_success());
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod materialize;
pub mod orchestrator;
pub mod progress;

pub use config::{EngineTarget, Knobs, SecurityVariant, SeedPlan};
pub use error::{BackendError, ConfigError, SeedError};
pub use orchestrator::{RunReport, Seeder};
