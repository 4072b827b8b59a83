//! Seeding run orchestration.
//!
//! Targets are seeded one after another in the order given. Within a target
//! all databases are created first, then each database receives a freshly
//! generated schema. One RNG is shared by the whole run.

use crate::backend::{Connector, DocumentAdmin};
use crate::config::{EngineTarget, Knobs};
use crate::error::{Phase, SeedError};
use crate::materialize::{MaterializeStats, Materializer};
use crate::progress::{ProgressEvent, ProgressHook, ProgressKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use seed_gen::{generate_collections, generate_schema, EngineFamily};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Database label used for errors raised before any database is selected
const ADMIN_SCOPE: &str = "<admin>";

/// Result of seeding one database
#[derive(Debug)]
pub struct DatabaseOutcome {
    pub name: String,
    pub result: Result<MaterializeStats, SeedError>,
}

/// Result of seeding one target
#[derive(Debug)]
pub struct TargetOutcome {
    pub label: String,
    pub databases: Vec<DatabaseOutcome>,
    /// Error that stopped the target before all databases were attempted
    pub error: Option<SeedError>,
}

impl TargetOutcome {
    fn new(label: String) -> Self {
        Self {
            label,
            databases: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.databases.iter().all(|db| db.result.is_ok())
    }

    /// Errors in the order they happened
    pub fn errors(&self) -> impl Iterator<Item = &SeedError> {
        self.databases
            .iter()
            .filter_map(|db| db.result.as_ref().err())
            .chain(self.error.as_ref())
    }

    pub fn rows(&self) -> u64 {
        self.databases
            .iter()
            .filter_map(|db| db.result.as_ref().ok())
            .map(|stats| stats.rows)
            .sum()
    }
}

/// Per-target outcomes of a run
#[derive(Debug)]
pub struct RunReport {
    /// Seed the run's RNG was created from
    pub seed: u64,
    pub targets: Vec<TargetOutcome>,
    /// Set when a schema generation failure stopped the run early
    pub aborted: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.aborted && self.targets.iter().all(TargetOutcome::is_success)
    }

    pub fn first_error(&self) -> Option<&SeedError> {
        self.errors().next()
    }

    pub fn errors(&self) -> impl Iterator<Item = &SeedError> {
        self.targets.iter().flat_map(|t| t.errors())
    }

    pub fn failed_targets(&self) -> usize {
        self.targets.iter().filter(|t| !t.is_success()).count()
    }
}

/// Drives schema generation and materialization over a list of targets
pub struct Seeder<C: Connector> {
    connector: C,
    knobs: Knobs,
    progress: Option<ProgressHook>,
}

impl<C: Connector> Seeder<C> {
    pub fn new(connector: C, knobs: Knobs) -> Self {
        Self {
            connector,
            knobs,
            progress: None,
        }
    }

    pub fn with_progress(mut self, hook: ProgressHook) -> Self {
        self.progress = Some(hook);
        self
    }

    /// Seed every target in order and report per-target outcomes.
    ///
    /// A failed target does not stop the ones after it. Only a schema
    /// generation failure ends the run early.
    pub fn run(&self, targets: &[EngineTarget]) -> RunReport {
        let seed = self.knobs.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        info!(seed, targets = targets.len(), "seeding run started");

        let start = Instant::now();
        let mut report = RunReport {
            seed,
            targets: Vec::with_capacity(targets.len()),
            aborted: false,
        };

        for target in targets {
            let target_start = Instant::now();
            let mut outcome = TargetOutcome::new(target.label());
            info!(target_label = %outcome.label, prefix = %target.prefix, "seeding target");

            let result = match target.engine.family() {
                EngineFamily::RelationalSerial | EngineFamily::RelationalAutoIncrement => {
                    self.seed_relational(target, &mut outcome, &mut rng)
                }
                EngineFamily::Document => self.seed_documents(target, &mut outcome, &mut rng),
            };

            if let Err(e) = result {
                outcome.error = Some(e);
            }
            if let Some(e) = &outcome.error {
                error!(target_label = %outcome.label, error = %e, "target aborted");
                report.aborted = e.aborts_run();
            }

            let succeeded = outcome.databases.iter().filter(|db| db.result.is_ok()).count();
            info!(
                target_label = %outcome.label,
                databases = succeeded,
                failed = outcome.databases.len() - succeeded,
                rows = outcome.rows(),
                elapsed_ms = target_start.elapsed().as_millis() as u64,
                success = outcome.is_success(),
                "target finished"
            );
            self.emit(&outcome.label, None, ProgressKind::Target);
            report.targets.push(outcome);

            if report.aborted {
                break;
            }
        }

        info!(
            targets = report.targets.len(),
            failed = report.failed_targets(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "seeding run finished"
        );
        report
    }

    /// Returns `Err` only for errors that stop the whole target
    fn seed_relational(
        &self,
        target: &EngineTarget,
        outcome: &mut TargetOutcome,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), SeedError> {
        let materializer = Materializer::new(target, &self.knobs).with_progress(self.progress.as_ref());
        let names = target.database_names(&self.knobs);

        let mut admin = self
            .connector
            .open_admin(target)
            .map_err(|e| connect_error(&outcome.label, ADMIN_SCOPE, e))?;
        let created = materializer.create_databases(admin.as_mut(), &names);
        if let Err(e) = admin.close() {
            warn!(target_label = %outcome.label, error = %e, "closing admin connection failed");
        }
        let created = created?;
        debug!(target_label = %outcome.label, created, "databases ready");

        for name in &names {
            let db_start = Instant::now();
            let schema = generate_schema(
                target.engine,
                self.knobs.table_range(),
                self.knobs.column_range(),
                self.knobs.pass_through_probability,
                rng,
            )
            .map_err(|e| SeedError::schema_generation(&outcome.label, name, e))?;

            let mut conn = self
                .connector
                .open_scoped(target, name)
                .map_err(|e| connect_error(&outcome.label, name, e))?;
            let result = materializer.materialize(conn.as_mut(), name, &schema, rng);
            if let Err(e) = conn.close() {
                warn!(target_label = %outcome.label, database = %name, error = %e, "closing connection failed");
            }

            if !self.record(outcome, name, result, db_start) {
                break;
            }
        }
        Ok(())
    }

    /// Returns `Err` only for errors that stop the whole target
    fn seed_documents(
        &self,
        target: &EngineTarget,
        outcome: &mut TargetOutcome,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), SeedError> {
        let materializer = Materializer::new(target, &self.knobs).with_progress(self.progress.as_ref());
        let names = target.database_names(&self.knobs);

        let mut admin = self
            .connector
            .open_document_admin(target)
            .map_err(|e| connect_error(&outcome.label, ADMIN_SCOPE, e))?;
        if let Err(e) = materializer.create_document_databases(admin.as_mut(), &names) {
            close_document_admin(admin, &outcome.label);
            return Err(e);
        }

        for name in &names {
            let db_start = Instant::now();
            let schema = match generate_collections(self.knobs.table_range(), rng) {
                Ok(schema) => schema,
                Err(e) => {
                    close_document_admin(admin, &outcome.label);
                    return Err(SeedError::schema_generation(&outcome.label, name, e));
                }
            };

            let mut store = match self.connector.open_document_store(target, name) {
                Ok(store) => store,
                Err(e) => {
                    close_document_admin(admin, &outcome.label);
                    return Err(connect_error(&outcome.label, name, e));
                }
            };
            let result = materializer.materialize_docs(store.as_mut(), name, &schema, rng);
            if let Err(e) = store.close() {
                warn!(target_label = %outcome.label, database = %name, error = %e, "closing store failed");
            }

            if !self.record(outcome, name, result, db_start) {
                break;
            }
        }

        match admin.database_names() {
            Ok(databases) => debug!(target_label = %outcome.label, ?databases, "database inventory"),
            Err(e) => warn!(target_label = %outcome.label, error = %e, "listing databases failed"),
        }
        close_document_admin(admin, &outcome.label);
        Ok(())
    }

    /// Record a database result. Returns false when the target must stop.
    fn record(
        &self,
        outcome: &mut TargetOutcome,
        name: &str,
        result: Result<MaterializeStats, SeedError>,
        started: Instant,
    ) -> bool {
        match result {
            Ok(stats) => {
                info!(
                    target_label = %outcome.label,
                    database = %name,
                    objects = stats.objects,
                    rows = stats.rows,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "database seeded"
                );
                self.emit(&outcome.label, Some(name), ProgressKind::Database);
                outcome.databases.push(DatabaseOutcome {
                    name: name.to_string(),
                    result: Ok(stats),
                });
                true
            }
            Err(e) if e.aborts_target() => {
                outcome.error = Some(e);
                false
            }
            Err(e) => {
                error!(target_label = %outcome.label, database = %name, error = %e, "database failed");
                outcome.databases.push(DatabaseOutcome {
                    name: name.to_string(),
                    result: Err(e),
                });
                true
            }
        }
    }

    fn emit(&self, target: &str, database: Option<&str>, kind: ProgressKind) {
        if let Some(progress) = &self.progress {
            progress.emit(&ProgressEvent {
                target,
                database,
                kind,
            });
        }
    }
}

fn close_document_admin(admin: Box<dyn DocumentAdmin>, label: &str) {
    if let Err(e) = admin.close() {
        warn!(target_label = %label, error = %e, "closing admin connection failed");
    }
}

fn connect_error(label: &str, database: &str, source: crate::error::BackendError) -> SeedError {
    SeedError::Connectivity {
        target: label.to_string(),
        database: database.to_string(),
        phase: Phase::Connect,
        source,
    }
}
