//! Materialization of generated schemas into live databases.
//!
//! Relational engines get databases, tables and parameterized row inserts
//! with explicit commits; the document engine gets databases, collections and
//! unordered bulk inserts followed by a count check.

pub mod dialect;
mod document;
mod relational;

use crate::config::{EngineTarget, Knobs};
use crate::error::{BackendError, Phase, SeedError};
use crate::progress::{ProgressEvent, ProgressHook, ProgressKind};
use seed_gen::ValueGenerator;

/// Inserts between two progress events
pub const PROGRESS_INTERVAL: u64 = 250;

/// What a single database materialization produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeStats {
    /// Tables or collections created
    pub objects: usize,
    /// Rows or documents inserted
    pub rows: u64,
    pub commits: u64,
}

/// Materializes schemas for one target
pub struct Materializer<'a> {
    label: String,
    knobs: &'a Knobs,
    values: ValueGenerator,
    progress: Option<&'a ProgressHook>,
}

impl<'a> Materializer<'a> {
    pub fn new(target: &'a EngineTarget, knobs: &'a Knobs) -> Self {
        Self {
            label: target.label(),
            knobs,
            values: ValueGenerator::new(knobs.document_max_depth),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<&'a ProgressHook>) -> Self {
        self.progress = progress;
        self
    }

    fn error(&self, database: &str, phase: Phase, source: BackendError) -> SeedError {
        SeedError::from_backend(&self.label, database, phase, source)
    }

    fn report_rows(&self, database: &str, rows: u64) {
        if rows == 0 {
            return;
        }
        if let Some(progress) = self.progress {
            progress.emit(&ProgressEvent {
                target: &self.label,
                database: Some(database),
                kind: ProgressKind::Rows(rows),
            });
        }
    }
}
