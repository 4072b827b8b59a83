use super::{MaterializeStats, Materializer};
use crate::backend::{Document, DocumentAdmin, DocumentStore};
use crate::error::{Phase, SeedError};
use rand::Rng;
use seed_gen::CollectionSchema;
use std::time::Instant;
use tracing::{debug, warn};

impl Materializer<'_> {
    /// Create every document database in `names` that does not exist yet
    pub fn create_document_databases(
        &self,
        admin: &mut dyn DocumentAdmin,
        names: &[String],
    ) -> Result<usize, SeedError> {
        let existing = admin
            .database_names()
            .map_err(|e| self.error("*", Phase::CreateDatabase, e))?;

        let mut created = 0;
        for name in names {
            if existing.iter().any(|db| db == name) {
                continue;
            }
            admin
                .create_database(name)
                .map_err(|e| self.error(name, Phase::CreateDatabase, e))?;
            created += 1;
        }
        Ok(created)
    }

    /// Create collections and insert `rows_per_table` documents into each.
    ///
    /// Inserts are unordered: a rejected document does not stop the rest.
    /// Afterwards every collection must hold at least the expected number of
    /// documents. A short collection does not stop its siblings; once all are
    /// written and synced, the first shortfall is returned.
    pub fn materialize_docs<R: Rng + ?Sized>(
        &self,
        store: &mut dyn DocumentStore,
        database: &str,
        schema: &CollectionSchema,
        rng: &mut R,
    ) -> Result<MaterializeStats, SeedError> {
        let start = Instant::now();
        let expected = self.knobs.rows_per_table as u64;
        let mut stats = MaterializeStats::default();
        let mut shortfall = None;

        let existing = store
            .collection_names()
            .map_err(|e| self.error(database, Phase::Ddl, e))?;

        for collection in &schema.collections {
            if !existing.contains(collection) {
                store
                    .create_collection(collection)
                    .map_err(|e| self.error(database, Phase::Ddl, e))?;
            }
            stats.objects += 1;

            let docs: Vec<Document> = (0..expected)
                .map(|_| self.values.shaped_document(self.knobs.document_shape, rng))
                .collect();
            let outcome = store
                .insert_many(collection, &docs)
                .map_err(|e| self.error(database, Phase::Dml, e))?;
            if !outcome.failures.is_empty() {
                warn!(
                    target_label = %self.label,
                    database = %database,
                    collection = %collection,
                    failed = outcome.failures.len(),
                    first = %outcome.failures[0],
                    "bulk insert partially failed"
                );
            }
            stats.rows += outcome.inserted;
            self.report_rows(database, outcome.inserted);

            let actual = store
                .count_documents(collection)
                .map_err(|e| self.error(database, Phase::Verify, e))?;
            if actual < expected {
                warn!(
                    target_label = %self.label,
                    database = %database,
                    collection = %collection,
                    expected,
                    actual,
                    "collection short of documents"
                );
                shortfall.get_or_insert(SeedError::Verification {
                    target: self.label.clone(),
                    database: database.to_string(),
                    collection: collection.clone(),
                    expected,
                    actual,
                });
            }
        }

        store
            .sync()
            .map_err(|e| self.error(database, Phase::Verify, e))?;
        stats.commits += 1;

        if let Some(err) = shortfall {
            return Err(err);
        }

        debug!(
            target_label = %self.label,
            database = %database,
            collections = stats.objects,
            documents = stats.rows,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "documents synced"
        );
        Ok(stats)
    }
}
