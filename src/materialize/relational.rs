use super::dialect::{self, CreateDatabase};
use super::{MaterializeStats, Materializer, PROGRESS_INTERVAL};
use crate::backend::SqlConnection;
use crate::error::{BackendError, Phase, SeedError};
use rand::Rng;
use seed_gen::{SchemaGenerationError, SchemaSpec, SqlValue};
use std::time::Instant;
use tracing::debug;

impl Materializer<'_> {
    /// Create every database in `names` that does not exist yet.
    ///
    /// Runs on an admin connection with no open transaction and is safe to
    /// repeat. Returns how many databases were actually created.
    pub fn create_databases(
        &self,
        admin: &mut dyn SqlConnection,
        names: &[String],
    ) -> Result<usize, SeedError> {
        let dialect = admin.dialect();
        let mut created = 0;

        for name in names {
            let fail = |e| self.error(name, Phase::CreateDatabase, e);
            match dialect::create_database(dialect, name) {
                CreateDatabase::CheckThenCreate {
                    exists_sql,
                    create_sql,
                } => {
                    let rows = admin
                        .query(&exists_sql, &[SqlValue::String(name.clone())])
                        .map_err(fail)?;
                    if rows.is_empty() {
                        admin.execute(&create_sql, &[]).map_err(fail)?;
                        created += 1;
                        debug!(target_label = %self.label, database = %name, "created database");
                    }
                }
                CreateDatabase::IfNotExists(sql) => {
                    let affected = admin.execute(&sql, &[]).map_err(fail)?;
                    if affected > 0 {
                        created += 1;
                    }
                }
            }
        }

        Ok(created)
    }

    /// Create the schema's tables and fill each with `rows_per_table` rows.
    ///
    /// DDL is committed once before any row is inserted. Rows are committed
    /// per table, and every `commit_every` rows when that knob is set.
    /// Tables left by an earlier run are topped up to `rows_per_table`, never
    /// past it; a table already holding more rows is an error.
    pub fn materialize<R: Rng + ?Sized>(
        &self,
        conn: &mut dyn SqlConnection,
        database: &str,
        schema: &SchemaSpec,
        rng: &mut R,
    ) -> Result<MaterializeStats, SeedError> {
        let engine = schema
            .engine
            .dialect()
            .ok_or_else(|| {
                SeedError::schema_generation(
                    &self.label,
                    database,
                    SchemaGenerationError::NoAllowedTypes(schema.engine),
                )
            })?;
        let conn_dialect = conn.dialect();
        let mut stats = MaterializeStats::default();

        let start = Instant::now();
        for table in &schema.tables {
            for stmt in dialect::key_prelude(conn_dialect, database, &table.name) {
                conn.execute(&stmt, &[])
                    .map_err(|e| self.error(database, Phase::Ddl, e))?;
            }
            let sql = dialect::create_table_sql(engine, conn_dialect, database, table).map_err(
                |unmapped| {
                    self.error(
                        database,
                        Phase::Ddl,
                        BackendError::statement(
                            &format!("CREATE TABLE {}", table.name),
                            format!(
                                "column {} has type {} with no {} spelling",
                                unmapped.column, unmapped.spelling, conn_dialect
                            ),
                        ),
                    )
                },
            )?;
            conn.execute(&sql, &[])
                .map_err(|e| self.error(database, Phase::Ddl, e))?;
            stats.objects += 1;
        }
        conn.commit()
            .map_err(|e| self.error(database, Phase::Ddl, e))?;
        stats.commits += 1;
        debug!(
            target_label = %self.label,
            database = %database,
            tables = stats.objects,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ddl committed"
        );

        let rows_per_table = self.knobs.rows_per_table as u64;
        for table in &schema.tables {
            let count_sql = dialect::count_rows_sql(conn_dialect, &table.name);
            let existing = existing_rows(conn, &count_sql)
                .map_err(|e| self.error(database, Phase::Dml, e))?;
            if existing > rows_per_table {
                return Err(self.error(
                    database,
                    Phase::Dml,
                    BackendError::statement(
                        &count_sql,
                        format!(
                            "table {} already holds {} rows, more than {}",
                            table.name, existing, rows_per_table
                        ),
                    ),
                ));
            }
            if existing == rows_per_table {
                debug!(
                    target_label = %self.label,
                    database = %database,
                    table = %table.name,
                    rows = existing,
                    "table already populated"
                );
                continue;
            }

            let sql = dialect::insert_sql(conn_dialect, table);
            let types = table.value_types();
            let mut unreported = 0u64;

            for row in (existing + 1)..=rows_per_table {
                let values = self.values.generate_row(&types, rng);
                conn.execute(&sql, &values)
                    .map_err(|e| self.error(database, Phase::Dml, e))?;
                stats.rows += 1;
                unreported += 1;

                if row % PROGRESS_INTERVAL == 0 {
                    debug!(
                        target_label = %self.label,
                        database = %database,
                        table = %table.name,
                        rows = row,
                        "inserting"
                    );
                    self.report_rows(database, unreported);
                    unreported = 0;
                }
                if let Some(every) = self.knobs.commit_every {
                    if every > 0 && row % every as u64 == 0 && row < rows_per_table {
                        conn.commit()
                            .map_err(|e| self.error(database, Phase::Dml, e))?;
                        stats.commits += 1;
                    }
                }
            }

            conn.commit()
                .map_err(|e| self.error(database, Phase::Dml, e))?;
            stats.commits += 1;
            self.report_rows(database, unreported);
        }

        debug!(
            target_label = %self.label,
            database = %database,
            rows = stats.rows,
            commits = stats.commits,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "dml committed"
        );
        Ok(stats)
    }
}

/// Committed row count reported by a `COUNT(*)` query
fn existing_rows(conn: &mut dyn SqlConnection, sql: &str) -> Result<u64, BackendError> {
    let rows = conn.query(sql, &[])?;
    match rows.first().and_then(|row| row.first()) {
        Some(SqlValue::Int(n)) if *n >= 0 => Ok(*n as u64),
        other => Err(BackendError::statement(
            sql,
            format!("unexpected row count {:?}", other),
        )),
    }
}
