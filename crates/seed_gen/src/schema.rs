//! Random schema generation.
//!
//! A relational schema is a set of `<word>_<ordinal>` tables, each starting with
//! the engine-managed `id` key, followed by randomly named and typed columns and
//! an optional `ref_id` integer. The document engine gets a list of collection
//! names built the same way.

use crate::fake;
use crate::types::{AbstractColumnType, EngineKind};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Name of the engine-managed surrogate key column
pub const ID_COLUMN: &str = "id";
/// Name of the optional pass-through integer column
pub const REF_COLUMN: &str = "ref_id";

/// Default number of tables per schema
pub const DEFAULT_TABLES: RangeInclusive<usize> = 4..=10;
/// Default number of random columns per table
pub const DEFAULT_COLUMNS: RangeInclusive<usize> = 6..=10;
/// Default probability of appending the `ref_id` column
pub const DEFAULT_PASS_THROUGH_PROBABILITY: f64 = 0.2;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaGenerationError {
    #[error("engine {0} has no column types to draw from")]
    NoAllowedTypes(EngineKind),
    #[error("invalid {what} range {min}..={max}")]
    InvalidRange {
        what: &'static str,
        min: usize,
        max: usize,
    },
    #[error("pass-through probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
}

/// Column definition. `ty` is `None` only for the surrogate key.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: Option<AbstractColumnType>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, ty: AbstractColumnType) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
        }
    }

    pub fn surrogate_key() -> Self {
        Self {
            name: ID_COLUMN.to_string(),
            ty: None,
        }
    }

    pub fn is_key(&self) -> bool {
        self.ty.is_none()
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    /// Columns that receive generated values, in declaration order
    pub fn value_columns(&self) -> impl Iterator<Item = (&str, AbstractColumnType)> {
        self.columns
            .iter()
            .filter_map(|c| c.ty.map(|ty| (c.name.as_str(), ty)))
    }

    /// Abstract types of the value columns, in declaration order
    pub fn value_types(&self) -> Vec<AbstractColumnType> {
        self.value_columns().map(|(_, ty)| ty).collect()
    }

    pub fn has_pass_through(&self) -> bool {
        self.columns
            .last()
            .is_some_and(|c| c.name == REF_COLUMN)
    }

    /// Number of random columns, excluding `id` and `ref_id`
    pub fn random_column_count(&self) -> usize {
        let extra = if self.has_pass_through() { 2 } else { 1 };
        self.columns.len().saturating_sub(extra)
    }
}

/// Relational schema for one target database
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSpec {
    pub engine: EngineKind,
    pub tables: Vec<TableSpec>,
}

impl SchemaSpec {
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }
}

/// Document-store schema: ordered collection names
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
    pub collections: Vec<String>,
}

/// Generate a fresh relational schema for `engine`.
///
/// Fails only when `engine` has no column types or when a range is empty.
pub fn generate_schema<R: Rng + ?Sized>(
    engine: EngineKind,
    tables: RangeInclusive<usize>,
    columns: RangeInclusive<usize>,
    pass_through_probability: f64,
    rng: &mut R,
) -> Result<SchemaSpec, SchemaGenerationError> {
    let allowed = engine.allowed_types();
    if allowed.is_empty() {
        return Err(SchemaGenerationError::NoAllowedTypes(engine));
    }
    check_range("table", &tables)?;
    check_range("column", &columns)?;
    if !(0.0..=1.0).contains(&pass_through_probability) {
        return Err(SchemaGenerationError::InvalidProbability(
            pass_through_probability,
        ));
    }

    let table_count = rng.random_range(tables);
    let mut specs = Vec::with_capacity(table_count);

    for ordinal in 1..=table_count {
        let column_count = rng.random_range(columns.clone());
        let mut used: HashSet<String> = [ID_COLUMN, REF_COLUMN]
            .into_iter()
            .map(String::from)
            .collect();

        let mut cols = Vec::with_capacity(column_count + 2);
        cols.push(ColumnSpec::surrogate_key());

        while cols.len() < column_count + 1 {
            let name = fake::word(rng, fake::WORD_LEN);
            if !used.insert(name.clone()) {
                continue;
            }
            let ty = allowed
                .choose(rng)
                .copied()
                .ok_or(SchemaGenerationError::NoAllowedTypes(engine))?;
            cols.push(ColumnSpec::new(name, ty));
        }

        if rng.random_bool(pass_through_probability) {
            cols.push(ColumnSpec::new(REF_COLUMN, AbstractColumnType::Integer));
        }

        specs.push(TableSpec {
            name: ordinal_name(rng, ordinal),
            columns: cols,
        });
    }

    Ok(SchemaSpec {
        engine,
        tables: specs,
    })
}

/// Generate collection names for the document engine
pub fn generate_collections<R: Rng + ?Sized>(
    collections: RangeInclusive<usize>,
    rng: &mut R,
) -> Result<CollectionSchema, SchemaGenerationError> {
    check_range("collection", &collections)?;
    let count = rng.random_range(collections);
    Ok(CollectionSchema {
        collections: (1..=count).map(|i| ordinal_name(rng, i)).collect(),
    })
}

fn ordinal_name<R: Rng + ?Sized>(rng: &mut R, ordinal: usize) -> String {
    format!("{}_{}", fake::word(rng, fake::WORD_LEN), ordinal)
}

fn check_range(
    what: &'static str,
    range: &RangeInclusive<usize>,
) -> Result<(), SchemaGenerationError> {
    if range.is_empty() || *range.start() == 0 {
        return Err(SchemaGenerationError::InvalidRange {
            what,
            min: *range.start(),
            max: *range.end(),
        });
    }
    Ok(())
}
