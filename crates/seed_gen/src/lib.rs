//! Synthetic schema and value generation for db-seeder.
//!
//! Everything here is pure and I/O free. Given a seeded RNG the output is
//! fully reproducible.
//!
//! # Example
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use seed_gen::{generate_schema, EngineKind, ValueGenerator};
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let schema = generate_schema(EngineKind::Postgres, 4..=4, 6..=10, 0.2, &mut rng).unwrap();
//! assert_eq!(schema.tables.len(), 4);
//!
//! let values = ValueGenerator::default();
//! let row = values.generate_row(&schema.tables[0].value_types(), &mut rng);
//! assert_eq!(row.len(), schema.tables[0].columns.len() - 1);
//! ```

pub mod fake;
pub mod schema;
pub mod types;
pub mod value;

pub use schema::{
    generate_collections, generate_schema, CollectionSchema, ColumnSpec, SchemaGenerationError,
    SchemaSpec, TableSpec, ID_COLUMN, REF_COLUMN,
};
pub use types::{
    translate, translate_native, translation_table, AbstractColumnType, Dialect, EngineFamily,
    EngineKind, TypeTranslation,
};
pub use value::{DocumentShape, SqlValue, ValueGenerator};
