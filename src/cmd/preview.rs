//! Preview command CLI handler.

use super::parse_range;
use db_seeder::config::Knobs;
use db_seeder::materialize::dialect;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use seed_gen::{
    generate_collections, generate_schema, translation_table, Dialect, EngineKind, ValueGenerator,
};
use std::io::{self, Write};

/// Database name used in rendered statements
const PREVIEW_DATABASE: &str = "preview_1";

pub fn run(
    engine: String,
    as_dialect: Option<String>,
    tables: Option<String>,
    rows: usize,
    seed: Option<u64>,
    types: bool,
) -> anyhow::Result<()> {
    let engine = engine
        .parse::<EngineKind>()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let render = as_dialect
        .map(|d| d.parse::<Dialect>().map_err(|e| anyhow::anyhow!("{}", e)))
        .transpose()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if types {
        let from = engine
            .dialect()
            .ok_or_else(|| anyhow::anyhow!("Engine {} has no column types", engine))?;
        let targets: Vec<Dialect> = match render {
            Some(d) => vec![d],
            None => Dialect::ALL.into_iter().filter(|d| *d != from).collect(),
        };
        for to in targets {
            writeln!(out, "-- {} -> {}", from, to)?;
            for row in translation_table(from, to) {
                writeln!(out, "{:<12} {:<18} {}", row.ty.to_string(), row.from, row.to)?;
            }
            writeln!(out)?;
        }
        return Ok(());
    }

    let knobs = Knobs::default();
    let (min, max) = match tables {
        Some(range) => parse_range(&range)?,
        None => (knobs.min_tables, knobs.max_tables),
    };
    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let values = ValueGenerator::new(knobs.document_max_depth);

    writeln!(out, "-- db-seeder preview, engine {}, seed {}", engine, seed)?;

    let Some(engine_dialect) = engine.dialect() else {
        let schema = generate_collections(min..=max, &mut rng)?;
        for collection in &schema.collections {
            writeln!(out, "// collection {}", collection)?;
            for _ in 0..rows {
                let doc = values.shaped_document(knobs.document_shape, &mut rng);
                writeln!(out, "{}", serde_json::Value::Object(doc))?;
            }
        }
        return Ok(());
    };

    let conn_dialect = render.unwrap_or(engine_dialect);
    let schema = generate_schema(
        engine,
        min..=max,
        knobs.column_range(),
        knobs.pass_through_probability,
        &mut rng,
    )?;

    let ddl = dialect::schema_ddl(engine_dialect, conn_dialect, PREVIEW_DATABASE, &schema)
        .map_err(|u| anyhow::anyhow!("Column {} has unmapped type {}", u.column, u.spelling))?;
    write!(out, "{}", ddl)?;
    writeln!(out)?;

    for table in &schema.tables {
        let types = table.value_types();
        for _ in 0..rows {
            let row = values.generate_row(&types, &mut rng);
            writeln!(
                out,
                "{}",
                dialect::insert_literal_sql(conn_dialect, table, &row)
            )?;
        }
    }

    Ok(())
}
