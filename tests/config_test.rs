//! Seeding plan parsing and validation.

use db_seeder::config::{Knobs, SecurityVariant, SeedPlan};
use db_seeder::error::ConfigError;
use seed_gen::{DocumentShape, EngineKind};
use std::io::Write;
use tempfile::NamedTempFile;

const PLAN: &str = r#"
knobs:
  databases_per_target: 2
  rows_per_table: 100
  min_tables: 3
  max_tables: 5
  commit_every: 50
  document_shape: contact
  seed: 99
targets:
  - engine: postgres
    security: tls
    host: pg.internal
    port: 5432
    prefix: pg_tls
  - engine: mysql
    security: mtls
    prefix: shop
  - engine: maria
    prefix: maria
  - engine: mongodb
    security: hsm
    port: 27017
    prefix: docs
    databases: 1
"#;

#[test]
fn test_parse_full_plan() {
    let plan = SeedPlan::parse(PLAN).unwrap();
    plan.validate().unwrap();

    assert_eq!(plan.knobs.databases_per_target, 2);
    assert_eq!(plan.knobs.rows_per_table, 100);
    assert_eq!(plan.knobs.table_range(), 3..=5);
    assert_eq!(plan.knobs.commit_every, Some(50));
    assert_eq!(plan.knobs.document_shape, DocumentShape::Contact);
    assert_eq!(plan.knobs.seed, Some(99));
    // unspecified knobs keep their defaults
    assert_eq!(plan.knobs.column_range(), Knobs::default().column_range());

    assert_eq!(plan.targets.len(), 4);
    let pg = &plan.targets[0];
    assert_eq!(pg.engine, EngineKind::Postgres);
    assert_eq!(pg.security, SecurityVariant::Tls);
    assert_eq!(pg.host, "pg.internal");
    assert_eq!(pg.port, 5432);

    assert_eq!(plan.targets[1].security, SecurityVariant::MutualTls);
    assert_eq!(plan.targets[2].engine, EngineKind::MariaDb);
    assert_eq!(plan.targets[2].security, SecurityVariant::Plain);
    assert_eq!(plan.targets[2].host, "localhost");

    let docs = &plan.targets[3];
    assert_eq!(docs.engine, EngineKind::Mongo);
    assert_eq!(docs.security, SecurityVariant::HsmTunnel);
    assert_eq!(docs.database_names(&plan.knobs), vec!["docs_1"]);
    assert_eq!(docs.label(), "mongo/hsm_tunnel");
}

#[test]
fn test_empty_plan_has_no_targets() {
    let plan = SeedPlan::parse("knobs:\n  rows_per_table: 10\n").unwrap();
    assert!(matches!(plan.validate(), Err(ConfigError::NoTargets)));
}

#[test]
fn test_unknown_engine_rejected() {
    let yaml = "targets:\n  - engine: oracle\n    prefix: ora\n";
    assert!(SeedPlan::parse(yaml).is_err());
}

#[test]
fn test_invalid_knobs_rejected() {
    let yaml = "knobs:\n  pass_through_probability: 1.5\ntargets:\n  - engine: postgres\n    prefix: pg\n";
    let plan = SeedPlan::parse(yaml).unwrap();
    assert!(matches!(
        plan.validate(),
        Err(ConfigError::InvalidKnob {
            name: "pass_through_probability",
            ..
        })
    ));

    let yaml = "knobs:\n  commit_every: 0\ntargets:\n  - engine: postgres\n    prefix: pg\n";
    let plan = SeedPlan::parse(yaml).unwrap();
    assert!(matches!(
        plan.validate(),
        Err(ConfigError::InvalidKnob {
            name: "commit_every",
            ..
        })
    ));
}

#[test]
fn test_bad_prefix_rejected() {
    let yaml = "targets:\n  - engine: postgres\n    prefix: Bad-Name\n";
    let plan = SeedPlan::parse(yaml).unwrap();
    assert!(matches!(plan.validate(), Err(ConfigError::InvalidPrefix(_))));
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(PLAN.as_bytes()).unwrap();
    let plan = SeedPlan::load(file.path()).unwrap();
    assert_eq!(plan.targets.len(), 4);
}

#[test]
fn test_load_reports_path() {
    let err = SeedPlan::load(std::path::Path::new("/nonexistent/plan.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("/nonexistent/plan.yaml"));

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"targets: [").unwrap();
    assert!(matches!(
        SeedPlan::load(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_default_targets_cover_every_engine() {
    let targets = SeedPlan::default_targets();
    let engines: Vec<EngineKind> = targets.iter().map(|t| t.engine).collect();
    assert_eq!(engines, EngineKind::ALL.to_vec());
    assert!(targets.iter().all(|t| t.validate().is_ok()));
}
