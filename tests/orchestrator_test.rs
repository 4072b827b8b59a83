//! Run-level behavior of the seeder across several targets.

#[path = "fake_backend/mod.rs"]
mod fake_backend;

use db_seeder::config::{EngineTarget, Knobs, SecurityVariant};
use db_seeder::error::{Phase, SeedError};
use db_seeder::orchestrator::Seeder;
use db_seeder::progress::{ProgressHook, ProgressKind};
use fake_backend::FakeConnector;
use seed_gen::EngineKind;
use std::cell::RefCell;
use std::rc::Rc;

fn knobs() -> Knobs {
    Knobs {
        databases_per_target: 2,
        rows_per_table: 6,
        min_tables: 2,
        max_tables: 4,
        seed: Some(2024),
        ..Knobs::default()
    }
}

fn targets() -> Vec<EngineTarget> {
    vec![
        EngineTarget::new(EngineKind::Postgres, SecurityVariant::Plain, "pg"),
        EngineTarget::new(EngineKind::MySql, SecurityVariant::Tls, "my"),
        EngineTarget::new(EngineKind::MariaDb, SecurityVariant::MutualTls, "maria"),
        EngineTarget::new(EngineKind::Mongo, SecurityVariant::HsmTunnel, "mongo"),
    ]
}

#[test]
fn test_unreachable_target_does_not_stop_others() {
    let connector = FakeConnector::new().unreachable("mysql/tls");
    let state = connector.state.clone();

    let report = Seeder::new(connector, knobs()).run(&targets());

    assert!(!report.is_success());
    assert!(!report.aborted);
    assert_eq!(report.targets.len(), 4);
    assert_eq!(report.failed_targets(), 1);

    let failed = &report.targets[1];
    assert_eq!(failed.label, "mysql/tls");
    assert!(failed.databases.is_empty());
    match &failed.error {
        Some(SeedError::Connectivity { target, phase, .. }) => {
            assert_eq!(target, "mysql/tls");
            assert_eq!(*phase, Phase::Connect);
        }
        other => panic!("expected connectivity error, got {:?}", other),
    }

    for outcome in [&report.targets[0], &report.targets[2], &report.targets[3]] {
        assert!(outcome.is_success(), "{} failed", outcome.label);
        assert_eq!(outcome.databases.len(), 2);
    }

    let state = state.borrow();
    assert!(state.databases("mysql/tls").is_empty());
    assert_eq!(state.databases("mariadb/mutual_tls"), vec!["maria_1", "maria_2"]);
}

#[test]
fn test_first_error_names_the_failing_target() {
    let connector = FakeConnector::new().unreachable("postgres/plain");
    let report = Seeder::new(connector, knobs()).run(&targets());

    let message = report.first_error().unwrap().to_string();
    assert!(message.contains("postgres/plain"), "{}", message);
    assert_eq!(report.errors().count(), 1);
}

#[test]
fn test_report_carries_seed() {
    let report = Seeder::new(FakeConnector::new(), knobs()).run(&targets());
    assert_eq!(report.seed, 2024);
    assert!(report.is_success());
    assert!(report.targets.iter().all(|t| t.rows() > 0));
}

#[test]
fn test_same_seed_same_database_contents() {
    let run = || {
        let connector = FakeConnector::new();
        let state = connector.state.clone();
        Seeder::new(connector, knobs()).run(&targets());
        let state = state.borrow();
        let db = state.database("postgres/plain", "pg_2").unwrap();
        db.ddl.clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_per_target_database_override() {
    let connector = FakeConnector::new();
    let state = connector.state.clone();
    let targets = vec![
        EngineTarget::new(EngineKind::Postgres, SecurityVariant::Plain, "one").with_databases(1),
        EngineTarget::new(EngineKind::Postgres, SecurityVariant::Tls, "four").with_databases(4),
    ];

    let report = Seeder::new(connector, knobs()).run(&targets);
    assert!(report.is_success());

    let state = state.borrow();
    assert_eq!(state.databases("postgres/plain"), vec!["one_1"]);
    assert_eq!(state.databases("postgres/tls").len(), 4);
}

#[test]
fn test_progress_events_cover_rows_and_targets() {
    let rows = Rc::new(RefCell::new(0u64));
    let databases = Rc::new(RefCell::new(0usize));
    let finished = Rc::new(RefCell::new(Vec::new()));

    let hook = {
        let rows = rows.clone();
        let databases = databases.clone();
        let finished = finished.clone();
        ProgressHook::new(move |event| match event.kind {
            ProgressKind::Rows(n) => *rows.borrow_mut() += n,
            ProgressKind::Database => *databases.borrow_mut() += 1,
            ProgressKind::Target => finished.borrow_mut().push(event.target.to_string()),
        })
    };

    let report = Seeder::new(FakeConnector::new(), knobs())
        .with_progress(hook)
        .run(&targets());

    let total: u64 = report.targets.iter().map(|t| t.rows()).sum();
    assert_eq!(*rows.borrow(), total);
    assert_eq!(*databases.borrow(), 8);
    assert_eq!(
        *finished.borrow(),
        vec![
            "postgres/plain",
            "mysql/tls",
            "mariadb/mutual_tls",
            "mongo/hsm_tunnel"
        ]
    );
}

#[test]
fn test_invalid_ranges_abort_the_run() {
    let knobs = Knobs {
        min_tables: 0,
        max_tables: 0,
        ..knobs()
    };
    let report = Seeder::new(FakeConnector::new(), knobs).run(&targets());

    assert!(report.aborted);
    assert_eq!(report.targets.len(), 1);
    match &report.targets[0].error {
        Some(SeedError::SchemaGeneration { target, database, .. }) => {
            assert_eq!(target, "postgres/plain");
            assert_eq!(database, "pg_1");
        }
        other => panic!("expected schema generation error, got {:?}", other),
    }
    let message = report.first_error().unwrap().to_string();
    assert!(message.contains("postgres/plain"), "{}", message);
}
