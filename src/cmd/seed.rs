//! Seed command CLI handler.

use super::parse_range;
use anyhow::Context;
use db_seeder::backend::SandboxConnector;
use db_seeder::config::SeedPlan;
use db_seeder::orchestrator::Seeder;
use db_seeder::progress::{ProgressHook, ProgressKind};
use indicatif::{ProgressBar, ProgressStyle};
use seed_gen::{DocumentShape, EngineKind};
use std::path::PathBuf;
use std::time::Duration;

pub struct SeedArgs {
    pub config: Option<PathBuf>,
    pub sandbox: String,
    pub engines: Option<String>,
    pub databases: Option<usize>,
    pub rows: Option<usize>,
    pub tables: Option<String>,
    pub columns: Option<String>,
    pub commit_every: Option<usize>,
    pub max_depth: Option<usize>,
    pub document_shape: Option<String>,
    pub seed: Option<u64>,
    pub progress: bool,
}

pub fn run(args: SeedArgs) -> anyhow::Result<()> {
    let mut plan = match &args.config {
        Some(path) => SeedPlan::load(path)?,
        None => SeedPlan {
            targets: SeedPlan::default_targets(),
            ..SeedPlan::default()
        },
    };

    if let Some(engines) = &args.engines {
        let wanted = engines
            .split(',')
            .map(|s| s.trim().parse::<EngineKind>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        plan.targets.retain(|t| wanted.contains(&t.engine));
    }

    let knobs = &mut plan.knobs;
    if let Some(n) = args.databases {
        knobs.databases_per_target = n;
    }
    if let Some(n) = args.rows {
        knobs.rows_per_table = n;
    }
    if let Some(range) = &args.tables {
        (knobs.min_tables, knobs.max_tables) = parse_range(range)?;
    }
    if let Some(range) = &args.columns {
        (knobs.min_columns, knobs.max_columns) = parse_range(range)?;
    }
    if args.commit_every.is_some() {
        knobs.commit_every = args.commit_every;
    }
    if let Some(depth) = args.max_depth {
        knobs.document_max_depth = depth;
    }
    if let Some(shape) = &args.document_shape {
        knobs.document_shape = shape
            .parse::<DocumentShape>()
            .map_err(|e| anyhow::anyhow!("{}", e))?;
    }
    if args.seed.is_some() {
        knobs.seed = args.seed;
    }

    plan.validate().context("Invalid seeding plan")?;

    let connector = SandboxConnector::from_location(&args.sandbox)
        .with_context(|| format!("Failed to open sandbox {}", args.sandbox))?;

    let progress_bar = if args.progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} rows {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut seeder = Seeder::new(connector, plan.knobs.clone());
    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        seeder = seeder.with_progress(ProgressHook::new(move |event| match event.kind {
            ProgressKind::Rows(n) => {
                pb_clone.inc(n);
                if let Some(db) = event.database {
                    pb_clone.set_message(format!("{} {}", event.target, db));
                }
            }
            ProgressKind::Database => {}
            ProgressKind::Target => pb_clone.set_message(format!("{} done", event.target)),
        }));
    }

    let report = seeder.run(&plan.targets);

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    eprintln!();
    eprintln!("Seed: {}", report.seed);
    for target in &report.targets {
        let status = if target.is_success() { "ok" } else { "FAILED" };
        eprintln!(
            "  {:<24} {:>3} databases {:>8} rows  {}",
            target.label,
            target.databases.iter().filter(|db| db.result.is_ok()).count(),
            target.rows(),
            status
        );
    }

    if report.is_success() {
        return Ok(());
    }

    eprintln!();
    for error in report.errors() {
        eprintln!("  error: {}", error);
    }
    anyhow::bail!(
        "{} of {} targets failed",
        report.failed_targets(),
        report.targets.len()
    )
}

