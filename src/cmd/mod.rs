mod preview;
mod seed;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "db-seeder")]
#[command(version)]
#[command(
    about = "Seed relational and document databases with randomized, schema-valid data",
    long_about = None
)]
pub struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate and materialize databases for every configured target
    Seed {
        /// YAML seeding plan with `knobs` and `targets` sections
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Embedded DuckDB sandbox: a database file, or :memory:
        #[arg(long, default_value = ":memory:")]
        sandbox: String,

        /// Engines to seed when no plan is given (comma-separated)
        #[arg(short, long)]
        engines: Option<String>,

        /// Databases per target
        #[arg(long)]
        databases: Option<usize>,

        /// Rows per table (documents per collection)
        #[arg(long)]
        rows: Option<usize>,

        /// Tables per database, as MIN..MAX or a single count
        #[arg(long)]
        tables: Option<String>,

        /// Random columns per table, as MIN..MAX or a single count
        #[arg(long)]
        columns: Option<String>,

        /// Also commit every N rows inside a table
        #[arg(long)]
        commit_every: Option<usize>,

        /// Maximum nesting depth of generated documents
        #[arg(long)]
        max_depth: Option<usize>,

        /// Document shape for the document engine: nested, contact
        #[arg(long)]
        document_shape: Option<String>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Show progress while seeding
        #[arg(short, long)]
        progress: bool,
    },

    /// Print the DDL and INSERT statements a seeding run would issue
    Preview {
        /// Engine whose type catalog the schema is generated for
        #[arg(short, long, default_value = "postgres")]
        engine: String,

        /// Render for another dialect: postgres, mysql, mariadb, duckdb
        #[arg(long = "as")]
        as_dialect: Option<String>,

        /// Tables to generate, as MIN..MAX or a single count
        #[arg(long)]
        tables: Option<String>,

        /// Sample rows per table
        #[arg(long, default_value = "3")]
        rows: usize,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Print the type translation table instead of a schema
        #[arg(long)]
        types: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Seed {
            config,
            sandbox,
            engines,
            databases,
            rows,
            tables,
            columns,
            commit_every,
            max_depth,
            document_shape,
            seed,
            progress,
        } => seed::run(seed::SeedArgs {
            config,
            sandbox,
            engines,
            databases,
            rows,
            tables,
            columns,
            commit_every,
            max_depth,
            document_shape,
            seed,
            progress,
        }),
        Commands::Preview {
            engine,
            as_dialect,
            tables,
            rows,
            seed,
            types,
        } => preview::run(engine, as_dialect, tables, rows, seed, types),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "db-seeder",
                &mut io::stdout().lock(),
            );
            Ok(())
        }
    }
}

/// Install the tracing subscriber. Logs go to stderr.
pub fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}

/// Parse `A..B`, `A..=B` or `A` into an inclusive range
pub(crate) fn parse_range(value: &str) -> anyhow::Result<(usize, usize)> {
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("Invalid range {:?}: expected MIN..MAX or N", value))
    };

    let (min, max) = if let Some((a, b)) = value.split_once("..=") {
        (parse(a)?, parse(b)?)
    } else if let Some((a, b)) = value.split_once("..") {
        (parse(a)?, parse(b)?)
    } else {
        let n = parse(value)?;
        (n, n)
    };

    if min == 0 || min > max {
        anyhow::bail!("Invalid range {:?}: need 1 <= MIN <= MAX", value);
    }
    Ok((min, max))
}
