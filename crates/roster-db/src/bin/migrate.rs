//! # Migration Tool
//!
//! Applies, reverts and inspects schema migrations.
//!
//! ## Usage
//! ```bash
//! # Apply everything pending
//! cargo run -p roster-db --bin migrate -- up
//!
//! # Revert the latest change-set
//! cargo run -p roster-db --bin migrate -- down
//!
//! # Show the recorded version
//! cargo run -p roster-db --bin migrate -- version
//!
//! # Clear a dirty state after repairing the schema by hand
//! cargo run -p roster-db --bin migrate -- force 2
//! cargo run -p roster-db --bin migrate -- force none
//!
//! # Scaffold a new up/down pair
//! cargo run -p roster-db --bin migrate -- create "add employee phone"
//! ```
//!
//! Connection settings come from `DB_*` / `DATABASE_URL` (a `.env` file is
//! loaded first). Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use roster_db::{migrations, CallContext, ConnectionPool, DatabaseSettings, MigrationManager};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "migrate", about = "Roster schema migrations")]
struct Cli {
    /// Directory holding `{version}_{name}.up.sql` / `.down.sql` files
    #[arg(long, global = true, default_value = "migrations/postgres")]
    path: PathBuf,

    /// Overall deadline in seconds
    #[arg(long, global = true, default_value_t = 300)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply all pending migrations
    Up,
    /// Roll back the most recent migration
    Down,
    /// Print the current version and dirty flag
    Version,
    /// Record VERSION (or `none`) as clean without running SQL
    Force { version: String },
    /// Create an empty up/down migration pair
    Create { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Scaffolding never needs a database.
    if let Command::Create { name } = &cli.command {
        return create(&cli, name).await;
    }

    let settings = DatabaseSettings::from_env().context("loading database settings")?;
    let pool = ConnectionPool::initialize(&settings)
        .await
        .context("connecting to database")?;
    let manager: MigrationManager = pool.migrations();
    let ctx = CallContext::with_timeout(Duration::from_secs(cli.timeout));

    let outcome = run(&cli, &manager, &ctx).await;
    pool.close().await;
    outcome
}

async fn run(cli: &Cli, manager: &MigrationManager, ctx: &CallContext) -> anyhow::Result<()> {
    match &cli.command {
        Command::Up => {
            let applied = manager.run_migrations(ctx, &cli.path).await?;
            if applied.is_empty() {
                println!("no change");
            } else {
                for version in applied {
                    println!("applied {version}");
                }
            }
        }
        Command::Down => match manager.rollback_one(ctx, &cli.path).await? {
            Some(version) => println!("rolled back {version}"),
            None => println!("no change"),
        },
        Command::Version => {
            let state = manager.current_version(ctx, &cli.path).await?;
            match state.version {
                Some(version) if state.dirty => println!("{version} (dirty)"),
                Some(version) => println!("{version}"),
                None => println!("no version"),
            }
        }
        Command::Force { version } => {
            let version = parse_force_version(version)?;
            manager.force(ctx, &cli.path, version).await?;
            info!(?version, "Forced");
        }
        Command::Create { name } => create(cli, name).await?,
    }

    Ok(())
}

async fn create(cli: &Cli, name: &str) -> anyhow::Result<()> {
    let (up, down) = migrations::create_migration(&cli.path, name)
        .await
        .context("creating migration files")?;
    println!("{}", up.display());
    println!("{}", down.display());
    Ok(())
}

fn parse_force_version(raw: &str) -> anyhow::Result<Option<u64>> {
    match raw.trim() {
        "none" => Ok(None),
        digits => match digits.parse::<u64>() {
            Ok(version) => Ok(Some(version)),
            Err(_) => bail!("invalid version {raw:?}: expected a number or `none`"),
        },
    }
}
