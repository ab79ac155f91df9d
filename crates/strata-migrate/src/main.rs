//! strata-migrate CLI
//!
//! Command-line tool for planning and applying table migrations.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use strata_migrate::prelude::*;

/// Declarative table migrations.
#[derive(Parser)]
#[command(name = "strata-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL.
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:strata.db")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the operations needed to reach a declared schema.
    Plan {
        /// JSON file holding the declared table.
        #[arg(short, long)]
        schema: PathBuf,
    },

    /// Print the SQL for the planned operations without executing it.
    Sql {
        /// JSON file holding the declared table.
        #[arg(short, long)]
        schema: PathBuf,

        /// Show revert SQL instead of forward SQL.
        #[arg(short, long)]
        reverse: bool,
    },

    /// Bring a table up to its declared schema.
    Apply {
        /// JSON file holding the declared table.
        #[arg(short, long)]
        schema: PathBuf,

        /// Write the applied migration here so it can be reverted later.
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Revert a saved migration.
    Revert {
        /// Migration file written by `apply --save`.
        #[arg(short, long)]
        plan: PathBuf,
    },

    /// Print the live definition of a table.
    Inspect {
        /// Table name.
        #[arg(short, long)]
        table: String,
    },
}

fn read_schema(path: &Path) -> anyhow::Result<TableSchema> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading schema file {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing schema file {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut backend = SqliteBackend::connect(&cli.database)
        .await
        .with_context(|| format!("connecting to {}", cli.database))?;

    match cli.command {
        Commands::Plan { schema } => {
            let declared = read_schema(&schema)?;
            let migration = Migration::plan_against(&mut backend, &declared).await?;
            if migration.is_empty() {
                info!(table = %declared.name, "Schema up to date");
            }
            println!("{}", serde_json::to_string_pretty(migration.operations())?);
        }

        Commands::Sql { schema, reverse } => {
            let declared = read_schema(&schema)?;
            let migration = Migration::plan_against(&mut backend, &declared).await?;
            let statements = if reverse {
                migration.revert_sql(backend.dialect())?
            } else {
                migration.sql(backend.dialect())?
            };
            for statement in statements {
                println!("{statement};");
            }
        }

        Commands::Apply { schema, save } => {
            let declared = read_schema(&schema)?;
            let migration = migrate(&mut backend, &declared).await?;
            if let Some(path) = save {
                migration.save(&path)?;
                info!(path = %path.display(), "Saved migration");
            }
        }

        Commands::Revert { plan } => {
            let mut migration = Migration::load(&plan)?;
            migration.revert(&mut backend).await?;
            migration.save(&plan)?;
        }

        Commands::Inspect { table } => match backend.introspect_table(&table).await? {
            Some(live) => println!("{}", serde_json::to_string_pretty(&live)?),
            None => info!(table = %table, "Table does not exist"),
        },
    }

    backend.close().await?;
    Ok(())
}
