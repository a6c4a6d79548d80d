//! pgworker command-line entry point
//!
//! Thin wrapper over the library: load a configuration, connect, run one
//! command.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pgworker::DatabaseWorker;
use pgworker::sql::SqlValue;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pgworker", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, default_value = "pgworker.yaml")]
    config: PathBuf,

    /// Write the configuration with discovered table details here
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print discovered table details as YAML
    Describe,
    /// Select rows from a table and print them
    Select {
        table: String,
        /// Comma-separated column list (default: all columns)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        /// Raw SQL condition
        #[arg(long = "where")]
        condition: Option<String>,
        #[arg(long, default_value_t = pgworker::sql::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Insert one row; values are given in table column order
    Insert {
        table: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Truncate a table and everything referencing it
    Clear {
        table: String,
        /// Confirm the truncation
        #[arg(long)]
        yes: bool,
    },
    /// Execute a statement and print its result
    Exec { sql: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pgworker=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut worker = DatabaseWorker::connect(&cli.config, None)
        .await
        .with_context(|| format!("failed to start from {}", cli.config.display()))?;

    match cli.command {
        Command::Describe => {
            let details = serde_yaml::to_string(&worker.config().tables_details)?;
            print!("{}", details);
        }
        Command::Select {
            table,
            columns,
            condition,
            limit,
        } => {
            let results = worker
                .select(&table, columns.as_slice(), condition.as_deref(), limit)
                .await?;
            worker.print(&results);
        }
        Command::Insert { table, values } => {
            let values: Vec<SqlValue> = values.iter().map(|v| SqlValue::parse_literal(v)).collect();
            let affected = worker.insert(&table, &values).await?;
            eprintln!("{} row(s) inserted", affected);
        }
        Command::Clear { table, yes } => {
            if !yes {
                bail!("refusing to truncate {} without --yes", table);
            }
            worker.clear(&table).await?;
        }
        Command::Exec { sql } => {
            let results = worker.execute(&sql).await?;
            if results.columns.is_empty() {
                eprintln!(
                    "{} row(s) affected in {:.1?}",
                    results.row_count, results.execution_time
                );
            } else {
                worker.print(&results);
                eprintln!(
                    "{} row(s) in {:.1?}",
                    results.row_count, results.execution_time
                );
            }
        }
    }

    // Written last so tables first seen by this command are included
    if let Some(path) = &cli.output {
        worker.write_config(path)?;
    }

    Ok(())
}
