//! # ordersheet-cli
//!
//! Runs the store order report and a couple of database maintenance commands.
//! Connection settings come from flags, an optional YAML file, and the
//! `DATABASE_*` environment (a `.env` file is loaded first).

mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ordersheet_db::{DataAccess, DbValue, RawOutcome, TabularPayload};
use ordersheet_report::{ReportOptions, export_orders};
use serde_json::{Map, Value};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ConnectionArgs;

#[derive(Parser)]
#[command(name = "ordersheet")]
#[command(about = "Store order report and database tools")]
#[command(version)]
struct Cli {
    /// Path to a YAML connection config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export recent store orders to a CSV sheet
    Report {
        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Number of order pages to read
        #[arg(long, default_value_t = 5)]
        pages: u32,

        /// Orders per page
        #[arg(long, default_value_t = 100)]
        per_page: u32,

        /// Table holding the store endpoint and keys
        #[arg(long, default_value = "stock_update_config")]
        config_table: String,
    },

    /// Run a raw SQL statement
    Query {
        /// Statement text, executed as given
        sql: String,
    },

    /// Empty a table
    Truncate {
        /// Table name
        table: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = config::resolve(&cli.connection, cli.config.as_deref())?;
    info!(endpoint = %config.endpoint(), "Using database");
    let access = DataAccess::new(config);

    match cli.command {
        Commands::Report {
            output,
            pages,
            per_page,
            config_table,
        } => {
            let options = ReportOptions::new(output)
                .with_pages(pages, per_page)
                .with_config_table(config_table);
            let summary = export_orders(&access, &options)
                .await
                .context("order report failed")?;
            println!(
                "Wrote {} rows for {} orders ({} skipped) to {}",
                summary.rows,
                summary.orders,
                summary.skipped,
                options.output.display()
            );
        }
        Commands::Query { sql } => match access.execute_raw(&sql).await? {
            RawOutcome::Rows(payload) => {
                for line in json_lines(&payload)? {
                    println!("{line}");
                }
            }
            RawOutcome::Write(result) => {
                println!("{} rows affected", result.rows_affected);
            }
        },
        Commands::Truncate { table } => {
            let emptied = access
                .truncate(&table)
                .await
                .with_context(|| format!("failed to truncate {table}"))?;
            println!("{table}: {}", if emptied { "emptied" } else { "rows reported" });
        }
    }

    Ok(())
}

/// Logs go to stderr so query output on stdout stays machine-readable.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// One JSON object per row, keys in the column order the database reported.
fn json_lines(payload: &TabularPayload) -> anyhow::Result<Vec<String>> {
    payload
        .rows()
        .iter()
        .map(|cells| -> anyhow::Result<String> {
            let object: Map<String, Value> = payload
                .columns()
                .iter()
                .zip(cells)
                .map(|(column, value)| (column.clone(), json_value(value)))
                .collect();
            Ok(serde_json::to_string(&object)?)
        })
        .collect()
}

fn json_value(value: &DbValue) -> Value {
    match value {
        DbValue::String(s) => Value::String(s.clone()),
        DbValue::Integer(i) => Value::from(*i),
        DbValue::Decimal(f) => Value::from(*f),
        DbValue::Boolean(b) => Value::Bool(*b),
        DbValue::Null => Value::Null,
    }
}
