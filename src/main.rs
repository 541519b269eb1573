//! Table Count Diff - Main entry point.
//!
//! Counts the rows of every configured table on two databases and prints the
//! per-table difference.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use table_count_diff::config::Config;
use table_count_diff::db::Database;
use table_count_diff::error::{DbError, DbResult};
use table_count_diff::models::{ComparisonOutcome, TableList};
use table_count_diff::{Orchestrator, Report};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging. Logs go to stderr so the
/// report on stdout stays clean.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn open_databases(config: &Config) -> DbResult<(Database, Database)> {
    let source = Database::open(&config.source_config()?).await?;
    let destination = match config.dest_config() {
        Ok(dest_config) => Database::open(&dest_config).await,
        Err(e) => Err(e),
    };
    match destination {
        Ok(destination) => Ok((source, destination)),
        Err(e) => {
            source.close().await;
            Err(e)
        }
    }
}

async fn compare(
    config: &Config,
    tables: TableList,
    source: Arc<Database>,
    destination: Arc<Database>,
) -> DbResult<ComparisonOutcome> {
    let orchestrator = Orchestrator::new(tables, source, destination, config.limiter_capacity()?)?
        .with_policy(config.failure_policy());

    orchestrator.run().await
}

/// Process status for a finished run: success only when every table was compared.
fn exit_code(result: &DbResult<ComparisonOutcome>) -> ExitCode {
    match result {
        Ok(outcome) if outcome.is_complete() => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Log a fatal error and echo it to stderr, which stays visible under any log filter.
fn fail(context: &str, err: &DbError) -> ExitCode {
    error!(error = %err, suggestion = err.suggestion(), "{}", context);
    eprintln!("Error: {}: {}", context, err);
    if let Some(suggestion) = err.suggestion() {
        eprintln!("Hint: {}", suggestion);
    }
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment may already carry the settings.
    dotenv::dotenv().ok();

    let config = Config::parse();
    init_tracing(&config);

    // Reject bad table names before any connection is opened.
    let tables = match config.table_list() {
        Ok(tables) => tables,
        Err(e) => return fail("Invalid table list", &e),
    };

    info!(
        tables = tables.len(),
        "Starting Table Count Diff v{}",
        env!("CARGO_PKG_VERSION")
    );

    let (source, destination) = match open_databases(&config).await {
        Ok(databases) => databases,
        Err(e) => return fail("Failed to initialize databases", &e),
    };
    info!(
        source = %source.name(),
        source_type = %source.db_type(),
        destination = %destination.name(),
        destination_type = %destination.db_type(),
        "Databases initialized"
    );

    let source = Arc::new(source);
    let destination = Arc::new(destination);
    let result = compare(&config, tables, Arc::clone(&source), Arc::clone(&destination)).await;

    source.close().await;
    destination.close().await;
    info!("Database connections closed");

    let code = exit_code(&result);
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return fail("Comparison failed", &e),
    };

    let report = Report::new(source.name(), destination.name(), outcome);
    match report.render(config.format) {
        Ok(rendered) => println!("{}", rendered.trim_end()),
        Err(e) => return fail("Failed to render report", &e),
    }

    info!("Done");
    code
}
