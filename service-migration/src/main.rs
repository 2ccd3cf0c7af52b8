//! Service Migration Main Entry Point
//!
//! Runs one invocation of the migration pipeline, selected by the first
//! argument:
//!
//! - `full-sync`: migrate every matching legacy record and print the metrics
//! - `batch`: read queued messages from stdin and print the failed message ids
//! - `audit`: read change-capture records from stdin and print the failed sequence numbers

use dotenv::dotenv;
use service_migration::consumer::{BatchResponse, QueueMessage};
use service_migration::version_history::StreamRecord;
use service_migration::{Dependencies, MigrationError};
use std::env;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "usage: service-migration <full-sync|batch|audit>";

const MODES: [&str; 3] = ["full-sync", "batch", "audit"];

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("service_migration=info,service_migration_repository=info")
    });

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .pretty(),
            )
            .init();
    }

    info!(
        service_name = "service-migration",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
}

async fn read_stdin() -> Result<String, MigrationError> {
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    Ok(input)
}

async fn run(mode: &str) -> Result<(), MigrationError> {
    let mut deps = Dependencies::new().await?;
    info!(mode, "Dependencies initialized successfully");

    match mode {
        "full-sync" => {
            let metrics = deps.orchestrator.full_sync().await?;
            println!("{}", serde_json::to_string(&metrics)?);
        }
        "batch" => {
            let messages: Vec<QueueMessage> = serde_json::from_str(&read_stdin().await?)?;
            let failures = deps.orchestrator.handle_batch(&messages).await;
            println!("{}", serde_json::to_string(&BatchResponse::from_failures(failures))?);
        }
        "audit" => {
            let records: Vec<StreamRecord> = serde_json::from_str(&read_stdin().await?)?;
            let failures = deps.change_detector.process_stream_records(&records).await;
            println!("{}", serde_json::to_string(&BatchResponse::from_failures(failures))?);
        }
        other => return Err(MigrationError::config(format!("unknown mode {other}. {USAGE}"))),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), MigrationError> {
    dotenv().ok();
    init_tracing();

    let Some(mode) = env::args().nth(1).filter(|mode| MODES.contains(&mode.as_str())) else {
        return Err(MigrationError::config(USAGE));
    };

    info!(mode = %mode, "Starting service migration");
    match run(&mode).await {
        Ok(()) => {
            info!(mode = %mode, "Service migration completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(mode = %mode, error = %e, "Service migration failed");
            Err(e)
        }
    }
}
