//! Counter-reset maintenance tool. Runs outside the request path; refuses
//! to reset a counter once receipts or identifiers exist for its cycle.
//!
//! Usage: reset-counters <branch-uuid> <kind> <cycle>

use std::sync::Arc;

use admissions_service::config::Config;
use admissions_service::models::{CounterKey, SequenceKind};
use admissions_service::services::{init_metrics, Database, MaintenanceService};
use anyhow::{bail, Context, Result};
use registrar_core::observability::init_tracing;
use secrecy::ExposeSecret;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.service_name, &config.log_level);
    init_metrics();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        bail!("usage: reset-counters <branch-uuid> <kind> <cycle>");
    }

    let branch_id: Uuid = args[1].parse().context("invalid branch uuid")?;
    let kind = SequenceKind::from_string(&args[2]).with_context(|| {
        format!(
            "unknown sequence kind '{}' (expected registration_no, enrollment_no, receipt_no or exam_serial_no)",
            args[2]
        )
    })?;
    let cycle: i32 = args[3].parse().context("invalid cycle")?;

    let database = Database::new(
        config.database.url.expose_secret(),
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    database.run_migrations().await?;

    let db = Arc::new(database);
    let maintenance = MaintenanceService::new(db.clone(), db.clone(), db);

    let key = CounterKey::new(branch_id, kind, cycle);
    maintenance.reset_counter(&key).await?;

    println!("Counter {} reset", key);

    Ok(())
}
