//! CLI handler for reporting a call's outcome.

use anyhow::Result;
use chrono::Utc;

use crustula_core::models::CallUpdate;
use crustula_core::service;

use crate::config::Config;
use crate::jars::outcome_label;
use crate::sqlite_store::SqliteStore;

/// `crustula report`: record whether the jar handed out for a call worked.
///
/// The call's timestamp moves to the report time, so the jar's last-used
/// time reflects when the outcome was observed.
pub async fn run_report(
    config: &Config,
    call_id: &str,
    success: bool,
    url: Option<String>,
) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let update = CallUpdate {
        url,
        timestamp: Some(Utc::now()),
        success: Some(success),
    };
    let call = service::report_call(&store, call_id, &update).await?;
    store.pool().close().await;

    println!("{} {}", call.id, outcome_label(call.success));
    Ok(())
}
