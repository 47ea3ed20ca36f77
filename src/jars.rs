//! CLI handlers for jar creation, lookup, inspection, and deletion.
//!
//! Each handler opens the configured database, runs one service operation,
//! and prints the result to stdout.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;

use crustula_core::selector::jar_stats;
use crustula_core::service;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// `crustula add`: store a new jar from a copied curl command.
pub async fn run_add(config: &Config, curl_cmd: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let jar = service::create_jar(&store, curl_cmd, Utc::now()).await?;

    println!("id:     {}", jar.id);
    println!("domain: {}", jar.domain);
    store.pool().close().await;
    Ok(())
}

/// `crustula lookup`: hand out the best jar for `url`.
///
/// With `output`, the cookie-jar text is written to that file and only the
/// call id is printed, so scripts can feed the file to `curl -b`.
pub async fn run_lookup(config: &Config, url: &str, output: Option<&Path>) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let out =
        service::checkout_jar(&store, url, Utc::now(), &config.selection_policy()).await?;
    store.pool().close().await;

    match output {
        Some(path) => {
            std::fs::write(path, &out.jar.cookies)
                .with_context(|| format!("Failed to write cookie file: {}", path.display()))?;
            println!("{}", out.call.id);
        }
        None => {
            println!("call:   {}", out.call.id);
            println!("jar:    {}", out.jar.id);
            println!("domain: {}", out.call.domain);
            println!();
            print!("{}", out.jar.cookies);
        }
    }
    Ok(())
}

/// `crustula jar`: show a jar, its ranking stats, and its calls.
pub async fn run_show(config: &Config, id: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let jar = service::jar_with_calls(&store, id).await?;
    store.pool().close().await;

    let stats = jar_stats(&jar.jar, &jar.calls);
    println!("--- Jar ---");
    println!("id:             {}", jar.jar.id);
    println!("domain:         {}", jar.jar.domain);
    println!("ctime:          {}", jar.jar.ctime.to_rfc3339());
    println!("recent_success: {}", stats.recent_success);
    println!("last_used:      {}", stats.last_used.to_rfc3339());
    println!("strikes:        {}", stats.strikes);
    println!(
        "usable:         {}",
        !config.selection_policy().rejects(&stats)
    );
    println!();

    println!("--- Cookies ---");
    print!("{}", jar.jar.cookies);
    println!();

    println!("--- Calls ({}) ---", jar.calls.len());
    for call in jar.calls.iter().rev() {
        println!(
            "{}  {:<8} {}  {}",
            call.timestamp.format("%Y-%m-%d %H:%M:%S"),
            outcome_label(call.success),
            call.id,
            call.url.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// `crustula delete`: remove a jar and its calls.
pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    service::delete_jar(&store, id).await?;
    store.pool().close().await;
    println!("Deleted jar {}", id);
    Ok(())
}

pub(crate) fn outcome_label(success: Option<bool>) -> &'static str {
    match success {
        Some(true) => "ok",
        Some(false) => "failed",
        None => "pending",
    }
}
