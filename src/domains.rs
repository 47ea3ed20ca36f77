//! Per-domain overview.
//!
//! Lists every domain seen in jars or calls, the jar a lookup would hand
//! out right now, and the most recent calls. Used by `crustula domains`.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crustula_core::service;

use crate::config::Config;
use crate::jars::outcome_label;
use crate::sqlite_store::SqliteStore;

/// Run the domains command: query the database and print a summary.
pub async fn run_domains(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let domains = service::domain_overview(
        &store,
        &config.selection_policy(),
        config.domains.recent_calls,
    )
    .await?;
    store.pool().close().await;

    if domains.is_empty() {
        println!("No domains yet. Add a jar with `crustula add`.");
        return Ok(());
    }

    println!(
        "  {:<32} {:<38} {:>6}   {}",
        "DOMAIN", "ACTIVE JAR", "CALLS", "LAST CALL"
    );
    println!("  {}", "-".repeat(96));

    let now = Utc::now();
    for d in &domains {
        let active = d
            .active_jar
            .as_ref()
            .map(|j| j.id.as_str())
            .unwrap_or("(none usable)");
        let last = match d.recent_calls.first() {
            Some(call) => format!(
                "{} ({})",
                call_age(call.timestamp, now),
                outcome_label(call.success)
            ),
            None => "never".to_string(),
        };
        println!(
            "  {:<32} {:<38} {:>6}   {}",
            d.domain,
            active,
            d.recent_calls.len(),
            last
        );
    }

    println!();
    Ok(())
}

/// Age of a domain's last call, coarsened to the largest whole unit.
///
/// Calls older than a month, or stamped in the future by a client clock,
/// show the date instead.
fn call_age(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - ts).num_seconds();
    let unit = [(86_400, "day"), (3_600, "hour"), (60, "min")]
        .into_iter()
        .find(|(size, _)| secs >= *size);
    match unit {
        _ if !(0..86_400 * 30).contains(&secs) => call_date(ts),
        Some((size, name)) => {
            let n = secs / size;
            format!("{} {}{} ago", n, name, if n == 1 { "" } else { "s" })
        }
        None => "just now".to_string(),
    }
}

fn call_date(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_call_age_units() {
        let now = now();
        assert_eq!(call_age(now, now), "just now");
        assert_eq!(call_age(now - Duration::seconds(59), now), "just now");
        assert_eq!(call_age(now - Duration::minutes(5), now), "5 mins ago");
        assert_eq!(call_age(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(call_age(now - Duration::days(3), now), "3 days ago");
    }

    #[test]
    fn test_future_and_old_calls_show_date() {
        let now = now();
        let future = now + Duration::hours(2);
        assert_eq!(call_age(future, now), call_date(future));
        let old = now - Duration::days(90);
        assert_eq!(call_age(old, now), "2023-08-16 22:13");
    }
}
