//! The jar-cache operations, composed over any [`Store`].
//!
//! ```text
//! create:  curl command ─▶ curl ─▶ cookies_txt ─┐
//!                              └─▶ domain ──────┴─▶ Store::insert_jar
//! lookup:  URL ─▶ domain ─▶ Store::jars_for_domain ─▶ selector ─▶ Store::insert_call
//! ```
//!
//! Callers supply `now` so that behavior is reproducible in tests. Every
//! timestamp is cut to whole milliseconds on the way in, the resolution the
//! SQLite store keeps, so returned records match what a later read yields.

use chrono::{DateTime, SubsecRound, Utc};

use crate::cookies_txt::convert_header_to_cookies_str;
use crate::curl::extract_curl_string;
use crate::domain::domain_from_url;
use crate::error::{CrustulaError, Result};
use crate::models::{Call, CallUpdate, CallWithJar, DomainSummary, Jar, JarWithCalls};
use crate::selector::{select_jar, SelectionPolicy};
use crate::store::{CallUpdateOutcome, Store};

fn to_stored_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

/// Build the jar a curl command describes, without persisting it.
pub fn jar_from_curl(curl_cmd: &str, now: DateTime<Utc>) -> Result<Jar> {
    let request = extract_curl_string(curl_cmd)?;
    let domain = domain_from_url(&request.url);
    if domain.is_empty() {
        return Err(CrustulaError::MissingUrl);
    }
    let cookies = convert_header_to_cookies_str(&request.cookie_header);
    Ok(Jar::new(domain, cookies, to_stored_precision(now)))
}

/// Convert a curl command into a new jar and store it.
pub async fn create_jar(store: &dyn Store, curl_cmd: &str, now: DateTime<Utc>) -> Result<Jar> {
    let jar = jar_from_curl(curl_cmd, now)?;
    store.insert_jar(&jar).await?;
    tracing::info!(jar_id = %jar.id, domain = %jar.domain, "jar created");
    Ok(jar)
}

/// The jar a lookup for `domain` would hand out right now.
pub async fn jar_for_domain(
    store: &dyn Store,
    domain: &str,
    policy: &SelectionPolicy,
) -> Result<Option<Jar>> {
    let jars = store.jars_for_domain(domain).await?;
    Ok(select_jar(&jars, policy).map(|j| j.jar.clone()))
}

/// Hand out the best jar for `url` and record a pending call for it.
///
/// Fails with [`CrustulaError::NoUsableJar`] when the domain has no jar or
/// its best jar is rejected.
pub async fn checkout_jar(
    store: &dyn Store,
    url: &str,
    now: DateTime<Utc>,
    policy: &SelectionPolicy,
) -> Result<CallWithJar> {
    let domain = domain_from_url(url);
    let jar = jar_for_domain(store, domain, policy)
        .await?
        .ok_or_else(|| CrustulaError::NoUsableJar(domain.to_string()))?;

    let call = Call::pending(domain, url, &jar, to_stored_precision(now));
    store.insert_call(&call).await?;
    tracing::debug!(call_id = %call.id, jar_id = %jar.id, domain, "jar checked out");
    Ok(CallWithJar { call, jar })
}

/// Record the outcome of a call handed out by [`checkout_jar`].
pub async fn report_call(store: &dyn Store, call_id: &str, update: &CallUpdate) -> Result<Call> {
    let update = CallUpdate {
        timestamp: update.timestamp.map(to_stored_precision),
        ..update.clone()
    };
    match store.update_call(call_id, &update).await? {
        CallUpdateOutcome::Updated(call) => {
            tracing::info!(call_id, success = ?call.success, "call reported");
            Ok(call)
        }
        CallUpdateOutcome::NotFound => Err(CrustulaError::CallNotFound(call_id.to_string())),
        CallUpdateOutcome::AlreadyReported(_) => {
            Err(CrustulaError::CallAlreadyReported(call_id.to_string()))
        }
    }
}

pub async fn jar_with_calls(store: &dyn Store, jar_id: &str) -> Result<JarWithCalls> {
    store
        .get_jar(jar_id)
        .await?
        .ok_or_else(|| CrustulaError::JarNotFound(jar_id.to_string()))
}

pub async fn delete_jar(store: &dyn Store, jar_id: &str) -> Result<()> {
    if !store.delete_jar(jar_id).await? {
        return Err(CrustulaError::JarNotFound(jar_id.to_string()));
    }
    tracing::info!(jar_id, "jar deleted");
    Ok(())
}

/// Every known domain with its active jar and up to `recent_limit` recent calls.
pub async fn domain_overview(
    store: &dyn Store,
    policy: &SelectionPolicy,
    recent_limit: usize,
) -> Result<Vec<DomainSummary>> {
    let mut summaries = Vec::new();
    for domain in store.domains().await? {
        let active_jar = jar_for_domain(store, &domain, policy).await?;
        let recent_calls = store.recent_calls(&domain, recent_limit).await?;
        summaries.push(DomainSummary {
            domain,
            active_jar,
            recent_calls,
        });
    }
    Ok(summaries)
}
