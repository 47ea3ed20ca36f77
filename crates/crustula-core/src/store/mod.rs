//! Storage abstraction for jars and calls.
//!
//! The [`Store`] trait covers everything the service layer needs, so the
//! selection logic never depends on a particular database. Implementations
//! must be `Send + Sync` to be shared across request handlers.
//!
//! Consistency between concurrent writers is the backend's concern; the
//! selector only ever sees a snapshot returned by [`Store::jars_for_domain`].

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Call, CallUpdate, Jar, JarWithCalls};

/// What [`Store::update_call`] found.
#[derive(Debug, Clone, PartialEq)]
pub enum CallUpdateOutcome {
    Updated(Call),
    NotFound,
    /// The call's outcome had already been reported; nothing was changed.
    AlreadyReported(Call),
}

/// Abstract storage backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_jar`](Store::insert_jar) | Persist a new jar |
/// | [`get_jar`](Store::get_jar) | Jar with its calls, by id |
/// | [`jars_for_domain`](Store::jars_for_domain) | All jars of a domain with their calls |
/// | [`delete_jar`](Store::delete_jar) | Remove a jar and its calls |
/// | [`insert_call`](Store::insert_call) | Persist a new call |
/// | [`get_call`](Store::get_call) | Call by id |
/// | [`update_call`](Store::update_call) | Report a call's outcome |
/// | [`domains`](Store::domains) | Every domain seen in jars or calls |
/// | [`recent_calls`](Store::recent_calls) | Newest calls for a domain |
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_jar(&self, jar: &Jar) -> Result<()>;

    async fn get_jar(&self, id: &str) -> Result<Option<JarWithCalls>>;

    /// Jars for `domain` in creation order, each with its full call history.
    async fn jars_for_domain(&self, domain: &str) -> Result<Vec<JarWithCalls>>;

    /// Returns `false` if no such jar existed.
    async fn delete_jar(&self, id: &str) -> Result<bool>;

    async fn insert_call(&self, call: &Call) -> Result<()>;

    async fn get_call(&self, id: &str) -> Result<Option<Call>>;

    async fn update_call(&self, id: &str, update: &CallUpdate) -> Result<CallUpdateOutcome>;

    /// Distinct domains, sorted.
    async fn domains(&self) -> Result<Vec<String>>;

    /// Up to `limit` calls for `domain`, newest first.
    async fn recent_calls(&self, domain: &str, limit: usize) -> Result<Vec<Call>>;
}
