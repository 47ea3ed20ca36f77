//! In-memory [`Store`] implementation for tests and embedding.
//!
//! Jars and calls live in `Vec`s behind a single `std::sync::RwLock`, which
//! keeps a jar deletion and its call cleanup atomic.

use std::collections::BTreeSet;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Call, CallUpdate, Jar, JarWithCalls};

use super::{CallUpdateOutcome, Store};

#[derive(Default)]
struct Tables {
    jars: Vec<Jar>,
    calls: Vec<Call>,
}

impl Tables {
    fn with_calls(&self, jar: &Jar) -> JarWithCalls {
        JarWithCalls {
            jar: jar.clone(),
            calls: self
                .calls
                .iter()
                .filter(|c| c.jar_id.as_deref() == Some(jar.id.as_str()))
                .cloned()
                .collect(),
        }
    }
}

/// In-memory store.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_jar(&self, jar: &Jar) -> Result<()> {
        self.tables.write().unwrap().jars.push(jar.clone());
        Ok(())
    }

    async fn get_jar(&self, id: &str) -> Result<Option<JarWithCalls>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .jars
            .iter()
            .find(|j| j.id == id)
            .map(|j| tables.with_calls(j)))
    }

    async fn jars_for_domain(&self, domain: &str) -> Result<Vec<JarWithCalls>> {
        let tables = self.tables.read().unwrap();
        let mut jars: Vec<&Jar> = tables.jars.iter().filter(|j| j.domain == domain).collect();
        jars.sort_by_key(|j| j.ctime);
        Ok(jars.into_iter().map(|j| tables.with_calls(j)).collect())
    }

    async fn delete_jar(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.write().unwrap();
        let before = tables.jars.len();
        tables.jars.retain(|j| j.id != id);
        if tables.jars.len() == before {
            return Ok(false);
        }
        tables.calls.retain(|c| c.jar_id.as_deref() != Some(id));
        Ok(true)
    }

    async fn insert_call(&self, call: &Call) -> Result<()> {
        self.tables.write().unwrap().calls.push(call.clone());
        Ok(())
    }

    async fn get_call(&self, id: &str) -> Result<Option<Call>> {
        let tables = self.tables.read().unwrap();
        Ok(tables.calls.iter().find(|c| c.id == id).cloned())
    }

    async fn update_call(&self, id: &str, update: &CallUpdate) -> Result<CallUpdateOutcome> {
        let mut tables = self.tables.write().unwrap();
        let Some(call) = tables.calls.iter_mut().find(|c| c.id == id) else {
            return Ok(CallUpdateOutcome::NotFound);
        };
        if call.is_reported() {
            return Ok(CallUpdateOutcome::AlreadyReported(call.clone()));
        }
        update.apply(call);
        Ok(CallUpdateOutcome::Updated(call.clone()))
    }

    async fn domains(&self) -> Result<Vec<String>> {
        let tables = self.tables.read().unwrap();
        let all: BTreeSet<&str> = tables
            .jars
            .iter()
            .map(|j| j.domain.as_str())
            .chain(tables.calls.iter().map(|c| c.domain.as_str()))
            .collect();
        Ok(all.into_iter().map(str::to_string).collect())
    }

    async fn recent_calls(&self, domain: &str, limit: usize) -> Result<Vec<Call>> {
        let tables = self.tables.read().unwrap();
        let mut calls: Vec<Call> = tables
            .calls
            .iter()
            .filter(|c| c.domain == domain)
            .cloned()
            .collect();
        calls.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        calls.truncate(limit);
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_jars_for_domain_filters_and_attaches_calls() {
        let store = InMemoryStore::new();
        let a = Jar::new("a.test", "", ts(2));
        let b = Jar::new("b.test", "", ts(1));
        let a_old = Jar::new("a.test", "", ts(1));
        for j in [&a, &b, &a_old] {
            store.insert_jar(j).await.unwrap();
        }
        store
            .insert_call(&Call::pending("a.test", "https://a.test/", &a, ts(5)))
            .await
            .unwrap();

        let jars = store.jars_for_domain("a.test").await.unwrap();
        assert_eq!(jars.len(), 2);
        assert_eq!(jars[0].jar.id, a_old.id);
        assert_eq!(jars[1].calls.len(), 1);
        assert!(jars[0].calls.is_empty());
    }

    #[tokio::test]
    async fn test_delete_jar_removes_calls() {
        let store = InMemoryStore::new();
        let jar = Jar::new("a.test", "", ts(1));
        store.insert_jar(&jar).await.unwrap();
        let call = Call::pending("a.test", "https://a.test/", &jar, ts(2));
        store.insert_call(&call).await.unwrap();

        assert!(store.delete_jar(&jar.id).await.unwrap());
        assert!(store.get_call(&call.id).await.unwrap().is_none());
        assert!(!store.delete_jar(&jar.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_call_only_once() {
        let store = InMemoryStore::new();
        let jar = Jar::new("a.test", "", ts(1));
        let call = Call::pending("a.test", "https://a.test/", &jar, ts(2));
        store.insert_call(&call).await.unwrap();

        let report = CallUpdate {
            success: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            store.update_call(&call.id, &report).await.unwrap(),
            CallUpdateOutcome::Updated(c) if c.success == Some(true)
        ));
        assert!(matches!(
            store.update_call(&call.id, &report).await.unwrap(),
            CallUpdateOutcome::AlreadyReported(_)
        ));
        assert_eq!(
            store.update_call("missing", &report).await.unwrap(),
            CallUpdateOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_domains_and_recent_calls() {
        let store = InMemoryStore::new();
        let jar = Jar::new("b.test", "", ts(1));
        store.insert_jar(&jar).await.unwrap();
        for at in [3, 9, 6] {
            store
                .insert_call(&Call::pending("b.test", "https://b.test/", &jar, ts(at)))
                .await
                .unwrap();
        }
        store
            .insert_call(&Call::pending("a.test", "https://a.test/", &jar, ts(4)))
            .await
            .unwrap();

        assert_eq!(store.domains().await.unwrap(), vec!["a.test", "b.test"]);
        let recent = store.recent_calls("b.test", 2).await.unwrap();
        let times: Vec<_> = recent.iter().map(|c| c.timestamp).collect();
        assert_eq!(times, vec![ts(9), ts(6)]);
    }
}
