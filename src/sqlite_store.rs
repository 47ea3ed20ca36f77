//! SQLite-backed [`Store`] implementation.
//!
//! Timestamps are stored as integer milliseconds; `calls.success` is NULL
//! until an outcome is reported, and a report only applies while it still is.
//! Jar deletion runs in a transaction.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crustula_core::models::{Call, CallUpdate, Jar, JarWithCalls};
use crustula_core::store::{CallUpdateOutcome, Store};

use crate::config::Config;
use crate::db;

const JAR_COLUMNS: &str = "id, domain, cookies, ctime, mtime, atime";
const CALL_COLUMNS: &str = "id, domain, url, timestamp, success, jar_id";

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database. The schema must already exist.
    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn calls_for_jar(&self, jar_id: &str) -> Result<Vec<Call>> {
        let rows = sqlx::query(&format!(
            "SELECT {CALL_COLUMNS} FROM calls WHERE jar_id = ? ORDER BY timestamp ASC"
        ))
        .bind(jar_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(call_from_row).collect()
    }
}

fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp out of range: {}", ms))
}

fn opt_from_millis(ms: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    ms.map(from_millis).transpose()
}

fn jar_from_row(row: &SqliteRow) -> Result<Jar> {
    Ok(Jar {
        id: row.try_get("id")?,
        domain: row.try_get("domain")?,
        cookies: row.try_get("cookies")?,
        ctime: from_millis(row.try_get("ctime")?)?,
        mtime: opt_from_millis(row.try_get("mtime")?)?,
        atime: opt_from_millis(row.try_get("atime")?)?,
    })
}

fn call_from_row(row: &SqliteRow) -> Result<Call> {
    Ok(Call {
        id: row.try_get("id")?,
        domain: row.try_get("domain")?,
        url: row.try_get("url")?,
        timestamp: from_millis(row.try_get("timestamp")?)?,
        success: row.try_get("success")?,
        jar_id: row.try_get("jar_id")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_jar(&self, jar: &Jar) -> Result<()> {
        sqlx::query(
            "INSERT INTO jars (id, domain, cookies, ctime, mtime, atime) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&jar.id)
        .bind(&jar.domain)
        .bind(&jar.cookies)
        .bind(to_millis(jar.ctime))
        .bind(jar.mtime.map(to_millis))
        .bind(jar.atime.map(to_millis))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_jar(&self, id: &str) -> Result<Option<JarWithCalls>> {
        let row = sqlx::query(&format!("SELECT {JAR_COLUMNS} FROM jars WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let jar = jar_from_row(&row)?;
        let calls = self.calls_for_jar(&jar.id).await?;
        Ok(Some(JarWithCalls { jar, calls }))
    }

    async fn jars_for_domain(&self, domain: &str) -> Result<Vec<JarWithCalls>> {
        // Both reads share one transaction so the snapshot is consistent.
        let mut tx = self.pool.begin().await?;

        let jar_rows = sqlx::query(&format!(
            "SELECT {JAR_COLUMNS} FROM jars WHERE domain = ? ORDER BY ctime ASC, id ASC"
        ))
        .bind(domain)
        .fetch_all(&mut *tx)
        .await?;

        let call_rows = sqlx::query(&format!(
            "SELECT {CALL_COLUMNS} FROM calls \
             WHERE jar_id IN (SELECT id FROM jars WHERE domain = ?) \
             ORDER BY timestamp ASC"
        ))
        .bind(domain)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut calls: Vec<Call> = call_rows.iter().map(call_from_row).collect::<Result<_>>()?;
        let mut jars = Vec::with_capacity(jar_rows.len());
        for row in &jar_rows {
            let jar = jar_from_row(row)?;
            let (own, rest): (Vec<Call>, Vec<Call>) = calls
                .into_iter()
                .partition(|c| c.jar_id.as_deref() == Some(jar.id.as_str()));
            calls = rest;
            jars.push(JarWithCalls { jar, calls: own });
        }
        Ok(jars)
    }

    async fn delete_jar(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM calls WHERE jar_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM jars WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn insert_call(&self, call: &Call) -> Result<()> {
        sqlx::query(
            "INSERT INTO calls (id, domain, url, timestamp, success, jar_id) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&call.id)
        .bind(&call.domain)
        .bind(&call.url)
        .bind(to_millis(call.timestamp))
        .bind(call.success)
        .bind(&call.jar_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_call(&self, id: &str) -> Result<Option<Call>> {
        let row = sqlx::query(&format!("SELECT {CALL_COLUMNS} FROM calls WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(call_from_row).transpose()
    }

    async fn update_call(&self, id: &str, update: &CallUpdate) -> Result<CallUpdateOutcome> {
        // One conditional statement: of two racing reports, exactly one matches.
        let updated = sqlx::query(
            "UPDATE calls SET url = COALESCE(?, url), timestamp = COALESCE(?, timestamp), \
             success = COALESCE(?, success) WHERE id = ? AND success IS NULL",
        )
        .bind(&update.url)
        .bind(update.timestamp.map(to_millis))
        .bind(update.success)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let call = self.get_call(id).await?;
        Ok(match call {
            None => CallUpdateOutcome::NotFound,
            Some(call) if updated > 0 => CallUpdateOutcome::Updated(call),
            Some(call) => CallUpdateOutcome::AlreadyReported(call),
        })
    }

    async fn domains(&self) -> Result<Vec<String>> {
        let domains: Vec<String> = sqlx::query_scalar(
            "SELECT domain FROM jars UNION SELECT domain FROM calls ORDER BY domain ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(domains)
    }

    async fn recent_calls(&self, domain: &str, limit: usize) -> Result<Vec<Call>> {
        let rows = sqlx::query(&format!(
            "SELECT {CALL_COLUMNS} FROM calls WHERE domain = ? ORDER BY timestamp DESC LIMIT ?"
        ))
        .bind(domain)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(call_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::migrate_pool;
    use chrono::TimeZone;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate_pool(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[tokio::test]
    async fn test_jar_round_trips_through_sqlite() {
        let store = memory_store().await;
        let jar = Jar::new("a.test", "# Netscape HTTP Cookie File\n", ts(1_700_000_000_123));
        store.insert_jar(&jar).await.unwrap();

        let loaded = store.get_jar(&jar.id).await.unwrap().unwrap();
        assert_eq!(loaded.jar, jar);
        assert!(loaded.calls.is_empty());
    }

    #[tokio::test]
    async fn test_jars_for_domain_groups_calls() {
        let store = memory_store().await;
        let first = Jar::new("a.test", "", ts(1));
        let second = Jar::new("a.test", "", ts(2));
        let other = Jar::new("b.test", "", ts(3));
        for j in [&second, &first, &other] {
            store.insert_jar(j).await.unwrap();
        }
        for (jar, at) in [(&first, 10), (&second, 11), (&first, 12)] {
            store
                .insert_call(&Call::pending("a.test", "https://a.test/", jar, ts(at)))
                .await
                .unwrap();
        }

        let jars = store.jars_for_domain("a.test").await.unwrap();
        assert_eq!(jars.len(), 2);
        assert_eq!(jars[0].jar.id, first.id);
        assert_eq!(jars[0].calls.len(), 2);
        assert_eq!(jars[1].calls.len(), 1);
    }

    #[tokio::test]
    async fn test_update_call_persists_outcome_once() {
        let store = memory_store().await;
        let jar = Jar::new("a.test", "", ts(1));
        store.insert_jar(&jar).await.unwrap();
        let call = Call::pending("a.test", "https://a.test/", &jar, ts(2));
        store.insert_call(&call).await.unwrap();
        assert_eq!(store.get_call(&call.id).await.unwrap().unwrap().success, None);

        let update = CallUpdate {
            success: Some(false),
            url: Some("https://a.test/retry".to_string()),
            ..Default::default()
        };
        let outcome = store.update_call(&call.id, &update).await.unwrap();
        assert!(matches!(outcome, CallUpdateOutcome::Updated(_)));

        let stored = store.get_call(&call.id).await.unwrap().unwrap();
        assert_eq!(stored.success, Some(false));
        assert_eq!(stored.url.as_deref(), Some("https://a.test/retry"));
        assert_eq!(stored.jar_id.as_deref(), Some(jar.id.as_str()));

        assert!(matches!(
            store.update_call(&call.id, &update).await.unwrap(),
            CallUpdateOutcome::AlreadyReported(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_reports_one_wins() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::minimal();
        config.db.path = tmp.path().join("crustula.sqlite");
        let pool = db::connect(&config).await.unwrap();
        migrate_pool(&pool).await.unwrap();
        let store = SqliteStore::new(pool);

        let jar = Jar::new("a.test", "", ts(1));
        store.insert_jar(&jar).await.unwrap();
        let call = Call::pending("a.test", "https://a.test/", &jar, ts(2));
        store.insert_call(&call).await.unwrap();

        let ok = CallUpdate {
            success: Some(true),
            ..Default::default()
        };
        let failed = CallUpdate {
            success: Some(false),
            ..Default::default()
        };
        let (a, b) = tokio::join!(
            store.update_call(&call.id, &ok),
            store.update_call(&call.id, &failed)
        );
        let outcomes = [a.unwrap(), b.unwrap()];
        let updated = outcomes
            .iter()
            .filter(|o| matches!(o, CallUpdateOutcome::Updated(_)))
            .count();
        let rejected = outcomes
            .iter()
            .filter(|o| matches!(o, CallUpdateOutcome::AlreadyReported(_)))
            .count();
        assert_eq!((updated, rejected), (1, 1));
    }

    #[tokio::test]
    async fn test_update_missing_call() {
        let store = memory_store().await;
        assert!(matches!(
            store.update_call("nope", &CallUpdate::default()).await.unwrap(),
            CallUpdateOutcome::NotFound
        ));
    }

    #[tokio::test]
    async fn test_delete_jar_cascades_to_calls() {
        let store = memory_store().await;
        let jar = Jar::new("a.test", "", ts(1));
        store.insert_jar(&jar).await.unwrap();
        let call = Call::pending("a.test", "https://a.test/", &jar, ts(2));
        store.insert_call(&call).await.unwrap();

        assert!(store.delete_jar(&jar.id).await.unwrap());
        assert!(store.get_call(&call.id).await.unwrap().is_none());
        assert!(!store.delete_jar(&jar.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_domains_and_recent_calls() {
        let store = memory_store().await;
        let jar = Jar::new("b.test", "", ts(1));
        store.insert_jar(&jar).await.unwrap();
        for at in [5, 9, 7] {
            store
                .insert_call(&Call::pending("b.test", "https://b.test/", &jar, ts(at)))
                .await
                .unwrap();
        }
        let a_jar = Jar::new("a.test", "", ts(1));
        store.insert_jar(&a_jar).await.unwrap();

        assert_eq!(store.domains().await.unwrap(), vec!["a.test", "b.test"]);
        let recent = store.recent_calls("b.test", 2).await.unwrap();
        let times: Vec<_> = recent.iter().map(|c| c.timestamp).collect();
        assert_eq!(times, vec![ts(9), ts(7)]);
    }
}
