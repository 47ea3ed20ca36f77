use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the schema in the configured database. Idempotent.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // Timestamps are milliseconds since the Unix epoch.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jars (
            id TEXT PRIMARY KEY,
            domain TEXT NOT NULL,
            cookies TEXT NOT NULL,
            ctime INTEGER NOT NULL,
            mtime INTEGER,
            atime INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    // success: NULL until reported, then 0 or 1.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS calls (
            id TEXT PRIMARY KEY,
            domain TEXT NOT NULL,
            url TEXT,
            timestamp INTEGER NOT NULL,
            success INTEGER,
            jar_id TEXT,
            FOREIGN KEY (jar_id) REFERENCES jars(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jars_domain ON jars(domain)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_calls_domain ON calls(domain)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_calls_jar_id ON calls(jar_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_calls_success ON calls(success)")
        .execute(pool)
        .await?;

    Ok(())
}
