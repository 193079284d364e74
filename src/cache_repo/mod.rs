// SQLite cache of per-day node aggregates. One row per (hostname, window); never expires.

mod blob;

use crate::models::DayData;
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::future::Future;
use std::path::Path;
use tracing::{debug, instrument};

pub const CACHE_FILE: &str = "cache.db";

const KEY_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Cache key for one window: `data_<hostname>_<start>_<end>`.
pub fn cache_key(hostname: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "data_{}_{}_{}",
        hostname,
        start.format(KEY_TIME_FORMAT),
        end.format(KEY_TIME_FORMAT)
    )
}

/// One stored row, as listed by `list_entries`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheEntry {
    pub cache_key: String,
    pub hostname: String,
    pub window_start: i64,
    pub window_end: i64,
    pub created_at: i64,
    pub data: DayData,
}

pub struct ReportCache {
    pool: SqlitePool,
}

impl ReportCache {
    /// Open (creating if needed) `<cache_dir>/cache.db` and its table.
    pub async fn open(cache_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("creating cache directory {}", cache_dir.display()))?;
        let opts = SqliteConnectOptions::new()
            .filename(cache_dir.join(CACHE_FILE))
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        let cache = Self { pool };
        cache.init().await?;
        Ok(cache)
    }

    async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS report_cache (
                cache_key TEXT PRIMARY KEY,
                hostname TEXT NOT NULL,
                window_start INTEGER NOT NULL,
                window_end INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                data BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "cache", operation = "get"))]
    pub async fn get(&self, key: &str) -> anyhow::Result<Option<DayData>> {
        let row = sqlx::query("SELECT data FROM report_cache WHERE cache_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let bytes: Vec<u8> = row.try_get("data")?;
        decode(key, &bytes).map(Some)
    }

    #[instrument(skip(self, data), fields(repo = "cache", operation = "put", nodes = data.nodes.len()))]
    pub async fn put(
        &self,
        key: &str,
        hostname: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        data: &DayData,
    ) -> anyhow::Result<()> {
        let blob = blob::with_version_prefix(blob::BLOB_VERSION, serde_json::to_vec(data)?);
        sqlx::query(
            "INSERT OR REPLACE INTO report_cache (cache_key, hostname, window_start, window_end, created_at, data) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(key)
        .bind(hostname)
        .bind(start.timestamp())
        .bind(end.timestamp())
        .bind(Utc::now().timestamp())
        .bind(&blob)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recently written rows first.
    pub async fn list_entries(&self, limit: u32) -> anyhow::Result<Vec<CacheEntry>> {
        let rows = sqlx::query(
            "SELECT cache_key, hostname, window_start, window_end, created_at, data
             FROM report_cache ORDER BY created_at DESC, window_start DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let cache_key: String = row.try_get("cache_key")?;
            let bytes: Vec<u8> = row.try_get("data")?;
            let data = decode(&cache_key, &bytes)?;
            out.push(CacheEntry {
                hostname: row.try_get("hostname")?,
                window_start: row.try_get("window_start")?,
                window_end: row.try_get("window_end")?,
                created_at: row.try_get("created_at")?,
                cache_key,
                data,
            });
        }
        Ok(out)
    }
}

fn decode(key: &str, bytes: &[u8]) -> anyhow::Result<DayData> {
    let payload = blob::blob_payload(bytes, blob::BLOB_VERSION).ok_or_else(|| {
        anyhow::anyhow!(
            "cache record {} has unsupported version {}",
            key,
            blob::blob_version(bytes)
        )
    })?;
    serde_json::from_slice(payload).with_context(|| format!("decoding cache record {}", key))
}

/// Read-through lookup: return the cached window data, or compute and store it.
/// With no cache, always computes and touches nothing on disk.
pub async fn get_or_compute<F, Fut>(
    hostname: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    cache: Option<&ReportCache>,
    compute: F,
) -> anyhow::Result<DayData>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<DayData>>,
{
    let Some(cache) = cache else {
        return compute().await;
    };
    let key = cache_key(hostname, start, end);
    if let Some(data) = cache.get(&key).await? {
        debug!(key = %key, "cache hit");
        return Ok(data);
    }
    debug!(key = %key, "cache miss");
    let data = compute().await?;
    cache.put(&key, hostname, start, end, &data).await?;
    Ok(data)
}
