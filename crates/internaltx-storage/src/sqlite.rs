//! SQLite versioned store.
//!
//! One table per [`RecordKind`], created on first use, indexed on
//! `(height, version)`. `replace_version` runs its delete and inserts in a
//! single transaction, so readers see either the previous batch or the new
//! one.
//!
//! # Usage
//! ```rust,no_run
//! use internaltx_storage::sqlite::SqliteVersionedStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteVersionedStore::open("./internal_tx.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteVersionedStore::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use internaltx_core::error::TaskError;
use internaltx_core::record::InternalTransaction;
use internaltx_core::store::{RecordKind, VersionedStore};

/// SQLite-backed versioned record store.
pub struct SqliteVersionedStore {
    pool: SqlitePool,
    /// Tables already created by this handle.
    created: Mutex<HashSet<&'static str>>,
}

impl SqliteVersionedStore {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./internal_tx.db"`) or a full
    /// SQLite URL (`"sqlite:./internal_tx.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, TaskError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url)
            .await
            .map_err(|e| TaskError::storage("connect", e))?;

        let store = Self::with_pool(pool);
        store.init().await?;
        Ok(store)
    }

    /// Open an in-memory SQLite database.
    ///
    /// All data is lost when the pool is dropped. Ideal for tests.
    pub async fn in_memory() -> Result<Self, TaskError> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| TaskError::storage("connect", e))?;

        let store = Self::with_pool(pool);
        store.init().await?;
        Ok(store)
    }

    fn with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            created: Mutex::new(HashSet::new()),
        }
    }

    async fn init(&self) -> Result<(), TaskError> {
        // WAL mode: readers don't block the batch writer
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(|e| TaskError::storage("init", e))?;
        self.ensure_table(&InternalTransaction::KIND).await
    }

    /// Create the table and `(height, version)` index for `kind` if missing.
    async fn ensure_table(&self, kind: &RecordKind) -> Result<(), TaskError> {
        if self.is_created(kind)? {
            return Ok(());
        }

        let columns = kind
            .columns
            .iter()
            .map(|c| format!("\"{}\" {} NOT NULL", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(", ");

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                {columns}
            );",
            kind.name
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| TaskError::storage("create_table", e))?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS \"idx_{0}_height_version\" ON \"{0}\" (height, version);",
            kind.name
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| TaskError::storage("create_index", e))?;

        self.created
            .lock()
            .map_err(|_| TaskError::storage("create_table", "table cache poisoned"))?
            .insert(kind.name);
        debug!(table = kind.name, "table ready");
        Ok(())
    }

    fn is_created(&self, kind: &RecordKind) -> Result<bool, TaskError> {
        Ok(self
            .created
            .lock()
            .map_err(|_| TaskError::storage("create_table", "table cache poisoned"))?
            .contains(kind.name))
    }

    // ─── Inspection ─────────────────────────────────────────────────────────────

    /// All records stored under `(kind, height, version)`, ordered by hash.
    pub async fn records(
        &self,
        kind: &RecordKind,
        height: i64,
        version: u32,
    ) -> Result<Vec<InternalTransaction>, TaskError> {
        self.ensure_table(kind).await?;

        let rows = sqlx::query(&format!(
            "SELECT height, version, hash, parent_hash, \"from\", \"to\", \"type\", value
             FROM \"{}\" WHERE height = ? AND version = ? ORDER BY hash",
            kind.name
        ))
        .bind(height)
        .bind(version as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskError::storage("records", e))?;

        Ok(rows
            .into_iter()
            .map(|r| InternalTransaction {
                height: r.get("height"),
                version: r.get::<i64, _>("version") as u32,
                hash: r.get("hash"),
                parent_hash: r.get("parent_hash"),
                from: r.get("from"),
                to: r.get("to"),
                tx_type: r.get::<i64, _>("type") as u64,
                value: r.get("value"),
            })
            .collect())
    }

    /// Total rows stored for `kind` across all heights and versions.
    pub async fn count(&self, kind: &RecordKind) -> Result<u64, TaskError> {
        self.ensure_table(kind).await?;

        let row = sqlx::query(&format!("SELECT COUNT(*) as cnt FROM \"{}\"", kind.name))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| TaskError::storage("count", e))?;

        let cnt: i64 = row.get("cnt");
        Ok(cnt as u64)
    }
}

// ─── VersionedStore impl ─────────────────────────────────────────────────────

#[async_trait]
impl VersionedStore for SqliteVersionedStore {
    async fn existed(
        &self,
        kind: &RecordKind,
        height: i64,
        version: u32,
    ) -> Result<bool, TaskError> {
        self.ensure_table(kind).await?;

        let row = sqlx::query(&format!(
            "SELECT 1 FROM \"{}\" WHERE height = ? AND version = ? LIMIT 1",
            kind.name
        ))
        .bind(height)
        .bind(version as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TaskError::storage("existed", e))?;

        Ok(row.is_some())
    }

    async fn replace_version(
        &self,
        kind: &RecordKind,
        height: i64,
        version: u32,
        records: &[InternalTransaction],
    ) -> Result<(), TaskError> {
        self.ensure_table(kind).await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TaskError::storage("begin", e))?;

        let deleted = sqlx::query(&format!(
            "DELETE FROM \"{}\" WHERE height = ? AND version = ?",
            kind.name
        ))
        .bind(height)
        .bind(version as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| TaskError::storage("delete_old_version", e))?
        .rows_affected();

        let insert = format!(
            "INSERT INTO \"{}\" (height, version, hash, parent_hash, \"from\", \"to\", \"type\", value)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            kind.name
        );
        for rec in records {
            sqlx::query(&insert)
                .bind(rec.height)
                .bind(rec.version as i64)
                .bind(&rec.hash)
                .bind(&rec.parent_hash)
                .bind(&rec.from)
                .bind(&rec.to)
                .bind(rec.tx_type as i64)
                .bind(&rec.value)
                .execute(&mut *tx)
                .await
                .map_err(|e| TaskError::storage("write_many", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| TaskError::storage("commit", e))?;

        debug!(
            table = kind.name,
            height,
            version,
            deleted,
            written = records.len(),
            "version replaced"
        );
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
