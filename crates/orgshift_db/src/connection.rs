//! SQLite-backed document store.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::document::{
    Document, Fields, Query, SetMode, Snapshot, WriteOp, merge_fields, resolve_server_timestamps,
};
use crate::error::{DbError, DbResult};
use crate::path::{CollectionPath, DocPath};
use crate::store::{DocumentStore, PROVIDER_MAX_BATCH_OPS};

/// Document store persisted in a single SQLite file.
///
/// Every document is one row keyed by its full path, with its fields stored
/// as a JSON object. A batch commit runs inside one SQLite transaction.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// This will:
    /// 1. Create the database file (and its directory) if missing
    /// 2. Run any pending migrations
    /// 3. Configure SQLite for WAL mode
    pub async fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening document store: {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("cache_size", "-16000") // 16MB cache
            .pragma("synchronous", "NORMAL") // Safe with WAL
            .pragma("temp_store", "MEMORY");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        debug!("Document store connection established");

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Open an in-memory store (for testing).
    pub async fn open_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1) // In-memory must be single connection to share state
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
        debug!("Running document store migrations");
        sqlx::migrate!("./migrations").run(pool).await?;
        debug!("Document store migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Document and collection counts.
    pub async fn stats(&self) -> DbResult<StoreStats> {
        let documents: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        let collections: (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT parent_path) FROM documents")
                .fetch_one(&self.pool)
                .await?;

        Ok(StoreStats {
            document_count: documents.0 as u64,
            collection_count: collections.0 as u64,
        })
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub document_count: u64,
    pub collection_count: u64,
}

fn decode_fields(raw: &str) -> DbResult<Fields> {
    Ok(serde_json::from_str(raw)?)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, path: &DocPath) -> DbResult<Snapshot> {
        let row: Option<(String,)> = sqlx::query_as("SELECT fields FROM documents WHERE path = ?")
            .bind(path.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let fields = row.map(|(raw,)| decode_fields(&raw)).transpose()?;
        Ok(Snapshot {
            path: path.clone(),
            fields,
        })
    }

    async fn list_child_collections(&self, path: &DocPath) -> DbResult<Vec<String>> {
        let prefix = format!("{path}/");
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT parent_path FROM documents WHERE substr(parent_path, 1, ?) = ?",
        )
        .bind(prefix.chars().count() as i64)
        .bind(&prefix)
        .fetch_all(&self.pool)
        .await?;

        let depth = path.segments().len();
        let mut ids = Vec::new();
        for (raw,) in rows {
            let collection = CollectionPath::parse(&raw)?;
            if collection.segments().len() == depth + 1 {
                ids.push(collection.id().to_string());
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn list_documents(&self, collection: &CollectionPath) -> DbResult<Vec<Document>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT doc_id, fields FROM documents WHERE parent_path = ? ORDER BY doc_id",
        )
        .bind(collection.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, raw)| {
                Ok(Document {
                    id,
                    fields: decode_fields(&raw)?,
                })
            })
            .collect()
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> DbResult<Vec<Document>> {
        let matching = self
            .list_documents(collection)
            .await?
            .into_iter()
            .filter(|doc| query.matches(&doc.fields));
        Ok(match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn commit_batch(&self, ops: Vec<WriteOp>) -> DbResult<()> {
        if ops.len() > PROVIDER_MAX_BATCH_OPS {
            return Err(DbError::BatchTooLarge {
                ops: ops.len(),
                max: PROVIDER_MAX_BATCH_OPS,
            });
        }

        let now = Utc::now();
        let stamp = now.to_rfc3339();
        let op_count = ops.len();
        let mut tx = self.pool.begin().await?;

        for op in ops {
            match op {
                WriteOp::Set {
                    path,
                    mut fields,
                    mode,
                } => {
                    resolve_server_timestamps(&mut fields, now);
                    let key = path.to_string();
                    let stored = match mode {
                        SetMode::Replace => fields,
                        SetMode::Merge => {
                            let existing: Option<(String,)> =
                                sqlx::query_as("SELECT fields FROM documents WHERE path = ?")
                                    .bind(&key)
                                    .fetch_optional(&mut *tx)
                                    .await?;
                            let mut merged = existing
                                .map(|(raw,)| decode_fields(&raw))
                                .transpose()?
                                .unwrap_or_default();
                            merge_fields(&mut merged, fields);
                            merged
                        }
                    };

                    sqlx::query(
                        r#"
                        INSERT INTO documents (path, parent_path, doc_id, fields, updated_at)
                        VALUES (?, ?, ?, ?, ?)
                        ON CONFLICT(path) DO UPDATE SET
                            fields = excluded.fields,
                            updated_at = excluded.updated_at
                        "#,
                    )
                    .bind(&key)
                    .bind(path.parent().to_string())
                    .bind(path.id())
                    .bind(serde_json::to_string(&stored)?)
                    .bind(&stamp)
                    .execute(&mut *tx)
                    .await?;
                }
                WriteOp::Delete { path } => {
                    sqlx::query("DELETE FROM documents WHERE path = ?")
                        .bind(path.to_string())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        debug!(ops = op_count, "Committed batch");
        Ok(())
    }
}
