//! The document store capability consumed by the reorganization engine.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::document::{Document, Fields, Query, SetMode, Snapshot, WriteOp};
use crate::error::DbResult;
use crate::path::{CollectionPath, DocPath};

/// Hard per-commit operation ceiling of the provider.
pub const PROVIDER_MAX_BATCH_OPS: usize = 500;

/// Trait for hierarchical document store operations.
///
/// Abstracts over the storage implementation (SQLite file, in-memory).
/// Documents are addressed by [`DocPath`]; a collection exists as long as it
/// holds at least one document, independent of its parent document.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Read a single document.
    async fn get(&self, path: &DocPath) -> DbResult<Snapshot>;

    /// Ids of the non-empty collections nested directly under a document,
    /// sorted.
    async fn list_child_collections(&self, path: &DocPath) -> DbResult<Vec<String>>;

    /// Every document of a collection, ordered by id.
    async fn list_documents(&self, collection: &CollectionPath) -> DbResult<Vec<Document>>;

    /// Filtered and/or limited listing, ordered by id.
    async fn query(&self, collection: &CollectionPath, query: &Query) -> DbResult<Vec<Document>>;

    /// Write a single document.
    async fn set(&self, path: &DocPath, fields: Fields, mode: SetMode) -> DbResult<()> {
        let op = WriteOp::Set {
            path: path.clone(),
            fields,
            mode,
        };
        self.commit_batch(vec![op]).await
    }

    /// Delete a single document. Deleting a missing document is not an
    /// error and nested collections are left untouched.
    async fn delete(&self, path: &DocPath) -> DbResult<()> {
        self.commit_batch(vec![WriteOp::delete(path.clone())]).await
    }

    /// Apply every operation atomically, in order.
    async fn commit_batch(&self, ops: Vec<WriteOp>) -> DbResult<()>;

    /// Maximum number of operations accepted by one `commit_batch`.
    fn max_batch_ops(&self) -> usize {
        PROVIDER_MAX_BATCH_OPS
    }

    /// Sentinel replaced with the commit time when written.
    fn server_timestamp(&self) -> Value {
        crate::document::server_timestamp()
    }
}
