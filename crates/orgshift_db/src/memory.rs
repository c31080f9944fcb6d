//! In-process document store.
//!
//! Holds every document in an ordered map keyed by path. Commits are atomic
//! because the whole batch is applied under one lock. Used by tests and for
//! rehearsing a run against a snapshot.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::trace;

use crate::document::{
    Document, Fields, Query, SetMode, Snapshot, WriteOp, merge_fields, resolve_server_timestamps,
};
use crate::error::{DbError, DbResult};
use crate::path::{CollectionPath, DocPath};
use crate::store::{DocumentStore, PROVIDER_MAX_BATCH_OPS};

#[derive(Debug, Default)]
struct Inner {
    docs: BTreeMap<DocPath, Fields>,
    /// Size of every commit attempted, in call order.
    commits: Vec<usize>,
    /// Index of the commit call that will be rejected.
    fail_at: Option<usize>,
}

/// Document store kept entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    max_batch_ops: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_batch_ops: PROVIDER_MAX_BATCH_OPS,
        }
    }

    /// Seed a document directly, bypassing commit accounting.
    pub fn insert(&self, path: DocPath, fields: Fields) {
        self.inner.lock().docs.insert(path, fields);
    }

    /// Every stored document, for whole-store comparisons.
    pub fn dump(&self) -> BTreeMap<DocPath, Fields> {
        self.inner.lock().docs.clone()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.inner.lock().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Operation counts of every commit attempted so far.
    pub fn commit_sizes(&self) -> Vec<usize> {
        self.inner.lock().commits.clone()
    }

    /// Reject the commit call with the given zero-based index, counting
    /// every commit attempted on this store.
    pub fn fail_commit_at(&self, index: usize) {
        self.inner.lock().fail_at = Some(index);
    }

    fn collection_docs(inner: &Inner, collection: &CollectionPath) -> Vec<Document> {
        inner
            .docs
            .iter()
            .filter(|(path, _)| {
                path.segments().len() == collection.segments().len() + 1
                    && path.segments().starts_with(collection.segments())
            })
            .map(|(path, fields)| Document {
                id: path.id().to_string(),
                fields: fields.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> DbResult<Snapshot> {
        let fields = self.inner.lock().docs.get(path).cloned();
        Ok(Snapshot {
            path: path.clone(),
            fields,
        })
    }

    async fn list_child_collections(&self, path: &DocPath) -> DbResult<Vec<String>> {
        let inner = self.inner.lock();
        let depth = path.segments().len();
        let ids: BTreeSet<String> = inner
            .docs
            .keys()
            .filter(|candidate| path.has_nested_document(candidate))
            .map(|candidate| candidate.segments()[depth].clone())
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn list_documents(&self, collection: &CollectionPath) -> DbResult<Vec<Document>> {
        let inner = self.inner.lock();
        Ok(Self::collection_docs(&inner, collection))
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> DbResult<Vec<Document>> {
        let inner = self.inner.lock();
        let matching = Self::collection_docs(&inner, collection)
            .into_iter()
            .filter(|doc| query.matches(&doc.fields));
        Ok(match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn commit_batch(&self, ops: Vec<WriteOp>) -> DbResult<()> {
        let mut inner = self.inner.lock();
        let call = inner.commits.len();
        inner.commits.push(ops.len());

        if ops.len() > self.max_batch_ops {
            return Err(DbError::BatchTooLarge {
                ops: ops.len(),
                max: self.max_batch_ops,
            });
        }
        if inner.fail_at == Some(call) {
            inner.fail_at = None;
            return Err(DbError::commit_rejected(format!(
                "injected failure on commit #{call}"
            )));
        }

        let now = Utc::now();
        for op in ops {
            match op {
                WriteOp::Set {
                    path,
                    mut fields,
                    mode,
                } => {
                    resolve_server_timestamps(&mut fields, now);
                    match mode {
                        SetMode::Replace => {
                            inner.docs.insert(path, fields);
                        }
                        SetMode::Merge => {
                            merge_fields(inner.docs.entry(path).or_default(), fields);
                        }
                    }
                }
                WriteOp::Delete { path } => {
                    inner.docs.remove(&path);
                }
            }
        }
        trace!(commit = call, "memory store commit applied");
        Ok(())
    }

    fn max_batch_ops(&self) -> usize {
        self.max_batch_ops
    }
}
