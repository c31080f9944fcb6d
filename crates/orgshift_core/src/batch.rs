//! Chunked batch commits.

use orgshift_db::{DocumentStore, WriteOp};
use tracing::debug;

use crate::error::{CoreError, Result};

/// Operations per commit unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 400;

/// Commits an ordered list of writes in groups no larger than `max_ops`.
///
/// Each group is atomic; groups are committed one after another, so a
/// failure leaves every earlier group in place.
#[derive(Debug, Clone, Copy)]
pub struct BatchWriter<'a> {
    store: &'a dyn DocumentStore,
    max_ops: usize,
}

impl<'a> BatchWriter<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            max_ops: DEFAULT_BATCH_SIZE.min(store.max_batch_ops()),
        }
    }

    /// Use a specific group size, which must fit under the store ceiling.
    pub fn with_max_ops(store: &'a dyn DocumentStore, max_ops: usize) -> Result<Self> {
        let ceiling = store.max_batch_ops();
        if max_ops == 0 || max_ops > ceiling {
            return Err(CoreError::invalid_argument(
                "batch size",
                format!("must be between 1 and {ceiling}, got {max_ops}"),
            ));
        }
        Ok(Self { store, max_ops })
    }

    pub fn max_ops(&self) -> usize {
        self.max_ops
    }

    pub fn store(&self) -> &'a dyn DocumentStore {
        self.store
    }

    /// Commit every operation, returning how many were committed.
    pub async fn commit(&self, ops: Vec<WriteOp>) -> Result<usize> {
        if ops.is_empty() {
            return Ok(0);
        }

        let total = ops.len();
        let mut committed = 0;
        let mut remaining = ops.into_iter().peekable();
        let mut group_index = 0;

        while remaining.peek().is_some() {
            let group: Vec<WriteOp> = remaining.by_ref().take(self.max_ops).collect();
            let size = group.len();

            self.store
                .commit_batch(group)
                .await
                .map_err(|cause| CoreError::CommitFailed {
                    group_index,
                    committed_ops: committed,
                    cause,
                })?;

            committed += size;
            debug!(group = group_index, ops = size, committed, total, "committed batch group");
            group_index += 1;
        }

        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgshift_db::{DocPath, Fields, MemoryStore};
    use pretty_assertions::assert_eq;

    fn writes(count: usize) -> Vec<WriteOp> {
        (0..count)
            .map(|i| WriteOp::merge(DocPath::new("projects", format!("p{i:04}")), Fields::new()))
            .collect()
    }

    #[tokio::test]
    async fn test_groups_respect_max_ops() {
        let store = MemoryStore::new();
        let writer = BatchWriter::new(&store);

        let committed = writer.commit(writes(1000)).await.unwrap();

        assert_eq!(committed, 1000);
        assert_eq!(store.commit_sizes(), vec![400, 400, 200]);
        assert_eq!(store.len(), 1000);
    }

    #[tokio::test]
    async fn test_empty_input_issues_no_commit() {
        let store = MemoryStore::new();
        let committed = BatchWriter::new(&store).commit(Vec::new()).await.unwrap();
        assert_eq!(committed, 0);
        assert!(store.commit_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_group_size_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            BatchWriter::with_max_ops(&store, 0),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert!(BatchWriter::with_max_ops(&store, 501).is_err());
        assert_eq!(BatchWriter::with_max_ops(&store, 500).unwrap().max_ops(), 500);
    }

    #[tokio::test]
    async fn test_failed_group_keeps_earlier_groups() {
        let store = MemoryStore::new();
        store.fail_commit_at(1);
        let writer = BatchWriter::with_max_ops(&store, 100).unwrap();

        let err = writer.commit(writes(250)).await.unwrap_err();

        match err {
            CoreError::CommitFailed {
                group_index,
                committed_ops,
                ..
            } => {
                assert_eq!(group_index, 1);
                assert_eq!(committed_ops, 100);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.len(), 100);
        // The third group is never attempted.
        assert_eq!(store.commit_sizes(), vec![100, 100]);
    }
}
