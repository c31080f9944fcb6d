//! Copying and removing the collections nested under a document.

use orgshift_db::{CollectionPath, DocPath, Document, WriteOp};
use tracing::{debug, info};

use crate::batch::BatchWriter;
use crate::error::Result;
use crate::plan::PlanStep;

/// Copies every collection nested under a source document to the same
/// collection ids under a target document, keeping document ids.
///
/// Collections are discovered from the store rather than named up front.
/// Writes merge, so running a copy twice leaves the same result.
#[derive(Debug, Clone, Copy)]
pub struct SubcollectionCopier<'a> {
    writer: BatchWriter<'a>,
}

impl<'a> SubcollectionCopier<'a> {
    pub fn new(writer: BatchWriter<'a>) -> Self {
        Self { writer }
    }

    /// Copy nested collections of `source` under `target`. In a dry run the
    /// documents are only counted.
    pub async fn copy(
        &self,
        source: &DocPath,
        target: &DocPath,
        dry_run: bool,
    ) -> Result<Vec<PlanStep>> {
        let store = self.writer.store();
        let mut steps = Vec::new();

        for collection_id in store.list_child_collections(source).await? {
            let from = source.collection(&collection_id);
            let to = target.collection(&collection_id);
            let docs = store.list_documents(&from).await?;
            if docs.is_empty() {
                continue;
            }

            let documents = self.copy_documents(docs, &to, dry_run).await?;
            info!(
                source = %from,
                target = %to,
                documents,
                dry_run,
                "copied nested collection"
            );
            steps.push(PlanStep::CopyCollection {
                source: from.to_string(),
                target: to.to_string(),
                documents,
            });
        }

        Ok(steps)
    }

    /// Merge-write documents into `target`, keeping their ids. Returns the
    /// number of documents involved.
    pub async fn copy_documents(
        &self,
        docs: Vec<Document>,
        target: &CollectionPath,
        dry_run: bool,
    ) -> Result<usize> {
        let count = docs.len();
        if dry_run || count == 0 {
            return Ok(count);
        }

        let ops = docs
            .into_iter()
            .map(|doc| WriteOp::merge(target.doc(doc.id), doc.fields))
            .collect();
        self.writer.commit(ops).await
    }

    /// Delete every document of every collection nested under `source`.
    /// The document itself is left in place.
    pub async fn delete_all(&self, source: &DocPath, dry_run: bool) -> Result<Vec<PlanStep>> {
        let store = self.writer.store();
        let mut steps = Vec::new();

        for collection_id in store.list_child_collections(source).await? {
            let collection = source.collection(&collection_id);
            let docs = store.list_documents(&collection).await?;
            let documents = docs.len();

            if !dry_run {
                let ops = docs
                    .into_iter()
                    .map(|doc| WriteOp::delete(collection.doc(doc.id)))
                    .collect();
                self.writer.commit(ops).await?;
            }
            debug!(collection = %collection, documents, dry_run, "cleared nested collection");
            steps.push(PlanStep::DeleteCollection {
                path: collection.to_string(),
                documents,
            });
        }

        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgshift_db::{DocumentStore, Fields, MemoryStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn seeded() -> (MemoryStore, DocPath, DocPath) {
        let store = MemoryStore::new();
        let source = DocPath::new("users", "u1");
        let target = DocPath::new("users", "u2");
        store.insert(source.clone(), fields(json!({"name": "Al"})));
        for i in 0..3 {
            store.insert(
                source.collection("schedules").doc(format!("s{i}")),
                fields(json!({"day": i})),
            );
        }
        store.insert(source.collection("leaves").doc("l1"), fields(json!({"kind": "sick"})));
        store.insert(target.collection("leaves").doc("l9"), fields(json!({"kind": "vacation"})));
        (store, source, target)
    }

    #[tokio::test]
    async fn test_copy_discovers_every_collection() {
        let (store, source, target) = seeded();
        let copier = SubcollectionCopier::new(BatchWriter::new(&store));

        let steps = copier.copy(&source, &target, false).await.unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(
            steps[1],
            PlanStep::CopyCollection {
                source: "users/u1/schedules".into(),
                target: "users/u2/schedules".into(),
                documents: 3,
            }
        );
        let leaves = store.list_documents(&target.collection("leaves")).await.unwrap();
        let ids: Vec<_> = leaves.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "l9"]);
        assert_eq!(
            store.get(&target.collection("schedules").doc("s2")).await.unwrap().data(),
            fields(json!({"day": 2}))
        );
    }

    #[tokio::test]
    async fn test_dry_run_only_counts() {
        let (store, source, target) = seeded();
        let before = store.dump();
        let copier = SubcollectionCopier::new(BatchWriter::new(&store));

        let steps = copier.copy(&source, &target, true).await.unwrap();
        let deletions = copier.delete_all(&source, true).await.unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(deletions.len(), 2);
        assert_eq!(store.dump(), before);
        assert!(store.commit_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_copy_is_idempotent() {
        let (store, source, target) = seeded();
        let copier = SubcollectionCopier::new(BatchWriter::new(&store));

        copier.copy(&source, &target, false).await.unwrap();
        let once = store.dump();
        copier.copy(&source, &target, false).await.unwrap();

        assert_eq!(store.dump(), once);
    }

    #[tokio::test]
    async fn test_delete_all_keeps_parent_document() {
        let (store, source, _) = seeded();
        let copier = SubcollectionCopier::new(BatchWriter::new(&store));

        copier.delete_all(&source, false).await.unwrap();

        assert!(store.list_child_collections(&source).await.unwrap().is_empty());
        assert!(store.get(&source).await.unwrap().exists());
    }
}
