//! Field-level document merging.

use orgshift_db::{DocPath, Fields, WriteOp};
use serde::Serialize;
use serde_json::Value;

use crate::layout::{ORGANIZATION_ID, USER_ID, UserLocation};

/// Identifiers a merged document must carry at its destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub organization_id: Option<String>,
}

impl Identity {
    /// Identity of a user document at `location`. Flat records have no
    /// tenant, so their `organizationId` is left alone.
    pub fn of(location: &UserLocation) -> Self {
        Self {
            user_id: Some(location.user_id.clone()),
            organization_id: location.tenant_id.clone(),
        }
    }

    /// Rewrite stale self-referential ids in `fields`, returning the names
    /// of the rewritten fields.
    ///
    /// Only fields that are present with a non-empty value are touched.
    pub fn normalize(&self, fields: &mut Fields) -> Vec<String> {
        let mut rewritten = Vec::new();
        for (name, expected) in [
            (USER_ID, self.user_id.as_deref()),
            (ORGANIZATION_ID, self.organization_id.as_deref()),
        ] {
            let Some(expected) = expected else { continue };
            let stale = match fields.get(name) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) if s.is_empty() => false,
                Some(Value::String(s)) => s != expected,
                Some(_) => true,
            };
            if stale {
                fields.insert(name.to_string(), Value::from(expected));
                rewritten.push(name.to_string());
            }
        }
        rewritten
    }
}

/// Outcome of merging one document into another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedDocument {
    /// The write that applies the merge.
    #[serde(skip)]
    pub write: WriteOp,
    /// Target fields as they will read after the write.
    pub preview: Fields,
    pub target_existed: bool,
    /// Source-only fields.
    pub added: Vec<String>,
    /// Fields in both documents whose target value changes.
    pub overwritten: Vec<String>,
    /// Fields in both documents with equal values.
    pub unchanged: Vec<String>,
    /// Target-only fields kept as they are.
    pub preserved: Vec<String>,
    /// Identity fields rewritten before the merge.
    pub normalized: Vec<String>,
}

/// Merges a source document into a target with merge-write semantics.
#[derive(Debug, Clone, Default)]
pub struct DocumentMerger {
    identity: Identity,
}

impl DocumentMerger {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    /// Build the merge of `source` into the document at `target`, whose
    /// current fields are `existing` (`None` when it does not exist yet).
    pub fn merge(
        &self,
        target: &DocPath,
        mut source: Fields,
        existing: Option<&Fields>,
    ) -> MergedDocument {
        let normalized = self.identity.normalize(&mut source);

        let mut added = Vec::new();
        let mut overwritten = Vec::new();
        let mut unchanged = Vec::new();
        let mut preview = existing.cloned().unwrap_or_default();

        for (key, value) in &source {
            match preview.get(key) {
                None => added.push(key.clone()),
                Some(current) if current == value => unchanged.push(key.clone()),
                Some(_) => overwritten.push(key.clone()),
            }
        }
        let preserved = preview
            .keys()
            .filter(|key| !source.contains_key(*key))
            .cloned()
            .collect();

        for (key, value) in &source {
            preview.insert(key.clone(), value.clone());
        }

        MergedDocument {
            write: WriteOp::merge(target.clone(), source),
            preview,
            target_existed: existing.is_some(),
            added,
            overwritten,
            unchanged,
            preserved,
            normalized,
        }
    }
}
