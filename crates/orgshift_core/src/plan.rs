//! Reports of what a reorganization did, or would do in a dry run.

use serde::Serialize;

use crate::lookup::LookupEntry;
use crate::merge::MergedDocument;

/// One step of a reorganization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanStep {
    /// Field merge of one document into another.
    MergeDocument {
        source: String,
        target: String,
        #[serde(flatten)]
        merge: MergedDocument,
    },
    /// Documents of one collection merge-written into another.
    CopyCollection {
        source: String,
        target: String,
        documents: usize,
    },
    /// Flat lookup entry rewritten to its canonical shape.
    ReconcileLookup {
        path: String,
        entry: LookupEntry,
        /// Stale entry removed after the rewrite.
        stale_removed: Option<String>,
    },
    /// Every document of a nested collection removed.
    DeleteCollection { path: String, documents: usize },
    DeleteDocument { path: String },
    /// Nothing to do for this path.
    Skipped { path: String, reason: String },
}

impl PlanStep {
    pub fn skipped(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::Skipped {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Totals over every step of a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanTotals {
    pub documents_written: usize,
    pub documents_deleted: usize,
    pub collections_copied: usize,
    pub lookups_reconciled: usize,
}

/// Ordered list of steps for a single invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub operation: String,
    pub dry_run: bool,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(operation: impl Into<String>, dry_run: bool) -> Self {
        Self {
            operation: operation.into(),
            dry_run,
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    pub fn extend(&mut self, steps: impl IntoIterator<Item = PlanStep>) {
        self.steps.extend(steps);
    }

    pub fn totals(&self) -> PlanTotals {
        let mut totals = PlanTotals::default();
        for step in &self.steps {
            match step {
                PlanStep::MergeDocument { .. } => totals.documents_written += 1,
                PlanStep::CopyCollection { documents, .. } => {
                    totals.documents_written += documents;
                    totals.collections_copied += 1;
                }
                PlanStep::ReconcileLookup { stale_removed, .. } => {
                    totals.documents_written += 1;
                    totals.lookups_reconciled += 1;
                    if stale_removed.is_some() {
                        totals.documents_deleted += 1;
                    }
                }
                PlanStep::DeleteCollection { documents, .. } => {
                    totals.documents_deleted += documents;
                }
                PlanStep::DeleteDocument { .. } => totals.documents_deleted += 1,
                PlanStep::Skipped { .. } => {}
            }
        }
        totals
    }
}
