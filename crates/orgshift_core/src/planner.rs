//! Tenant reorganization: flat-to-hierarchy migration and user merges.

use std::sync::Arc;

use orgshift_db::{CollectionPath, Document, DocumentStore, Query, WriteOp, non_empty_str};
use serde::Serialize;
use tracing::{info, warn};

use crate::batch::BatchWriter;
use crate::config::OrgshiftConfig;
use crate::copier::SubcollectionCopier;
use crate::error::{CoreError, Result};
use crate::layout::{
    self, LOCATION_SETTINGS, ORGANIZATION_ID, USERS, UserLocation, require_id, tenant_collection,
    tenant_doc,
};
use crate::lookup::{LookupEntry, LookupIndex};
use crate::merge::{DocumentMerger, Identity};
use crate::plan::{Plan, PlanStep};

/// A request to fold one user record into another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOperation {
    pub source: UserLocation,
    pub target: UserLocation,
    pub dry_run: bool,
    /// Remove the source record and its nested collections afterwards.
    pub delete_source: bool,
}

/// Drives migrations and merges against a document store.
///
/// Each operation is staged: copy, then reconcile the lookup index, then
/// delete. Every stage merges or replaces with the same values on a rerun,
/// so an interrupted run is recovered by running it again.
#[derive(Debug, Clone)]
pub struct ReorgPlanner {
    store: Arc<dyn DocumentStore>,
    batch_size: usize,
    collections: Vec<String>,
}

impl ReorgPlanner {
    pub fn new(store: Arc<dyn DocumentStore>, config: &OrgshiftConfig) -> Self {
        Self {
            store,
            batch_size: config.batch.max_ops,
            collections: config.migration.collections.clone(),
        }
    }

    fn writer(&self) -> Result<BatchWriter<'_>> {
        BatchWriter::with_max_ops(self.store.as_ref(), self.batch_size)
    }

    async fn require_tenant(&self, tenant_id: &str) -> Result<()> {
        if self.store.get(&tenant_doc(tenant_id)).await?.exists() {
            Ok(())
        } else {
            Err(CoreError::tenant_not_found(tenant_id))
        }
    }

    /// Move every flat record of `tenant_id` under `organizations/{tenant_id}`.
    ///
    /// Users are merged with their nested collections and their flat record
    /// collapsed to a lookup entry. Documents of the other scoped collections
    /// are copied and left in place.
    pub async fn migrate_tenant(&self, tenant_id: &str, dry_run: bool) -> Result<Plan> {
        require_id("org-id", tenant_id)?;
        let writer = self.writer()?;
        self.require_tenant(tenant_id).await?;

        let mut plan = Plan::new("migrate-to-hierarchy", dry_run);
        info!(tenant = tenant_id, dry_run, "migrating tenant to hierarchy");

        let users = self
            .store
            .query(&CollectionPath::root(USERS), &Query::where_eq(ORGANIZATION_ID, tenant_id))
            .await?;
        info!(tenant = tenant_id, users = users.len(), "found flat users");
        for user in users {
            self.migrate_user(&writer, tenant_id, user, dry_run, &mut plan)
                .await?;
        }

        let copier = SubcollectionCopier::new(writer);
        for collection in &self.collections {
            let source = CollectionPath::root(collection.as_str());
            let target = tenant_collection(tenant_id, collection);
            let docs = self
                .store
                .query(&source, &Query::where_eq(ORGANIZATION_ID, tenant_id))
                .await?;
            if docs.is_empty() {
                plan.push(PlanStep::skipped(&source, "no documents for this tenant"));
                continue;
            }

            let documents = copier.copy_documents(docs, &target, dry_run).await?;
            info!(
                source = %source,
                target = %target,
                documents,
                dry_run,
                "copied scoped collection"
            );
            plan.push(PlanStep::CopyCollection {
                source: source.to_string(),
                target: target.to_string(),
                documents,
            });
        }

        let totals = plan.totals();
        info!(
            tenant = tenant_id,
            dry_run,
            written = totals.documents_written,
            "tenant migration finished"
        );
        Ok(plan)
    }

    async fn migrate_user(
        &self,
        writer: &BatchWriter<'_>,
        tenant_id: &str,
        user: Document,
        dry_run: bool,
        plan: &mut Plan,
    ) -> Result<()> {
        let source = layout::lookup_entry(&user.id);
        let location = UserLocation::in_tenant(tenant_id, user.id.as_str());
        let target = location.path();

        // A flat record already collapsed by an earlier run carries nothing
        // beyond the lookup fields, and its tenant record exists.
        let existing = self.store.get(&target).await?;
        let collapsed = LookupEntry {
            organization_id: tenant_id.to_string(),
            user_id: user.id.clone(),
            email: non_empty_str(&user.fields, layout::EMAIL)
                .unwrap_or_default()
                .to_string(),
        };
        if existing.exists() && collapsed.matches(&user.fields) {
            plan.push(PlanStep::skipped(&source, "already a lookup entry"));
        } else {
            let merged = DocumentMerger::new(Identity::of(&location)).merge(
                &target,
                user.fields,
                existing.fields.as_ref(),
            );
            if !dry_run {
                writer.commit(vec![merged.write.clone()]).await?;
            }
            plan.push(PlanStep::MergeDocument {
                source: source.to_string(),
                target: target.to_string(),
                merge: merged,
            });
        }

        let copier = SubcollectionCopier::new(*writer);
        plan.extend(copier.copy(&source, &target, dry_run).await?);

        let step = LookupIndex::new(self.store.as_ref())
            .reconcile(tenant_id, &user.id, None, false, dry_run)
            .await?;
        plan.push(step);
        Ok(())
    }

    /// Merge one user's record and nested collections into another's.
    pub async fn merge_user(&self, op: &MergeOperation) -> Result<Plan> {
        op.source.validate("source")?;
        op.target.validate("target")?;
        if op.source.path() == op.target.path() {
            return Err(CoreError::invalid_argument(
                "target",
                "source and target are the same user",
            ));
        }
        let writer = self.writer()?;
        if let Some(tenant) = &op.target.tenant_id {
            self.require_tenant(tenant).await?;
        }

        let source = op.source.path();
        let target = op.target.path();
        let operation = if op.target.tenant_id.is_some() {
            "merge-org-user"
        } else {
            "merge-user"
        };
        let mut plan = Plan::new(operation, op.dry_run);
        info!(source = %source, target = %target, dry_run = op.dry_run, "merging user");

        let (source_snap, target_snap) =
            tokio::try_join!(self.store.get(&source), self.store.get(&target))?;
        let Some(source_fields) = source_snap.fields else {
            return Err(CoreError::UserNotFound {
                path: source.to_string(),
            });
        };
        if !target_snap.exists() {
            warn!(target = %target, "target user does not exist yet; it will be created");
        }

        let merged = DocumentMerger::new(Identity::of(&op.target)).merge(
            &target,
            source_fields,
            target_snap.fields.as_ref(),
        );
        if !op.dry_run {
            writer.commit(vec![merged.write.clone()]).await?;
        }
        plan.push(PlanStep::MergeDocument {
            source: source.to_string(),
            target: target.to_string(),
            merge: merged,
        });

        let copier = SubcollectionCopier::new(writer);
        plan.extend(copier.copy(&source, &target, op.dry_run).await?);

        if let Some(tenant) = &op.target.tenant_id {
            let step = LookupIndex::new(self.store.as_ref())
                .reconcile(
                    tenant,
                    &op.target.user_id,
                    Some(&op.source.user_id),
                    op.delete_source,
                    op.dry_run,
                )
                .await?;
            plan.push(step);
        }

        if op.delete_source {
            plan.extend(copier.delete_all(&source, op.dry_run).await?);
            if !op.dry_run {
                writer.commit(vec![WriteOp::delete(source.clone())]).await?;
            }
            plan.push(PlanStep::DeleteDocument {
                path: source.to_string(),
            });
        }

        let totals = plan.totals();
        info!(
            source = %source,
            target = %target,
            dry_run = op.dry_run,
            written = totals.documents_written,
            deleted = totals.documents_deleted,
            "user merge finished"
        );
        Ok(plan)
    }

    /// Copy `location_settings/{tenant}` under the tenant, stamping the
    /// tenant id and migration time. A missing source is reported, not an
    /// error.
    pub async fn migrate_location_settings(&self, tenant_id: &str, dry_run: bool) -> Result<Plan> {
        require_id("org-id", tenant_id)?;
        let writer = self.writer()?;
        self.require_tenant(tenant_id).await?;

        let mut plan = Plan::new("migrate-location-settings", dry_run);
        let source = orgshift_db::DocPath::new(LOCATION_SETTINGS, tenant_id);
        let target = tenant_collection(tenant_id, LOCATION_SETTINGS).doc(tenant_id);

        let (source_snap, target_snap) =
            tokio::try_join!(self.store.get(&source), self.store.get(&target))?;
        let Some(mut payload) = source_snap.fields else {
            warn!(source = %source, "no flat location settings to migrate");
            plan.push(PlanStep::skipped(&source, "source document does not exist"));
            return Ok(plan);
        };

        payload.insert(ORGANIZATION_ID.into(), tenant_id.into());
        payload.insert("migratedAt".into(), self.store.server_timestamp());
        let merged = DocumentMerger::default().merge(&target, payload, target_snap.fields.as_ref());
        if !dry_run {
            writer.commit(vec![merged.write.clone()]).await?;
        }
        info!(source = %source, target = %target, dry_run, "migrated location settings");
        plan.push(PlanStep::MergeDocument {
            source: source.to_string(),
            target: target.to_string(),
            merge: merged,
        });
        Ok(plan)
    }
}
