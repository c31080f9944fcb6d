//! Flat per-user lookup index.
//!
//! Every user living under a tenant has a lightweight entry at
//! `users/{userId}` holding exactly `organizationId`, `userId` and `email`,
//! so the tenant of a user can be found without knowing it up front.

use orgshift_db::{DocumentStore, Fields, SetMode, Snapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::layout::{EMAIL, ORGANIZATION_ID, USER_ID, lookup_entry, tenant_user};
use crate::plan::PlanStep;

/// Canonical contents of a lookup entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub organization_id: String,
    pub user_id: String,
    pub email: String,
}

impl LookupEntry {
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(ORGANIZATION_ID.into(), Value::from(self.organization_id.as_str()));
        fields.insert(USER_ID.into(), Value::from(self.user_id.as_str()));
        fields.insert(EMAIL.into(), Value::from(self.email.as_str()));
        fields
    }

    /// Whether `fields` already has exactly the canonical shape of this
    /// entry.
    pub fn matches(&self, fields: &Fields) -> bool {
        *fields == self.to_fields()
    }
}

/// Which record the entry's email was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailSource {
    Lookup,
    TenantRecord,
    StaleLookup,
    Missing,
}

/// Computed lookup entry for a user, with where its email came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub entry: LookupEntry,
    pub email_source: EmailSource,
    /// Stale entry that exists and is not the user's own.
    pub stale: Option<Snapshot>,
}

/// Keeps lookup entries consistent with the tenant-scoped user records.
#[derive(Debug, Clone, Copy)]
pub struct LookupIndex<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> LookupIndex<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Compute the entry for `user_id` in `tenant_id` without writing.
    ///
    /// The email is taken from the first non-empty of the current entry,
    /// the tenant record, and the stale entry of `stale_user_id`.
    pub async fn resolve(
        &self,
        tenant_id: &str,
        user_id: &str,
        stale_user_id: Option<&str>,
    ) -> Result<Resolved> {
        let stale_user_id = stale_user_id.filter(|stale| *stale != user_id);
        let current_path = lookup_entry(user_id);
        let record_path = tenant_user(tenant_id, user_id);

        let (current, record, stale) = tokio::try_join!(
            self.store.get(&current_path),
            self.store.get(&record_path),
            async {
                match stale_user_id {
                    Some(stale) => self.store.get(&lookup_entry(stale)).await.map(Some),
                    None => Ok(None),
                }
            }
        )?;
        let stale = stale.filter(Snapshot::exists);

        let (email, email_source) = [
            (current.str_field(EMAIL), EmailSource::Lookup),
            (record.str_field(EMAIL), EmailSource::TenantRecord),
            (
                stale.as_ref().and_then(|s| s.str_field(EMAIL)),
                EmailSource::StaleLookup,
            ),
        ]
        .into_iter()
        .find_map(|(email, source)| email.map(|e| (e.to_string(), source)))
        .unwrap_or((String::new(), EmailSource::Missing));

        Ok(Resolved {
            entry: LookupEntry {
                organization_id: tenant_id.to_string(),
                user_id: user_id.to_string(),
                email,
            },
            email_source,
            stale,
        })
    }

    /// Rewrite the entry of `user_id` to its canonical shape, then remove
    /// the stale entry when `delete_stale` is set. A dry run only resolves.
    pub async fn reconcile(
        &self,
        tenant_id: &str,
        user_id: &str,
        stale_user_id: Option<&str>,
        delete_stale: bool,
        dry_run: bool,
    ) -> Result<PlanStep> {
        let resolved = self.resolve(tenant_id, user_id, stale_user_id).await?;
        let path = lookup_entry(user_id);
        let stale_removed = resolved
            .stale
            .as_ref()
            .filter(|_| delete_stale)
            .map(|snapshot| snapshot.path.clone());

        if !dry_run {
            self.store
                .set(&path, resolved.entry.to_fields(), SetMode::Replace)
                .await?;
            if let Some(stale) = &stale_removed {
                self.store.delete(stale).await?;
            }
            info!(
                entry = %path,
                email_source = ?resolved.email_source,
                stale_removed = stale_removed.is_some(),
                "reconciled lookup entry"
            );
        }

        Ok(PlanStep::ReconcileLookup {
            path: path.to_string(),
            entry: resolved.entry,
            stale_removed: stale_removed.map(|p| p.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgshift_db::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_email_preference_order() {
        let store = MemoryStore::new();
        store.insert(tenant_user("o1", "u2"), fields(json!({"email": "record@x.com"})));
        store.insert(lookup_entry("u1"), fields(json!({"email": "stale@x.com"})));
        let index = LookupIndex::new(&store);

        let resolved = index.resolve("o1", "u2", Some("u1")).await.unwrap();
        assert_eq!(resolved.entry.email, "record@x.com");
        assert_eq!(resolved.email_source, EmailSource::TenantRecord);

        store.insert(lookup_entry("u2"), fields(json!({"email": "lookup@x.com", "extra": 1})));
        let resolved = index.resolve("o1", "u2", Some("u1")).await.unwrap();
        assert_eq!(resolved.email_source, EmailSource::Lookup);

        let resolved = index.resolve("o1", "u3", Some("u1")).await.unwrap();
        assert_eq!(resolved.entry.email, "stale@x.com");

        let resolved = index.resolve("o1", "u4", None).await.unwrap();
        assert_eq!(resolved.entry.email, "");
        assert_eq!(resolved.email_source, EmailSource::Missing);
    }

    #[tokio::test]
    async fn test_reconcile_replaces_and_removes_stale() {
        let store = MemoryStore::new();
        store.insert(
            lookup_entry("u2"),
            fields(json!({"organizationId": "old", "name": "Alice", "email": "a@x.com"})),
        );
        store.insert(lookup_entry("u1"), fields(json!({"organizationId": "o1"})));
        let index = LookupIndex::new(&store);

        let step = index.reconcile("o1", "u2", Some("u1"), true, false).await.unwrap();

        assert_eq!(
            store.get(&lookup_entry("u2")).await.unwrap().data(),
            fields(json!({"organizationId": "o1", "userId": "u2", "email": "a@x.com"}))
        );
        assert!(!store.get(&lookup_entry("u1")).await.unwrap().exists());
        assert!(matches!(
            step,
            PlanStep::ReconcileLookup { stale_removed: Some(ref p), .. } if p == "users/u1"
        ));
    }

    #[tokio::test]
    async fn test_stale_kept_without_deletion_and_self_never_stale() {
        let store = MemoryStore::new();
        store.insert(lookup_entry("u1"), fields(json!({"email": "a@x.com"})));
        let index = LookupIndex::new(&store);

        index.reconcile("o1", "u2", Some("u1"), false, false).await.unwrap();
        assert!(store.get(&lookup_entry("u1")).await.unwrap().exists());

        index.reconcile("o1", "u1", Some("u1"), true, false).await.unwrap();
        assert_eq!(
            store.get(&lookup_entry("u1")).await.unwrap().str_field("organizationId"),
            Some("o1")
        );
    }

    #[tokio::test]
    async fn test_dry_run_does_not_write() {
        let store = MemoryStore::new();
        store.insert(lookup_entry("u1"), fields(json!({"email": "a@x.com"})));
        let before = store.dump();

        LookupIndex::new(&store)
            .reconcile("o1", "u2", Some("u1"), true, true)
            .await
            .unwrap();

        assert_eq!(store.dump(), before);
    }
}
