//! Duplicate user detection within a tenant.

use std::collections::BTreeMap;

use orgshift_db::DocumentStore;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::layout::{EMAIL, USERS, require_id, tenant_collection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateMember {
    pub id: String,
    pub name: String,
}

/// Users of one tenant sharing a normalized email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub email: String,
    pub members: Vec<DuplicateMember>,
}

/// Read-only scan for users that are candidates for a merge.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateScanner<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> DuplicateScanner<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Groups of two or more users with the same trimmed, lower-cased
    /// email, ordered by email with members ordered by id. Users without an
    /// email are ignored.
    pub async fn scan(&self, tenant_id: &str) -> Result<Vec<DuplicateGroup>> {
        require_id("org-id", tenant_id)?;
        let users = self
            .store
            .list_documents(&tenant_collection(tenant_id, USERS))
            .await?;
        let scanned = users.len();

        let mut by_email: BTreeMap<String, Vec<DuplicateMember>> = BTreeMap::new();
        for user in users {
            let Some(email) = user
                .str_field(EMAIL)
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
            else {
                continue;
            };
            let name = user
                .str_field("name")
                .or_else(|| user.str_field("displayName"))
                .unwrap_or_default()
                .to_string();
            by_email.entry(email).or_default().push(DuplicateMember { id: user.id, name });
        }

        let groups: Vec<DuplicateGroup> = by_email
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(email, mut members)| {
                members.sort_by(|a, b| a.id.cmp(&b.id));
                DuplicateGroup { email, members }
            })
            .collect();

        info!(tenant = tenant_id, scanned, groups = groups.len(), "duplicate scan finished");
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tenant_user;
    use crate::test_helpers::fields;
    use orgshift_db::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_groups_by_normalized_email() {
        let store = MemoryStore::new();
        store.insert(tenant_user("o1", "a"), fields(json!({"email": "Dup@x.com", "name": "A"})));
        store.insert(
            tenant_user("o1", "b"),
            fields(json!({"email": " dup@x.com", "displayName": "B"})),
        );
        store.insert(tenant_user("o1", "c"), fields(json!({"email": "dup@X.COM"})));
        store.insert(tenant_user("o1", "d"), fields(json!({"email": "solo@x.com"})));
        store.insert(tenant_user("o1", "e"), fields(json!({"name": "No email"})));
        store.insert(tenant_user("o1", "f"), fields(json!({"email": ""})));

        let groups = DuplicateScanner::new(&store).scan("o1").await.unwrap();

        assert_eq!(
            groups,
            vec![DuplicateGroup {
                email: "dup@x.com".into(),
                members: vec![
                    DuplicateMember { id: "a".into(), name: "A".into() },
                    DuplicateMember { id: "b".into(), name: "B".into() },
                    DuplicateMember { id: "c".into(), name: String::new() },
                ],
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_tenant_has_no_groups() {
        let store = MemoryStore::new();
        assert!(DuplicateScanner::new(&store).scan("o1").await.unwrap().is_empty());
    }
}
