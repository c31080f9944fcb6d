//! Duplicate detection followed by the merge that resolves it.

mod common;

use common::{fields, flat_user, org, org_user};
use orgshift_core::{DuplicateScanner, MergeOperation, OrgshiftConfig, ReorgPlanner, UserLocation};
use orgshift_db::{DocumentStore, MemoryStore};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn tenant_with_duplicates() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.insert(org("o1"), fields(json!({"name": "Acme"})));
    store.insert(org_user("o1", "u1"), fields(json!({"name": "Al", "email": " A@X.com "})));
    store.insert(org_user("o1", "u2"), fields(json!({"displayName": "Alice", "email": "a@x.com"})));
    store.insert(org_user("o1", "u3"), fields(json!({"name": "Bo", "email": "b@x.com"})));
    store.insert(org_user("o1", "u4"), fields(json!({"name": "Blank", "email": "   "})));
    store.insert(org_user("o1", "u5"), fields(json!({"name": "Blank too", "email": ""})));
    store.insert(
        flat_user("u1"),
        fields(json!({"organizationId": "o1", "userId": "u1", "email": "a@x.com"})),
    );
    Arc::new(store)
}

#[tokio::test]
async fn merging_a_reported_group_clears_it() {
    let store = tenant_with_duplicates();

    let groups = DuplicateScanner::new(store.as_ref()).scan("o1").await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].email, "a@x.com");
    let members: Vec<(&str, &str)> = groups[0]
        .members
        .iter()
        .map(|m| (m.id.as_str(), m.name.as_str()))
        .collect();
    assert_eq!(members, vec![("u1", "Al"), ("u2", "Alice")]);

    let planner = ReorgPlanner::new(store.clone(), &OrgshiftConfig::default());
    planner
        .merge_user(&MergeOperation {
            source: UserLocation::in_tenant("o1", "u1"),
            target: UserLocation::in_tenant("o1", "u2"),
            dry_run: false,
            delete_source: true,
        })
        .await
        .unwrap();

    let groups = DuplicateScanner::new(store.as_ref()).scan("o1").await.unwrap();
    assert!(groups.is_empty());
    assert!(!store.get(&org_user("o1", "u1")).await.unwrap().exists());
}

#[tokio::test]
async fn scanning_an_unknown_tenant_finds_nothing() {
    let store = tenant_with_duplicates();
    let groups = DuplicateScanner::new(store.as_ref()).scan("nope").await.unwrap();
    assert!(groups.is_empty());
}
