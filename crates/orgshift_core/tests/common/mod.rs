//! Shared fixtures for reorganization tests.
#![allow(dead_code)]

use std::sync::Arc;

use orgshift_db::{DocPath, Fields, MemoryStore};
use serde_json::{Value, json};

pub fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

pub fn org(id: &str) -> DocPath {
    DocPath::new("organizations", id)
}

pub fn org_user(org_id: &str, user_id: &str) -> DocPath {
    org(org_id).collection("users").doc(user_id)
}

pub fn flat_user(user_id: &str) -> DocPath {
    DocPath::new("users", user_id)
}

/// Tenant `o1` with two users about to be merged:
/// `u1 {name: "Al", email: "a@x.com"}` with `schedules/s1`, and
/// `u2 {name: "Alice"}`, each with a flat lookup entry.
pub fn merge_fixture() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.insert(org("o1"), fields(json!({"name": "Acme"})));
    store.insert(org_user("o1", "u1"), fields(json!({"name": "Al", "email": "a@x.com"})));
    store.insert(
        org_user("o1", "u1").collection("schedules").doc("s1"),
        fields(json!({"day": "mon"})),
    );
    store.insert(org_user("o1", "u2"), fields(json!({"name": "Alice"})));
    store.insert(
        flat_user("u1"),
        fields(json!({"organizationId": "o1", "userId": "u1", "email": "a@x.com"})),
    );
    store.insert(
        flat_user("u2"),
        fields(json!({"organizationId": "o1", "userId": "u2", "email": ""})),
    );
    Arc::new(store)
}

/// Tenant `o1` still stored flat: two full user records with nested
/// collections, scoped documents for `o1` and for another tenant.
pub fn flat_fixture() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.insert(org("o1"), fields(json!({"name": "Acme"})));
    store.insert(
        flat_user("u1"),
        fields(json!({"organizationId": "o1", "name": "Al", "email": "al@x.com", "role": "admin"})),
    );
    for i in 0..3 {
        store.insert(
            flat_user("u1").collection("schedules").doc(format!("s{i}")),
            fields(json!({"slot": i})),
        );
    }
    store.insert(
        flat_user("u1").collection("leaves").doc("l1"),
        fields(json!({"kind": "sick"})),
    );
    store.insert(
        flat_user("u2"),
        fields(json!({"organizationId": "o1", "userId": "legacy", "name": "Bo"})),
    );
    store.insert(
        flat_user("u9"),
        fields(json!({"organizationId": "o2", "name": "Other"})),
    );
    store.insert(
        DocPath::new("projects", "p1"),
        fields(json!({"organizationId": "o1", "title": "Roadmap"})),
    );
    store.insert(
        DocPath::new("projects", "p2"),
        fields(json!({"organizationId": "o2", "title": "Elsewhere"})),
    );
    store.insert(
        DocPath::new("work_locations", "w1"),
        fields(json!({"organizationId": "o1", "city": "Oslo"})),
    );
    Arc::new(store)
}
