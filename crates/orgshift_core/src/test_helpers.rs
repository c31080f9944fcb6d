#![cfg(test)]

use std::sync::Arc;

use orgshift_db::{Fields, MemoryStore};
use serde_json::{Value, json};

use crate::layout::{tenant_doc, tenant_user};

pub fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}

/// Store holding tenant `o1` with one user `u1` that has a schedule.
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.insert(tenant_doc("o1"), fields(json!({"name": "Acme"})));
    let user = tenant_user("o1", "u1");
    store.insert(
        user.clone(),
        fields(json!({"name": "Alice", "email": "alice@x.com", "userId": "u1"})),
    );
    store.insert(
        user.collection("schedules").doc("s1"),
        fields(json!({"day": "mon"})),
    );
    Arc::new(store)
}
