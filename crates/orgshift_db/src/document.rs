//! Document payloads, write operations and queries.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::DocPath;

/// Field mapping of a single document.
pub type Fields = serde_json::Map<String, Value>;

/// Key of the object used as the server timestamp sentinel.
const SENTINEL_KEY: &str = "$orgshift";
const SERVER_TIMESTAMP: &str = "serverTimestamp";

/// Value substituted by the store with the commit time when written.
pub fn server_timestamp() -> Value {
    let mut sentinel = Fields::new();
    sentinel.insert(SENTINEL_KEY.to_string(), Value::from(SERVER_TIMESTAMP));
    Value::Object(sentinel)
}

/// Whether a value is the server timestamp sentinel.
pub fn is_server_timestamp(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            map.len() == 1
                && map.get(SENTINEL_KEY).and_then(Value::as_str) == Some(SERVER_TIMESTAMP)
        }
        _ => false,
    }
}

/// Replace every top-level server timestamp sentinel with `now`.
pub fn resolve_server_timestamps(fields: &mut Fields, now: DateTime<Utc>) {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    for value in fields.values_mut() {
        if is_server_timestamp(value) {
            *value = Value::String(stamp.clone());
        }
    }
}

/// Apply a merge write onto an existing field mapping.
///
/// Top-level only: a nested map in `incoming` replaces the existing map
/// under the same key as a whole.
pub fn merge_fields(existing: &mut Fields, incoming: Fields) {
    for (key, value) in incoming {
        existing.insert(key, value);
    }
}

/// How `set` treats fields already stored in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetMode {
    /// Update only the named fields, keeping the rest.
    Merge,
    /// Replace the whole document.
    Replace,
}

/// One operation inside a batch commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    Set {
        path: DocPath,
        fields: Fields,
        mode: SetMode,
    },
    Delete {
        path: DocPath,
    },
}

impl WriteOp {
    pub fn merge(path: DocPath, fields: Fields) -> Self {
        Self::Set {
            path,
            fields,
            mode: SetMode::Merge,
        }
    }

    pub fn replace(path: DocPath, fields: Fields) -> Self {
        Self::Set {
            path,
            fields,
            mode: SetMode::Replace,
        }
    }

    pub fn delete(path: DocPath) -> Self {
        Self::Delete { path }
    }

    pub fn path(&self) -> &DocPath {
        match self {
            Self::Set { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// Result of reading a single document.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: DocPath,
    /// `None` when the document does not exist.
    pub fields: Option<Fields>,
}

impl Snapshot {
    pub fn exists(&self) -> bool {
        self.fields.is_some()
    }

    /// Fields of the document, empty when it does not exist.
    pub fn data(&self) -> Fields {
        self.fields.clone().unwrap_or_default()
    }

    /// A string field, `None` when missing, not a string, or blank.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields
            .as_ref()
            .and_then(|fields| non_empty_str(fields, name))
    }
}

/// A document returned from a collection listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn str_field(&self, name: &str) -> Option<&str> {
        non_empty_str(&self.fields, name)
    }
}

/// Read a string field that is present and not blank.
pub fn non_empty_str<'a>(fields: &'a Fields, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

/// Comparison used by a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    NotEqual,
}

/// Single-field filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn matches(&self, fields: &Fields) -> bool {
        let actual = fields.get(&self.field);
        match self.op {
            FilterOp::Equal => actual == Some(&self.value),
            FilterOp::NotEqual => actual.is_some_and(|v| v != &self.value),
        }
    }
}

/// Collection query: an optional filter and an optional result limit.
/// Results are always ordered by document id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub limit: Option<usize>,
}

impl Query {
    /// Every document in the collection.
    pub fn all() -> Self {
        Self::default()
    }

    /// Documents whose `field` equals `value`.
    pub fn where_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Some(Filter {
                field: field.into(),
                op: FilterOp::Equal,
                value: value.into(),
            }),
            limit: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(fields))
    }
}
