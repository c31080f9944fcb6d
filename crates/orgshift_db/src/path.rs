//! Hierarchical document and collection paths.
//!
//! A path is a sequence of segments alternating collection id and document
//! id, starting with a top-level collection:
//!
//! - `users` is a collection path (odd number of segments)
//! - `users/u1` is a document path (even number of segments)
//! - `organizations/o1/users/u1/schedules` is a nested collection path

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// Check that a single id can be used as a path segment.
pub fn validate_id(id: &str) -> DbResult<()> {
    if id.trim().is_empty() {
        return Err(DbError::invalid_path(id, "id must not be empty"));
    }
    if id.contains('/') {
        return Err(DbError::invalid_path(id, "id must not contain '/'"));
    }
    Ok(())
}

fn split_segments(raw: &str) -> DbResult<Vec<String>> {
    let segments: Vec<String> = raw.split('/').map(str::to_string).collect();
    for segment in &segments {
        validate_id(segment).map_err(|_| DbError::invalid_path(raw, "empty segment"))?;
    }
    Ok(segments)
}

/// Path of a collection, top-level or nested under a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CollectionPath {
    segments: Vec<String>,
}

/// Path of a single document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DocPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// A top-level collection.
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            segments: vec![id.into()],
        }
    }

    /// Parse a slash-separated collection path.
    pub fn parse(raw: &str) -> DbResult<Self> {
        let segments = split_segments(raw)?;
        if segments.len() % 2 == 0 {
            return Err(DbError::invalid_path(
                raw,
                "collection paths have an odd number of segments",
            ));
        }
        Ok(Self { segments })
    }

    /// The collection's own id (last segment).
    pub fn id(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// The document this collection is nested under, if any.
    pub fn parent(&self) -> Option<DocPath> {
        if self.segments.len() == 1 {
            return None;
        }
        Some(DocPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// A document inside this collection.
    pub fn doc(&self, id: impl Into<String>) -> DocPath {
        let mut segments = self.segments.clone();
        segments.push(id.into());
        DocPath { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl DocPath {
    /// Shorthand for `CollectionPath::root(collection).doc(id)`.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        CollectionPath::root(collection).doc(id)
    }

    /// Parse a slash-separated document path.
    pub fn parse(raw: &str) -> DbResult<Self> {
        let segments = split_segments(raw)?;
        if segments.len() % 2 != 0 {
            return Err(DbError::invalid_path(
                raw,
                "document paths have an even number of segments",
            ));
        }
        Ok(Self { segments })
    }

    /// The document id (last segment).
    pub fn id(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// The collection holding this document.
    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// A collection nested under this document.
    pub fn collection(&self, id: impl Into<String>) -> CollectionPath {
        let mut segments = self.segments.clone();
        segments.push(id.into());
        CollectionPath { segments }
    }

    /// Whether `other` lives in a collection directly nested under this
    /// document (exactly two segments deeper).
    pub fn has_nested_document(&self, other: &DocPath) -> bool {
        other.segments.len() == self.segments.len() + 2
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl From<CollectionPath> for String {
    fn from(path: CollectionPath) -> Self {
        path.to_string()
    }
}

impl From<DocPath> for String {
    fn from(path: DocPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for CollectionPath {
    type Error = DbError;

    fn try_from(raw: String) -> DbResult<Self> {
        Self::parse(&raw)
    }
}

impl TryFrom<String> for DocPath {
    type Error = DbError;

    fn try_from(raw: String) -> DbResult<Self> {
        Self::parse(&raw)
    }
}
