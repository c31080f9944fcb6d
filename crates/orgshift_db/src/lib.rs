//! orgshift document store layer
//!
//! A hierarchical document store seen through a small capability trait
//! ([`DocumentStore`]): single-document get/set/delete, collection listing
//! and filtered queries, nested collection discovery, and atomic batch
//! commits bounded by a per-commit operation ceiling.
//!
//! # Backends
//!
//! - [`SqliteStore`] - one SQLite file, one row per document, batches run as
//!   a single transaction
//! - [`MemoryStore`] - in-process map with commit accounting and failure
//!   injection, used for tests and rehearsals
//!
//! # Usage
//!
//! ```rust,ignore
//! use orgshift_db::{DocPath, DocumentStore, SqliteStore};
//!
//! let store = SqliteStore::open("path/to/store.db").await?;
//! let org = store.get(&DocPath::new("organizations", "o1")).await?;
//! ```

pub mod connection;
pub mod document;
pub mod error;
pub mod memory;
pub mod path;
pub mod store;

pub use connection::{SqliteStore, StoreStats};
pub use document::{
    Document, Fields, Filter, FilterOp, Query, SetMode, Snapshot, WriteOp, non_empty_str,
    server_timestamp,
};
pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use path::{CollectionPath, DocPath, validate_id};
pub use store::{DocumentStore, PROVIDER_MAX_BATCH_OPS};
