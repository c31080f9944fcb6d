//! orgshift core - tenant data reorganization engine
//!
//! Moves flat top-level collections under per-tenant collections, merges
//! duplicate user records, keeps the flat user lookup index consistent and
//! verifies the resulting hierarchy. Everything runs against an
//! [`orgshift_db::DocumentStore`]; no state is kept between invocations.

pub mod batch;
pub mod config;
pub mod copier;
pub mod duplicates;
pub mod error;
pub mod layout;
pub mod lookup;
pub mod merge;
pub mod plan;
pub mod planner;
pub mod verify;

#[cfg(test)]
pub mod test_helpers;

pub use batch::{BatchWriter, DEFAULT_BATCH_SIZE};
pub use config::OrgshiftConfig;
pub use copier::SubcollectionCopier;
pub use duplicates::{DuplicateGroup, DuplicateMember, DuplicateScanner};
pub use error::{ConfigError, CoreError, Result};
pub use layout::UserLocation;
pub use lookup::{EmailSource, LookupEntry, LookupIndex};
pub use merge::{DocumentMerger, Identity, MergedDocument};
pub use plan::{Plan, PlanStep, PlanTotals};
pub use planner::{MergeOperation, ReorgPlanner};
pub use verify::{IntegrityVerifier, ShapeWarning, VerificationReport};
