//! Collection names and path helpers for the tenant hierarchy.

use std::fmt;

use orgshift_db::{CollectionPath, DocPath, validate_id};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const ORGANIZATIONS: &str = "organizations";
pub const USERS: &str = "users";
pub const PROJECTS: &str = "projects";
pub const LOCATION_SETTINGS: &str = "location_settings";
pub const WORK_LOCATIONS: &str = "work_locations";
pub const USER_GROUPS: &str = "user_groups";
pub const SCHEDULES: &str = "schedules";
pub const LEAVES: &str = "leaves";

/// Flat collections moved under the tenant besides users.
pub const SCOPED_COLLECTIONS: [&str; 4] =
    [PROJECTS, LOCATION_SETTINGS, WORK_LOCATIONS, USER_GROUPS];

pub const ORGANIZATION_ID: &str = "organizationId";
pub const USER_ID: &str = "userId";
pub const EMAIL: &str = "email";

/// Check a command-line identifier before any store access.
pub fn require_id(argument: &str, value: &str) -> Result<()> {
    validate_id(value).map_err(|e| CoreError::invalid_argument(argument, e.to_string()))
}

/// `organizations/{tenant}`
pub fn tenant_doc(tenant_id: &str) -> DocPath {
    DocPath::new(ORGANIZATIONS, tenant_id)
}

/// `organizations/{tenant}/{collection}`
pub fn tenant_collection(tenant_id: &str, collection: &str) -> CollectionPath {
    tenant_doc(tenant_id).collection(collection)
}

/// `organizations/{tenant}/users/{user}`
pub fn tenant_user(tenant_id: &str, user_id: &str) -> DocPath {
    tenant_collection(tenant_id, USERS).doc(user_id)
}

/// Flat lookup entry `users/{user}`.
pub fn lookup_entry(user_id: &str) -> DocPath {
    DocPath::new(USERS, user_id)
}

/// Where a user record lives: the flat `users` collection, or a tenant's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLocation {
    pub tenant_id: Option<String>,
    pub user_id: String,
}

impl UserLocation {
    pub fn flat(user_id: impl Into<String>) -> Self {
        Self {
            tenant_id: None,
            user_id: user_id.into(),
        }
    }

    pub fn in_tenant(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            user_id: user_id.into(),
        }
    }

    pub fn path(&self) -> DocPath {
        match &self.tenant_id {
            Some(tenant) => tenant_user(tenant, &self.user_id),
            None => lookup_entry(&self.user_id),
        }
    }

    /// Validate both ids, naming the offending argument.
    pub fn validate(&self, argument: &str) -> Result<()> {
        if let Some(tenant) = &self.tenant_id {
            require_id("org-id", tenant)?;
        }
        require_id(argument, &self.user_id)
    }
}

impl fmt::Display for UserLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(tenant_user("o1", "u1").to_string(), "organizations/o1/users/u1");
        assert_eq!(
            tenant_collection("o1", PROJECTS).to_string(),
            "organizations/o1/projects"
        );
        assert_eq!(UserLocation::flat("u1").path().to_string(), "users/u1");
    }

    #[test]
    fn test_validation_names_argument() {
        let err = UserLocation::in_tenant("o1", "a/b").validate("source").unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidArgument { ref argument, .. } if argument == "source")
        );

        let err = UserLocation::in_tenant(" ", "u1").validate("source").unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidArgument { ref argument, .. } if argument == "org-id")
        );
    }
}
