//! Post-migration integrity checks.

use orgshift_db::{CollectionPath, DocumentStore, Query};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::VerifyConfig;
use crate::error::{CoreError, Result};
use crate::layout::{
    EMAIL, LEAVES, LOCATION_SETTINGS, ORGANIZATION_ID, PROJECTS, SCHEDULES, USER_GROUPS, USER_ID,
    USERS, WORK_LOCATIONS, require_id, tenant_collection, tenant_doc,
};

/// Number of settings keys shown in a report.
const SETTINGS_KEY_PREVIEW: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionCounts {
    pub users: usize,
    pub projects: usize,
    pub user_groups: usize,
    pub work_locations: usize,
    pub location_settings: usize,
}

/// Nested data found for one sampled user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSample {
    pub user_id: String,
    pub label: String,
    pub has_schedules: bool,
    pub has_leaves: bool,
}

/// The settings document in effect for the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsCheck {
    pub document_id: String,
    /// Whether the document is keyed by the tenant id.
    pub tenant_keyed: bool,
    /// Sorted field names, capped.
    pub keys: Vec<String>,
    pub more_keys: bool,
}

/// Shape of one sampled flat lookup entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupSample {
    pub user_id: String,
    pub missing_fields: Vec<String>,
}

/// A finding that does not fail verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeWarning {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub tenant_id: String,
    pub counts: CollectionCounts,
    pub user_samples: Vec<UserSample>,
    pub settings: Option<SettingsCheck>,
    pub lookups: Vec<LookupSample>,
    pub warnings: Vec<ShapeWarning>,
}

impl VerificationReport {
    pub fn is_healthy(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Whether every sampled lookup entry has all canonical fields.
    pub fn lookups_ok(&self) -> bool {
        self.lookups.iter().all(|l| l.missing_fields.is_empty())
    }
}

/// Re-reads a tenant's hierarchy and reports on its shape. Never writes.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityVerifier<'a> {
    store: &'a dyn DocumentStore,
    user_sample: usize,
    lookup_sample: usize,
}

impl<'a> IntegrityVerifier<'a> {
    pub fn new(store: &'a dyn DocumentStore, config: &VerifyConfig) -> Self {
        Self {
            store,
            user_sample: config.user_sample,
            lookup_sample: config.lookup_sample,
        }
    }

    pub async fn verify(&self, tenant_id: &str) -> Result<VerificationReport> {
        require_id("org-id", tenant_id)?;
        if !self.store.get(&tenant_doc(tenant_id)).await?.exists() {
            return Err(CoreError::tenant_not_found(tenant_id));
        }

        let mut warnings = Vec::new();
        let users_path = tenant_collection(tenant_id, USERS);
        let users = self.store.list_documents(&users_path).await?;

        let mut user_samples = Vec::new();
        for user in users.iter().take(self.user_sample) {
            let path = users_path.doc(user.id.as_str());
            let first = Query::all().limit(1);
            let schedules_path = path.collection(SCHEDULES);
            let leaves_path = path.collection(LEAVES);
            let (schedules, leaves) = tokio::try_join!(
                self.store.query(&schedules_path, &first),
                self.store.query(&leaves_path, &first),
            )?;
            let label = user
                .str_field("name")
                .or_else(|| user.str_field(EMAIL))
                .unwrap_or(user.id.as_str())
                .to_string();
            user_samples.push(UserSample {
                user_id: user.id.clone(),
                label,
                has_schedules: !schedules.is_empty(),
                has_leaves: !leaves.is_empty(),
            });
        }

        let settings_path = tenant_collection(tenant_id, LOCATION_SETTINGS);
        let (projects, user_groups, work_locations, settings_docs) = tokio::try_join!(
            self.count(tenant_collection(tenant_id, PROJECTS)),
            self.count(tenant_collection(tenant_id, USER_GROUPS)),
            self.count(tenant_collection(tenant_id, WORK_LOCATIONS)),
            self.store.list_documents(&settings_path),
        )?;

        let tenant_keyed = settings_docs.iter().find(|d| d.id == tenant_id);
        if tenant_keyed.is_none() {
            warnings.push(ShapeWarning {
                path: settings_path.doc(tenant_id).to_string(),
                message: if settings_docs.is_empty() {
                    "no location settings documents".to_string()
                } else {
                    "no settings document keyed by the tenant id".to_string()
                },
            });
        }
        let settings = tenant_keyed.or(settings_docs.first()).map(|doc| {
            let mut keys: Vec<String> = doc.fields.keys().cloned().collect();
            keys.sort();
            let more_keys = keys.len() > SETTINGS_KEY_PREVIEW;
            keys.truncate(SETTINGS_KEY_PREVIEW);
            SettingsCheck {
                document_id: doc.id.clone(),
                tenant_keyed: doc.id == tenant_id,
                keys,
                more_keys,
            }
        });

        let entries = self
            .store
            .query(
                &CollectionPath::root(USERS),
                &Query::where_eq(ORGANIZATION_ID, tenant_id).limit(self.lookup_sample),
            )
            .await?;
        let mut lookups = Vec::new();
        for entry in entries {
            let missing_fields: Vec<String> = [ORGANIZATION_ID, EMAIL, USER_ID]
                .into_iter()
                .filter(|field| entry.str_field(field).is_none())
                .map(str::to_string)
                .collect();
            if !missing_fields.is_empty() {
                warnings.push(ShapeWarning {
                    path: format!("{USERS}/{}", entry.id),
                    message: format!("lookup entry missing {}", missing_fields.join(", ")),
                });
            }
            lookups.push(LookupSample {
                user_id: entry.id,
                missing_fields,
            });
        }

        for warning in &warnings {
            warn!(path = %warning.path, "{}", warning.message);
        }

        let report = VerificationReport {
            tenant_id: tenant_id.to_string(),
            counts: CollectionCounts {
                users: users.len(),
                projects,
                user_groups,
                work_locations,
                location_settings: settings_docs.len(),
            },
            user_samples,
            settings,
            lookups,
            warnings,
        };
        info!(
            tenant = tenant_id,
            users = report.counts.users,
            warnings = report.warnings.len(),
            "verification finished"
        );
        Ok(report)
    }

    async fn count(&self, collection: CollectionPath) -> orgshift_db::DbResult<usize> {
        Ok(self.store.list_documents(&collection).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{lookup_entry, tenant_user};
    use crate::test_helpers::{fields, seeded_store};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_tenant() {
        let store = seeded_store();
        let verifier = IntegrityVerifier::new(store.as_ref(), &VerifyConfig::default());
        assert!(matches!(
            verifier.verify("nope").await,
            Err(CoreError::TenantNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_report_flags_missing_settings_and_bad_lookup() {
        let store = seeded_store();
        store.insert(
            tenant_collection("o1", LOCATION_SETTINGS).doc("legacy"),
            fields(json!({"b": 1, "a": 2})),
        );
        store.insert(
            lookup_entry("u1"),
            fields(json!({"organizationId": "o1", "userId": "u1"})),
        );
        let before = store.dump();

        let report = IntegrityVerifier::new(store.as_ref(), &VerifyConfig::default())
            .verify("o1")
            .await
            .unwrap();

        assert_eq!(report.counts.users, 1);
        assert_eq!(report.counts.location_settings, 1);
        assert_eq!(
            report.user_samples,
            vec![UserSample {
                user_id: "u1".into(),
                label: "Alice".into(),
                has_schedules: true,
                has_leaves: false,
            }]
        );
        let settings = report.settings.clone().unwrap();
        assert_eq!(settings.document_id, "legacy");
        assert!(!settings.tenant_keyed);
        assert_eq!(settings.keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(report.warnings.len(), 2);
        assert!(!report.lookups_ok());
        assert!(!report.is_healthy());
        assert_eq!(store.dump(), before);
    }

    #[tokio::test]
    async fn test_healthy_tenant() {
        let store = seeded_store();
        let mut settings = serde_json::Map::new();
        for i in 0..10 {
            settings.insert(format!("k{i}"), json!(i));
        }
        store.insert(tenant_collection("o1", LOCATION_SETTINGS).doc("o1"), settings);
        store.insert(
            lookup_entry("u1"),
            fields(json!({"organizationId": "o1", "userId": "u1", "email": "alice@x.com"})),
        );
        store.insert(tenant_user("o1", "u2"), fields(json!({})));

        let report = IntegrityVerifier::new(store.as_ref(), &VerifyConfig::default())
            .verify("o1")
            .await
            .unwrap();

        assert!(report.is_healthy());
        let settings = report.settings.unwrap();
        assert!(settings.tenant_keyed);
        assert_eq!(settings.keys.len(), 8);
        assert!(settings.more_keys);
        assert_eq!(report.user_samples[1].label, "u2");
    }
}
