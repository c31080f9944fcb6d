use std::process::ExitCode;

use miette::Result;
use orgshift_core::config::VerifyConfig;
use orgshift_core::{CoreError, IntegrityVerifier, VerificationReport};
use orgshift_db::DocumentStore;

use crate::output::{Output, new_table};

/// Exit status when the tenant document does not exist.
pub const TENANT_MISSING: u8 = 2;

fn mark(present: bool) -> &'static str {
    if present { "✓" } else { "0" }
}

/// Check the hierarchy of one tenant. Shape warnings do not change the exit
/// status; a missing tenant does.
pub async fn hierarchy(
    store: &dyn DocumentStore,
    config: &VerifyConfig,
    org_id: &str,
    output: &Output,
) -> Result<ExitCode> {
    let report = match IntegrityVerifier::new(store, config).verify(org_id).await {
        Ok(report) => report,
        Err(CoreError::TenantNotFound { tenant_id }) => {
            output.error(&format!("Organization {tenant_id} not found"));
            return Ok(ExitCode::from(TENANT_MISSING));
        }
        Err(e) => return Err(e.into()),
    };

    if output.is_json() {
        output.report(&report)?;
    } else {
        render(&report, output);
    }
    Ok(ExitCode::SUCCESS)
}

fn render(report: &VerificationReport, output: &Output) {
    output.section(&format!("Hierarchy of organization {}", report.tenant_id));

    let counts = &report.counts;
    let mut table = new_table(&["Collection", "Documents"]);
    for (name, count) in [
        ("users", counts.users),
        ("projects", counts.projects),
        ("user_groups", counts.user_groups),
        ("work_locations", counts.work_locations),
        ("location_settings", counts.location_settings),
    ] {
        table.add_row(vec![name.to_string(), count.to_string()]);
    }
    output.table(&table);

    if !report.user_samples.is_empty() {
        output.section("Sampled users");
        for sample in &report.user_samples {
            output.list_item(&format!(
                "{} ({}) | schedules: {} | leaves: {}",
                sample.label,
                sample.user_id,
                mark(sample.has_schedules),
                mark(sample.has_leaves)
            ));
        }
    }

    output.section("Location settings");
    match &report.settings {
        Some(settings) => {
            output.kv(
                &format!("has '{}' doc", report.tenant_id),
                if settings.tenant_keyed { "YES" } else { "NO" },
            );
            output.kv(
                &format!("keys of '{}'", settings.document_id),
                &format!(
                    "{}{}",
                    settings.keys.join(", "),
                    if settings.more_keys { " …" } else { "" }
                ),
            );
        }
        None => output.kv("location_settings", "MISSING (0 docs)"),
    }

    output.section("Lookup entries");
    output.kv("Sampled", &report.lookups.len().to_string());
    output.kv(
        "Shape OK",
        if report.lookups_ok() { "YES" } else { "NO" },
    );

    output.print("");
    if report.is_healthy() {
        output.success("Integrity check complete");
    } else {
        for warning in &report.warnings {
            output.warning(&format!("{}: {}", warning.path, warning.message));
        }
        output.status(&format!(
            "Integrity check complete with {} warning(s)",
            report.warnings.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgshift_db::{DocPath, MemoryStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tenant_without_settings() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(
            DocPath::new("organizations", "o1"),
            json!({"name": "Acme"}).as_object().cloned().unwrap(),
        );
        store
    }

    #[tokio::test]
    async fn test_missing_tenant_exits_with_two() {
        let store = tenant_without_settings();
        let code = hierarchy(&store, &VerifyConfig::default(), "o2", &Output::new())
            .await
            .unwrap();
        assert_eq!(code, ExitCode::from(TENANT_MISSING));
    }

    #[tokio::test]
    async fn test_shape_warnings_still_succeed() {
        let store = tenant_without_settings();
        let report = IntegrityVerifier::new(&store, &VerifyConfig::default())
            .verify("o1")
            .await
            .unwrap();
        assert!(!report.is_healthy());

        let code = hierarchy(&store, &VerifyConfig::default(), "o1", &Output::new())
            .await
            .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }
}
