pub mod config;
pub mod merge;
pub mod migrate;
pub mod scan;
pub mod verify;

use miette::Result;
use orgshift_core::{Plan, PlanStep};

use crate::output::Output;

fn verb(dry_run: bool, would: &str, did: &str) -> String {
    if dry_run {
        format!("Would {would}")
    } else {
        did.to_string()
    }
}

/// Print a plan as text, or as JSON in report mode.
pub fn render_plan(plan: &Plan, output: &Output) -> Result<()> {
    if output.is_json() {
        return output.report(plan);
    }

    let dry = plan.dry_run;
    let title = if dry {
        format!("[DRY RUN] {}", plan.operation)
    } else {
        plan.operation.clone()
    };
    output.section(&title);

    for step in &plan.steps {
        let line = match step {
            PlanStep::MergeDocument {
                source,
                target,
                merge,
            } => {
                let mut line = format!("{} {source} -> {target}", verb(dry, "merge", "Merged"));
                if !merge.target_existed {
                    line.push_str(" (creates target)");
                }
                if !merge.normalized.is_empty() {
                    line.push_str(&format!(" [normalized: {}]", merge.normalized.join(", ")));
                }
                line
            }
            PlanStep::CopyCollection {
                source,
                target,
                documents,
            } => format!(
                "{} {documents} doc(s) {source} -> {target}",
                verb(dry, "copy", "Copied")
            ),
            PlanStep::ReconcileLookup {
                path,
                entry,
                stale_removed,
            } => {
                let email = if entry.email.is_empty() {
                    "<empty>"
                } else {
                    entry.email.as_str()
                };
                let mut line = format!(
                    "{} {path} = {{ organizationId: {}, userId: {}, email: {email} }}",
                    verb(dry, "write", "Wrote"),
                    entry.organization_id,
                    entry.user_id,
                );
                if let Some(stale) = stale_removed {
                    line.push_str(&format!(", removing {stale}"));
                }
                line
            }
            PlanStep::DeleteCollection { path, documents } => {
                format!("{} {documents} doc(s) in {path}", verb(dry, "delete", "Deleted"))
            }
            PlanStep::DeleteDocument { path } => {
                format!("{} {path}", verb(dry, "delete", "Deleted"))
            }
            PlanStep::Skipped { path, reason } => format!("Skipped {path}: {reason}"),
        };
        output.list_item(&line);
    }

    let totals = plan.totals();
    output.print("");
    output.kv("Documents written", &totals.documents_written.to_string());
    output.kv("Documents deleted", &totals.documents_deleted.to_string());
    output.kv("Lookup entries", &totals.lookups_reconciled.to_string());

    if dry {
        output.warning("Dry run: nothing was written");
    } else {
        output.success("Done");
    }
    Ok(())
}
