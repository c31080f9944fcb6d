use miette::Result;
use orgshift_core::DuplicateScanner;
use orgshift_db::DocumentStore;
use owo_colors::OwoColorize;

use crate::output::{Output, new_table};

/// List users of a tenant that share an email address.
pub async fn duplicates(store: &dyn DocumentStore, org_id: &str, output: &Output) -> Result<()> {
    let groups = DuplicateScanner::new(store).scan(org_id).await?;

    if output.is_json() {
        return output.report(&groups);
    }

    if groups.is_empty() {
        output.success(&format!("No duplicates by email found in organizations/{org_id}/users"));
        return Ok(());
    }

    let mut table = new_table(&["Email", "User", "Name"]);
    for group in &groups {
        for (i, member) in group.members.iter().enumerate() {
            let email = if i == 0 { group.email.as_str() } else { "" };
            table.add_row(vec![email, member.id.as_str(), member.name.as_str()]);
        }
    }
    output.table(&table);
    output.print("");
    output.warning(&format!(
        "Found {} duplicate email group(s)",
        groups.len().to_string().bold()
    ));
    output.status(
        "Merge candidates with: orgshift merge-org-user --org-id <ID> --source <ID> --target <ID>",
    );
    Ok(())
}
