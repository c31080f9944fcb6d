use miette::Result;
use orgshift_core::ReorgPlanner;

use super::render_plan;
use crate::output::Output;

/// Move a tenant's flat collections under `organizations/{org_id}`.
pub async fn to_hierarchy(
    planner: &ReorgPlanner,
    org_id: &str,
    dry_run: bool,
    output: &Output,
) -> Result<()> {
    let plan = planner.migrate_tenant(org_id, dry_run).await?;
    render_plan(&plan, output)
}

/// Copy the tenant's flat location settings document under the tenant.
pub async fn location_settings(
    planner: &ReorgPlanner,
    org_id: &str,
    dry_run: bool,
    output: &Output,
) -> Result<()> {
    let plan = planner.migrate_location_settings(org_id, dry_run).await?;
    render_plan(&plan, output)
}
