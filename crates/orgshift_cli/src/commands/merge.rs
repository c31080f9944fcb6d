use miette::Result;
use orgshift_core::{MergeOperation, ReorgPlanner};

use super::render_plan;
use crate::output::Output;

/// Merge one user record into another and report what happened.
pub async fn run(planner: &ReorgPlanner, op: MergeOperation, output: &Output) -> Result<()> {
    let plan = planner.merge_user(&op).await?;
    render_plan(&plan, output)
}
