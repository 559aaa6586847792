//! Execution engine - applies resources in order, stopping at the first failure

use crate::context::{ApplyContext, CommandExecutor, NoProgress, ProgressCallback};
use crate::planner::ExecutionPlan;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::{Context, Result, anyhow};

/// Execute a plan with the given options and progress callback
///
/// Resources are applied one at a time, in plan order. The first resource
/// that fails aborts the run; the returned error names that resource.
/// Resources applied before it keep their new state.
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run)
/// * `exec` - Runner for the external commands resources issue
/// * `progress` - Progress callback
///
/// # Returns
/// Summary of execution results
pub fn execute<P>(
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    exec: &dyn CommandExecutor,
    progress: &mut P,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
{
    let mut summary = ExecuteSummary::default();
    progress.on_plan_start(plan.total_resources());

    for (index, resource) in plan.resources.iter().enumerate() {
        let id = resource.id();
        let description = resource.description();
        progress.on_resource_start(index, &id, &description);

        let mut ctx = ApplyContext::new(opts.dry_run, exec);
        let result = match resource.apply(&mut ctx) {
            Ok(ApplyResult::Failed { error }) => Err(anyhow!("{error}")),
            other => other,
        };

        match result {
            Ok(result) => {
                progress.on_resource_complete(&id, &result);
                summary.add_result(&result);
            }
            Err(e) => {
                progress.on_resource_complete(
                    &id,
                    &ApplyResult::Failed {
                        error: format!("{e:#}"),
                    },
                );
                return Err(e).with_context(|| format!("{description} failed"));
            }
        }
    }

    Ok(summary)
}

/// Simple execution without callbacks
pub fn execute_simple(
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    exec: &dyn CommandExecutor,
) -> Result<ExecuteSummary> {
    execute(plan, opts, exec, &mut NoProgress)
}
