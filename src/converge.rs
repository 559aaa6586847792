//! Convergence procedure: bring an installed system to its profile
//!
//! The profile is turned into an ordered [`ExecutionPlan`] and applied one
//! resource at a time. The first failure stops the run; whatever was applied
//! before it stays applied, and re-running picks up from there.

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{
    ApplyContext, ApplyResult, CommandExecutor, DiffSummary, ExecuteOptions, ExecuteSummary,
    ExecutionPlan, ProgressCallback, ResourceDiff, ResourceState, compute_diffs,
};

use crate::resource::{
    FlatpakApp, GSettingResource, GrubCmdline, ManagedFile, PackageSet, PacmanRepository, Symlink,
    managed_file,
};
use crate::schema::Profile;
use crate::ui;

/// Options for one convergence run
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvergeOptions<'a> {
    pub dry_run: bool,
    /// `TYPE[.ID]` filter
    pub only: Option<&'a str>,
}

/// Build the plan for a profile, in application order
pub fn build_plan(profile: &Profile) -> ExecutionPlan {
    let mut plan = ExecutionPlan::new();

    plan.push(Box::new(PacmanRepository::new(
        &profile.paths.pacman_conf,
        &profile.pacman.repository,
    )));
    plan.push(Box::new(PackageSet::new(
        &profile.packages,
        profile.pacman.noconfirm,
    )));

    for app in &profile.flatpak.apps {
        plan.push(Box::new(FlatpakApp::new(&profile.flatpak.remote, app)));
    }
    for setting in &profile.desktop.settings {
        plan.push(Box::new(GSettingResource::new(
            &profile.machine.username,
            setting,
        )));
    }

    plan.push(Box::new(ManagedFile::new(
        &profile.session.path,
        managed_file::render_session(&profile.session),
    )));
    plan.push(Box::new(Symlink::new(
        &profile.firmware.source,
        &profile.firmware.target,
    )));

    if !profile.grub.kernel_params.is_empty() {
        plan.push(Box::new(GrubCmdline::new(
            &profile.grub.defaults_file,
            &profile.grub.config_output,
            &profile.grub.kernel_params,
        )));
    }

    plan
}

/// Converge the running system
pub fn run(
    profile: &Profile,
    exec: &dyn CommandExecutor,
    opts: ConvergeOptions,
) -> Result<ExecuteSummary> {
    ui::header(&format!("Converging {}", profile.machine.hostname));

    let plan = build_plan(profile).filter_by_target(opts.only);
    if plan.is_empty() {
        bail!(
            "No resources match --only {}",
            opts.only.unwrap_or_default()
        );
    }

    if opts.dry_run {
        let ctx = ApplyContext::new(true, exec);
        display_diff(&compute_diffs(&plan.resources, &ctx));
    }

    let execute_opts = ExecuteOptions {
        dry_run: opts.dry_run,
    };
    let summary = declarative::execute(&plan, &execute_opts, exec, &mut ConsoleProgress::default())?;

    print_summary(&summary, opts.dry_run);
    Ok(summary)
}

/// Prints a numbered step per resource
#[derive(Debug, Default)]
struct ConsoleProgress {
    total: usize,
}

impl ProgressCallback for ConsoleProgress {
    fn on_plan_start(&mut self, count: usize) {
        self.total = count;
    }

    fn on_resource_start(&mut self, index: usize, _id: &str, description: &str) {
        ui::step(index + 1, self.total, description);
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => ui::dim("already up to date"),
            ApplyResult::Created => ui::success(&format!("{id} created")),
            ApplyResult::Modified => ui::success(&format!("{id} updated")),
            ApplyResult::Skipped { reason } => ui::dim(&format!("skipped: {reason}")),
            ApplyResult::Failed { error } => ui::warn(&format!("{id} failed: {error}")),
        }
    }
}

/// Display pending changes, in plan order
fn display_diff(diffs: &[ResourceDiff]) {
    ui::header("Pending changes");
    if diffs.is_empty() {
        ui::success("No changes needed");
        return;
    }

    for diff in diffs {
        let symbol = match &diff.current {
            ResourceState::Absent => "+".green(),
            ResourceState::Unknown => "?".dimmed(),
            _ => "~".yellow(),
        };
        ui::kv(
            &format!("{symbol} {}", diff.resource_type),
            &format!("{} ({} -> {})", diff.resource_id, diff.current, diff.desired),
        );
    }

    let summary = DiffSummary::from_diffs(diffs);
    ui::info(&format!(
        "{} to add, {} to change",
        summary.additions, summary.modifications
    ));
}

fn print_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if dry_run {
        ui::info("Dry run - no changes made");
    } else if summary.total_changes() == 0 {
        ui::success("System already matches the profile");
    } else {
        ui::success(&format!(
            "Converged: {} created, {} modified, {} unchanged",
            summary.created, summary.modified, summary.no_change
        ));
    }
}
