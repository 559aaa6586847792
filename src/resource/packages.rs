//! Package set resource - system upgrade plus install of missing packages

use anyhow::Result;
use std::collections::HashSet;

use super::{ApplyContext, ApplyResult, Invocation, Resource, ResourceState, dry_run_skip};

/// The full package list, synced in one pacman transaction
#[derive(Debug, Clone)]
pub struct PackageSet {
    pub packages: Vec<String>,
    pub noconfirm: bool,
}

impl PackageSet {
    pub fn new(packages: &[String], noconfirm: bool) -> Self {
        Self {
            packages: packages.to_vec(),
            noconfirm,
        }
    }

    /// Packages from the set that are not installed, in list order
    fn missing(&self, ctx: &ApplyContext) -> Result<Vec<&str>> {
        let output = ctx
            .exec
            .capture(&Invocation::new("pacman", ["-Qq"]).read_only())?;
        let installed: HashSet<&str> = output.lines().map(str::trim).collect();

        Ok(self
            .packages
            .iter()
            .map(String::as_str)
            .filter(|p| !installed.contains(p))
            .collect())
    }

    fn sync_invocation(&self) -> Invocation {
        let mut args = vec!["-Syu".to_string(), "--needed".to_string()];
        if self.noconfirm {
            args.push("--noconfirm".to_string());
        }
        args.extend(self.packages.iter().cloned());
        Invocation::new("pacman", args)
    }

    fn summary(&self) -> String {
        format!("{} packages", self.packages.len())
    }
}

impl Resource for PackageSet {
    fn id(&self) -> String {
        "packages".to_string()
    }

    fn description(&self) -> String {
        format!("Sync {} packages", self.packages.len())
    }

    fn resource_type(&self) -> &'static str {
        "pacman_packages"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        let missing = self.missing(ctx)?;
        if missing.is_empty() {
            return Ok(ResourceState::Present {
                details: Some(self.summary()),
            });
        }
        Ok(ResourceState::Modified {
            from: format!("missing {}", missing.join(" ")),
            to: self.summary(),
        })
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(self.summary()),
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let missing = self.missing(ctx)?;
        log::info!(
            "{} of {} packages not installed",
            missing.len(),
            self.packages.len()
        );

        if ctx.dry_run {
            return Ok(dry_run_skip());
        }

        ctx.exec.run(&self.sync_invocation())?;
        Ok(if missing.is_empty() {
            ApplyResult::Modified
        } else {
            ApplyResult::Created
        })
    }
}
