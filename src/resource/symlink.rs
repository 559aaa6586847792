//! Symlink resource - force-created with `ln -sfnv`

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use super::{ApplyContext, ApplyResult, Invocation, Resource, ResourceState, dry_run_skip};

/// A symlink to create
#[derive(Debug, Clone)]
pub struct Symlink {
    /// Source path (what the symlink points to)
    pub source: PathBuf,
    /// Target path (where the symlink is created)
    pub target: PathBuf,
}

impl Symlink {
    pub fn new(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            target: target.as_ref().to_path_buf(),
        }
    }

    /// Check current symlink state
    fn check_current(&self) -> Result<SymlinkState> {
        if !self.target.exists() && !self.target.is_symlink() {
            return Ok(SymlinkState::Missing);
        }

        if !self.target.is_symlink() {
            if self.target.is_dir() {
                return Ok(SymlinkState::Directory);
            }
            return Ok(SymlinkState::NotALink);
        }

        let link_target = fs::read_link(&self.target)
            .with_context(|| format!("Failed to read symlink {}", self.target.display()))?;
        if link_target == self.source {
            Ok(SymlinkState::Correct)
        } else {
            Ok(SymlinkState::WrongTarget(link_target))
        }
    }

    fn link_invocation(&self) -> Invocation {
        Invocation::new(
            "ln",
            [
                "-sfnv".to_string(),
                self.source.to_string_lossy().to_string(),
                self.target.to_string_lossy().to_string(),
            ],
        )
    }
}

#[derive(Debug)]
enum SymlinkState {
    Missing,
    Correct,
    WrongTarget(PathBuf),
    NotALink,
    /// A real directory, which `ln -sfn` would link into instead of replacing
    Directory,
}

impl Resource for Symlink {
    fn id(&self) -> String {
        self.target.to_string_lossy().to_string()
    }

    fn description(&self) -> String {
        format!(
            "Symlink {} -> {}",
            self.target.display(),
            self.source.display()
        )
    }

    fn resource_type(&self) -> &'static str {
        "symlink"
    }

    fn current_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        match self.check_current()? {
            SymlinkState::Missing => Ok(ResourceState::Absent),
            SymlinkState::Correct => Ok(self.desired_state()),
            SymlinkState::WrongTarget(actual) => Ok(ResourceState::Modified {
                from: actual.to_string_lossy().to_string(),
                to: self.source.to_string_lossy().to_string(),
            }),
            SymlinkState::NotALink => Ok(ResourceState::Modified {
                from: "not a symlink".to_string(),
                to: format!("symlink -> {}", self.source.display()),
            }),
            SymlinkState::Directory => Ok(ResourceState::Modified {
                from: "directory".to_string(),
                to: format!("symlink -> {}", self.source.display()),
            }),
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(format!("-> {}", self.source.display())),
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let state = self.check_current()?;
        match state {
            SymlinkState::Correct => return Ok(ApplyResult::NoChange),
            SymlinkState::Directory => bail!(
                "{} is a directory, remove it before linking it to {}",
                self.target.display(),
                self.source.display()
            ),
            _ => {}
        }
        if ctx.dry_run {
            return Ok(dry_run_skip());
        }

        if !self.source.exists() {
            log::warn!("{} does not exist yet, linking anyway", self.source.display());
        }

        ctx.exec.run(&self.link_invocation())?;
        Ok(match state {
            SymlinkState::Missing => ApplyResult::Created,
            _ => ApplyResult::Modified,
        })
    }
}
