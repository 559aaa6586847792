//! Pacman repository resource - uncomment a section in pacman.conf

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{ApplyContext, ApplyResult, Resource, ResourceState, dry_run_skip};
use crate::files::{self, Presence};
use crate::pacman_conf::{self, RepositoryState};
use crate::ui::{self, Preview};

/// A repository section that should be enabled
#[derive(Debug, Clone)]
pub struct PacmanRepository {
    /// Path to pacman.conf
    pub config: PathBuf,
    /// Section name without brackets, e.g. "multilib"
    pub section: String,
}

impl PacmanRepository {
    pub fn new(config: impl AsRef<Path>, section: &str) -> Self {
        Self {
            config: config.as_ref().to_path_buf(),
            section: section.to_string(),
        }
    }

    fn read(&self) -> Result<String> {
        files::read(&self.config, Presence::Required, Preview::Truncated)
    }
}

impl Resource for PacmanRepository {
    fn id(&self) -> String {
        self.section.clone()
    }

    fn description(&self) -> String {
        format!("Enable [{}] in {}", self.section, self.config.display())
    }

    fn resource_type(&self) -> &'static str {
        "pacman_repository"
    }

    fn current_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        let text = self.read()?;
        Ok(match pacman_conf::repository_state(&text, &self.section) {
            // An absent section cannot be enabled; there is nothing to do
            RepositoryState::Enabled | RepositoryState::Absent => {
                ResourceState::Present { details: None }
            }
            RepositoryState::Disabled => ResourceState::Modified {
                from: "commented out".to_string(),
                to: "enabled".to_string(),
            },
        })
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let text = self.read()?;

        let Some(enabled) = pacman_conf::enable_repository(&text, &self.section) else {
            if pacman_conf::repository_state(&text, &self.section) == RepositoryState::Absent {
                ui::warn(&format!(
                    "No [{}] section in {}, leaving it untouched",
                    self.section,
                    self.config.display()
                ));
            }
            return Ok(ApplyResult::NoChange);
        };

        ui::diff(&text, &enabled);
        if ctx.dry_run {
            return Ok(dry_run_skip());
        }

        files::write(&self.config, &enabled, false)?;
        Ok(ApplyResult::Modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::RecordingExecutor;
    use std::fs;
    use tempfile::TempDir;

    const DISABLED: &str = "[core]\nInclude = /etc/pacman.d/mirrorlist\n\n#[multilib]\n#Include = /etc/pacman.d/mirrorlist\n";

    fn fixture(content: &str) -> (TempDir, PacmanRepository) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pacman.conf");
        fs::write(&path, content).unwrap();
        (dir, PacmanRepository::new(path, "multilib"))
    }

    #[test]
    fn test_enables_and_then_no_change() {
        let (_dir, repo) = fixture(DISABLED);
        let exec = RecordingExecutor::new();
        let mut ctx = ApplyContext::new(false, &exec);

        assert_ne!(repo.current_state(&ctx).unwrap(), repo.desired_state());
        assert_eq!(repo.apply(&mut ctx).unwrap(), ApplyResult::Modified);
        assert!(
            fs::read_to_string(&repo.config)
                .unwrap()
                .ends_with("\n[multilib]\nInclude = /etc/pacman.d/mirrorlist\n")
        );

        assert_eq!(repo.current_state(&ctx).unwrap(), repo.desired_state());
        assert_eq!(repo.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
        assert!(exec.lines().is_empty());
    }

    #[test]
    fn test_absent_section_leaves_file_untouched() {
        let (_dir, repo) = fixture("[core]\nInclude = /etc/pacman.d/mirrorlist\n");
        let exec = RecordingExecutor::new();
        let mut ctx = ApplyContext::new(false, &exec);

        assert_eq!(repo.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
        assert_eq!(
            fs::read_to_string(&repo.config).unwrap(),
            "[core]\nInclude = /etc/pacman.d/mirrorlist\n"
        );
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let (_dir, repo) = fixture(DISABLED);
        let exec = RecordingExecutor::new();
        let mut ctx = ApplyContext::new(true, &exec);

        assert!(matches!(
            repo.apply(&mut ctx).unwrap(),
            ApplyResult::Skipped { .. }
        ));
        assert_eq!(fs::read_to_string(&repo.config).unwrap(), DISABLED);
    }

    #[test]
    fn test_missing_config_is_error() {
        let dir = TempDir::new().unwrap();
        let repo = PacmanRepository::new(dir.path().join("pacman.conf"), "multilib");
        let exec = RecordingExecutor::new();
        let mut ctx = ApplyContext::new(false, &exec);
        assert!(repo.apply(&mut ctx).is_err());
    }
}
