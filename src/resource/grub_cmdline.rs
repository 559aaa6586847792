//! Kernel command line resource - parameters in GRUB_CMDLINE_LINUX_DEFAULT

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{ApplyContext, ApplyResult, Invocation, Resource, ResourceState, dry_run_skip};
use crate::files::{self, Presence};
use crate::grub;
use crate::ui::{self, Preview};

/// Kernel parameters ensured in GRUB's defaults, followed by a config rebuild
#[derive(Debug, Clone)]
pub struct GrubCmdline {
    /// Usually /etc/default/grub
    pub defaults_file: PathBuf,
    /// grub-mkconfig output
    pub config_output: PathBuf,
    pub params: Vec<String>,
}

impl GrubCmdline {
    pub fn new(
        defaults_file: impl AsRef<Path>,
        config_output: impl AsRef<Path>,
        params: &[String],
    ) -> Self {
        Self {
            defaults_file: defaults_file.as_ref().to_path_buf(),
            config_output: config_output.as_ref().to_path_buf(),
            params: params.to_vec(),
        }
    }

    fn read(&self) -> Result<String> {
        files::read(&self.defaults_file, Presence::Required, Preview::Truncated)
    }
}

impl Resource for GrubCmdline {
    fn id(&self) -> String {
        self.params.join(" ")
    }

    fn description(&self) -> String {
        format!("Kernel parameters {}", self.params.join(" "))
    }

    fn resource_type(&self) -> &'static str {
        "kernel_cmdline"
    }

    fn current_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        let text = self.read()?;
        Ok(match grub::ensure_kernel_params(&text, &self.params) {
            None => self.desired_state(),
            Some(_) => ResourceState::Modified {
                from: "parameters missing".to_string(),
                to: self.params.join(" "),
            },
        })
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(self.params.join(" ")),
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let text = self.read()?;
        let Some(updated) = grub::ensure_kernel_params(&text, &self.params) else {
            return Ok(ApplyResult::NoChange);
        };

        ui::diff(&text, &updated);
        if ctx.dry_run {
            return Ok(dry_run_skip());
        }

        files::write(&self.defaults_file, &updated, false)?;
        ctx.exec.run(&Invocation::new(
            "grub-mkconfig",
            ["-o".to_string(), self.config_output.to_string_lossy().to_string()],
        ))?;
        Ok(ApplyResult::Modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::RecordingExecutor;
    use declarative::CommandOutput;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, GrubCmdline) {
        let dir = TempDir::new().unwrap();
        let defaults = dir.path().join("grub");
        fs::write(&defaults, "GRUB_CMDLINE_LINUX_DEFAULT=\"loglevel=3 quiet\"\n").unwrap();
        let cmdline = GrubCmdline::new(
            &defaults,
            "/boot/grub/grub.cfg",
            &["nvidia_drm.modeset=1".to_string()],
        );
        (dir, cmdline)
    }

    #[test]
    fn test_adds_param_and_regenerates_once() {
        let (_dir, cmdline) = fixture();
        let exec = RecordingExecutor::new();
        let mut ctx = ApplyContext::new(false, &exec);

        assert_eq!(cmdline.apply(&mut ctx).unwrap(), ApplyResult::Modified);
        assert_eq!(
            fs::read_to_string(&cmdline.defaults_file).unwrap(),
            "GRUB_CMDLINE_LINUX_DEFAULT=\"loglevel=3 quiet nvidia_drm.modeset=1\"\n"
        );
        assert_eq!(exec.lines(), vec!["grub-mkconfig -o /boot/grub/grub.cfg"]);

        assert_eq!(cmdline.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
        assert_eq!(exec.lines().len(), 1);
    }

    #[test]
    fn test_mkconfig_failure_propagates() {
        let (_dir, cmdline) = fixture();
        let exec = RecordingExecutor::new().respond("grub-mkconfig", CommandOutput::failed(1));
        let mut ctx = ApplyContext::new(false, &exec);
        assert!(cmdline.apply(&mut ctx).is_err());
    }
}
