//! Flatpak application resource

use anyhow::Result;

use super::{ApplyContext, ApplyResult, Invocation, Resource, ResourceState, dry_run_skip};

/// A Flatpak application installed system-wide from a remote
#[derive(Debug, Clone)]
pub struct FlatpakApp {
    pub remote: String,
    /// Application id, e.g. "com.spotify.Client"
    pub app: String,
}

impl FlatpakApp {
    pub fn new(remote: &str, app: &str) -> Self {
        Self {
            remote: remote.to_string(),
            app: app.to_string(),
        }
    }

    fn is_installed(&self, ctx: &ApplyContext) -> Result<bool> {
        ctx.exec
            .probe(&Invocation::new("flatpak", ["info", self.app.as_str()]).read_only())
    }
}

impl Resource for FlatpakApp {
    fn id(&self) -> String {
        self.app.clone()
    }

    fn description(&self) -> String {
        format!("Install {} from {}", self.app, self.remote)
    }

    fn resource_type(&self) -> &'static str {
        "flatpak_app"
    }

    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState> {
        if self.is_installed(ctx)? {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(dry_run_skip());
        }

        let installed = self.is_installed(ctx)?;
        ctx.exec.run(&Invocation::new(
            "flatpak",
            ["install", "-y", self.remote.as_str(), self.app.as_str()],
        ))?;

        Ok(if installed {
            ApplyResult::NoChange
        } else {
            ApplyResult::Created
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::RecordingExecutor;
    use declarative::CommandOutput;

    #[test]
    fn test_installs_missing_app() {
        let exec = RecordingExecutor::new().respond("flatpak info", CommandOutput::failed(1));
        let mut ctx = ApplyContext::new(false, &exec);
        let app = FlatpakApp::new("flathub", "com.spotify.Client");

        assert_eq!(app.apply(&mut ctx).unwrap(), ApplyResult::Created);
        assert_eq!(
            exec.lines(),
            vec![
                "flatpak info com.spotify.Client",
                "flatpak install -y flathub com.spotify.Client",
            ]
        );
    }

    #[test]
    fn test_installed_app_is_still_invoked() {
        let exec = RecordingExecutor::new();
        let mut ctx = ApplyContext::new(false, &exec);
        let app = FlatpakApp::new("flathub", "com.github.tchx84.Flatseal");

        assert_eq!(app.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
        assert!(exec.ran("flatpak install -y flathub com.github.tchx84.Flatseal"));
    }

    #[test]
    fn test_install_failure_propagates() {
        let exec = RecordingExecutor::new().respond("flatpak install", CommandOutput::failed(1));
        let mut ctx = ApplyContext::new(false, &exec);
        assert!(FlatpakApp::new("flathub", "x.y.Z").apply(&mut ctx).is_err());
    }

    #[test]
    fn test_dry_run_runs_nothing() {
        let exec = RecordingExecutor::new();
        let mut ctx = ApplyContext::new(true, &exec);
        assert!(matches!(
            FlatpakApp::new("flathub", "x.y.Z").apply(&mut ctx).unwrap(),
            ApplyResult::Skipped { .. }
        ));
        assert!(exec.lines().is_empty());
    }
}
