//! Managed file resource - a file whose whole content is owned by the profile

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{ApplyContext, ApplyResult, Resource, ResourceState, dry_run_skip};
use crate::files;
use crate::schema::SessionConfig;

/// A file that is overwritten with fixed content, never merged
#[derive(Debug, Clone)]
pub struct ManagedFile {
    pub path: PathBuf,
    pub content: String,
}

impl ManagedFile {
    pub fn new(path: impl AsRef<Path>, content: String) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            content,
        }
    }

    /// The file's current content, `None` when it does not exist
    fn existing(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(Some)
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }
}

/// Render the desktop entry for the GPU session
pub fn render_session(session: &SessionConfig) -> String {
    let mut exec = String::from("env");
    for var in &session.env {
        exec.push(' ');
        exec.push_str(var);
    }
    exec.push(' ');
    exec.push_str(&session.command);

    format!(
        "[Desktop Entry]\n\
         Name={}\n\
         Comment={}\n\
         Exec={exec}\n\
         DesktopNames={}\n\
         Type=Application\n",
        session.name, session.comment, session.desktop_names
    )
}

impl Resource for ManagedFile {
    fn id(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    fn description(&self) -> String {
        format!("Write {}", self.path.display())
    }

    fn resource_type(&self) -> &'static str {
        "managed_file"
    }

    fn current_state(&self, _ctx: &ApplyContext) -> Result<ResourceState> {
        Ok(match self.existing()? {
            None => ResourceState::Absent,
            Some(text) if text == self.content => ResourceState::Present { details: None },
            Some(_) => ResourceState::Modified {
                from: "different content".to_string(),
                to: "profile content".to_string(),
            },
        })
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let existing = self.existing()?;
        if existing.as_deref() == Some(self.content.as_str()) {
            return Ok(ApplyResult::NoChange);
        }
        if ctx.dry_run {
            return Ok(dry_run_skip());
        }

        files::write(&self.path, &self.content, false)?;
        Ok(match existing {
            None => ApplyResult::Created,
            Some(_) => ApplyResult::Modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::RecordingExecutor;
    use tempfile::TempDir;

    #[test]
    fn test_render_reference_session() {
        assert_eq!(
            render_session(&SessionConfig::default()),
            "[Desktop Entry]\n\
             Name=GNOME (NVIDIA)\n\
             Comment=Run GNOME Desktop using NVIDIA GPU\n\
             Exec=env __NV_PRIME_RENDER_OFFLOAD=1 __VK_LAYER_NV_optimus=NVIDIA_only __GLX_VENDOR_LIBRARY_NAME=nvidia /usr/bin/gnome-session --session=gnome\n\
             DesktopNames=GNOME\n\
             Type=Application\n"
        );
    }

    #[test]
    fn test_write_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wayland-sessions/custom-gnome-nvidia.desktop");
        let file = ManagedFile::new(&path, render_session(&SessionConfig::default()));
        let exec = RecordingExecutor::new();
        let mut ctx = ApplyContext::new(false, &exec);

        assert_eq!(file.current_state(&ctx).unwrap(), ResourceState::Absent);
        assert_eq!(file.apply(&mut ctx).unwrap(), ApplyResult::Created);
        let first = fs::read_to_string(&path).unwrap();

        assert_eq!(file.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
        assert_eq!(file.current_state(&ctx).unwrap(), file.desired_state());
    }

    #[test]
    fn test_foreign_content_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.desktop");
        fs::write(&path, "[Desktop Entry]\nName=Old\nX-Local=keep\n").unwrap();

        let file = ManagedFile::new(&path, "[Desktop Entry]\nName=New\n".to_string());
        let exec = RecordingExecutor::new();
        let mut ctx = ApplyContext::new(false, &exec);

        assert_eq!(file.apply(&mut ctx).unwrap(), ApplyResult::Modified);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[Desktop Entry]\nName=New\n"
        );
    }
}
