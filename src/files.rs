//! Text file access with existence checks and progress output

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::ProvisionError;
use crate::ui::{self, Preview};

/// Whether a missing file is an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    /// A missing file reads as empty
    Optional,
}

/// Read a text file
pub fn read(path: &Path, presence: Presence, preview: Preview) -> Result<String> {
    if !path.exists() {
        return match presence {
            Presence::Required => Err(ProvisionError::MissingFile {
                path: path.to_path_buf(),
            }
            .into()),
            Presence::Optional => {
                log::debug!("{} does not exist, reading as empty", path.display());
                Ok(String::new())
            }
        };
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    ui::result(&format!("read {}", path.display()), &content, preview);
    Ok(content)
}

/// Replace a file's content, creating parent directories as needed
pub fn write(path: &Path, text: &str, dry_run: bool) -> Result<()> {
    if dry_run {
        ui::result(&format!("would write {}", path.display()), text, Preview::Truncated);
        return Ok(());
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    ui::result(&format!("written {}", path.display()), text, Preview::Truncated);
    Ok(())
}

/// Append text to a file, creating it if missing
pub fn append(path: &Path, text: &str, dry_run: bool) -> Result<()> {
    if dry_run {
        ui::result(&format!("would append to {}", path.display()), text, Preview::Truncated);
        return Ok(());
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {} for appending", path.display()))?;
    file.write_all(text.as_bytes())
        .with_context(|| format!("Failed to append to {}", path.display()))?;
    ui::result(&format!("appended to {}", path.display()), text, Preview::Truncated);
    Ok(())
}
