//! Mount table and fstab inspection for the install target

use std::path::{Path, PathBuf};

use crate::error::ProvisionError;
use crate::paths;
use crate::schema::MountExpectation;

/// One line of `mount` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub source: String,
    pub path: PathBuf,
    pub fstype: String,
}

/// Parse `mount` output (`<source> on <path> type <fstype> (<options>)`)
///
/// Lines in any other shape are skipped.
pub fn parse_mount_table(output: &str) -> Vec<MountEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (source, rest) = line.split_once(" on ")?;
            let (path, rest) = rest.rsplit_once(" type ")?;
            let fstype = rest.split_whitespace().next()?;
            Some(MountEntry {
                source: source.to_string(),
                path: PathBuf::from(path),
                fstype: fstype.to_string(),
            })
        })
        .collect()
}

/// Check that every expected filesystem is mounted below `root`
///
/// Other mounts are ignored. When a path is mounted more than once the
/// last (topmost) mount counts.
pub fn verify(
    entries: &[MountEntry],
    root: &Path,
    expected: &[MountExpectation],
) -> Result<(), ProvisionError> {
    for expectation in expected {
        let path = paths::under(root, &expectation.path);
        let found = entries.iter().rev().find(|e| e.path == path);

        match found {
            Some(entry) if entry.fstype == expectation.fstype => {
                log::debug!("{} is {} from {}", path.display(), entry.fstype, entry.source);
            }
            other => {
                return Err(ProvisionError::MountMismatch {
                    path,
                    expected: expectation.fstype.clone(),
                    found: other.map(|e| e.fstype.clone()),
                });
            }
        }
    }
    Ok(())
}

/// Whether an fstab already has an entry mounted at `mount_point`
pub fn fstab_has_mount(fstab: &str, mount_point: &Path) -> bool {
    fstab
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_whitespace().nth(1))
        .any(|field| Path::new(field) == mount_point)
}
