//! Error types for provisioning preconditions and configuration.
//!
//! Command failures are reported by [`declarative::CommandError`]; the
//! errors here cover the host not being in a state we can work with.

use std::path::PathBuf;
use thiserror::Error;

/// A precondition on the host is not met
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A file the procedure depends on does not exist
    #[error("file {} could not be read: it does not exist", .path.display())]
    MissingFile { path: PathBuf },

    /// The firmware did not boot us in 64-bit UEFI mode
    #[error("not booted in 64-bit EFI mode (platform size is {found:?})")]
    NotEfi64 { found: String },

    /// The connectivity probe failed
    #[error("no internet connection (could not reach {host}); connect and run again")]
    Offline { host: String },

    /// A required mount point is missing or has the wrong filesystem
    #[error("mount {} missing or wrong: expected {expected}, found {}", .path.display(), .found.as_deref().unwrap_or("nothing"))]
    MountMismatch {
        path: PathBuf,
        expected: String,
        found: Option<String>,
    },

    /// Host changes need root privileges
    #[error("must be run as root (try sudo), or pass --dry-run")]
    NotRoot,
}

/// The profile could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read profile {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An ordered set contains the same entry twice
    #[error("{list} lists {entry:?} more than once")]
    DuplicateEntry { list: &'static str, entry: String },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_mismatch_message() {
        let err = ProvisionError::MountMismatch {
            path: PathBuf::from("/mnt/boot"),
            expected: "ext4".into(),
            found: Some("vfat".into()),
        };
        assert_eq!(
            err.to_string(),
            "mount /mnt/boot missing or wrong: expected ext4, found vfat"
        );

        let err = ProvisionError::MountMismatch {
            path: PathBuf::from("/mnt"),
            expected: "btrfs".into(),
            found: None,
        };
        assert!(err.to_string().ends_with("found nothing"));
    }

    #[test]
    fn test_duplicate_entry_message() {
        let err = ConfigError::DuplicateEntry {
            list: "packages",
            entry: "git".into(),
        };
        assert_eq!(err.to_string(), "packages lists \"git\" more than once");
    }
}
