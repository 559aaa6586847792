//! Privilege checks and dropping to the primary user
//!
//! The whole program runs as root. Commands that must act on a user's
//! session (gsettings) are wrapped in `sudo -Hu <user>` instead.

use declarative::Invocation;

use crate::error::ProvisionError;

/// Whether the process runs with an effective uid of 0
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// Refuse to continue without root, unless nothing will be changed
pub fn ensure_root(dry_run: bool) -> Result<(), ProvisionError> {
    check_root(is_root(), dry_run)
}

fn check_root(root: bool, dry_run: bool) -> Result<(), ProvisionError> {
    if root {
        return Ok(());
    }
    if dry_run {
        log::warn!("Not running as root; dry-run probes may see less of the system");
        return Ok(());
    }
    Err(ProvisionError::NotRoot)
}

/// Run an invocation as `user`, with that user's home directory
pub fn as_user(user: &str, invocation: Invocation) -> Invocation {
    invocation.wrapped("sudo", ["-Hu", user])
}
