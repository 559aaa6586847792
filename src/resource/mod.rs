//! Resources the convergence procedure applies
//!
//! Each resource reads the host through [`ApplyContext::exec`] or the
//! filesystem, and reports what it changed. Every one is safe to re-apply.

pub use declarative::{ApplyContext, ApplyResult, Invocation, Resource, ResourceState};

pub mod flatpak;
pub mod grub_cmdline;
pub mod gsetting;
pub mod managed_file;
pub mod packages;
pub mod repository;
pub mod symlink;

pub use flatpak::FlatpakApp;
pub use grub_cmdline::GrubCmdline;
pub use gsetting::GSettingResource;
pub use managed_file::ManagedFile;
pub use packages::PackageSet;
pub use repository::PacmanRepository;
pub use symlink::Symlink;

/// Result used by every resource when nothing may be changed
fn dry_run_skip() -> ApplyResult {
    ApplyResult::Skipped {
        reason: "Dry run".to_string(),
    }
}
