use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::paths;
use crate::schema::Profile;

/// Where the profile came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    File(PathBuf),
    BuiltIn,
}

/// Load the profile to provision with
///
/// An explicit path must exist. Without one, `<config_dir>/profile.toml` is
/// used when present, and the built-in profile otherwise. On installer media
/// there is usually no config directory at all.
pub fn load_profile(explicit: Option<&Path>) -> Result<(Profile, ProfileSource)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = paths::config_dir()?.join(paths::PROFILE_FILE);
            candidate.exists().then_some(candidate)
        }
    };

    let Some(path) = path else {
        log::info!("No profile found, using built-in profile");
        let profile = Profile::default();
        profile.validate()?;
        return Ok((profile, ProfileSource::BuiltIn));
    };

    let profile = read_profile(&path)?;
    log::info!("Loaded profile from {}", path.display());
    Ok((profile, ProfileSource::File(path)))
}

/// Parse and validate a profile file
pub fn read_profile(path: &Path) -> Result<Profile, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let profile: Profile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    profile.validate()?;
    Ok(profile)
}
