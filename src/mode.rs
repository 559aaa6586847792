//! Mode selection: fresh install from the live medium, or converge an installed system

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

use crate::files::{self, Presence};
use crate::ui::Preview;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Running on the installer medium: install the OS
    Bootstrap,
    /// Running on an installed system: converge it to the profile
    Converge,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bootstrap => write!(f, "bootstrap"),
            Self::Converge => write!(f, "converge"),
        }
    }
}

impl Mode {
    /// Decide the mode from the content of the hostname file
    pub fn from_hostname(content: &str, live_hostname: &str) -> Self {
        if content.trim() == live_hostname {
            Self::Bootstrap
        } else {
            Self::Converge
        }
    }

    /// Read the hostname marker and decide the mode
    ///
    /// There is no sensible fallback when the marker is unreadable, so that
    /// is an error.
    pub fn detect(marker: &Path, live_hostname: &str) -> Result<Self> {
        let content = files::read(marker, Presence::Required, Preview::Truncated)
            .context("Cannot determine whether this is the installer or an installed system")?;
        let mode = Self::from_hostname(&content, live_hostname);
        log::info!("Hostname {:?} selects {mode} mode", content.trim());
        Ok(mode)
    }
}
