//! Profile schema: the desired state of one machine.
//!
//! Every field has a default, so an empty (or missing) profile describes the
//! reference machine this tool was written for.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::error::ConfigError;

// ============================================================================
// Main Profile Schema
// ============================================================================

/// Desired state of a machine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub machine: MachineConfig,

    /// Packages for pacstrap and `pacman -Syu --needed`, in install order
    pub packages: Vec<String>,

    pub pacman: PacmanConfig,
    pub flatpak: FlatpakConfig,
    pub desktop: DesktopConfig,
    pub session: SessionConfig,
    pub firmware: FirmwareConfig,
    pub grub: GrubConfig,
    pub bootstrap: BootstrapConfig,
    pub paths: HostPaths,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            machine: MachineConfig::default(),
            packages: default_packages(),
            pacman: PacmanConfig::default(),
            flatpak: FlatpakConfig::default(),
            desktop: DesktopConfig::default(),
            session: SessionConfig::default(),
            firmware: FirmwareConfig::default(),
            grub: GrubConfig::default(),
            bootstrap: BootstrapConfig::default(),
            paths: HostPaths::default(),
        }
    }
}

impl Profile {
    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.machine.username.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "machine.username",
            });
        }
        if self.machine.hostname.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "machine.hostname",
            });
        }
        if self.packages.is_empty() {
            return Err(ConfigError::Empty { field: "packages" });
        }

        ensure_unique("packages", &self.packages)?;
        ensure_unique("flatpak.apps", &self.flatpak.apps)?;
        ensure_unique("grub.kernel_params", &self.grub.kernel_params)?;
        ensure_unique("bootstrap.services", &self.bootstrap.services)?;
        Ok(())
    }
}

fn ensure_unique(list: &'static str, items: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.as_str()) {
            return Err(ConfigError::DuplicateEntry {
                list,
                entry: item.clone(),
            });
        }
    }
    Ok(())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

// ============================================================================
// Machine identity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub hostname: String,
    /// Primary (non-root) user
    pub username: String,
    /// Hostname of the installer live system
    pub live_hostname: String,
    /// Zone name under /usr/share/zoneinfo
    pub timezone: String,
    /// Line to enable in locale.gen, e.g. "en_US.UTF-8 UTF-8"
    pub locale: String,
    pub keymap: String,
    pub console_font: String,
    /// Keep the hardware clock in local time (dual boot with Windows)
    pub local_rtc: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            hostname: "f15arch".to_string(),
            username: "patrick".to_string(),
            live_hostname: "archiso".to_string(),
            timezone: "Europe/Berlin".to_string(),
            locale: "en_US.UTF-8 UTF-8".to_string(),
            keymap: "de-latin1".to_string(),
            console_font: "ter-124b".to_string(),
            local_rtc: true,
        }
    }
}

impl MachineConfig {
    /// The `LANG` value for locale.conf: the first field of the locale line
    pub fn lang(&self) -> &str {
        self.locale.split_whitespace().next().unwrap_or("C.UTF-8")
    }
}

// ============================================================================
// Package managers
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacmanConfig {
    /// Repository section to enable in pacman.conf
    pub repository: String,
    /// Pass --noconfirm to pacman
    pub noconfirm: bool,
}

impl Default for PacmanConfig {
    fn default() -> Self {
        Self {
            repository: "multilib".to_string(),
            noconfirm: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatpakConfig {
    pub remote: String,
    /// Application ids, installed in order
    pub apps: Vec<String>,
}

impl Default for FlatpakConfig {
    fn default() -> Self {
        Self {
            remote: "flathub".to_string(),
            apps: strings(&[
                "com.discordapp.Discord",
                "com.spotify.Client",
                "com.vysp3r.ProtonPlus",
                "com.github.tchx84.Flatseal",
            ]),
        }
    }
}

// ============================================================================
// Desktop
// ============================================================================

/// A gsettings key to set for the primary user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GSetting {
    pub schema: String,
    pub key: String,
    /// GVariant text, passed to gsettings verbatim
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub settings: Vec<GSetting>,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            settings: vec![GSetting {
                schema: "org.gnome.desktop.input-sources".to_string(),
                key: "sources".to_string(),
                value: "[('xkb', 'de')]".to_string(),
            }],
        }
    }
}

/// Wayland session entry that runs the desktop on the discrete GPU
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: PathBuf,
    pub name: String,
    pub comment: String,
    /// `KEY=VALUE` pairs passed through `env`
    pub env: Vec<String>,
    pub command: String,
    pub desktop_names: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/usr/share/wayland-sessions/custom-gnome-nvidia.desktop"),
            name: "GNOME (NVIDIA)".to_string(),
            comment: "Run GNOME Desktop using NVIDIA GPU".to_string(),
            env: strings(&[
                "__NV_PRIME_RENDER_OFFLOAD=1",
                "__VK_LAYER_NV_optimus=NVIDIA_only",
                "__GLX_VENDOR_LIBRARY_NAME=nvidia",
            ]),
            command: "/usr/bin/gnome-session --session=gnome".to_string(),
            desktop_names: "GNOME".to_string(),
        }
    }
}

// ============================================================================
// Firmware and bootloader
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirmwareConfig {
    /// Directory the link points to
    pub source: PathBuf,
    /// Where the link is created
    pub target: PathBuf,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("/srv/dotfiles/edid"),
            target: PathBuf::from("/usr/lib/firmware/edid"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrubConfig {
    /// The shell-assignment file grub-mkconfig reads, relative to the root
    pub defaults_file: PathBuf,
    /// grub-mkconfig output, as seen from inside the system
    pub config_output: PathBuf,
    /// Assignments written into `defaults_file` at install time
    pub settings: BTreeMap<String, String>,
    /// Parameters ensured in GRUB_CMDLINE_LINUX_DEFAULT
    pub kernel_params: Vec<String>,
    pub target: String,
    pub bootloader_id: String,
}

impl Default for GrubConfig {
    fn default() -> Self {
        let settings = [
            ("GRUB_DEFAULT", "saved"),
            ("GRUB_SAVEDEFAULT", "true"),
            ("GRUB_DISABLE_OS_PROBER", "false"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            defaults_file: PathBuf::from("/etc/default/grub"),
            config_output: PathBuf::from("/boot/grub/grub.cfg"),
            settings,
            kernel_params: Vec::new(),
            target: "x86_64-efi".to_string(),
            bootloader_id: "GRUB".to_string(),
        }
    }
}

// ============================================================================
// Bootstrap
// ============================================================================

/// A filesystem that must be mounted below the target root before install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountExpectation {
    /// Mount point inside the new system ("/", "/boot", ...)
    pub path: PathBuf,
    pub fstype: String,
    /// Shown in the partitioning instructions
    #[serde(default)]
    pub label: String,
}

impl MountExpectation {
    fn new(path: &str, fstype: &str, label: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            fstype: fstype.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Where the new system is mounted on the live medium
    pub target_root: PathBuf,
    /// EFI system partition mount point inside the new system
    pub esp: PathBuf,
    /// Address pinged once to check connectivity
    pub connectivity_host: String,
    pub mounts: Vec<MountExpectation>,
    /// systemd units enabled in the new system
    pub services: Vec<String>,
    /// Supplementary group granting administrative rights
    pub admin_group: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            target_root: PathBuf::from("/mnt"),
            esp: PathBuf::from("/boot/efi"),
            connectivity_host: "1.1.1.1".to_string(),
            mounts: vec![
                MountExpectation::new("/", "btrfs", "\"Arch Linux\" root partition"),
                MountExpectation::new("/boot", "ext4", "\"Arch Boot Partition\", 1GB"),
                MountExpectation::new("/boot/efi", "vfat", "EFI System Partition"),
            ],
            services: strings(&["NetworkManager"]),
            admin_group: "wheel".to_string(),
        }
    }
}

/// Host files inspected by the mode selector and the procedures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostPaths {
    pub hostname_marker: PathBuf,
    pub pacman_conf: PathBuf,
    pub efi_platform_size: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            hostname_marker: PathBuf::from("/etc/hostname"),
            pacman_conf: PathBuf::from("/etc/pacman.conf"),
            efi_platform_size: PathBuf::from("/sys/firmware/efi/fw_platform_size"),
        }
    }
}

/// Packages of the reference machine
pub fn default_packages() -> Vec<String> {
    strings(&[
        "base",
        "base-devel",
        "python",
        "git",
        "linux",
        "linux-firmware",
        "intel-ucode",
        "nvidia-open",
        "nvidia-utils",
        "lib32-nvidia-utils",
        "nvidia-prime",
        "drm-info",
        "mesa",
        "vulkan-intel",
        "terminus-font",
        "cuda",
        "grub",
        "efibootmgr",
        "os-prober",
        "grub-btrfs",
        "btrfs-progs",
        "networkmanager",
        "wpa_supplicant",
        "vim",
        "nano",
        "htop",
        "mission-center",
        "gparted",
        "man-db",
        "man-pages",
        "texinfo",
        "sudo",
        "pipewire",
        "pipewire-alsa",
        "pipewire-pulse",
        "pipewire-jack",
        "wireplumber",
        "qpwgraph",
        "gnome",
        "gnome-browser-connector",
        "power-profiles-daemon",
        "bash-completion",
        "flatpak",
        "firefox",
        "chromium",
        "libreoffice-fresh",
        "blender",
        "keepass",
        "gimp",
        "code",
        "steam",
        "lutris",
        "wine-mono",
        "wine-gecko",
        "gamescope",
    ])
}

// ============================================================================
// Tests
// ============================================================================
