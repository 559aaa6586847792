//! Bootstrap procedure: install the OS from the live medium
//!
//! A linear sequence of stages, each entered once. Any failure aborts the
//! install with the stage named in the error; the only tolerated failures
//! are the hardware clock steps and the operator's partitioning shell.

use anyhow::{Context, Result};
use declarative::{CommandExecutor, Invocation};
use std::path::{Path, PathBuf};

use crate::error::ProvisionError;
use crate::exec::in_chroot;
use crate::files::{self, Presence};
use crate::grub;
use crate::mounts;
use crate::paths;
use crate::schema::Profile;
use crate::ui::{self, Preview};

/// Install stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Console,
    Environment,
    Partitioning,
    Mounts,
    BaseInstall,
    Fstab,
    Localization,
    Bootloader,
    Accounts,
    Complete,
}

impl Stage {
    /// Number of stages before [`Stage::Complete`]
    pub const COUNT: usize = 9;

    pub fn next(self) -> Self {
        match self {
            Self::Console => Self::Environment,
            Self::Environment => Self::Partitioning,
            Self::Partitioning => Self::Mounts,
            Self::Mounts => Self::BaseInstall,
            Self::BaseInstall => Self::Fstab,
            Self::Fstab => Self::Localization,
            Self::Localization => Self::Bootloader,
            Self::Bootloader => Self::Accounts,
            Self::Accounts | Self::Complete => Self::Complete,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Console => "Console setup",
            Self::Environment => "Boot mode and network",
            Self::Partitioning => "Partitioning",
            Self::Mounts => "Mounted filesystems",
            Self::BaseInstall => "Base system",
            Self::Fstab => "fstab",
            Self::Localization => "Time, locale and hostname",
            Self::Bootloader => "Bootloader",
            Self::Accounts => "Services and accounts",
            Self::Complete => "Complete",
        }
    }
}

/// Check the firmware's platform size marker
pub fn efi_platform_check(content: &str) -> Result<(), ProvisionError> {
    let found = content.trim();
    if found == "64" {
        Ok(())
    } else {
        Err(ProvisionError::NotEfi64 {
            found: found.to_string(),
        })
    }
}

/// A fresh install onto the filesystems mounted below the target root
pub struct Bootstrap<'a> {
    profile: &'a Profile,
    exec: &'a dyn CommandExecutor,
    dry_run: bool,
    root: PathBuf,
    reboot_prompt: bool,
}

impl<'a> Bootstrap<'a> {
    pub fn new(profile: &'a Profile, exec: &'a dyn CommandExecutor, dry_run: bool) -> Self {
        Self {
            profile,
            exec,
            dry_run,
            root: profile.bootstrap.target_root.clone(),
            reboot_prompt: false,
        }
    }

    /// Offer to reboot once the install is complete
    pub fn with_reboot_prompt(mut self, prompt: bool) -> Self {
        self.reboot_prompt = prompt;
        self
    }

    /// Run every stage in order
    pub fn run(&self) -> Result<()> {
        ui::header("Fresh Arch Linux install");

        let mut stage = Stage::Console;
        let mut number = 1;
        while stage != Stage::Complete {
            ui::step(number, Stage::COUNT, stage.title());
            self.enter(stage)
                .with_context(|| format!("Install stopped at stage {number} ({})", stage.title()))?;
            stage = stage.next();
            number += 1;
        }

        self.finish()
    }

    fn enter(&self, stage: Stage) -> Result<()> {
        match stage {
            Stage::Console => self.console(),
            Stage::Environment => self.environment(),
            Stage::Partitioning => self.partitioning(),
            Stage::Mounts => self.mounts(),
            Stage::BaseInstall => self.base_install(),
            Stage::Fstab => self.fstab(),
            Stage::Localization => self.localization(),
            Stage::Bootloader => self.bootloader(),
            Stage::Accounts => self.accounts(),
            Stage::Complete => Ok(()),
        }
    }

    /// Path of an in-system file on the live medium
    fn target(&self, path: impl AsRef<Path>) -> PathBuf {
        paths::under(&self.root, path.as_ref())
    }

    fn chroot<I, S>(&self, program: &str, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        in_chroot(&self.root, program, args)
    }

    /// Run a command whose failure is reported but not fatal
    fn best_effort(&self, invocation: &Invocation) {
        if let Err(e) = self.exec.run(invocation) {
            ui::warn(&format!("{e:#}, continuing"));
        }
    }

    fn console(&self) -> Result<()> {
        let machine = &self.profile.machine;
        self.exec
            .run(&Invocation::new("loadkeys", [machine.keymap.as_str()]))?;
        self.exec
            .run(&Invocation::new("setfont", [machine.console_font.as_str()]))?;
        Ok(())
    }

    fn environment(&self) -> Result<()> {
        let marker = &self.profile.paths.efi_platform_size;
        let size = files::read(marker, Presence::Required, Preview::Truncated)
            .context("Not booted in EFI mode")?;
        efi_platform_check(&size)?;

        let host = &self.profile.bootstrap.connectivity_host;
        let ping = Invocation::new("ping", ["-c1", "-W5", host.as_str()]).read_only();
        if !self.exec.probe(&ping)? {
            return Err(ProvisionError::Offline { host: host.clone() }.into());
        }
        Ok(())
    }

    fn partitioning(&self) -> Result<()> {
        self.exec
            .run(&Invocation::new("lsblk", Vec::<String>::new()).read_only())?;

        ui::info("Partition, format and mount the install target:");
        for mount in &self.profile.bootstrap.mounts {
            ui::kv(
                &self.target(&mount.path).display().to_string(),
                &format!("{} {}", mount.fstype, mount.label),
            );
        }
        ui::dim("use fdisk /dev/xxx to partition");
        ui::dim("use mkfs.ext4 / mkfs.btrfs to format, compress=zstd for btrfs");
        ui::dim("use mount --mkdir to mount, leave other partitions where they are");
        ui::info("Exit the shell (Ctrl+D) when done.");

        let shell = self
            .exec
            .run_unchecked(&Invocation::new("bash", Vec::<String>::new()))?;
        if !shell.success {
            log::info!("Partitioning shell exited with {:?}", shell.code);
        }
        Ok(())
    }

    fn mounts(&self) -> Result<()> {
        let output = self
            .exec
            .capture(&Invocation::new("mount", Vec::<String>::new()).read_only())?;
        let entries = mounts::parse_mount_table(&output);
        let below_root: String = output
            .lines()
            .filter(|l| l.contains(&*self.root.to_string_lossy()))
            .map(|l| format!("{l}\n"))
            .collect();
        ui::result("mounted below target", &below_root, Preview::Full);

        match mounts::verify(&entries, &self.root, &self.profile.bootstrap.mounts) {
            Ok(()) => Ok(()),
            // The partitioning shell did not run, so nothing is mounted yet
            Err(e) if self.dry_run => {
                ui::warn(&format!("{e}, continuing dry run"));
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn base_install(&self) -> Result<()> {
        let mut args = vec!["-K".to_string(), self.root.to_string_lossy().to_string()];
        args.extend(self.profile.packages.iter().cloned());
        self.exec.run(&Invocation::new("pacstrap", args))
    }

    fn fstab(&self) -> Result<()> {
        let path = self.target("/etc/fstab");
        let esp = &self.profile.bootstrap.esp;
        let current = files::read(&path, Presence::Optional, Preview::Truncated)?;

        if mounts::fstab_has_mount(&current, esp) {
            log::info!("fstab already mounts {}", esp.display());
        } else {
            let genfstab = Invocation::new(
                "genfstab",
                ["-U".to_string(), self.root.to_string_lossy().to_string()],
            )
            .read_only();
            // genfstab needs the target mounted, which a dry run never does
            if self.dry_run {
                ui::action(&format!(
                    "would append the output of {genfstab} to {}",
                    path.display()
                ));
            } else {
                let generated = self.exec.capture(&genfstab)?;
                files::append(&path, &generated, self.dry_run)?;
            }
        }

        files::read(&path, Presence::Optional, Preview::Full)?;
        Ok(())
    }

    fn localization(&self) -> Result<()> {
        let machine = &self.profile.machine;

        self.exec.run(&self.chroot(
            "ln",
            [
                "-sf".to_string(),
                format!("/usr/share/zoneinfo/{}", machine.timezone),
                "/etc/localtime".to_string(),
            ],
        ))?;
        self.best_effort(&self.chroot("hwclock", ["--systohc"]));
        if machine.local_rtc {
            self.best_effort(&self.chroot("timedatectl", ["set-local-rtc", "1"]));
        }

        let locale_gen = self.target("/etc/locale.gen");
        let current = files::read(&locale_gen, Presence::Optional, Preview::Truncated)?;
        if current.lines().any(|l| l.trim() == machine.locale) {
            log::info!("{} already enabled in locale.gen", machine.locale);
        } else {
            let separator = if current.is_empty() || current.ends_with('\n') {
                ""
            } else {
                "\n"
            };
            files::append(
                &locale_gen,
                &format!("{separator}{}\n", machine.locale),
                self.dry_run,
            )?;
        }
        self.exec
            .run(&self.chroot("locale-gen", Vec::<String>::new()))?;

        files::write(
            &self.target("/etc/locale.conf"),
            &format!("LANG={}\n", machine.lang()),
            self.dry_run,
        )?;
        files::write(
            &self.target("/etc/vconsole.conf"),
            &format!("KEYMAP={}\nFONT={}\n", machine.keymap, machine.console_font),
            self.dry_run,
        )?;
        files::write(
            &self.target("/etc/hostname"),
            &format!("{}\n", machine.hostname),
            self.dry_run,
        )?;
        Ok(())
    }

    fn bootloader(&self) -> Result<()> {
        let grub = &self.profile.grub;
        let defaults = self.target(&grub.defaults_file);

        // pacstrap installs the defaults file, so a dry run may not have it
        if self.dry_run && !defaults.exists() {
            ui::action(&format!(
                "would configure {} once the base system is installed",
                defaults.display()
            ));
        } else {
            let current = files::read(&defaults, Presence::Required, Preview::Truncated)?;
            let configured = grub::set_assignments(&current, &grub.settings);
            let configured =
                grub::ensure_kernel_params(&configured, &grub.kernel_params).unwrap_or(configured);
            if configured != current {
                ui::diff(&current, &configured);
                files::write(&defaults, &configured, self.dry_run)?;
            }
        }

        self.exec
            .run(&self.chroot("os-prober", Vec::<String>::new()))?;
        self.exec.run(&self.chroot(
            "grub-install",
            [
                format!("--target={}", grub.target),
                format!("--efi-directory={}", self.profile.bootstrap.esp.display()),
                format!("--bootloader-id={}", grub.bootloader_id),
            ],
        ))?;
        self.exec.run(&self.chroot(
            "grub-mkconfig",
            ["-o".to_string(), grub.config_output.to_string_lossy().to_string()],
        ))?;
        Ok(())
    }

    fn accounts(&self) -> Result<()> {
        let username = self.profile.machine.username.as_str();

        for service in &self.profile.bootstrap.services {
            self.exec
                .run(&self.chroot("systemctl", ["enable", service.as_str()]))?;
        }
        self.exec
            .run(&self.chroot("timedatectl", ["set-ntp", "true"]))?;

        let group = self.profile.bootstrap.admin_group.as_str();
        self.exec
            .run(&self.chroot("useradd", ["-mG", group, username]))?;

        ui::info(&format!(
            "Uncomment the %{} line to grant sudo rights",
            self.profile.bootstrap.admin_group
        ));
        self.exec
            .run(&self.chroot("visudo", Vec::<String>::new()))?;
        ui::info(&format!("Set the password for {username}"));
        self.exec.run(&self.chroot("passwd", [username]))?;
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        println!();
        ui::success("Setup complete. Now reboot into your new system.");

        if !self.reboot_prompt || self.dry_run {
            return Ok(());
        }

        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Reboot now?")
            .default(false)
            .interact();
        match confirmed {
            Ok(true) => self.exec.run(&Invocation::new("reboot", Vec::<String>::new())),
            Ok(false) => Ok(()),
            Err(e) => {
                log::debug!("Reboot prompt unavailable: {e}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::RecordingExecutor;
    use declarative::CommandOutput;
    use std::fs;
    use tempfile::TempDir;

    const GRUB_DEFAULTS: &str = "GRUB_DEFAULT=0\nGRUB_TIMEOUT=5\nGRUB_CMDLINE_LINUX_DEFAULT=\"loglevel=3 quiet\"\n#GRUB_DISABLE_OS_PROBER=false\n";

    struct Fixture {
        _dir: TempDir,
        profile: Profile,
        root: PathBuf,
    }

    impl Fixture {
        fn new(platform_size: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let root = dir.path().join("mnt");
            fs::create_dir_all(root.join("etc/default")).unwrap();
            fs::write(root.join("etc/default/grub"), GRUB_DEFAULTS).unwrap();

            let marker = dir.path().join("fw_platform_size");
            fs::write(&marker, platform_size).unwrap();

            let mut profile = Profile::default();
            profile.packages = vec!["base".to_string(), "linux".to_string()];
            profile.bootstrap.target_root = root.clone();
            profile.paths.efi_platform_size = marker;

            Self {
                _dir: dir,
                profile,
                root,
            }
        }

        fn mount_table(&self) -> String {
            let root = self.root.display();
            format!(
                "proc on /proc type proc (rw)\n\
                 /dev/sda6 on {root} type btrfs (rw,compress=zstd:3)\n\
                 /dev/sda5 on {root}/boot type ext4 (rw)\n\
                 /dev/sda1 on {root}/boot/efi type vfat (rw)\n"
            )
        }

        fn executor(&self) -> RecordingExecutor {
            RecordingExecutor::new()
                .respond("mount", CommandOutput::ok(&self.mount_table()))
                .respond(
                    "genfstab",
                    CommandOutput::ok("UUID=1 / btrfs rw 0 0\nUUID=2 /boot/efi vfat rw 0 2\n"),
                )
        }

        fn read(&self, path: &str) -> String {
            fs::read_to_string(self.root.join(path)).unwrap()
        }

        fn chroot(&self, rest: &str) -> String {
            format!("arch-chroot {} {rest}", self.root.display())
        }
    }

    #[test]
    fn test_stage_sequence() {
        let mut stage = Stage::Console;
        let mut seen = 0;
        while stage != Stage::Complete {
            seen += 1;
            stage = stage.next();
        }
        assert_eq!(seen, Stage::COUNT);
        assert_eq!(Stage::Complete.next(), Stage::Complete);
    }

    #[test]
    fn test_efi_platform_check() {
        assert!(efi_platform_check("64\n").is_ok());
        assert!(matches!(
            efi_platform_check("32\n"),
            Err(ProvisionError::NotEfi64 { ref found }) if found == "32"
        ));
    }

    #[test]
    fn test_32bit_efi_aborts_before_any_change() {
        let fx = Fixture::new("32\n");
        let exec = fx.executor();

        let err = Bootstrap::new(&fx.profile, &exec, false).run().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProvisionError>(),
            Some(ProvisionError::NotEfi64 { .. })
        ));
        assert_eq!(exec.lines(), vec!["loadkeys de-latin1", "setfont ter-124b"]);
        assert!(!fx.root.join("etc/hostname").exists());
        assert_eq!(fx.read("etc/default/grub"), GRUB_DEFAULTS);
    }

    #[test]
    fn test_offline_aborts() {
        let fx = Fixture::new("64\n");
        let exec = fx.executor().respond("ping", CommandOutput::failed(1));

        let err = Bootstrap::new(&fx.profile, &exec, false).run().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProvisionError>(),
            Some(ProvisionError::Offline { .. })
        ));
        assert!(!exec.ran("lsblk"));
    }

    #[test]
    fn test_missing_mount_aborts_before_pacstrap() {
        let fx = Fixture::new("64\n");
        let table: String = fx
            .mount_table()
            .lines()
            .filter(|l| !l.contains("/boot/efi"))
            .map(|l| format!("{l}\n"))
            .collect();
        let exec = RecordingExecutor::new().respond("mount", CommandOutput::ok(&table));

        let err = Bootstrap::new(&fx.profile, &exec, false).run().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProvisionError>(),
            Some(ProvisionError::MountMismatch { .. })
        ));
        assert!(err.to_string().contains("Mounted filesystems"));
        assert!(!exec.ran("pacstrap"));
    }

    #[test]
    fn test_full_install() {
        let fx = Fixture::new("64\n");
        let exec = fx.executor();

        Bootstrap::new(&fx.profile, &exec, false).run().unwrap();

        let lines = exec.lines();
        let expected_order = [
            "loadkeys de-latin1".to_string(),
            "ping -c1 -W5 1.1.1.1".to_string(),
            "lsblk".to_string(),
            "bash".to_string(),
            "mount".to_string(),
            format!("pacstrap -K {} base linux", fx.root.display()),
            format!("genfstab -U {}", fx.root.display()),
            fx.chroot("ln -sf /usr/share/zoneinfo/Europe/Berlin /etc/localtime"),
            fx.chroot("locale-gen"),
            fx.chroot("grub-install --target=x86_64-efi --efi-directory=/boot/efi --bootloader-id=GRUB"),
            fx.chroot("grub-mkconfig -o /boot/grub/grub.cfg"),
            fx.chroot("systemctl enable NetworkManager"),
            fx.chroot("useradd -mG wheel patrick"),
            fx.chroot("visudo"),
            fx.chroot("passwd patrick"),
        ];
        let positions: Vec<usize> = expected_order
            .iter()
            .map(|e| lines.iter().position(|l| l == e).unwrap_or_else(|| panic!("{e} not run")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(fx.read("etc/vconsole.conf"), "KEYMAP=de-latin1\nFONT=ter-124b\n");
        assert_eq!(fx.read("etc/hostname"), "f15arch\n");
        assert_eq!(fx.read("etc/locale.conf"), "LANG=en_US.UTF-8\n");
        assert_eq!(fx.read("etc/locale.gen"), "en_US.UTF-8 UTF-8\n");
        assert!(fx.read("etc/fstab").contains("/boot/efi vfat"));

        let grub = fx.read("etc/default/grub");
        assert!(grub.contains("GRUB_DEFAULT=saved\n"));
        assert!(grub.contains("GRUB_SAVEDEFAULT=true\n"));
        assert!(grub.contains("GRUB_DISABLE_OS_PROBER=false\n"));
        assert!(!grub.contains("#GRUB_DISABLE_OS_PROBER"));
    }

    #[test]
    fn test_best_effort_failures_do_not_abort() {
        let fx = Fixture::new("64\n");
        let exec = fx
            .executor()
            .respond(&fx.chroot("hwclock"), CommandOutput::failed(1))
            .respond(&fx.chroot("timedatectl set-local-rtc"), CommandOutput::failed(1))
            .respond("bash", CommandOutput::failed(130));

        Bootstrap::new(&fx.profile, &exec, false).run().unwrap();
        assert!(exec.ran(&fx.chroot("passwd patrick")));
    }

    #[test]
    fn test_checked_step_failure_aborts() {
        let fx = Fixture::new("64\n");
        let exec = fx
            .executor()
            .respond(&fx.chroot("locale-gen"), CommandOutput::failed(1));

        let err = Bootstrap::new(&fx.profile, &exec, false).run().unwrap_err();
        assert!(format!("{err:#}").contains("locale-gen"));
        assert!(!exec.ran(&fx.chroot("grub-install")));
        assert!(!fx.root.join("etc/hostname").exists());
    }

    #[test]
    fn test_existing_esp_entry_skips_genfstab() {
        let fx = Fixture::new("64\n");
        let fstab = "# /dev/sda1\nUUID=2 /boot/efi vfat rw 0 2\n";
        fs::write(fx.root.join("etc/fstab"), fstab).unwrap();
        let exec = fx.executor();

        Bootstrap::new(&fx.profile, &exec, false).run().unwrap();

        assert!(!exec.ran("genfstab"));
        assert_eq!(fx.read("etc/fstab"), fstab);
    }

    #[test]
    fn test_commented_esp_entry_still_generates() {
        let fx = Fixture::new("64\n");
        fs::write(fx.root.join("etc/fstab"), "# UUID=2 /boot/efi vfat rw 0 2\n").unwrap();
        let exec = fx.executor();

        Bootstrap::new(&fx.profile, &exec, false).run().unwrap();
        assert!(exec.ran("genfstab -U"));
    }

    #[test]
    fn test_enabled_locale_not_appended_again() {
        let fx = Fixture::new("64\n");
        fs::write(fx.root.join("etc/locale.gen"), "#de_DE.UTF-8 UTF-8\nen_US.UTF-8 UTF-8\n").unwrap();
        let exec = fx.executor();

        Bootstrap::new(&fx.profile, &exec, false).run().unwrap();
        assert_eq!(
            fx.read("etc/locale.gen"),
            "#de_DE.UTF-8 UTF-8\nen_US.UTF-8 UTF-8\n"
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let fx = Fixture::new("64\n");
        let exec = fx.executor();

        Bootstrap::new(&fx.profile, &exec, true).run().unwrap();

        assert!(!fx.root.join("etc/hostname").exists());
        assert!(!fx.root.join("etc/fstab").exists());
        assert_eq!(fx.read("etc/default/grub"), GRUB_DEFAULTS);
    }

    #[test]
    fn test_dry_run_completes_on_an_empty_target() {
        let fx = Fixture::new("64\n");
        fs::remove_dir_all(fx.root.join("etc")).unwrap();
        let exec = RecordingExecutor::new()
            .respond("mount", CommandOutput::ok("proc on /proc type proc (rw)\n"));

        Bootstrap::new(&fx.profile, &exec, true).run().unwrap();

        assert!(!exec.ran("genfstab"));
        assert!(exec.ran(&fx.chroot("grub-mkconfig")));
        assert!(!fx.root.join("etc").exists());
    }

    #[test]
    fn test_missing_grub_defaults_still_fails_a_real_install() {
        let fx = Fixture::new("64\n");
        fs::remove_file(fx.root.join("etc/default/grub")).unwrap();
        let exec = fx.executor();

        let err = Bootstrap::new(&fx.profile, &exec, false).run().unwrap_err();

        assert!(err.to_string().contains("Bootloader"));
        assert!(!exec.ran(&fx.chroot("grub-install")));
    }
}
