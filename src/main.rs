mod bootstrap;
mod cli;
mod config;
mod converge;
mod error;
mod exec;
mod files;
mod grub;
mod mode;
mod mounts;
mod pacman_conf;
mod paths;
mod privilege;
mod resource;
mod schema;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, ModeArg};
use std::io;

use crate::bootstrap::Bootstrap;
use crate::config::ProfileSource;
use crate::converge::ConvergeOptions;
use crate::exec::SystemExecutor;
use crate::mode::Mode;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Some(Command::Completions { shell }) = cli.command {
        generate(shell, &mut Cli::command(), "provision", &mut io::stdout());
        return Ok(());
    }

    let (profile, source) = config::load_profile(cli.config.as_deref())?;
    match &source {
        ProfileSource::File(path) => ui::kv("profile", &path.display().to_string()),
        ProfileSource::BuiltIn => ui::kv("profile", "built-in"),
    }

    privilege::ensure_root(cli.dry_run)?;

    let mode = match cli.mode {
        ModeArg::Auto => Mode::detect(
            &profile.paths.hostname_marker,
            &profile.machine.live_hostname,
        )?,
        ModeArg::Bootstrap => Mode::Bootstrap,
        ModeArg::Converge => Mode::Converge,
    };
    ui::kv("mode", &mode.to_string());
    if cli.dry_run {
        ui::info("Dry run: commands that change the system are only printed");
    }

    let exec = SystemExecutor::new(cli.dry_run);
    match mode {
        Mode::Bootstrap => {
            if let Some(only) = &cli.only {
                ui::warn(&format!("--only {only} has no effect on a fresh install"));
            }
            Bootstrap::new(&profile, &exec, cli.dry_run)
                .with_reboot_prompt(true)
                .run()
        }
        Mode::Converge => {
            let opts = ConvergeOptions {
                dry_run: cli.dry_run,
                only: cli.only.as_deref(),
            };
            converge::run(&profile, &exec, opts).map(|_| ())
        }
    }
}
