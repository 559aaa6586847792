use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "provision")]
#[command(author = "Patrick")]
#[command(version)]
#[command(
    about = "Install Arch Linux from the live medium, or converge an installed machine",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Profile to apply (defaults to profile.toml in the config directory)
    #[arg(short, long, env = "PROVISION_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Show what would change without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Which procedure to run
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    pub mode: ModeArg,

    /// Only converge resources matching TYPE or TYPE.ID (e.g. apps.spotify)
    #[arg(long, value_name = "TYPE[.ID]")]
    pub only: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Decide from the hostname marker
    Auto,
    /// Install onto the mounted target
    Bootstrap,
    /// Converge the running system
    Converge,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["provision"]).unwrap();
        assert_eq!(cli.mode, ModeArg::Auto);
        assert!(!cli.dry_run);
        assert!(cli.only.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "provision",
            "-n",
            "-vv",
            "--mode",
            "converge",
            "--only",
            "flatpak_app.com.spotify.Client",
            "-c",
            "/tmp/profile.toml",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.mode, ModeArg::Converge);
        assert_eq!(cli.only.as_deref(), Some("flatpak_app.com.spotify.Client"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/profile.toml")));
    }

    #[test]
    fn test_completions_subcommand() {
        let cli = Cli::try_parse_from(["provision", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Completions { shell: Shell::Bash })
        ));
    }
}
