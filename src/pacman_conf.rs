//! Text transforms for pacman.conf

use regex::Regex;

/// How a repository section appears in pacman.conf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryState {
    Enabled,
    /// Header and Include line are both commented out
    Disabled,
    Absent,
}

fn disabled_pattern(section: &str) -> Regex {
    let pattern = format!(
        r"(?m)^([ \t]*)#([ \t]*\[{}\][ \t]*\r?\n[ \t]*)#([ \t]*Include[ \t]*=[^\n]*)",
        regex::escape(section)
    );
    // The section name is escaped, so the pattern is always valid
    Regex::new(&pattern).unwrap_or_else(|e| unreachable!("invalid repository pattern: {e}"))
}

fn enabled_pattern(section: &str) -> Regex {
    let pattern = format!(r"(?m)^[ \t]*\[{}\][ \t]*\r?$", regex::escape(section));
    Regex::new(&pattern).unwrap_or_else(|e| unreachable!("invalid repository pattern: {e}"))
}

/// Classify how `section` appears in the config text
pub fn repository_state(text: &str, section: &str) -> RepositoryState {
    if disabled_pattern(section).is_match(text) {
        RepositoryState::Disabled
    } else if enabled_pattern(section).is_match(text) {
        RepositoryState::Enabled
    } else {
        RepositoryState::Absent
    }
}

/// Uncomment a disabled repository section
///
/// Removes exactly the `#` in front of the `[section]` header and the one in
/// front of the `Include` line that follows it. Everything else, including
/// whitespace around the markers, is kept. Returns `None` when there is
/// nothing to change.
pub fn enable_repository(text: &str, section: &str) -> Option<String> {
    let pattern = disabled_pattern(section);
    if !pattern.is_match(text) {
        return None;
    }
    Some(pattern.replace_all(text, "${1}${2}${3}").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOCK: &str = "\
[options]
HoldPkg     = pacman glibc
Architecture = auto

[core]
Include = /etc/pacman.d/mirrorlist

[extra]
Include = /etc/pacman.d/mirrorlist

# If you want to run 32 bit applications on your x86_64 system,
# enable the multilib repositories as required here.

#[multilib-testing]
#Include = /etc/pacman.d/mirrorlist

#[multilib]
#Include = /etc/pacman.d/mirrorlist

# An example of a custom package repository.
#[custom]
#SigLevel = Optional TrustAll
#Server = file:///home/custompkgs
";

    #[test]
    fn test_minimal_example() {
        let text = "#[multilib]\n#Include = /etc/pacman.d/mirrorlist";
        assert_eq!(
            enable_repository(text, "multilib").unwrap(),
            "[multilib]\nInclude = /etc/pacman.d/mirrorlist"
        );
    }

    #[test]
    fn test_stock_config_only_touches_multilib() {
        let enabled = enable_repository(STOCK, "multilib").unwrap();
        let expected = STOCK.replace(
            "#[multilib]\n#Include = /etc/pacman.d/mirrorlist",
            "[multilib]\nInclude = /etc/pacman.d/mirrorlist",
        );
        assert_eq!(enabled, expected);
        assert!(enabled.contains("#[multilib-testing]\n#Include"));
        assert_eq!(enabled.lines().count(), STOCK.lines().count());
    }

    #[test]
    fn test_leading_whitespace_preserved() {
        let text = "x\n  # [multilib]\n\t#  Include = /etc/pacman.d/mirrorlist\ny\n";
        assert_eq!(
            enable_repository(text, "multilib").unwrap(),
            "x\n   [multilib]\n\t  Include = /etc/pacman.d/mirrorlist\ny\n"
        );
    }

    #[test]
    fn test_already_enabled_is_noop() {
        let once = enable_repository(STOCK, "multilib").unwrap();
        assert_eq!(enable_repository(&once, "multilib"), None);
        assert_eq!(repository_state(&once, "multilib"), RepositoryState::Enabled);
    }

    #[test]
    fn test_absent_section_is_noop() {
        let text = "[options]\n[core]\nInclude = /etc/pacman.d/mirrorlist\n";
        assert_eq!(enable_repository(text, "multilib"), None);
        assert_eq!(repository_state(text, "multilib"), RepositoryState::Absent);
    }

    #[test]
    fn test_idempotent() {
        let once = enable_repository(STOCK, "multilib").unwrap();
        let twice = enable_repository(&once, "multilib").unwrap_or_else(|| once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_header_without_commented_include_untouched() {
        let text = "#[multilib]\nInclude = /etc/pacman.d/mirrorlist\n";
        assert_eq!(enable_repository(text, "multilib"), None);
    }

    #[test]
    fn test_section_name_is_literal() {
        let text = "#[multi.lib]\n#Include = /etc/pacman.d/mirrorlist\n";
        assert_eq!(enable_repository(text, "multi.lib").as_deref(), Some("[multi.lib]\nInclude = /etc/pacman.d/mirrorlist\n"));
        assert_eq!(enable_repository("#[multixlib]\n#Include = x\n", "multi.lib"), None);
    }

    #[test]
    fn test_disabled_state_detected() {
        assert_eq!(repository_state(STOCK, "multilib"), RepositoryState::Disabled);
    }
}
