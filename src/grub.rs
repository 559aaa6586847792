//! Edits to GRUB's shell-assignment defaults file (`/etc/default/grub`)

use std::collections::BTreeMap;

pub const CMDLINE_KEY: &str = "GRUB_CMDLINE_LINUX_DEFAULT";

/// Split text into lines, remembering whether it ended with a newline
fn split_lines(text: &str) -> (Vec<String>, bool) {
    let lines = text.lines().map(str::to_string).collect();
    (lines, text.is_empty() || text.ends_with('\n'))
}

fn join_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if trailing_newline && !out.is_empty() {
        out.push('\n');
    }
    out
}

/// The key of an assignment line, with the line's comment state
fn assignment_key(line: &str) -> Option<(&str, bool)> {
    let trimmed = line.trim_start();
    let (commented, body) = match trimmed.strip_prefix('#') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let (key, _) = body.split_once('=')?;
    let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some((key, commented))
}

fn render_value(value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Set shell assignments, replacing existing (or commented-out) ones in place
///
/// An active assignment wins over a commented one; keys that appear nowhere
/// are appended in map order.
pub fn set_assignments(text: &str, settings: &BTreeMap<String, String>) -> String {
    let (mut lines, trailing) = split_lines(text);

    for (key, value) in settings {
        let rendered = format!("{key}={}", render_value(value));
        let active = lines
            .iter()
            .position(|l| assignment_key(l) == Some((key.as_str(), false)));
        let commented = || {
            lines
                .iter()
                .position(|l| assignment_key(l) == Some((key.as_str(), true)))
        };

        match active.or_else(commented) {
            Some(index) => lines[index] = rendered,
            None => lines.push(rendered),
        }
    }

    join_lines(&lines, trailing)
}

/// Ensure each parameter appears in the default kernel command line
///
/// A parameter of the form `key=value` replaces an existing token with the
/// same key. Returns `None` when every parameter is already present.
pub fn ensure_kernel_params(text: &str, params: &[String]) -> Option<String> {
    let (mut lines, trailing) = split_lines(text);
    let index = lines
        .iter()
        .position(|l| assignment_key(l) == Some((CMDLINE_KEY, false)));

    let current = index.map_or(String::new(), |i| {
        let (_, value) = lines[i].split_once('=').unwrap_or_default();
        unquote(value).to_string()
    });

    let mut tokens: Vec<String> = current.split_whitespace().map(str::to_string).collect();
    let mut changed = false;

    for param in params {
        if tokens.iter().any(|t| t == param) {
            continue;
        }
        changed = true;
        let key = param.split_once('=').map(|(k, _)| k);
        let existing = key.and_then(|k| {
            tokens
                .iter()
                .position(|t| t.split_once('=').is_some_and(|(tk, _)| tk == k))
        });
        match existing {
            Some(i) => tokens[i].clone_from(param),
            None => tokens.push(param.clone()),
        }
    }

    if !changed {
        return None;
    }

    let rendered = format!("{CMDLINE_KEY}=\"{}\"", tokens.join(" "));
    match index {
        Some(i) => lines[i] = rendered,
        None => lines.push(rendered),
    }
    Some(join_lines(&lines, trailing))
}
