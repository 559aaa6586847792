use colored::Colorize;

/// Lines of command or file output shown before truncating
pub const PREVIEW_LINES: usize = 8;

/// How much of an output to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preview {
    /// First [`PREVIEW_LINES`] lines
    Truncated,
    /// Everything
    Full,
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!();
    println!("{} {}", format!("[{num}/{total}]").blue().bold(), msg);
}

/// Print a single host action (a command run, a file written)
pub fn action(msg: &str) {
    println!("{} {}", "*".cyan(), msg);
}

/// Print an action together with a preview of what it produced
pub fn result(action: &str, output: &str, preview: Preview) {
    let mut lines = preview_lines(action, output, preview).into_iter();
    if let Some(first) = lines.next() {
        println!("{} {}", "*".cyan(), first);
    }
    for line in lines {
        println!("{}", line.dimmed());
    }
}

/// Print the changed lines between two versions of a text file
pub fn diff(old: &str, new: &str) {
    let diff = similar::TextDiff::from_lines(old, new);
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => print!("    {}", format!("- {change}").red()),
            similar::ChangeTag::Insert => print!("    {}", format!("+ {change}").green()),
            similar::ChangeTag::Equal => {}
        }
    }
}

/// Format `action -> output` as display lines
///
/// A single line of output is shown inline. Anything else is summarised as a
/// line count followed by the (possibly truncated) lines, each prefixed `  | `.
pub fn preview_lines(action: &str, output: &str, preview: Preview) -> Vec<String> {
    let lines: Vec<&str> = output.lines().collect();
    if let [only] = lines.as_slice() {
        return vec![format!("{action} -> {only}")];
    }

    let shown = match preview {
        Preview::Truncated => PREVIEW_LINES.min(lines.len()),
        Preview::Full => lines.len(),
    };

    let mut out = Vec::with_capacity(shown + 1);
    out.push(format!("{action} -> {} lines", lines.len()));
    out.extend(lines[..shown].iter().map(|l| format!("  | {l}")));
    out
}

// ============================================================================
// Tests
// ============================================================================
