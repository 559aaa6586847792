//! Error types for command execution

use thiserror::Error;

/// A checked external command did not succeed
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command ran and exited non-zero
    #[error("command `{command}` returned {}", describe_code(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The command could not be started at all
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "no exit status (terminated by signal)".to_string(),
    }
}
