use anyhow::Result;
use declarative::{CommandError, CommandExecutor, CommandOutput, Invocation, OutputMode};
use std::process::{Command, Stdio};

use crate::ui::{self, Preview};

/// Runs commands on the host
///
/// Every invocation is announced before it runs. In dry-run mode mutating
/// invocations are only announced and report success; read-only probes
/// still run so later steps see the real host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor {
    pub dry_run: bool,
}

impl SystemExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl CommandExecutor for SystemExecutor {
    fn execute(&self, invocation: &Invocation, mode: OutputMode) -> Result<CommandOutput> {
        let line = invocation.to_string();

        if self.dry_run && invocation.mutating {
            ui::action(&format!("would run {line}"));
            return Ok(CommandOutput::ok(""));
        }

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);

        let output = match mode {
            OutputMode::Inherit => {
                ui::action(&format!("run {line}"));
                let status = command
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(|source| CommandError::Spawn {
                        command: line.clone(),
                        source,
                    })?;
                CommandOutput {
                    success: status.success(),
                    code: status.code(),
                    ..CommandOutput::default()
                }
            }
            OutputMode::Capture => {
                let output: CommandOutput = command
                    .stdin(Stdio::null())
                    .output()
                    .map_err(|source| CommandError::Spawn {
                        command: line.clone(),
                        source,
                    })?
                    .into();
                ui::result(&format!("run {line}"), &output.stdout_str(), Preview::Truncated);
                output
            }
        };

        log::debug!("`{line}` exited with {:?}", output.code);
        if !output.success && !output.stderr.is_empty() {
            log::debug!("stderr: {}", output.stderr_str().trim());
        }
        Ok(output)
    }
}

/// Build an invocation that runs inside the installed system
pub fn in_chroot<I, S>(root: &std::path::Path, program: &str, args: I) -> Invocation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Invocation::new(program, args).wrapped("arch-chroot", [root.to_string_lossy().to_string()])
}
