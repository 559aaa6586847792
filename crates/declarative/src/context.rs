//! Apply context and provider traits
//!
//! These traits allow the declarative crate to be used without
//! depending on a specific process runner, UI, etc.

use crate::error::CommandError;
use crate::types::{ApplyResult, CommandOutput, Invocation, OutputMode};
use anyhow::Result;

/// Boundary through which every external command is run
///
/// Implementations decide how commands are spawned (or recorded, in tests).
/// `execute` only fails when the command cannot be started; a non-zero exit
/// is reported through [`CommandOutput::success`]. The provided methods add
/// the checked/unchecked policies on top.
pub trait CommandExecutor {
    /// Run the invocation and report its output
    fn execute(&self, invocation: &Invocation, mode: OutputMode) -> Result<CommandOutput>;

    /// Run with the terminal attached, failing on a non-zero exit
    fn run(&self, invocation: &Invocation) -> Result<()> {
        let output = self.execute(invocation, OutputMode::Inherit)?;
        check(invocation, &output)?;
        Ok(())
    }

    /// Run with the terminal attached and ignore the exit status
    fn run_unchecked(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.execute(invocation, OutputMode::Inherit)
    }

    /// Run and capture stdout, failing on a non-zero exit
    fn capture(&self, invocation: &Invocation) -> Result<String> {
        let output = self.execute(invocation, OutputMode::Capture)?;
        check(invocation, &output)?;
        Ok(output.stdout_str())
    }

    /// Run quietly and report only whether it succeeded
    fn probe(&self, invocation: &Invocation) -> Result<bool> {
        Ok(self.execute(invocation, OutputMode::Capture)?.success)
    }
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn execute(&self, invocation: &Invocation, mode: OutputMode) -> Result<CommandOutput> {
        (**self).execute(invocation, mode)
    }
}

fn check(invocation: &Invocation, output: &CommandOutput) -> Result<(), CommandError> {
    if output.success {
        return Ok(());
    }
    Err(CommandError::Failed {
        command: invocation.to_string(),
        code: output.code,
        stderr: output.stderr_str().trim().to_string(),
    })
}

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called once before the first resource, with the plan size
    fn on_plan_start(&mut self, count: usize);

    /// Called when starting to apply a single resource
    fn on_resource_start(&mut self, index: usize, id: &str, description: &str);

    /// Called when a resource application completes
    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_plan_start(&mut self, _count: usize) {}
    fn on_resource_start(&mut self, _index: usize, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _id: &str, _result: &ApplyResult) {}
}

/// Context passed to resource state queries and apply operations
pub struct ApplyContext<'a> {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Runner for external commands
    pub exec: &'a dyn CommandExecutor,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context
    pub fn new(dry_run: bool, exec: &'a dyn CommandExecutor) -> Self {
        Self { dry_run, exec }
    }
}
