//! # Declarative
//!
//! A framework for declarative resource management.
//!
//! This crate provides the core abstractions for declaring desired state,
//! detecting current state, and converging systems to match the desired state.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something with state that can be managed (files, packages, settings)
//! - **ResourceState**: The current or desired state of a resource
//! - **ExecutionPlan**: An ordered list of resources
//! - **Executor**: Applies resources one by one, stopping at the first failure
//! - **CommandExecutor**: The boundary every external command goes through
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecutionPlan, ExecuteOptions, execute_simple};
//!
//! let mut plan = ExecutionPlan::new();
//! plan.push(Box::new(FileResource {
//!     path: "/tmp/test.txt".into(),
//!     content: "hello".into(),
//! }));
//!
//! let summary = execute_simple(&plan, &ExecuteOptions::default(), &executor)?;
//! ```
//!
//! ## Provider Traits
//!
//! - [`CommandExecutor`]: Runs (or records) external commands
//! - [`ProgressCallback`]: Receives progress updates

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, CommandExecutor, NoProgress, ProgressCallback};
pub use diff::{DiffSummary, ResourceDiff, compute_diffs};
pub use error::CommandError;
pub use executor::{execute, execute_simple};
pub use planner::ExecutionPlan;
pub use resource::{BoxedResource, Resource};
pub use types::{
    ApplyResult, CommandOutput, ExecuteOptions, ExecuteSummary, Invocation, OutputMode,
    ResourceState,
};
