// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running external commands, using
//! `tokio::process::Command`, and for driving the interaction protocol
//! against their output.
//!
//! - [`executor`] owns the [`ProcessExecutor`] facade (`spawn`, `execute`,
//!   `submit`, `schedule_until_true`).
//! - [`execution`] holds the shared [`ProcessExecution`] handle.
//! - [`launch`] starts processes and merges their stdout/stderr.
//! - [`output_consumer`] runs the per-character read/match/reply loop.
//! - [`shutdown`] keeps the registry of termination hooks.
//! - [`countdown`] bounds polling attempts by the remaining time budget.

pub mod countdown;
pub mod execution;
pub mod executor;
pub(crate) mod launch;
pub(crate) mod output_consumer;
pub mod shutdown;

pub use countdown::CountdownWatch;
pub use execution::{ExecutionId, ProcessExecution};
pub use executor::ProcessExecutor;
pub use shutdown::ShutdownHooks;
