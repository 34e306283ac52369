// src/engine/mod.rs

//! Execution engine for rfile.
//!
//! This module ties together:
//! - the dependency executor ([`executor`]), which runs a task's
//!   dependencies (serially or through the [`scheduler`]) before its body
//! - the bounded parallel [`scheduler`]
//! - the failure handler for watched runs ([`catch`])
//!
//! Watching itself lives in [`crate::watch`]; the executor hands over to it
//! when a task declares a watch target.

use std::path::PathBuf;

use crate::types::TaskArgs;

pub mod catch;
pub mod executor;
pub mod scheduler;

pub use crate::exec::RunOutput;
pub use executor::Engine;
pub use scheduler::{default_parallelism, run_all};

/// Run-wide knobs coming from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// `set -x` for shell bodies, full watch listings.
    pub verbose: bool,
    /// Run watched tasks once instead of entering the watch loop.
    pub no_watch: bool,
    /// Ceiling for parallel dependencies in flight.
    pub max_parallel: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            no_watch: false,
            max_parallel: default_parallelism(),
        }
    }
}

/// Per-invocation context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub args: TaskArgs,
    pub cwd: PathBuf,
    /// Slot among displayed peers; `Some` switches output to prefixed lines.
    pub run_index: Option<usize>,
    /// Width names are padded to in prefixed output.
    pub padding: usize,
    /// Capture output without echoing it.
    pub hide_output: bool,
    /// Never enter a watch loop (watch sources and catch handlers).
    pub suppress_watch: bool,
    /// Paths from `-w/--watch`, replacing the task's own watch target.
    pub watch_override: Option<Vec<PathBuf>>,
}

impl RunContext {
    pub fn new(args: TaskArgs, cwd: impl Into<PathBuf>) -> Self {
        Self {
            args,
            cwd: cwd.into(),
            ..Self::default()
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hide_output = true;
        self.suppress_watch = true;
        self
    }

    /// Context for a dependency of the task running under `self`.
    pub fn for_dependency(&self, run_index: usize, padding: usize) -> Self {
        Self {
            args: self.args.clone(),
            cwd: self.cwd.clone(),
            run_index: Some(run_index),
            padding,
            hide_output: self.hide_output,
            suppress_watch: self.suppress_watch,
            watch_override: None,
        }
    }

    pub fn with_args(&self, args: TaskArgs) -> Self {
        Self {
            args,
            ..self.clone()
        }
    }
}
