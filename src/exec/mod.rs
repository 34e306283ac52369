// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ProcessBackend` trait the engine runs bodies
//!   through, plus the request/result types and the `RunningChild` handle.
//! - [`pty`] is the production backend (pseudo-terminal, pipe fallback).
//! - [`output`] holds the output sinks and the `name | line` framing.
//! - [`interpreter`] builds the shell / python / generic preludes.

pub mod backend;
pub mod interpreter;
pub mod output;
pub mod pty;

pub use backend::{ProcessBackend, RunOutput, RunningChild, ScriptPrelude, SpawnRequest};
pub use output::{LinePrinter, MemorySink, OutputSink, StdoutSink};
pub use pty::PtyBackend;
