// src/dag/mod.rs

//! Dependency validation.
//!
//! - [`graph`] builds the graph of everything one invocation can reach and
//!   rejects missing dependencies and cycles before anything runs.

pub mod graph;

pub use graph::DependencyGraph;
