// src/config/mod.rs

//! rfile discovery, YAML loading and directive parsing.

pub mod directives;
pub mod loader;
pub mod model;

pub use directives::{InterpreterLookup, SystemLookup};
pub use loader::{load_rfile, parse_rfile, resolve_rfile};
pub use model::{ArgSpec, TaskDefinition, TaskRegistry};
