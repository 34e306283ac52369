// src/watch/mod.rs

//! Watch sessions for tasks with a `# watch:` target.
//!
//! - [`resolve`] classifies the target (command, interval, path, script) and
//!   produces the list of paths.
//! - [`path_utils`] validates those paths and matches events against them.
//! - [`watcher`] wires up `notify`.
//! - [`controller`] runs the session: initial run, then a rerun per change,
//!   either to completion or through the cancel-and-restart [`rerun`]
//!   worker.

pub mod controller;
pub mod path_utils;
pub mod rerun;
pub mod resolve;
pub mod watcher;

pub use controller::{status_line, watch_task, watch_task_with_fs};
pub use path_utils::WatchedPath;
pub use rerun::{RerunRequest, RerunWorker};
pub use resolve::{WatchSource, classify};
pub use watcher::{WatcherHandle, spawn_path_watcher};
