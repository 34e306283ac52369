// src/exec/backend.rs

//! Pluggable process backend.
//!
//! The engine talks to a `ProcessBackend` instead of spawning processes
//! itself. Production uses [`PtyBackend`](super::pty::PtyBackend); tests can
//! provide their own implementation that records requests and returns
//! scripted results.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::config::model::TaskDefinition;
use crate::errors::Result;
use crate::types::TaskArgs;

/// Result of running a task body: `(exit_code, captured output)`.
///
/// Skipped bodies (no-op tasks, failed dependencies) report `(0, "")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout: String,
}

impl RunOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
        }
    }

    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Text written ahead of the body plus runner-specific environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptPrelude {
    pub text: String,
    pub env: Vec<(String, String)>,
}

/// Everything a backend needs to run one task body.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub task: Arc<TaskDefinition>,
    pub args: TaskArgs,
    pub cwd: PathBuf,
    pub prelude: ScriptPrelude,
    pub run_index: Option<usize>,
    pub padding: usize,
    pub hide_output: bool,
    pub running_child: Option<RunningChild>,
}

impl SpawnRequest {
    /// Positional arguments: declared args in declared order, missing ones
    /// as empty strings so positions stay stable.
    pub fn positional_args(&self) -> Vec<String> {
        self.task
            .args
            .iter()
            .map(|spec| self.args.get(&spec.name).unwrap_or_default().to_string())
            .collect()
    }

    /// Environment for the child on top of the inherited one.
    pub fn env(&self) -> Vec<(String, String)> {
        let mut env = self.args.env_pairs();
        env.extend(self.prelude.env.iter().cloned());
        env
    }
}

/// Pid of the child currently running for one watch session.
///
/// The backend records the pid right after spawn and clears it when the
/// child exits; the cancel-and-restart worker reads it to kill the child.
#[derive(Debug, Clone, Default)]
pub struct RunningChild {
    pid: Arc<Mutex<Option<u32>>>,
}

impl RunningChild {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, pid: u32) {
        *self.pid.lock().unwrap_or_else(PoisonError::into_inner) = Some(pid);
    }

    pub fn clear(&self) {
        *self.pid.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn pid(&self) -> Option<u32> {
        *self.pid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// SIGKILL the recorded child, if any. Returns whether a signal was sent.
    pub fn kill(&self) -> bool {
        let Some(pid) = self.pid.lock().unwrap_or_else(PoisonError::into_inner).take() else {
            return false;
        };
        kill_pid(pid)
    }
}

#[cfg(unix)]
fn kill_pid(pid: u32) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => {
            debug!(pid, "killed running child");
            true
        }
        Err(err) => {
            // Already gone.
            debug!(pid, error = %err, "could not kill running child");
            false
        }
    }
}

#[cfg(not(unix))]
fn kill_pid(pid: u32) -> bool {
    debug!(pid, "killing by pid is not supported on this platform");
    false
}

/// Trait abstracting how a task body is turned into a running process.
pub trait ProcessBackend: Send + Sync {
    /// Run the body described by `request` to completion.
    ///
    /// A nonzero exit is returned as data in [`RunOutput`]; errors are for
    /// failures to run at all.
    fn spawn(
        &self,
        request: SpawnRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RunOutput>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::ArgSpec;

    fn request(args: TaskArgs) -> SpawnRequest {
        let mut task = TaskDefinition::inline("t", "/bin/sh", "echo");
        task.args = vec![ArgSpec::new("first"), ArgSpec::new("second")];
        SpawnRequest {
            task: Arc::new(task),
            args,
            cwd: PathBuf::from("/"),
            prelude: ScriptPrelude {
                text: String::new(),
                env: vec![("RFILE_ARGS".into(), "{}".into())],
            },
            run_index: None,
            padding: 0,
            hide_output: false,
            running_child: None,
        }
    }

    #[test]
    fn positional_args_follow_declaration_order() {
        let req = request(TaskArgs::new().with("second", "2").with("CHANGED", "x"));
        assert_eq!(req.positional_args(), vec!["".to_string(), "2".to_string()]);
    }

    #[test]
    fn env_has_both_cases_and_prelude_vars() {
        let req = request(TaskArgs::new().with("Name", "v"));
        let env = req.env();
        assert!(env.contains(&("name".into(), "v".into())));
        assert!(env.contains(&("NAME".into(), "v".into())));
        assert!(env.contains(&("RFILE_ARGS".into(), "{}".into())));
    }

    #[test]
    fn running_child_kill_without_pid_is_a_noop() {
        let child = RunningChild::new();
        assert!(!child.kill());
        child.set(42);
        assert_eq!(child.pid(), Some(42));
        child.clear();
        assert_eq!(child.pid(), None);
    }
}
