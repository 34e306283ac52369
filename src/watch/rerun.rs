// src/watch/rerun.rs

//! Cancel-and-restart worker for `# cancel` watch sessions.
//!
//! The worker lives on its own thread with a current-thread runtime, so the
//! watch loop only ever hands it a request and goes back to waiting for
//! events. Each request kills the child of the previous run, aborts that run
//! and starts a fresh one.

use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::model::TaskDefinition;
use crate::engine::{Engine, RunContext};
use crate::errors::{Result, RfileError};
use crate::exec::RunningChild;
use crate::watch::controller::run_watched_body;

/// One rerun, with the path that triggered it (empty for the first run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerunRequest {
    pub changed: String,
}

/// Handle to the worker thread. Dropping it stops the worker, which kills
/// whatever is still running.
#[derive(Debug)]
pub struct RerunWorker {
    tx: mpsc::UnboundedSender<RerunRequest>,
    running: RunningChild,
}

impl RerunWorker {
    pub fn spawn(engine: Engine, task: Arc<TaskDefinition>, ctx: RunContext) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let running = RunningChild::new();
        let worker_running = running.clone();

        thread::Builder::new()
            .name(format!("rfile-rerun-{}", task.name))
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        warn!(error = %err, "could not start rerun worker runtime");
                        return;
                    }
                };
                runtime.block_on(worker_loop(engine, task, ctx, worker_running, rx));
                // Reader threads of killed runs may outlive us; don't wait.
                runtime.shutdown_background();
            })?;

        Ok(Self { tx, running })
    }

    pub fn request(&self, changed: impl Into<String>) -> Result<()> {
        self.tx
            .send(RerunRequest {
                changed: changed.into(),
            })
            .map_err(|_| RfileError::internal("rerun worker stopped unexpectedly"))
    }

    /// Pid of the child currently running, if any.
    pub fn running_pid(&self) -> Option<u32> {
        self.running.pid()
    }
}

async fn worker_loop(
    engine: Engine,
    task: Arc<TaskDefinition>,
    ctx: RunContext,
    running: RunningChild,
    mut rx: mpsc::UnboundedReceiver<RerunRequest>,
) {
    let mut current: Option<JoinHandle<()>> = None;

    while let Some(request) = rx.recv().await {
        if running.kill() {
            debug!(task = %task.name, "killed previous run");
        }
        if let Some(previous) = current.take() {
            previous.abort();
        }

        let engine = engine.clone();
        let task = Arc::clone(&task);
        let ctx = ctx.clone();
        let running = running.clone();
        current = Some(tokio::spawn(async move {
            let result =
                run_watched_body(&engine, &task, &ctx, &request.changed, Some(running)).await;
            if let Err(err) = result {
                warn!(task = %task.name, error = %err, "watched run failed to start");
            }
        }));
    }

    debug!(task = %task.name, "rerun worker shutting down");
    running.kill();
    if let Some(previous) = current.take() {
        previous.abort();
    }
}
