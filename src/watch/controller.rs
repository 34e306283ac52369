// src/watch/controller.rs

//! Watch sessions: resolve paths, install watches, rerun on changes.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::Event;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::model::TaskDefinition;
use crate::engine::catch::on_failure;
use crate::engine::{Engine, RunContext, RunOutput};
use crate::errors::{Result, RfileError};
use crate::exec::{LinePrinter, RunningChild};
use crate::fs::{FileSystem, RealFileSystem};
use crate::style;
use crate::watch::path_utils::{WatchedPath, changed_path, validate_paths};
use crate::watch::rerun::RerunWorker;
use crate::watch::resolve::{WatchSource, classify, resolve_paths};
use crate::watch::watcher::spawn_path_watcher;

/// Listings longer than this are summarised unless running verbose.
const MAX_LISTING_LEN: usize = 100;

/// Keep `task` running under its watch target. Only returns on error.
pub async fn watch_task(
    engine: &Engine,
    task: Arc<TaskDefinition>,
    ctx: RunContext,
) -> Result<RunOutput> {
    watch_task_with_fs(engine, task, ctx, &RealFileSystem).await
}

pub async fn watch_task_with_fs(
    engine: &Engine,
    task: Arc<TaskDefinition>,
    ctx: RunContext,
    fs: &dyn FileSystem,
) -> Result<RunOutput> {
    let source = match &ctx.watch_override {
        Some(paths) => WatchSource::Paths(paths.clone()),
        None => classify(
            task.watch.as_deref().unwrap_or_default(),
            engine.registry(),
            &ctx.cwd,
        ),
    };
    debug!(task = %task.name, ?source, "resolved watch source");

    if let WatchSource::Interval(every) = source {
        return poll(engine, &task, &ctx, every).await;
    }

    let written = resolve_paths(engine, &task, &ctx, source).await?;
    let watched = validate_paths(fs, &ctx.cwd, &written)?;
    announce(engine, &task, &ctx, &watched);

    let (_watcher, events) = spawn_path_watcher(&watched)?;
    info!(task = %task.name, cancel = task.cancel_watch, "watching for changes");

    if task.cancel_watch {
        cancel_and_restart(engine, &task, &ctx, &watched, events).await
    } else {
        run_to_completion(engine, &task, &ctx, &watched, events).await
    }
}

/// Run the body once with `CHANGED` set; hand nonzero exits to the catch
/// handler.
pub async fn run_watched_body(
    engine: &Engine,
    task: &Arc<TaskDefinition>,
    ctx: &RunContext,
    changed: &str,
    running_child: Option<RunningChild>,
) -> Result<RunOutput> {
    let run_ctx = ctx.with_args(ctx.args.clone().with("CHANGED", changed));
    let output = engine.run_body(task, &run_ctx, running_child).await?;
    if !output.success() {
        on_failure(engine, task, &run_ctx, &output).await;
    }
    Ok(output)
}

async fn poll(
    engine: &Engine,
    task: &Arc<TaskDefinition>,
    ctx: &RunContext,
    every: Duration,
) -> Result<RunOutput> {
    info!(task = %task.name, ?every, "rerunning on an interval");
    loop {
        run_watched_body(engine, task, ctx, "", None).await?;
        tokio::time::sleep(every).await;
    }
}

/// Each change runs the body to completion before the next one is looked at.
/// Changes that arrive meanwhile are queued and each gets its own run.
async fn run_to_completion(
    engine: &Engine,
    task: &Arc<TaskDefinition>,
    ctx: &RunContext,
    watched: &[WatchedPath],
    mut events: mpsc::UnboundedReceiver<Event>,
) -> Result<RunOutput> {
    run_watched_body(engine, task, ctx, "", None).await?;

    let mut pending: VecDeque<PathBuf> = VecDeque::new();
    loop {
        while let Ok(event) = events.try_recv() {
            queue_change(&mut pending, watched, &event);
        }
        let Some(changed) = pending.pop_front() else {
            match events.recv().await {
                Some(event) => {
                    queue_change(&mut pending, watched, &event);
                    continue;
                }
                None => break,
            }
        };
        debug!(task = %task.name, ?changed, queued = pending.len(), "change detected");
        run_watched_body(engine, task, ctx, &path_arg(&changed), None).await?;
    }

    Err(RfileError::internal("file watcher stopped unexpectedly"))
}

/// Queue the path `event` touched. A repeat of the path already at the back
/// of the queue (one save often produces several events) is dropped.
fn queue_change(pending: &mut VecDeque<PathBuf>, watched: &[WatchedPath], event: &Event) {
    if let Some(path) = changed_path(watched, event) {
        if pending.back() != Some(&path) {
            pending.push_back(path);
        }
    }
}

/// Each change kills the running body and starts a new one.
async fn cancel_and_restart(
    engine: &Engine,
    task: &Arc<TaskDefinition>,
    ctx: &RunContext,
    watched: &[WatchedPath],
    mut events: mpsc::UnboundedReceiver<Event>,
) -> Result<RunOutput> {
    let worker = RerunWorker::spawn(engine.clone(), Arc::clone(task), ctx.clone())?;
    worker.request("")?;

    while let Some(event) = events.recv().await {
        if let Some(changed) = changed_path(watched, &event) {
            debug!(task = %task.name, ?changed, "change detected, restarting");
            worker.request(path_arg(&changed))?;
        }
    }

    Err(RfileError::internal("file watcher stopped unexpectedly"))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `watching a b c`, or `watching N files` for long listings.
pub fn status_line(watched: &[WatchedPath], verbose: bool) -> String {
    let listing = watched
        .iter()
        .map(|w| w.display.display().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    if listing.len() > MAX_LISTING_LEN && !verbose {
        format!("watching {} files", watched.len())
    } else {
        format!("watching {listing}")
    }
}

fn announce(engine: &Engine, task: &TaskDefinition, ctx: &RunContext, watched: &[WatchedPath]) {
    let line = format!("{}\n", style::yellow(&status_line(watched, engine.options().verbose)));
    let mut printer = match ctx.run_index {
        Some(index) => LinePrinter::prefixed(&task.name, index, ctx.padding),
        None => LinePrinter::passthrough(),
    };
    engine.sink().stdout(&printer.feed(line.as_bytes()));
}
