// src/watch/resolve.rs

//! Turning a `# watch:` target into something to wait on.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::model::{TaskDefinition, TaskRegistry};
use crate::engine::{Engine, RunContext};
use crate::errors::{Result, RfileError};
use crate::watch::path_utils::paths_from_output;

/// What a watch target means.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchSource {
    /// Paths given explicitly on the command line.
    Paths(Vec<PathBuf>),
    /// A command whose output lists the paths.
    Task(Arc<TaskDefinition>),
    /// Rerun on a timer instead of on changes.
    Interval(Duration),
    /// A single word that is not a command on `PATH`.
    Path(PathBuf),
    /// Inline script whose output lists the paths.
    Script(String),
}

/// Classify a watch target.
///
/// In order: a registered command name, a non-negative number of seconds, a
/// single word that does not resolve to an executable (from `cwd`), and
/// finally an inline script.
pub fn classify(target: &str, registry: &TaskRegistry, cwd: &Path) -> WatchSource {
    let target = target.trim();
    if let Some(task) = registry.get(target) {
        return WatchSource::Task(task);
    }
    if let Some(interval) = parse_interval(target) {
        return WatchSource::Interval(interval);
    }
    if is_single_word(target) && !is_executable(target, cwd) {
        return WatchSource::Path(PathBuf::from(target));
    }
    WatchSource::Script(target.to_string())
}

fn parse_interval(target: &str) -> Option<Duration> {
    let secs: f64 = target.parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

fn is_single_word(target: &str) -> bool {
    !target.is_empty() && !target.contains(char::is_whitespace)
}

fn is_executable(word: &str, cwd: &Path) -> bool {
    which::which_in(word, std::env::var_os("PATH"), cwd).is_ok()
}

/// Produce the list of paths for a path-based source, as written.
///
/// Watch commands run with hidden output and never watch themselves.
pub async fn resolve_paths(
    engine: &Engine,
    task: &TaskDefinition,
    ctx: &RunContext,
    source: WatchSource,
) -> Result<Vec<PathBuf>> {
    match source {
        WatchSource::Paths(paths) => Ok(paths),
        WatchSource::Path(path) => Ok(vec![path]),
        WatchSource::Task(source_task) => {
            debug!(task = %task.name, source = %source_task.name, "listing watch paths from command");
            let source_ctx = RunContext::new(ctx.args.clone(), ctx.cwd.clone()).hidden();
            let output = engine.execute(source_task, source_ctx).await?;
            Ok(paths_from_output(&output.stdout))
        }
        WatchSource::Script(script) => {
            debug!(task = %task.name, %script, "listing watch paths from script");
            let inline = Arc::new(TaskDefinition::inline(
                format!("{}-watch", task.name),
                task.interpreter.clone(),
                format!("{script}\n"),
            ));
            let source_ctx =
                RunContext::new(ctx.args.clone().with("CHANGED", ""), ctx.cwd.clone()).hidden();
            let output = engine.run_body(&inline, &source_ctx, None).await?;
            if !output.success() {
                return Err(RfileError::user(format!(
                    "watch command failed: {}\n{}",
                    script.trim(),
                    output.stdout.trim_end()
                )));
            }
            Ok(paths_from_output(&output.stdout))
        }
        WatchSource::Interval(_) => Err(RfileError::internal(
            "interval watch targets have no paths to resolve",
        )),
    }
}
