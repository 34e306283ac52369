// src/engine/catch.rs

//! `# catch:` handling for watched runs that exit nonzero.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::model::TaskDefinition;
use crate::engine::{Engine, RunContext, RunOutput};
use crate::style::strip_ansi;

/// Run the catch target of `task` after `failed` came back nonzero.
///
/// The handler sees the failed run's args plus `ERROR` (output with colors
/// stripped) and `ERROR_COLOR` (output as printed). Whatever the handler
/// does is logged and otherwise ignored.
pub async fn on_failure(
    engine: &Engine,
    task: &Arc<TaskDefinition>,
    ctx: &RunContext,
    failed: &RunOutput,
) {
    let Some(target) = task.catch.as_deref() else {
        return;
    };
    debug!(task = %task.name, exit_code = failed.exit_code, target, "running catch handler");

    let args = ctx
        .args
        .clone()
        .with("ERROR", strip_ansi(&failed.stdout))
        .with("ERROR_COLOR", failed.stdout.clone());
    let handler_ctx = RunContext {
        args,
        cwd: ctx.cwd.clone(),
        run_index: None,
        padding: 0,
        hide_output: false,
        suppress_watch: true,
        watch_override: None,
    };

    let result = match engine.registry().get(target) {
        Some(handler) => engine.execute(handler, handler_ctx).await,
        None => {
            let inline = Arc::new(TaskDefinition::inline(
                format!("{}-catch", task.name),
                task.interpreter.clone(),
                format!("{target}\n"),
            ));
            engine.run_body(&inline, &handler_ctx, None).await
        }
    };

    match result {
        Ok(output) => debug!(
            task = %task.name,
            exit_code = output.exit_code,
            "catch handler finished"
        ),
        Err(err) => warn!(task = %task.name, error = %err, "catch handler failed"),
    }
}
