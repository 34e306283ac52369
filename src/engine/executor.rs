// src/engine/executor.rs

//! Dependency executor.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::model::{TaskDefinition, TaskRegistry};
use crate::engine::scheduler::run_all;
use crate::engine::{EngineOptions, RunContext};
use crate::errors::{Result, RfileError};
use crate::exec::interpreter::prelude_for;
use crate::exec::{OutputSink, ProcessBackend, RunOutput, RunningChild, SpawnRequest};
use crate::style;

/// Boxed future returned by [`Engine::execute`]; boxing is what lets
/// execution recurse through dependencies.
pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = Result<RunOutput>> + Send + 'a>>;

/// Shared handle to the registry, backend and output sink.
///
/// Cloning is cheap; parallel dependencies each get a clone.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    registry: TaskRegistry,
    backend: Arc<dyn ProcessBackend>,
    sink: Arc<dyn OutputSink>,
    options: EngineOptions,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tasks", &self.inner.registry.len())
            .field("options", &self.inner.options)
            .finish()
    }
}

impl Engine {
    pub fn new(
        registry: TaskRegistry,
        backend: Arc<dyn ProcessBackend>,
        sink: Arc<dyn OutputSink>,
        options: EngineOptions,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                registry,
                backend,
                sink,
                options,
            }),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.inner.registry
    }

    pub fn options(&self) -> EngineOptions {
        self.inner.options
    }

    pub fn sink(&self) -> &Arc<dyn OutputSink> {
        &self.inner.sink
    }

    /// Run `task`: its dependencies first, then its body (or its watch loop).
    ///
    /// Dependencies all run to completion even when some fail; if any failed
    /// the body is skipped and the result is `(0, "")`.
    pub fn execute(&self, task: Arc<TaskDefinition>, ctx: RunContext) -> ExecFuture<'_> {
        Box::pin(async move {
            debug!(task = %task.name, run_index = ?ctx.run_index, "executing command");

            if !task.dependencies.is_empty() {
                let failed = self.run_dependencies(&task, &ctx).await?;
                if !failed.is_empty() {
                    let line = format!(
                        "{} not running '{}' because these dependencies failed: {}\n",
                        style::error_label("[r]"),
                        task.name,
                        failed.join(", ")
                    );
                    self.inner.sink.stderr(line.as_bytes());
                    return Ok(RunOutput::skipped());
                }
            }

            if !task.has_body() {
                return Ok(RunOutput::skipped());
            }

            if self.should_watch(&task, &ctx) {
                return crate::watch::watch_task(self, task, ctx).await;
            }

            self.run_body(&task, &ctx, None).await
        })
    }

    /// Run only the body of `task`, no dependencies and no watching.
    pub async fn run_body(
        &self,
        task: &Arc<TaskDefinition>,
        ctx: &RunContext,
        running_child: Option<RunningChild>,
    ) -> Result<RunOutput> {
        let request = SpawnRequest {
            task: Arc::clone(task),
            args: ctx.args.clone(),
            cwd: ctx.cwd.clone(),
            prelude: prelude_for(task, &ctx.args, self.inner.options.verbose),
            run_index: ctx.run_index,
            padding: ctx.padding,
            hide_output: ctx.hide_output,
            running_child,
        };
        let output = self.inner.backend.spawn(request).await?;
        debug!(task = %task.name, exit_code = output.exit_code, "command body finished");
        Ok(output)
    }

    pub fn lookup(&self, name: &str, dependent: &str) -> Result<Arc<TaskDefinition>> {
        self.inner.registry.get(name).ok_or_else(|| {
            RfileError::user(format!(
                "'{name}' command not found in rfile but was specified as a dependency of '{dependent}'"
            ))
        })
    }

    fn should_watch(&self, task: &TaskDefinition, ctx: &RunContext) -> bool {
        !self.inner.options.no_watch
            && !ctx.suppress_watch
            && (task.watch.is_some() || ctx.watch_override.is_some())
    }

    /// Run every dependency and return the names of the ones that exited
    /// nonzero.
    async fn run_dependencies(
        &self,
        task: &TaskDefinition,
        ctx: &RunContext,
    ) -> Result<Vec<String>> {
        let deps = task
            .dependencies
            .iter()
            .map(|name| self.lookup(name, &task.name))
            .collect::<Result<Vec<_>>>()?;
        let padding = deps.iter().map(|d| d.name.chars().count()).max().unwrap_or(0);

        let outputs = if task.parallel {
            info!(
                task = %task.name,
                count = deps.len(),
                max_parallel = self.inner.options.max_parallel,
                "running dependencies in parallel"
            );
            let operations: Vec<_> = deps
                .iter()
                .enumerate()
                .map(|(index, dep)| {
                    let engine = self.clone();
                    let dep = Arc::clone(dep);
                    let dep_ctx = ctx.for_dependency(index, padding);
                    async move { engine.execute(dep, dep_ctx).await }
                })
                .collect();
            run_all(operations, self.inner.options.max_parallel).await?
        } else {
            let mut outputs = Vec::with_capacity(deps.len());
            for (index, dep) in deps.iter().enumerate() {
                let output = self
                    .execute(Arc::clone(dep), ctx.for_dependency(index, padding))
                    .await?;
                outputs.push(output);
            }
            outputs
        };

        Ok(deps
            .iter()
            .zip(outputs)
            .filter(|(_, output)| !output.success())
            .map(|(dep, _)| dep.name.clone())
            .collect())
    }
}
