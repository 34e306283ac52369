use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rfile::errors::Result;
use rfile::exec::{LinePrinter, OutputSink, ProcessBackend, RunOutput, ScriptPrelude, SpawnRequest};
use rfile::types::TaskArgs;

/// What the fake backend saw for one spawn.
#[derive(Debug, Clone)]
pub struct FakeRun {
    pub task: String,
    pub args: TaskArgs,
    pub cwd: PathBuf,
    pub prelude: ScriptPrelude,
    pub run_index: Option<usize>,
    pub padding: usize,
    pub hide_output: bool,
}

#[derive(Debug, Clone, Default)]
struct Script {
    exit_code: i32,
    output: String,
    delay: Option<Duration>,
}

/// A fake process backend that:
/// - records every spawn request, in start order
/// - answers with a scripted exit code and output per task name
/// - tracks how many spawns were in flight at once
///
/// Output is also written to the sink (framed like the real backend) when
/// one is attached and the request is not hidden.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    runs: Arc<Mutex<Vec<FakeRun>>>,
    finished: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    sink: Option<Arc<dyn OutputSink>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Arc<dyn OutputSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::default()
        }
    }

    pub fn exit_code(&self, task: &str, code: i32) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(task.to_string())
            .or_default()
            .exit_code = code;
        self
    }

    pub fn output(&self, task: &str, output: &str) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(task.to_string())
            .or_default()
            .output = output.to_string();
        self
    }

    pub fn delay(&self, task: &str, delay: Duration) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(task.to_string())
            .or_default()
            .delay = Some(delay);
        self
    }

    pub fn runs(&self) -> Vec<FakeRun> {
        self.runs.lock().unwrap().clone()
    }

    /// Task names in the order their spawns started.
    pub fn started(&self) -> Vec<String> {
        self.runs().into_iter().map(|r| r.task).collect()
    }

    /// Task names in the order their spawns finished.
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl ProcessBackend for FakeBackend {
    fn spawn(
        &self,
        request: SpawnRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RunOutput>> + Send + '_>> {
        Box::pin(async move {
            let script = self
                .scripts
                .lock()
                .unwrap()
                .get(&request.task.name)
                .cloned()
                .unwrap_or_default();

            self.runs.lock().unwrap().push(FakeRun {
                task: request.task.name.clone(),
                args: request.args.clone(),
                cwd: request.cwd.clone(),
                prelude: request.prelude.clone(),
                run_index: request.run_index,
                padding: request.padding,
                hide_output: request.hide_output,
            });

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = script.delay {
                tokio::time::sleep(delay).await;
            }

            if let (Some(sink), false) = (&self.sink, request.hide_output) {
                let mut printer = match request.run_index {
                    Some(index) => LinePrinter::prefixed(&request.task.name, index, request.padding),
                    None => LinePrinter::passthrough(),
                };
                let mut framed = printer.feed(script.output.as_bytes());
                framed.extend(printer.finish());
                if !framed.is_empty() {
                    sink.stdout(&framed);
                }
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.lock().unwrap().push(request.task.name.clone());
            Ok(RunOutput::new(script.exit_code, script.output))
        })
    }
}
