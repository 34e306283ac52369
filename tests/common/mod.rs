#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rfile::config::TaskRegistry;
use rfile::engine::{Engine, EngineOptions, RunContext};
use rfile::exec::{MemorySink, OutputSink, PtyBackend};
use rfile::types::TaskArgs;
use rfile_test_utils::FakeBackend;

pub use rfile_test_utils::{RegistryBuilder, TaskBuilder, init_tracing, wait_until, with_timeout};

pub fn options(max_parallel: usize) -> EngineOptions {
    EngineOptions {
        verbose: false,
        no_watch: false,
        max_parallel,
    }
}

/// Engine over a fake backend; both write into the returned sink.
pub fn fake_engine(
    registry: TaskRegistry,
    options: EngineOptions,
) -> (Engine, FakeBackend, MemorySink) {
    init_tracing();
    let sink = MemorySink::new();
    let shared: Arc<dyn OutputSink> = Arc::new(sink.clone());
    let backend = FakeBackend::with_sink(Arc::clone(&shared));
    let engine = Engine::new(registry, Arc::new(backend.clone()), shared, options);
    (engine, backend, sink)
}

/// Engine that runs real processes, capturing what they print.
pub fn real_engine(registry: TaskRegistry, options: EngineOptions) -> (Engine, MemorySink) {
    init_tracing();
    let sink = MemorySink::new();
    let shared: Arc<dyn OutputSink> = Arc::new(sink.clone());
    let backend = Arc::new(PtyBackend::new(Arc::clone(&shared)));
    let engine = Engine::new(registry, backend, shared, options);
    (engine, sink)
}

pub fn ctx(cwd: &Path) -> RunContext {
    RunContext::new(TaskArgs::new(), cwd.to_path_buf())
}

pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

pub fn plain(text: &str) -> String {
    rfile::style::strip_ansi(text)
}

pub fn root() -> PathBuf {
    PathBuf::from("/")
}
