// src/exec/output.rs

//! Where child output goes, and how it is framed on the way.

use std::fmt::Debug;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use colored::Colorize;

use crate::style::color_for_run;

/// Destination for everything `r` shows the user.
///
/// Each call writes one whole frame (a chunk of passthrough bytes or a set of
/// complete prefixed lines) so concurrent runs interleave at line
/// granularity only.
pub trait OutputSink: Send + Sync + Debug {
    fn stdout(&self, bytes: &[u8]);
    fn stderr(&self, bytes: &[u8]);
}

/// The real terminal.
#[derive(Debug, Clone, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn stdout(&self, bytes: &[u8]) {
        let mut out = std::io::stdout().lock();
        // A closed stdout (e.g. `r | head`) must not take the run down.
        let _ = out.write_all(bytes);
        let _ = out.flush();
    }

    fn stderr(&self, bytes: &[u8]) {
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(bytes);
        let _ = err.flush();
    }
}

/// Collects output in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    out: Arc<Mutex<Vec<u8>>>,
    err: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_string(&self) -> String {
        let out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&out).into_owned()
    }

    pub fn stderr_string(&self) -> String {
        let err = self.err.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&err).into_owned()
    }
}

impl OutputSink for MemorySink {
    fn stdout(&self, bytes: &[u8]) {
        self.out
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
    }

    fn stderr(&self, bytes: &[u8]) {
        self.err
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
    }
}

/// Turns raw output chunks into what gets written to the sink.
///
/// Passthrough mode returns chunks untouched. Prefixed mode emits only
/// complete lines as `<name><pad> | <line>\n`, holding a trailing partial
/// line back until more data arrives or [`LinePrinter::finish`] is called.
#[derive(Debug, Clone)]
pub struct LinePrinter {
    prefix: Option<String>,
    partial: Vec<u8>,
}

impl LinePrinter {
    pub fn passthrough() -> Self {
        Self {
            prefix: None,
            partial: Vec::new(),
        }
    }

    /// `padding` is the width the name is padded to.
    pub fn prefixed(name: &str, run_index: usize, padding: usize) -> Self {
        let pad = " ".repeat(padding.saturating_sub(name.chars().count()));
        let prefix = format!("{}{pad} | ", name.color(color_for_run(run_index)));
        Self {
            prefix: Some(prefix),
            partial: Vec::new(),
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<u8> {
        let Some(prefix) = &self.prefix else {
            return chunk.to_vec();
        };

        self.partial.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            push_line(&mut out, prefix, &line[..line.len() - 1]);
        }
        out
    }

    /// Flush whatever partial line is left, terminated with a newline.
    pub fn finish(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        if let Some(prefix) = &self.prefix {
            if !self.partial.is_empty() {
                let line = std::mem::take(&mut self.partial);
                push_line(&mut out, prefix, &line);
            }
        }
        out
    }
}

fn push_line(out: &mut Vec<u8>, prefix: &str, line: &[u8]) {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    out.extend_from_slice(prefix.as_bytes());
    out.extend_from_slice(line);
    out.push(b'\n');
}
