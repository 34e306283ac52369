// src/types.rs

use std::fmt;
use std::path::Path;

/// Resolved argument values for one invocation, in insertion order.
///
/// Order matters: positional arguments handed to the child follow the task's
/// declared order, and overlays (`CHANGED`, `ERROR`, ...) land at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskArgs {
    entries: Vec<(String, String)>,
}

impl TaskArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style overlay used for `CHANGED` / `ERROR` injection.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Environment pairs for the child: every argument under its lower-case
    /// and its upper-case name.
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.entries.len() * 2);
        for (k, v) in &self.entries {
            out.push((k.to_lowercase(), v.clone()));
            out.push((k.to_uppercase(), v.clone()));
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TaskArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = TaskArgs::new();
        for (k, v) in iter {
            args.insert(k, v);
        }
        args
    }
}

/// Which runner flavour a task body gets, chosen from the interpreter's file
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterKind {
    /// bash, zsh, sh, fish: body runs under a `set -e` prelude.
    Shell,
    /// python, python3: body gets an `args` object and common imports.
    Python,
    /// Anything else: body runs as-is.
    Generic,
}

impl InterpreterKind {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match name.as_str() {
            "bash" | "zsh" | "sh" | "fish" => InterpreterKind::Shell,
            "python" | "python3" => InterpreterKind::Python,
            _ => InterpreterKind::Generic,
        }
    }
}

impl fmt::Display for InterpreterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InterpreterKind::Shell => "shell",
            InterpreterKind::Python => "python",
            InterpreterKind::Generic => "generic",
        };
        f.write_str(s)
    }
}
