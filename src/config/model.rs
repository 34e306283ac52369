// src/config/model.rs

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::types::InterpreterKind;

/// One `# arg:` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    pub help: String,
    pub default: Option<String>,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: String::new(),
            default: None,
        }
    }
}

/// A parsed rfile command. Immutable once it is in a [`TaskRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub name: String,
    /// Absolute path of the interpreter executable.
    pub interpreter: PathBuf,
    pub help: String,
    /// Script text with the directive preamble removed.
    pub body: String,
    pub args: Vec<ArgSpec>,
    pub dependencies: Vec<String>,
    pub parallel: bool,
    /// Raw `# watch:` target: a task name, an interval, a path or a script.
    pub watch: Option<String>,
    /// Raw `# catch:` target: a task name or a script.
    pub catch: Option<String>,
    /// `# cancel`: a new change kills the in-flight run.
    pub cancel_watch: bool,
}

impl TaskDefinition {
    pub fn new(name: impl Into<String>, interpreter: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            interpreter: interpreter.into(),
            help: String::new(),
            body: String::new(),
            args: Vec::new(),
            dependencies: Vec::new(),
            parallel: false,
            watch: None,
            catch: None,
            cancel_watch: false,
        }
    }

    /// Ad hoc task used for inline watch and catch scripts.
    pub fn inline(
        name: impl Into<String>,
        interpreter: impl Into<PathBuf>,
        body: impl Into<String>,
    ) -> Self {
        let mut task = Self::new(name, interpreter);
        task.body = body.into();
        task
    }

    pub fn kind(&self) -> InterpreterKind {
        InterpreterKind::from_path(&self.interpreter)
    }

    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

/// Insertion-ordered set of commands. The first entry is the default.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Vec<Arc<TaskDefinition>>,
    index: HashMap<String, usize>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. A later task with the same name replaces the earlier one
    /// in place.
    pub fn insert(&mut self, task: TaskDefinition) {
        let task = Arc::new(task);
        match self.index.get(&task.name) {
            Some(&i) => self.tasks[i] = task,
            None => {
                self.index.insert(task.name.clone(), self.tasks.len());
                self.tasks.push(task);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<TaskDefinition>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tasks[i]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TaskDefinition>> {
        self.tasks.iter()
    }

    pub fn default_task(&self) -> Option<Arc<TaskDefinition>> {
        self.tasks.first().cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl FromIterator<TaskDefinition> for TaskRegistry {
    fn from_iter<I: IntoIterator<Item = TaskDefinition>>(iter: I) -> Self {
        let mut registry = TaskRegistry::new();
        for task in iter {
            registry.insert(task);
        }
        registry
    }
}
