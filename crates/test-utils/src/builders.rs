#![allow(dead_code)]

use rfile::config::{ArgSpec, TaskDefinition, TaskRegistry};

/// Builder for `TaskDefinition` to simplify test setup.
///
/// Tasks default to `/bin/sh` as their interpreter.
pub struct TaskBuilder {
    task: TaskDefinition,
}

impl TaskBuilder {
    pub fn new(name: &str, body: &str) -> Self {
        Self {
            task: TaskDefinition::inline(name, "/bin/sh", body),
        }
    }

    pub fn interpreter(mut self, path: &str) -> Self {
        self.task.interpreter = path.into();
        self
    }

    pub fn dep(mut self, name: &str) -> Self {
        self.task.dependencies.push(name.to_string());
        self
    }

    pub fn deps(mut self, names: &[&str]) -> Self {
        self.task
            .dependencies
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn parallel(mut self) -> Self {
        self.task.parallel = true;
        self
    }

    pub fn arg(mut self, name: &str, default: Option<&str>) -> Self {
        let mut spec = ArgSpec::new(name);
        spec.default = default.map(str::to_string);
        self.task.args.push(spec);
        self
    }

    pub fn watch(mut self, target: &str) -> Self {
        self.task.watch = Some(target.to_string());
        self
    }

    pub fn catch(mut self, target: &str) -> Self {
        self.task.catch = Some(target.to_string());
        self
    }

    pub fn cancel(mut self) -> Self {
        self.task.cancel_watch = true;
        self
    }

    pub fn build(self) -> TaskDefinition {
        self.task
    }
}

/// Builder for `TaskRegistry`; the first task added is the default.
#[derive(Default)]
pub struct RegistryBuilder {
    registry: TaskRegistry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, task: TaskBuilder) -> Self {
        self.registry.insert(task.build());
        self
    }

    pub fn build(self) -> TaskRegistry {
        self.registry
    }
}
