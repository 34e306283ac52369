// src/dag/graph.rs

use std::collections::{HashSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::config::model::TaskRegistry;
use crate::errors::{Result, RfileError};

/// Dependency graph of everything a single invocation can reach.
///
/// Edge direction: dep -> task. For
///
/// ```text
/// test:
///   # dep: build
/// ```
///
/// we add edge `build -> test`.
#[derive(Debug, Clone)]
pub struct DependencyGraph<'a> {
    graph: DiGraphMap<&'a str, ()>,
}

impl<'a> DependencyGraph<'a> {
    /// Walk the dependencies of `root`, plus those of any `# watch:` or
    /// `# catch:` target that names a command, and check that every
    /// referenced dependency exists and that there are no cycles.
    pub fn build(registry: &'a TaskRegistry, root: &'a str) -> Result<Self> {
        let mut graph: DiGraphMap<&'a str, ()> = DiGraphMap::new();
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut queue: VecDeque<&'a str> = VecDeque::from([root]);

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            graph.add_node(name);
            let Some(task) = registry.iter().find(|t| t.name == name) else {
                return Err(RfileError::user(format!(
                    "'{name}' command not found in rfile"
                )));
            };

            for dep in &task.dependencies {
                if !registry.contains(dep) {
                    return Err(RfileError::user(format!(
                        "'{dep}' command not found in rfile but was specified as a dependency of '{name}'"
                    )));
                }
                graph.add_edge(dep.as_str(), name, ());
                queue.push_back(dep.as_str());
            }

            // Watch and catch targets run as their own invocations, so they
            // are walked but not linked to the task that names them.
            for target in [&task.watch, &task.catch].into_iter().flatten() {
                if registry.contains(target) {
                    queue.push_back(target.as_str());
                }
            }
        }

        let built = Self { graph };
        let order = built.topological_order()?;
        debug!(?order, root, "validated dependency graph");
        Ok(built)
    }

    /// Tasks in an order where every dependency comes before its dependents.
    pub fn topological_order(&self) -> Result<Vec<&'a str>> {
        toposort(&self.graph, None).map_err(|cycle| {
            RfileError::user(format!(
                "Dependency cycle detected involving command '{}'",
                cycle.node_id()
            ))
        })
    }
}
