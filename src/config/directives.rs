// src/config/directives.rs

//! Parsing of the `# directive:` preamble at the top of each command.
//!
//! ```text
//! test:
//!   # arg: name=world (who to greet)
//!   # dep: build
//!   # watch: git ls-files
//!   echo "hello $NAME"
//! ```
//!
//! The preamble is every leading line that starts with `# `. Everything from
//! the first other line onward is the body.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::model::{ArgSpec, TaskDefinition};
use crate::errors::{Result, RfileError};
use crate::style;

/// Shells tried, in order, when a command has no `# shell:` directive.
pub const DEFAULT_SHELLS: [&str; 3] = ["bash", "zsh", "sh"];

const SAMPLE_LEN: usize = 30;

/// Resolves interpreter names to executables.
pub trait InterpreterLookup {
    fn find(&self, name: &str) -> Option<PathBuf>;
}

/// Looks interpreters up on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct SystemLookup;

impl InterpreterLookup for SystemLookup {
    fn find(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

pub fn default_shell(lookup: &dyn InterpreterLookup) -> Result<PathBuf> {
    DEFAULT_SHELLS
        .iter()
        .find_map(|s| lookup.find(s))
        .ok_or_else(|| {
            RfileError::user(format!(
                "No shell found, tried: {}",
                DEFAULT_SHELLS.join(", ")
            ))
        })
}

/// Parse one rfile entry into a [`TaskDefinition`].
pub fn parse_command(
    name: &str,
    code: &str,
    is_default: bool,
    lookup: &dyn InterpreterLookup,
) -> Result<TaskDefinition> {
    let lines: Vec<&str> = code.split('\n').collect();
    let preamble_len = lines
        .iter()
        .take_while(|l| l.trim().starts_with("# "))
        .count();

    let mut interpreter: Option<PathBuf> = None;
    let mut help: Option<String> = None;
    let mut task = TaskDefinition::new(name, PathBuf::new());

    for line in lines[..preamble_len].iter().map(|l| l.trim()) {
        if let Some(rest) = line.strip_prefix("# shell: ") {
            let (shell, shell_help) = split_name_and_help(rest);
            let path = lookup.find(shell).ok_or_else(|| {
                RfileError::user(format!("Shell {shell} could not be found in PATH"))
            })?;
            interpreter = Some(path);
            if shell_help.is_some() {
                help = shell_help;
            }
        } else if let Some(rest) = line.strip_prefix("# arg: ") {
            task.args.push(parse_arg(rest));
        } else if let Some(rest) = line.strip_prefix("# dep: ") {
            task.dependencies.push(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("# help: ") {
            help = Some(rest.to_string());
        } else if line == "# parallel" {
            task.parallel = true;
        } else if line == "# cancel" {
            task.cancel_watch = true;
        } else if let Some(rest) = line.strip_prefix("# watch:") {
            task.watch = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("# catch:") {
            task.catch = Some(rest.trim().to_string());
        } else if help.is_none() {
            help = Some(line["# ".len()..].to_string());
        }
    }

    task.body = lines[preamble_len..].join("\n");
    task.interpreter = match interpreter {
        Some(path) => path,
        None => default_shell(lookup)?,
    };

    let mut help = help
        .or_else(|| dependency_help(&task.dependencies))
        .unwrap_or_else(|| style::faint(&body_sample(&task.body)));
    if is_default {
        help.push_str(" (default)");
    }
    task.help = help;

    if task.catch.is_some() && task.watch.is_none() {
        warn!(
            command = name,
            "'# catch' cannot be used without '# watch', but this was found in command '{name}'"
        );
    }

    debug!(command = name, interpreter = ?task.interpreter, "parsed command");
    Ok(task)
}

/// `NAME (help text)` → (`NAME`, `Some("help text")`).
fn split_name_and_help(s: &str) -> (&str, Option<String>) {
    match s.split_once(' ') {
        Some((name, rest)) => {
            let rest = rest.trim_start_matches('(').trim_end_matches(')');
            (name, Some(rest.to_string()))
        }
        None => (s, None),
    }
}

fn parse_arg(s: &str) -> ArgSpec {
    let (decl, help) = split_name_and_help(s.trim());
    let (name, default) = match decl.split_once('=') {
        Some((name, default)) => (name, Some(default.to_string())),
        None => (decl, None),
    };
    ArgSpec {
        name: name.to_string(),
        help: help.unwrap_or_default(),
        default,
    }
}

/// "run a", "run a, and b", "run a, b, and c".
fn dependency_help(deps: &[String]) -> Option<String> {
    match deps {
        [] => None,
        [only] => Some(format!("run {only}")),
        [init @ .., last] => Some(format!("run {}, and {last}", init.join(", "))),
    }
}

/// First few characters of the body, one line, for commands without help.
fn body_sample(body: &str) -> String {
    let head: String = body.chars().take(SAMPLE_LEN + 1).collect();
    let sample = head.trim().replace('\n', "; ");
    if sample.chars().count() == SAMPLE_LEN + 1 {
        let mut cut: String = sample.chars().take(SAMPLE_LEN - 3).collect();
        cut.push_str("...");
        cut
    } else {
        sample.chars().take(SAMPLE_LEN).collect()
    }
}
