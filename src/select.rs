// src/select.rs

//! Picking the command to run and parsing its own arguments.

use clap::{Arg, ArgAction, Command};

use crate::config::model::{TaskDefinition, TaskRegistry};
use crate::errors::{Result, RfileError};
use crate::types::TaskArgs;

/// Outcome of matching the requested name against the rfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The name as given (or the default command).
    Exact(String),
    /// A unique command starting with what was given.
    Prefix { given: String, resolved: String },
    NoMatch { given: String },
    Ambiguous { given: String, candidates: Vec<String> },
}

impl Selection {
    /// Name of the command to run, if there is one.
    pub fn command(&self) -> Option<&str> {
        match self {
            Selection::Exact(name) => Some(name),
            Selection::Prefix { resolved, .. } => Some(resolved),
            _ => None,
        }
    }

    /// Message shown under the help listing when nothing can run.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Selection::NoMatch { given } => {
                Some(format!("No possible matches found for command '{given}'"))
            }
            Selection::Ambiguous { given, candidates } => Some(format!(
                "Ambiguous short command '{given}', could be any of: {}",
                candidates.join(", ")
            )),
            _ => None,
        }
    }
}

/// Resolve `requested` against the registry; `None` picks the default.
pub fn select_command(registry: &TaskRegistry, requested: Option<&str>) -> Selection {
    let given = match requested {
        Some(name) => name,
        None => {
            return match registry.default_task() {
                Some(task) => Selection::Exact(task.name.clone()),
                None => Selection::NoMatch {
                    given: String::new(),
                },
            };
        }
    };

    if registry.contains(given) {
        return Selection::Exact(given.to_string());
    }

    let mut candidates: Vec<String> = registry
        .names()
        .filter(|name| name.starts_with(given))
        .map(str::to_string)
        .collect();
    match candidates.len() {
        0 => Selection::NoMatch {
            given: given.to_string(),
        },
        1 => Selection::Prefix {
            given: given.to_string(),
            resolved: candidates.remove(0),
        },
        _ => Selection::Ambiguous {
            given: given.to_string(),
            candidates,
        },
    }
}

/// Arguments of one command as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub args: TaskArgs,
    /// `-h/--help` appeared among the command's own arguments.
    pub help: bool,
}

/// Parse `--<arg> VALUE` options for `task`.
///
/// Resolved values follow the declaration order. Declared defaults fill in
/// for options that were not given; options with neither are left out.
pub fn parse_task_args(task: &TaskDefinition, raw: &[String]) -> Result<ParsedArgs> {
    let matches = task_command(task)
        .try_get_matches_from(raw)
        .map_err(|err| RfileError::user(clap_message(&err)))?;

    let mut args = TaskArgs::new();
    for spec in &task.args {
        if let Some(value) = matches.get_one::<String>(&spec.name) {
            args.insert(spec.name.clone(), value.clone());
        }
    }
    Ok(ParsedArgs {
        args,
        help: matches.get_flag("help"),
    })
}

fn task_command(task: &TaskDefinition) -> Command {
    let mut cmd = Command::new(task.name.clone())
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .short('h')
                .long("help")
                .action(ArgAction::SetTrue),
        );
    for spec in &task.args {
        let mut arg = Arg::new(spec.name.clone())
            .long(spec.name.clone())
            .value_name(spec.name.to_uppercase())
            .help(spec.help.clone())
            .action(ArgAction::Set);
        if let Some(default) = &spec.default {
            arg = arg.default_value(default.clone());
        }
        cmd = cmd.arg(arg);
    }
    cmd
}

/// First line of a clap error without its `error: ` label.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}
