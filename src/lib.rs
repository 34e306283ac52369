// src/lib.rs

pub mod cli;
pub mod completions;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod help;
pub mod logging;
pub mod select;
pub mod style;
pub mod types;
pub mod watch;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::completions::render_completions;
use crate::config::{SystemLookup, load_rfile, resolve_rfile};
use crate::dag::DependencyGraph;
use crate::engine::{Engine, EngineOptions, RunContext, default_parallelism};
use crate::errors::{Result, RfileError};
use crate::exec::{OutputSink, PtyBackend, StdoutSink};
use crate::fs::RealFileSystem;
use crate::help::{render_command_help, render_help};
use crate::select::{Selection, parse_task_args, select_command};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - rfile discovery and loading
/// - completions and help screens
/// - command selection and argument parsing
/// - the engine with the real process backend
pub async fn run(args: CliArgs) -> Result<i32> {
    let fs = RealFileSystem;
    let cwd = std::env::current_dir()?;

    let rfile = match resolve_rfile(&fs, args.rfile.as_deref(), &cwd) {
        Ok(path) => path,
        Err(err) if args.help && err.is_user_error() => {
            print!("{}", render_help(None, None));
            return Ok(0);
        }
        Err(err) => return Err(err),
    };
    let registry = load_rfile(&fs, &rfile, &SystemLookup)?;
    let root_dir = rfile_dir(&rfile, &cwd);
    debug!(rfile = ?rfile, commands = registry.len(), "loaded rfile");

    if args.completions {
        let shell = std::env::var("SHELL").ok();
        print!(
            "{}",
            render_completions(
                &registry,
                args.prev.as_deref(),
                shell.as_deref(),
                std::io::stdout().is_terminal(),
            )
        );
        return Ok(0);
    }

    let selection = select_command(&registry, args.command.as_deref());
    if let Some(message) = selection.error_message() {
        print!("{}", render_help(Some(&registry), Some(&message)));
        return Ok(0);
    }
    if let Selection::Prefix { given, resolved } = &selection {
        println!(
            "{}",
            style::yellow(&format!("Assuming '{given}' is short for '{resolved}'"))
        );
    }
    let task = selection
        .command()
        .and_then(|name| registry.get(name))
        .ok_or_else(|| RfileError::internal(format!("selected command vanished: {selection:?}")))?;

    let parsed = parse_task_args(&task, &args.args)?;
    if args.help || parsed.help {
        if args.command.is_none() {
            print!("{}", render_help(Some(&registry), None));
        } else {
            print!("{}", render_command_help(&task));
        }
        return Ok(0);
    }

    DependencyGraph::build(&registry, &task.name)?;

    let sink: Arc<dyn OutputSink> = Arc::new(StdoutSink);
    let backend = Arc::new(PtyBackend::new(Arc::clone(&sink)));
    let options = EngineOptions {
        verbose: args.verbose,
        no_watch: args.no_watch,
        max_parallel: args.jobs.unwrap_or_else(default_parallelism).max(1),
    };
    info!(command = %task.name, ?options, "running command");
    let engine = Engine::new(registry, backend, sink, options);

    let mut ctx = RunContext::new(parsed.args, root_dir);
    if !args.watch.is_empty() {
        ctx.watch_override = Some(args.watch.iter().map(|p| cwd.join(p)).collect());
    }

    let output = engine.execute(task, ctx).await?;
    Ok(output.exit_code)
}

/// Commands run in the directory that holds the rfile.
fn rfile_dir(rfile: &Path, cwd: &Path) -> PathBuf {
    match rfile.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
        _ => cwd.to_path_buf(),
    }
}

/// The message `main` prints for an error that ends the run.
pub fn error_report(err: &RfileError) -> String {
    match err {
        RfileError::User(msg) => format!("{} {msg}", style::error_label("User error:")),
        RfileError::Internal(msg) => format!(
            "{} {msg}\nIf you're seeing this, this is an rfile bug",
            style::error_label("Internal error:")
        ),
        RfileError::Other(inner) => format!("{} {inner:#}", style::error_label("error:")),
        other => format!("{} {other}", style::error_label("error:")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_rfile_runs_in_its_directory() {
        let cwd = Path::new("/home/me");
        assert_eq!(rfile_dir(Path::new("sub/rfile"), cwd), PathBuf::from("/home/me/sub"));
        assert_eq!(rfile_dir(Path::new("rfile"), cwd), PathBuf::from("/home/me"));
        assert_eq!(rfile_dir(Path::new("/proj/rfile.yml"), cwd), PathBuf::from("/proj"));
    }

    #[test]
    fn reports_are_labelled_by_kind() {
        let user = style::strip_ansi(&error_report(&RfileError::user("bad")));
        assert_eq!(user, "User error: bad");

        let internal = style::strip_ansi(&error_report(&RfileError::internal("broken")));
        assert!(internal.starts_with("Internal error: broken\n"));
        assert!(internal.ends_with("this is an rfile bug"));
    }
}
