// src/help.rs

//! Help screens for `r -h` and `r COMMAND -h`.

use colored::Colorize;

use crate::config::model::{TaskDefinition, TaskRegistry};
use crate::style;

fn preamble() -> String {
    format!(
        "{}: r [-h, --help] [-v, --verbose] [-r, --rfile rfile] {}\n\nrfile is a simple command runner for executing Python and shell scripts",
        style::yellow("usage"),
        "COMMAND".cyan()
    )
}

/// Top-level help. `None` means no rfile was found.
pub fn render_help(registry: Option<&TaskRegistry>, error: Option<&str>) -> String {
    let mut out = preamble();
    match registry {
        None => {
            out.push_str(&format!(
                "\n\n{}: no rfile was found so no commands are available\n",
                "note".green()
            ));
        }
        Some(registry) => {
            out.push_str(&format!("\n\n{}\n", style::bold("available commands:")));
            let width = registry.names().map(|n| n.chars().count()).max().unwrap_or(0);
            for task in registry.iter() {
                let pad = " ".repeat(width - task.name.chars().count() + 5);
                out.push_str(&format!("    {}{pad}{}\n", style::purple(&task.name), task.help));
            }
        }
    }
    if let Some(error) = error {
        out.push_str(&format!("{}\n", error.red().bold()));
    }
    out
}

/// Help for a single command, listing its `--arg` options.
pub fn render_command_help(task: &TaskDefinition) -> String {
    let mut usage = format!(
        "{}: r [-v, --verbose] {} [-h, --help]",
        style::yellow("usage"),
        task.name
    );
    for arg in &task.args {
        usage.push_str(&format!(" [--{} {}]", arg.name, arg.name.to_uppercase()));
    }

    let mut out = format!("{usage}\n\n    {}", task.help);
    if !task.args.is_empty() {
        let mut rows = vec![(
            "  -h, --help".to_string(),
            "show this help message and exit".to_string(),
        )];
        for arg in &task.args {
            let help = match &arg.default {
                Some(default) if arg.help.is_empty() => format!("(default: {default})"),
                Some(default) => format!("{} (default: {default})", arg.help),
                None => arg.help.clone(),
            };
            rows.push((format!("  --{}", arg.name), help));
        }
        let width = rows.iter().map(|(flag, _)| flag.len()).max().unwrap_or(0);
        out.push_str(&format!("\n\n{}", style::bold("optional arguments:")));
        for (flag, help) in rows {
            let pad = " ".repeat(width - flag.len() + 2);
            out.push_str(&format!("\n{flag}{pad}{help}"));
        }
    }
    out.push('\n');
    out
}
