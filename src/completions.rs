// src/completions.rs

//! `r --completions --prev "<words>"`, called by the shell's completion hook.

use std::path::Path;

use crate::config::model::TaskRegistry;
use crate::style::strip_ansi;

pub const SUPPORTED_SHELLS: [&str; 1] = ["fish"];

/// Completion script for fish; it feeds the words typed so far back to `r`.
pub const FISH_SCRIPT: &str = r#"function get_r_completions
    set prev_arg (commandline -pco)
    r --completions --prev "$prev_arg"
end

complete -c r -k -a '(get_r_completions)' --no-files
"#;

/// Completions for the words typed so far.
///
/// `shell` is the value of `$SHELL`. With one previous word (`r`) every
/// command is offered; with two (`r CMD`) that command's options are.
/// `interactive` means stdout is a terminal: a person ran this, so print
/// the script to install instead.
pub fn render_completions(
    registry: &TaskRegistry,
    prev: Option<&str>,
    shell: Option<&str>,
    interactive: bool,
) -> String {
    let Some(shell) = shell else {
        return "Didn't find anything in SHELL environment variable, exiting\n".to_string();
    };
    let shell_name = Path::new(shell)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if !SUPPORTED_SHELLS.contains(&shell_name.as_str()) {
        return format!(
            "Shell '{shell_name}' isn't supported, only these shells are: {}\n",
            SUPPORTED_SHELLS.join(", ")
        );
    }

    if interactive {
        return format!(
            "Install completions for fish by saving this as ~/.config/fish/completions/r.fish:\n\n{FISH_SCRIPT}"
        );
    }

    let words: Vec<&str> = prev.map(|p| p.split_whitespace().collect()).unwrap_or_default();
    let mut out = String::new();
    match words.as_slice() {
        [_] => {
            for task in registry.iter() {
                out.push_str(&format!("{}\t{}\n", task.name, strip_ansi(&task.help)));
            }
        }
        [_, command] => {
            if let Some(task) = registry.get(command) {
                for arg in &task.args {
                    out.push_str(&format!("--{}\t{}\n", arg.name, arg.help));
                }
            }
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{ArgSpec, TaskDefinition};

    fn registry() -> TaskRegistry {
        let mut a = TaskDefinition::inline("build", "/bin/sh", "make");
        a.help = "compile".into();
        a.args = vec![ArgSpec {
            name: "target".into(),
            help: "what to build".into(),
            default: None,
        }];
        let mut b = TaskDefinition::inline("test", "/bin/sh", "make test");
        b.help = "\x1b[2mmake test\x1b[0m".into();
        vec![a, b].into_iter().collect()
    }

    #[test]
    fn first_word_lists_commands() {
        let out = render_completions(&registry(), Some("r"), Some("/usr/bin/fish"), false);
        assert_eq!(out, "build\tcompile\ntest\tmake test\n");
    }

    #[test]
    fn second_word_lists_command_args() {
        let out = render_completions(&registry(), Some("r build"), Some("/usr/bin/fish"), false);
        assert_eq!(out, "--target\twhat to build\n");
    }

    #[test]
    fn other_shells_are_not_supported() {
        let out = render_completions(&registry(), Some("r"), Some("/bin/bash"), false);
        assert_eq!(out, "Shell 'bash' isn't supported, only these shells are: fish\n");
        let none = render_completions(&registry(), Some("r"), None, false);
        assert!(none.starts_with("Didn't find anything in SHELL"));
    }

    #[test]
    fn terminals_get_the_install_script() {
        let out = render_completions(&registry(), None, Some("fish"), true);
        assert!(out.contains("complete -c r"));
    }
}
