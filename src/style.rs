// src/style.rs

//! Terminal decoration helpers.
//!
//! Colors come from `colored`, which turns itself off when stdout is not a
//! terminal (or `NO_COLOR` is set). Piped output is therefore plain, which is
//! what consumers of the `name | line` framing expect.

use std::io::IsTerminal;
use std::sync::LazyLock;

use colored::{Color, Colorize};
use regex::Regex;

/// Colors cycled through for peer output prefixes.
pub const PALETTE: [Color; 6] = [
    Color::Blue,
    Color::Magenta,
    Color::Green,
    Color::Yellow,
    Color::BrightRed,
    Color::BrightGreen,
];

// ESC followed by either a 7-bit C1 Fe sequence or a full CSI sequence.
static ANSI_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").ok());

/// Prefix color for a peer run.
pub fn color_for_run(run_index: usize) -> Color {
    PALETTE[run_index % PALETTE.len()]
}

/// Remove ANSI escape sequences (colors, cursor movement) from `s`.
pub fn strip_ansi(s: &str) -> String {
    match ANSI_ESCAPE.as_ref() {
        Some(re) => re.replace_all(s, "").into_owned(),
        None => s.to_string(),
    }
}

pub fn yellow(s: &str) -> String {
    s.yellow().to_string()
}

pub fn faint(s: &str) -> String {
    s.dimmed().to_string()
}

pub fn purple(s: &str) -> String {
    s.magenta().to_string()
}

pub fn bold(s: &str) -> String {
    s.bold().to_string()
}

/// Red label for messages written to stderr; plain unless stderr is a tty.
pub fn error_label(label: &str) -> String {
    if std::io::stderr().is_terminal() {
        label.red().to_string()
    } else {
        label.to_string()
    }
}
