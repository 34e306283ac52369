// src/config/loader.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use crate::config::directives::{InterpreterLookup, parse_command};
use crate::config::model::TaskRegistry;
use crate::errors::{Result, RfileError};
use crate::fs::FileSystem;

/// File names recognised during discovery, in the order they are reported.
pub const RFILE_NAMES: [&str; 3] = ["rfile", "rfile.yml", "rfile.yaml"];

const SAMPLE_RFILE: &str = r#"
# rfiles are just yaml, but comments under commands have meaning

my_prereq1:
    echo working...

my_prereq2:
    echo really working...

my_command:
    # arg: name (your name)
    # parallel
    # dep: my_prereq1
    # dep: my_prereq2
    echo hello "$NAME""#;

/// The rfile document before any structural checks.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct RawRfile(Value);

/// Find the rfile to use.
///
/// An explicit `-r` path must exist. Otherwise `start` and each of its
/// parents is searched for exactly one of [`RFILE_NAMES`].
pub fn resolve_rfile(
    fs: &dyn FileSystem,
    explicit: Option<&Path>,
    start: &Path,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        debug!(?path, "using rfile given on the command line");
        if !fs.is_file(path) {
            return Err(RfileError::user(format!(
                "Could not find rfile '{}'",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    for dir in start.ancestors() {
        let found: Vec<PathBuf> = RFILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .filter(|p| fs.is_file(p))
            .collect();
        match found.as_slice() {
            [] => continue,
            [only] => {
                debug!(path = ?only, "discovered rfile");
                return Ok(only.clone());
            }
            _ => {
                let names: Vec<String> = found
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .collect();
                return Err(RfileError::user(format!(
                    "Found more than one rfile in {}: {}",
                    dir.display(),
                    names.join(", ")
                )));
            }
        }
    }

    Err(RfileError::user(format!(
        "File 'rfile' not found in this directory or parents! Make one! Here is an example:{SAMPLE_RFILE}"
    )))
}

/// Read, check and parse an rfile into a registry.
pub fn load_rfile(
    fs: &dyn FileSystem,
    path: &Path,
    lookup: &dyn InterpreterLookup,
) -> Result<TaskRegistry> {
    let contents = fs.read_to_string(path)?;
    parse_rfile(&contents, lookup)
}

/// Parse rfile text. The document must be a flat mapping of command name to
/// script text; the first command is the default.
pub fn parse_rfile(contents: &str, lookup: &dyn InterpreterLookup) -> Result<TaskRegistry> {
    let RawRfile(doc) = serde_yaml::from_str(contents)?;

    let mapping = match doc {
        Value::Mapping(m) => m,
        other => {
            return Err(RfileError::user(format!(
                "Expected rfile top level be a flat YAML dictionary, but found {}",
                describe(&other)
            )));
        }
    };

    let mut registry = TaskRegistry::new();
    for (index, (key, value)) in mapping.iter().enumerate() {
        let name = scalar_key(key)?;
        let code = match value {
            Value::String(s) => s.as_str(),
            other => {
                return Err(RfileError::user(format!(
                    "Expected rfile dictionary entries to be strings, but found {}",
                    describe(other)
                )));
            }
        };
        registry.insert(parse_command(&name, code, index == 0, lookup)?);
    }

    if registry.is_empty() {
        return Err(RfileError::user(
            "There should be at least 1 command in the rfile",
        ));
    }
    Ok(registry)
}

fn scalar_key(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(RfileError::user(format!(
            "Expected rfile command names to be strings, but found {}",
            describe(other)
        ))),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a dictionary",
        Value::Tagged(_) => "a tagged value",
    }
}
