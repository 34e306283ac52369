// src/exec/interpreter.rs

//! Per-interpreter script preludes.

use serde_json::{Map, Value};

use crate::config::model::TaskDefinition;
use crate::exec::backend::ScriptPrelude;
use crate::types::{InterpreterKind, TaskArgs};

/// Environment variable carrying the python runner's arguments as JSON.
pub const PYTHON_ARGS_ENV: &str = "RFILE_ARGS";

const PYTHON_PRELUDE: &str = r#"import os
import sys
import subprocess
import math
import re
import json
import random

class dotdict(dict):
    __getattr__ = dict.get
    __setattr__ = dict.__setitem__
    __delattr__ = dict.__delitem__

args = dotdict(json.loads(os.environ.get("RFILE_ARGS", "{}")))
"#;

pub fn prelude_for(task: &TaskDefinition, args: &TaskArgs, verbose: bool) -> ScriptPrelude {
    match task.kind() {
        InterpreterKind::Shell => ScriptPrelude {
            text: if verbose { "set -ex\n" } else { "set -e\n" }.to_string(),
            env: Vec::new(),
        },
        InterpreterKind::Python => ScriptPrelude {
            text: PYTHON_PRELUDE.to_string(),
            env: vec![(PYTHON_ARGS_ENV.to_string(), python_args_json(task, args))],
        },
        InterpreterKind::Generic => ScriptPrelude::default(),
    }
}

/// Declared args default to `null`; every resolved value is a string.
fn python_args_json(task: &TaskDefinition, args: &TaskArgs) -> String {
    let mut map = Map::new();
    for spec in &task.args {
        map.insert(spec.name.clone(), Value::Null);
    }
    for (name, value) in args.iter() {
        map.insert(name.to_string(), Value::String(value.to_string()));
    }
    Value::Object(map).to_string()
}
