#![cfg(unix)]

mod common;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use common::{plain, scratch_dir};

fn r(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_r"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RFILE_LOG")
        .output()
        .expect("failed to run r")
}

fn stdout(out: &Output) -> String {
    plain(&String::from_utf8_lossy(&out.stdout))
}

fn stderr(out: &Output) -> String {
    plain(&String::from_utf8_lossy(&out.stderr))
}

fn project(rfile: &str) -> tempfile::TempDir {
    let dir = scratch_dir();
    fs::write(dir.path().join("rfile"), rfile).unwrap();
    dir
}

#[test]
fn runs_the_default_command() {
    let dir = project("hello: echo hello\nother: echo other\n");

    let out = r(dir.path(), &[]);

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "hello\n");
}

#[test]
fn exit_code_of_the_command_is_ours() {
    let dir = project("fail: exit 3\n");

    let out = r(dir.path(), &["fail"]);

    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn unique_prefixes_are_expanded_with_a_notice() {
    let dir = project("something: echo ran\nother: echo other\n");

    let out = r(dir.path(), &["some"]);

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "Assuming 'some' is short for 'something'\nran\n");
}

#[test]
fn unknown_commands_show_help_and_succeed() {
    let dir = project("build: echo b\nbench: echo c\n");

    let none = r(dir.path(), &["zzz"]);
    assert_eq!(none.status.code(), Some(0));
    let text = stdout(&none);
    assert!(text.contains("available commands:"));
    assert!(text.ends_with("No possible matches found for command 'zzz'\n"));

    let many = r(dir.path(), &["b"]);
    assert!(stdout(&many).ends_with("Ambiguous short command 'b', could be any of: build, bench\n"));
}

#[test]
fn missing_dependency_is_a_user_error() {
    let dir = project("a: |\n  # dep: missing\n  echo a\n");

    let out = r(dir.path(), &["a"]);

    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        stderr(&out),
        "User error: 'missing' command not found in rfile but was specified as a dependency of 'a'\n"
    );
    assert_eq!(stdout(&out), "");
}

#[test]
fn missing_watch_paths_stop_the_run() {
    let dir = project("t: |\n  # watch: nonexistent_file\n  echo hi\n");

    let out = r(dir.path(), &["t"]);

    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        stderr(&out),
        "User error: Some paths to watch didn't exist: nonexistent_file\n"
    );
    assert_eq!(stdout(&out), "");
}

#[test]
fn dependency_output_is_framed() {
    let dir = project(
        "go3: |\n  # dep: go2\n  # dep: go\n  echo go3\ngo2: echo wow\ngo: echo hello\n",
    );

    let out = r(dir.path(), &["go3"]);

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "go2 | wow\ngo  | hello\ngo3\n");
}

#[test]
fn command_args_reach_the_body() {
    let dir = project("greet: |\n  # arg: name=world (who to greet)\n  echo \"hi $name\"\n");

    assert_eq!(stdout(&r(dir.path(), &["greet"])), "hi world\n");
    assert_eq!(stdout(&r(dir.path(), &["greet", "--name", "bob"])), "hi bob\n");
}

#[test]
fn help_lists_commands() {
    let dir = project("build: |\n  # compile everything\n  echo b\n");

    let out = r(dir.path(), &["-h"]);

    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.starts_with("usage: r [-h, --help]"));
    assert!(text.contains("    build     compile everything (default)\n"));
}

#[test]
fn command_help_lists_its_args() {
    let dir = project("greet: |\n  # arg: name=world (who to greet)\n  echo \"hi $name\"\n");

    let out = r(dir.path(), &["greet", "-h"]);

    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.starts_with("usage: r [-v, --verbose] greet [-h, --help] [--name NAME]"));
    assert!(text.contains("--name      who to greet (default: world)"));
}

#[test]
fn without_an_rfile_help_still_works() {
    let dir = scratch_dir();

    let help = r(dir.path(), &["-h"]);
    assert_eq!(help.status.code(), Some(0));
    assert!(stdout(&help).contains("no rfile was found so no commands are available"));

    let run = r(dir.path(), &[]);
    assert_eq!(run.status.code(), Some(1));
    assert!(stderr(&run).contains("File 'rfile' not found in this directory or parents!"));
}

#[test]
fn explicit_rfile_path_is_used() {
    let dir = scratch_dir();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/tasks.yml"), "where: pwd -P\n").unwrap();
    let expected = dir.path().join("sub").canonicalize().unwrap();

    let out = r(dir.path(), &["-r", "sub/tasks.yml"]);

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out).trim_end(), expected.to_string_lossy());
}
