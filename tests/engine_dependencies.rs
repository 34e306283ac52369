mod common;

use std::time::Duration;

use common::*;
use rfile::engine::RunOutput;
use rfile::engine::catch::on_failure;
use rfile::types::TaskArgs;

#[tokio::test]
async fn serial_dependencies_run_in_order_before_the_body() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("all", "echo all").deps(&["lint", "build", "test"]))
        .task(TaskBuilder::new("lint", "echo lint"))
        .task(TaskBuilder::new("build", "echo build"))
        .task(TaskBuilder::new("test", "echo test").dep("build"))
        .build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(4));

    let task = registry.get("all").unwrap();
    let out = with_timeout(engine.execute(task, ctx(&root()))).await.unwrap();

    assert!(out.success());
    // No memoisation: `build` runs once directly and once for `test`.
    assert_eq!(backend.started(), vec!["lint", "build", "build", "test", "all"]);
}

#[tokio::test]
async fn dependencies_get_prefix_slots_and_padding() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("go3", "echo go3").deps(&["go2", "go"]))
        .task(TaskBuilder::new("go2", "echo wow"))
        .task(TaskBuilder::new("go", "echo hello"))
        .build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(4));

    with_timeout(engine.execute(registry.get("go3").unwrap(), ctx(&root())))
        .await
        .unwrap();

    let runs = backend.runs();
    let slots: Vec<_> = runs
        .iter()
        .map(|r| (r.task.as_str(), r.run_index, r.padding))
        .collect();
    assert_eq!(
        slots,
        vec![("go2", Some(0), 3), ("go", Some(1), 3), ("go3", None, 0)]
    );
}

#[tokio::test]
async fn prefixed_output_is_framed_per_line() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("go3", "echo go3").deps(&["go2", "go"]))
        .task(TaskBuilder::new("go2", "echo wow"))
        .task(TaskBuilder::new("go", "echo hello"))
        .build();
    let (engine, backend, sink) = fake_engine(registry.clone(), options(4));
    backend
        .output("go2", "wow\n")
        .output("go", "hello\n")
        .output("go3", "go3\n");

    with_timeout(engine.execute(registry.get("go3").unwrap(), ctx(&root())))
        .await
        .unwrap();

    assert_eq!(plain(&sink.stdout_string()), "go2 | wow\ngo  | hello\ngo3\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_dependencies_respect_the_bound() {
    let names = ["a", "b", "c", "d", "e", "f"];
    let mut builder = RegistryBuilder::new()
        .task(TaskBuilder::new("all", "echo done").deps(&names).parallel());
    for name in names {
        builder = builder.task(TaskBuilder::new(name, "sleep 1"));
    }
    let registry = builder.build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(2));
    for name in names {
        backend.delay(name, Duration::from_millis(60));
    }

    let out = with_timeout(engine.execute(registry.get("all").unwrap(), ctx(&root())))
        .await
        .unwrap();

    assert!(out.success());
    assert_eq!(backend.started().len(), 7);
    assert!(backend.max_in_flight() <= 2, "saw {} in flight", backend.max_in_flight());
    assert!(backend.max_in_flight() >= 2);
    assert_eq!(backend.finished().last().map(String::as_str), Some("all"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_fanouts_nest_without_deadlock() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("top", "echo top").deps(&["left", "right"]).parallel())
        .task(TaskBuilder::new("left", "echo left").deps(&["l1", "l2"]).parallel())
        .task(TaskBuilder::new("right", "echo right").deps(&["r1", "r2"]).parallel())
        .task(TaskBuilder::new("l1", "echo"))
        .task(TaskBuilder::new("l2", "echo"))
        .task(TaskBuilder::new("r1", "echo"))
        .task(TaskBuilder::new("r2", "echo"))
        .build();
    // One slot per fan-out still finishes.
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(1));

    let out = with_timeout(engine.execute(registry.get("top").unwrap(), ctx(&root())))
        .await
        .unwrap();

    assert!(out.success());
    assert_eq!(backend.started().len(), 7);
}

#[tokio::test]
async fn failed_dependency_skips_the_body_without_failing() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("main", "echo main").deps(&["bad", "good"]))
        .task(TaskBuilder::new("bad", "exit 3"))
        .task(TaskBuilder::new("good", "echo ok"))
        .build();
    let (engine, backend, sink) = fake_engine(registry.clone(), options(4));
    backend.exit_code("bad", 3);

    let out = with_timeout(engine.execute(registry.get("main").unwrap(), ctx(&root())))
        .await
        .unwrap();

    assert_eq!(out, RunOutput::skipped());
    assert_eq!(backend.started(), vec!["bad", "good"]);
    assert_eq!(
        plain(&sink.stderr_string()),
        "[r] not running 'main' because these dependencies failed: bad\n"
    );
}

#[tokio::test]
async fn body_exit_code_and_output_come_back_as_data() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("fail", "echo nope; exit 2"))
        .build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(4));
    backend.exit_code("fail", 2).output("fail", "nope\n");

    let out = engine
        .execute(registry.get("fail").unwrap(), ctx(&root()))
        .await
        .unwrap();

    assert_eq!(out, RunOutput::new(2, "nope\n"));
}

#[tokio::test]
async fn blank_bodies_never_spawn() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("group", "  \n").deps(&["one"]))
        .task(TaskBuilder::new("one", "echo one"))
        .build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(4));

    let out = engine
        .execute(registry.get("group").unwrap(), ctx(&root()))
        .await
        .unwrap();

    assert_eq!(out, RunOutput::skipped());
    assert_eq!(backend.started(), vec!["one"]);
}

#[tokio::test]
async fn missing_dependency_is_a_user_error() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("main", "echo").dep("ghost"))
        .build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(4));

    let err = engine
        .execute(registry.get("main").unwrap(), ctx(&root()))
        .await
        .unwrap_err();

    assert!(err.is_user_error());
    assert_eq!(
        err.to_string(),
        "'ghost' command not found in rfile but was specified as a dependency of 'main'"
    );
    assert!(backend.started().is_empty());
}

#[tokio::test]
async fn args_flow_to_dependencies_and_preludes() {
    let registry = RegistryBuilder::new()
        .task(
            TaskBuilder::new("py", "print(args.name)")
                .interpreter("/usr/bin/python3")
                .arg("name", Some("world"))
                .dep("sh"),
        )
        .task(TaskBuilder::new("sh", "echo $name"))
        .build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(4));

    let args = TaskArgs::new().with("name", "rfile");
    let ctx = rfile::engine::RunContext::new(args, root());
    engine
        .execute(registry.get("py").unwrap(), ctx)
        .await
        .unwrap();

    let runs = backend.runs();
    assert_eq!(runs[0].task, "sh");
    assert_eq!(runs[0].args.get("name"), Some("rfile"));
    assert_eq!(runs[0].prelude.text, "set -e\n");

    assert_eq!(runs[1].task, "py");
    assert!(runs[1].prelude.text.contains("args = dotdict("));
    assert_eq!(
        runs[1].prelude.env,
        vec![("RFILE_ARGS".to_string(), r#"{"name":"rfile"}"#.to_string())]
    );
}

#[tokio::test]
async fn verbose_traces_shell_bodies() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("t", "echo hi").interpreter("/bin/bash"))
        .build();
    let mut opts = options(4);
    opts.verbose = true;
    let (engine, backend, _sink) = fake_engine(registry.clone(), opts);

    engine.execute(registry.get("t").unwrap(), ctx(&root())).await.unwrap();

    assert_eq!(backend.runs()[0].prelude.text, "set -ex\n");
}

#[tokio::test]
async fn no_watch_runs_watched_tasks_once() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("t", "echo hi").watch("0.01"))
        .build();
    let mut opts = options(4);
    opts.no_watch = true;
    let (engine, backend, _sink) = fake_engine(registry.clone(), opts);

    let out = with_timeout(engine.execute(registry.get("t").unwrap(), ctx(&root())))
        .await
        .unwrap();

    assert!(out.success());
    assert_eq!(backend.started(), vec!["t"]);
}

#[tokio::test]
async fn named_catch_handler_sees_the_error_output() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("t", "exit 1").catch("report"))
        .task(TaskBuilder::new("report", "echo $ERROR"))
        .build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(4));

    let task = registry.get("t").unwrap();
    let ctx = rfile::engine::RunContext::new(TaskArgs::new().with("CHANGED", "a.txt"), root());
    on_failure(&engine, &task, &ctx, &RunOutput::new(1, "\x1b[31mboom\x1b[0m\n")).await;

    let runs = backend.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].task, "report");
    assert_eq!(runs[0].args.get("ERROR"), Some("boom\n"));
    assert_eq!(runs[0].args.get("ERROR_COLOR"), Some("\x1b[31mboom\x1b[0m\n"));
    assert_eq!(runs[0].args.get("CHANGED"), Some("a.txt"));
    assert_eq!(runs[0].run_index, None);
}

#[tokio::test]
async fn inline_catch_runs_with_the_task_interpreter() {
    let registry = RegistryBuilder::new()
        .task(
            TaskBuilder::new("t", "exit 1")
                .interpreter("/bin/bash")
                .catch("notify-send \"$ERROR\""),
        )
        .build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(4));
    backend.exit_code("t-catch", 7);

    let task = registry.get("t").unwrap();
    on_failure(&engine, &task, &ctx(&root()), &RunOutput::new(1, "bad")).await;

    let runs = backend.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].task, "t-catch");
    assert_eq!(runs[0].args.get("ERROR"), Some("bad"));
}

#[tokio::test]
async fn without_catch_nothing_runs() {
    let registry = RegistryBuilder::new().task(TaskBuilder::new("t", "exit 1")).build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(4));

    let task = registry.get("t").unwrap();
    on_failure(&engine, &task, &ctx(&root()), &RunOutput::new(1, "")).await;

    assert!(backend.runs().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_user_error_ends_the_run_while_a_sibling_polls() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("all", "echo all").deps(&["poll", "broken"]).parallel())
        .task(TaskBuilder::new("poll", "echo tick").watch("0.02"))
        .task(TaskBuilder::new("broken", "echo broken").dep("ghost"))
        .build();
    let (engine, backend, _sink) = fake_engine(registry.clone(), options(2));

    let err = with_timeout(engine.execute(registry.get("all").unwrap(), ctx(&root())))
        .await
        .unwrap_err();

    assert!(err.is_user_error());
    assert_eq!(
        err.to_string(),
        "'ghost' command not found in rfile but was specified as a dependency of 'broken'"
    );
    assert!(!backend.started().contains(&"all".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn nonzero_parallel_exits_do_not_cancel_siblings() {
    let registry = RegistryBuilder::new()
        .task(TaskBuilder::new("all", "echo all").deps(&["fast", "slow"]).parallel())
        .task(TaskBuilder::new("fast", "exit 1"))
        .task(TaskBuilder::new("slow", "sleep 1"))
        .build();
    let (engine, backend, sink) = fake_engine(registry.clone(), options(2));
    backend.exit_code("fast", 1);
    backend.delay("slow", Duration::from_millis(100));

    let out = with_timeout(engine.execute(registry.get("all").unwrap(), ctx(&root())))
        .await
        .unwrap();

    assert_eq!(out, RunOutput::skipped());
    let mut finished = backend.finished();
    finished.sort();
    assert_eq!(finished, vec!["fast", "slow"]);
    assert!(plain(&sink.stderr_string()).contains("dependencies failed: fast\n"));
}
