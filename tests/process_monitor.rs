// tests/process_monitor.rs

//! End-to-end behaviour of `ProcessMonitor` against real `sh -c` children.

#![cfg(unix)]

use std::error::Error;
use std::time::Duration;

use tokio::sync::oneshot;

use publink::errors::PublinkError;
use publink::monitor::{start, MonitorState, ProcessMonitor};
use publink::pattern::PatternRule;
use publink::types::{CommandLine, ExitPolicy, Invocation};
use publink_test_utils::{init_tracing, with_timeout, RecordingSink};

type TestResult = Result<(), Box<dyn Error>>;

fn monitor_for(script: &str) -> (ProcessMonitor, RecordingSink, RecordingSink) {
    let out = RecordingSink::new();
    let err = RecordingSink::new();
    let monitor = ProcessMonitor::new(Invocation::shell(script), PatternRule::default())
        .with_sinks(out.clone(), err.clone());
    (monitor, out, err)
}

/// `kill -0` fails once the pid no longer names a live process.
fn assert_process_gone(pid: &str) {
    let alive = std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("kill -0 {pid} 2>/dev/null"))
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    assert!(!alive, "process {pid} is still running");
    assert!(
        !std::path::Path::new(&format!("/proc/{pid}")).exists(),
        "/proc/{pid} still exists"
    );
}

/// Scripts below start with `echo $$`; `exec` keeps that pid for the sleeper.
fn first_line(sink: &RecordingSink) -> String {
    sink.lines().first().cloned().unwrap_or_default()
}

#[tokio::test]
async fn returns_destination_of_matching_line() -> TestResult {
    init_tracing();

    let (mut monitor, _out, _err) = monitor_for("echo 'foo -> bar'");
    let url = with_timeout(monitor.run()).await?;

    assert_eq!(url, "bar");
    assert_eq!(monitor.state(), MonitorState::Matched);
    Ok(())
}

#[tokio::test]
async fn forwards_stdout_in_production_order() -> TestResult {
    init_tracing();

    let (mut monitor, out, _err) = monitor_for("printf 'x\\ny -> z\\nw\\n'");
    let url = with_timeout(monitor.run()).await?;
    assert_eq!(url, "z");

    let code = with_timeout(monitor.wait()).await?;
    assert_eq!(code, Some(0));
    assert_eq!(monitor.state(), MonitorState::Finished);
    assert_eq!(out.lines(), vec!["x", "y -> z", "w"]);
    Ok(())
}

#[tokio::test]
async fn first_match_wins() -> TestResult {
    init_tracing();

    let (mut monitor, out, _err) = monitor_for("echo 'a -> 1'; echo 'a -> 2'");
    assert_eq!(with_timeout(monitor.run()).await?, "1");

    with_timeout(monitor.wait()).await?;
    assert_eq!(out.lines(), vec!["a -> 1", "a -> 2"]);
    Ok(())
}

#[tokio::test]
async fn stderr_is_mirrored_but_never_matched() -> TestResult {
    init_tracing();

    let (mut monitor, out, err) = monitor_for(
        "echo 'decoy -> wrong' >&2; sleep 0.2; echo 'real -> right'",
    );
    assert_eq!(with_timeout(monitor.run()).await?, "right");

    with_timeout(monitor.wait()).await?;
    assert_eq!(err.lines(), vec!["decoy -> wrong"]);
    assert_eq!(out.lines(), vec!["real -> right"]);
    Ok(())
}

#[tokio::test]
async fn returns_without_waiting_for_process_exit() -> TestResult {
    init_tracing();

    let (mut monitor, _out, _err) = monitor_for("echo 'svc -> https://up'; exec sleep 60");
    let url = with_timeout(monitor.run()).await?;
    assert_eq!(url, "https://up");
    assert!(monitor.pid().is_some());

    with_timeout(monitor.shutdown()).await;
    assert_eq!(monitor.state(), MonitorState::Finished);
    Ok(())
}

#[tokio::test]
async fn nonexistent_program_is_a_spawn_error() {
    init_tracing();

    let out = RecordingSink::new();
    let err = RecordingSink::new();
    let mut monitor = ProcessMonitor::new(
        Invocation::argv(["/definitely/not/a/real/binary-publink"]),
        PatternRule::default(),
    )
    .with_sinks(out.clone(), err.clone());

    match with_timeout(monitor.run()).await {
        Err(PublinkError::Spawn { command, .. }) => {
            assert!(command.contains("binary-publink"));
        }
        other => panic!("expected Spawn error, got {other:?}"),
    }

    assert_eq!(monitor.state(), MonitorState::Failed);
    assert!(out.lines().is_empty());
    assert!(err.lines().is_empty());
}

#[tokio::test]
async fn bad_working_directory_is_a_spawn_error() {
    let mut monitor = ProcessMonitor::new(
        Invocation::shell("echo 'a -> b'").with_cwd("/definitely/not/a/dir"),
        PatternRule::default(),
    )
    .with_sinks(RecordingSink::new(), RecordingSink::new());

    assert!(matches!(
        with_timeout(monitor.run()).await,
        Err(PublinkError::Spawn { .. })
    ));
}

#[tokio::test]
async fn exit_without_match_reports_exit_code() {
    init_tracing();

    let (mut monitor, out, _err) = monitor_for("echo one; echo two; exit 3");

    match with_timeout(monitor.run()).await {
        Err(PublinkError::NoMatch { exit_code }) => assert_eq!(exit_code, Some(3)),
        other => panic!("expected NoMatch, got {other:?}"),
    }
    assert_eq!(monitor.state(), MonitorState::Failed);
    assert_eq!(out.lines(), vec!["one", "two"]);
}

#[tokio::test]
async fn wait_policy_keeps_waiting_until_timeout() {
    init_tracing();

    let (monitor, _out, _err) = monitor_for("echo nothing");
    let mut monitor = monitor
        .with_exit_policy(ExitPolicy::Wait)
        .with_timeout(Some(Duration::from_millis(300)));

    match with_timeout(monitor.run()).await {
        Err(PublinkError::Timeout(d)) => assert_eq!(d, Duration::from_millis(300)),
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn timeout_kills_a_silent_process() {
    init_tracing();

    let (monitor, out, _err) = monitor_for("echo $$; exec sleep 60");
    let mut monitor = monitor.with_timeout(Some(Duration::from_millis(300)));

    assert!(matches!(
        with_timeout(monitor.run()).await,
        Err(PublinkError::Timeout(_))
    ));
    assert_eq!(monitor.state(), MonitorState::Failed);

    let pid = first_line(&out);
    assert!(pid.parse::<u32>().is_ok(), "expected a pid, got {pid:?}");
    assert_process_gone(&pid);
}

#[tokio::test]
async fn cancellation_stops_run_before_match() {
    init_tracing();

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let (monitor, out, _err) = monitor_for("echo $$; echo starting; exec sleep 60");
    let mut monitor = monitor.with_cancel(cancel_rx);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = cancel_tx.send(());
    });

    assert!(matches!(
        with_timeout(monitor.run()).await,
        Err(PublinkError::Cancelled)
    ));
    assert_eq!(monitor.state(), MonitorState::Failed);

    let lines = out.lines();
    assert_eq!(lines.get(1).map(String::as_str), Some("starting"));
    assert_process_gone(&lines[0]);
}

#[tokio::test]
async fn dropped_cancel_sender_is_not_a_cancellation() -> TestResult {
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    drop(cancel_tx);

    let (monitor, _out, _err) = monitor_for("sleep 0.2; echo 'late -> ok'");
    let mut monitor = monitor.with_cancel(cancel_rx);

    assert_eq!(with_timeout(monitor.run()).await?, "ok");
    Ok(())
}

#[tokio::test]
async fn cancellation_during_wait_kills_the_process() -> TestResult {
    init_tracing();

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let (monitor, _out, _err) = monitor_for("echo 'svc -> https://up'; exec sleep 60");
    let mut monitor = monitor.with_cancel(cancel_rx);

    assert_eq!(with_timeout(monitor.run()).await?, "https://up");
    let pid = monitor.pid().ok_or("running process should have a pid")?;

    cancel_tx.send(()).map_err(|_| "monitor dropped its cancel receiver")?;
    assert!(matches!(
        with_timeout(monitor.wait()).await,
        Err(PublinkError::Cancelled)
    ));
    assert_eq!(monitor.state(), MonitorState::Finished);
    assert_process_gone(&pid.to_string());
    Ok(())
}

#[tokio::test]
async fn shutdown_after_match_kills_the_process() -> TestResult {
    init_tracing();

    let (mut monitor, _out, _err) = monitor_for("echo 'svc -> https://up'; exec sleep 60");
    assert_eq!(
        monitor.invocation().command,
        CommandLine::Shell("echo 'svc -> https://up'; exec sleep 60".to_string())
    );

    with_timeout(monitor.run()).await?;
    let pid = monitor.pid().ok_or("running process should have a pid")?;

    with_timeout(monitor.shutdown()).await;
    assert_eq!(monitor.pid(), None);
    assert_process_gone(&pid.to_string());
    Ok(())
}

#[tokio::test]
async fn handle_kill_stops_a_started_process() -> TestResult {
    init_tracing();

    let mut handle = start(&Invocation::argv(["sleep", "60"]))?;
    assert_eq!(handle.command(), "sleep 60");
    let pid = handle.id().ok_or("started process should have a pid")?;

    with_timeout(handle.kill()).await;
    assert_eq!(handle.id(), None);
    assert_eq!(with_timeout(handle.wait()).await?, None);
    assert_process_gone(&pid.to_string());
    Ok(())
}

#[tokio::test]
async fn run_twice_is_rejected() -> TestResult {
    let (mut monitor, _out, _err) = monitor_for("echo 'a -> b'");
    with_timeout(monitor.run()).await?;

    assert!(matches!(
        monitor.run().await,
        Err(PublinkError::InvalidState(MonitorState::Matched))
    ));
    Ok(())
}

#[tokio::test]
async fn wait_before_run_is_rejected() {
    let (mut monitor, _out, _err) = monitor_for("echo 'a -> b'");
    assert!(matches!(
        monitor.wait().await,
        Err(PublinkError::InvalidState(MonitorState::Idle))
    ));
}

#[tokio::test]
async fn environment_and_cwd_reach_the_child() -> TestResult {
    let dir = tempfile::tempdir()?;
    let out = RecordingSink::new();
    let invocation = Invocation::shell("echo \"$(basename \"$PWD\") -> $PUBLINK_TEST_URL\"")
        .with_cwd(dir.path())
        .with_env("PUBLINK_TEST_URL", "https://env.example");

    let mut monitor = ProcessMonitor::new(invocation, PatternRule::default())
        .with_sinks(out.clone(), RecordingSink::new());

    assert_eq!(with_timeout(monitor.run()).await?, "https://env.example");
    Ok(())
}

#[tokio::test]
async fn custom_regex_rule_is_applied() -> TestResult {
    let out = RecordingSink::new();
    let rule = PatternRule::from_regex(r"Forwarding (https://\S+)")?;
    let mut monitor = ProcessMonitor::new(
        Invocation::argv(["sh", "-c", "echo 'Forwarding https://t.example to :8080'"]),
        rule,
    )
    .with_sinks(out.clone(), RecordingSink::new());

    assert_eq!(with_timeout(monitor.run()).await?, "https://t.example");
    Ok(())
}
