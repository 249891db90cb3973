// tests/process_launcher.rs

#![cfg(unix)]

mod common;
use crate::common::builders::LaunchRequestBuilder;
use crate::common::{drain, init_tracing};

use std::error::Error;

use opvisor::exec::ProcessLauncher;
use opvisor::operation::{LaunchRequest, LogEntry, OperationSnapshot};
use opvisor::stream::{StatusUpdate, StreamEvent};
use opvisor::supervisor::{Settings, Supervisor};
use opvisor::types::{OperationStatus, Severity, StreamKind};

type TestResult = Result<(), Box<dyn Error>>;

/// Launch one request with the real launcher and follow it to the end.
async fn run_to_end(
    request: LaunchRequest,
) -> Result<(Vec<LogEntry>, Vec<StreamEvent>, OperationSnapshot), Box<dyn Error>> {
    init_tracing();
    let sup = Supervisor::new(Settings::default(), ProcessLauncher::new())?;
    let receipt = sup.launch(request)?;
    assert_eq!(receipt.operation.status, OperationStatus::Running);

    let sub = sup.subscribe(&receipt.operation.id)?;
    let (logs, events) = drain(sub).await;
    let snapshot = sup.get(&receipt.operation.id)?;
    Ok((logs, events, snapshot))
}

fn final_status(events: &[StreamEvent]) -> Option<StatusUpdate> {
    events.iter().find_map(|e| match e {
        StreamEvent::Status(update) => Some(*update),
        _ => None,
    })
}

#[tokio::test]
async fn echo_succeeds_with_one_info_line() -> TestResult {
    let (logs, events, snapshot) =
        run_to_end(LaunchRequestBuilder::new("echo", "echo").arg("hello").build()).await?;

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].line, "hello");
    assert_eq!(logs[0].stream, StreamKind::Stdout);
    assert_eq!(logs[0].level, Severity::Info);

    assert_eq!(
        final_status(&events),
        Some(StatusUpdate {
            status: OperationStatus::Success,
            exit_code: Some(0),
        })
    );
    assert_eq!(events.last(), Some(&StreamEvent::End));

    let record = snapshot.operation;
    assert_eq!(record.status, OperationStatus::Success);
    assert_eq!(record.exit_code, Some(0));
    assert!(record.pid.is_some());
    assert!(record.ended_at.is_some());
    assert_eq!(record.last_error, None);
    Ok(())
}

#[tokio::test]
async fn missing_program_is_a_launch_failure_not_a_rejection() -> TestResult {
    let (logs, events, snapshot) = run_to_end(
        LaunchRequestBuilder::new("ghost", "opvisor-definitely-not-a-real-program").build(),
    )
    .await?;

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, Severity::Error);
    assert_eq!(logs[0].stream, StreamKind::Stderr);
    assert!(logs[0].line.contains("failed to start"));

    assert_eq!(
        final_status(&events),
        Some(StatusUpdate {
            status: OperationStatus::Error,
            exit_code: None,
        })
    );
    assert_eq!(snapshot.operation.status, OperationStatus::Error);
    assert!(snapshot.operation.last_error.is_some());
    Ok(())
}

#[tokio::test]
async fn stderr_error_line_and_nonzero_exit() -> TestResult {
    let (logs, events, snapshot) = run_to_end(
        LaunchRequestBuilder::shell("job", r#"echo "ERROR: disk full" >&2; exit 1"#).build(),
    )
    .await?;

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].line, "ERROR: disk full");
    assert_eq!(logs[0].stream, StreamKind::Stderr);
    assert_eq!(logs[0].level, Severity::Error);
    assert_eq!(logs[0].status, OperationStatus::Error);

    assert_eq!(
        final_status(&events),
        Some(StatusUpdate {
            status: OperationStatus::Error,
            exit_code: Some(1),
        })
    );
    assert_eq!(snapshot.operation.last_error.as_deref(), Some("ERROR: disk full"));
    Ok(())
}

#[tokio::test]
async fn child_sees_the_unbuffered_override() -> TestResult {
    let (logs, _, _) = run_to_end(
        LaunchRequestBuilder::shell("env", r#"echo "unbuffered=$PYTHONUNBUFFERED""#).build(),
    )
    .await?;

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].line, "unbuffered=1");
    Ok(())
}

#[tokio::test]
async fn request_env_and_cwd_are_applied() -> TestResult {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("marker.txt"), "")?;

    let (logs, _, snapshot) = run_to_end(
        LaunchRequestBuilder::shell("ls", r#"ls; echo "region=$REGION""#)
            .cwd(dir.path())
            .env("REGION", "eu")
            .build(),
    )
    .await?;

    let lines: Vec<&str> = logs.iter().map(|e| e.line.as_str()).collect();
    assert_eq!(lines, vec!["marker.txt", "region=eu"]);
    assert_eq!(snapshot.operation.status, OperationStatus::Success);
    Ok(())
}

#[tokio::test]
async fn lines_keep_their_order_and_trailing_fragment_is_flushed() -> TestResult {
    let (logs, _, _) = run_to_end(
        LaunchRequestBuilder::shell(
            "loop",
            r#"for i in 1 2 3 4 5; do echo "line $i"; done; printf "\n\nno newline  ""#,
        )
        .build(),
    )
    .await?;

    let lines: Vec<&str> = logs.iter().map(|e| e.line.as_str()).collect();
    assert_eq!(
        lines,
        vec!["line 1", "line 2", "line 3", "line 4", "line 5", "no newline"]
    );
    Ok(())
}

#[tokio::test]
async fn script_is_passed_as_first_argument() -> TestResult {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("job.sh"),
        "echo \"script got $1\"\necho \"✓ finished\"\n",
    )?;

    let (logs, _, snapshot) = run_to_end(
        LaunchRequestBuilder::new("script", "sh")
            .script("job.sh")
            .arg("alpha")
            .cwd(dir.path())
            .build(),
    )
    .await?;

    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].line, "script got alpha");
    assert_eq!(logs[1].level, Severity::Success);
    assert_eq!(snapshot.operation.status, OperationStatus::Success);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_operations_are_independent() -> TestResult {
    init_tracing();
    let sup = Supervisor::new(Settings::default(), ProcessLauncher::new())?;

    let ok = sup.launch(LaunchRequestBuilder::shell("ok", "echo fine").build())?;
    let bad = sup.launch(LaunchRequestBuilder::shell("bad", "exit 7").build())?;

    let ok_sub = sup.subscribe(&ok.operation.id)?;
    let bad_sub = sup.subscribe(&bad.operation.id)?;
    let ((ok_logs, _), (_, bad_events)) = tokio::join!(drain(ok_sub), drain(bad_sub));

    // Either stream may have finished before it was subscribed, so check the records.
    assert_eq!(ok_logs.len(), 1);
    assert_eq!(bad_events.last(), Some(&StreamEvent::End));
    assert_eq!(sup.get(&ok.operation.id)?.operation.status, OperationStatus::Success);
    let bad_record = sup.get(&bad.operation.id)?.operation;
    assert_eq!(bad_record.status, OperationStatus::Error);
    assert_eq!(bad_record.exit_code, Some(7));
    Ok(())
}
