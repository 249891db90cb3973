// src/exec/process_runner.rs

//! Runs one operation's process to completion.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::multiplex::{LineSplitter, OperationHandle};
use crate::operation::OperationEvent;
use crate::types::StreamKind;

use super::plan::LaunchPlan;

const READ_CHUNK: usize = 8 * 1024;

/// Spawn the process described by `plan` and drive `handle` until exit.
///
/// - Spawn failure becomes a single `SpawnFailed` event (synthetic error line,
///   `status = error`, no exit code). There is no retry.
/// - Both pipes are drained to EOF before `ProcessExited` is applied, so all
///   output produced before exit is appended first.
/// - Any other failure (e.g. waiting on the child) is reported as an exit
///   without a code.
pub async fn run_operation(plan: LaunchPlan, handle: OperationHandle) {
    let op = handle.id().clone();
    if let Err(err) = run_operation_inner(&plan, &handle).await {
        error!(op = %op, error = %err, "operation execution error");
        handle.apply(OperationEvent::ProcessExited { code: None });
    }
}

async fn run_operation_inner(plan: &LaunchPlan, handle: &OperationHandle) -> Result<()> {
    info!(
        op = %handle.id(),
        cmd = %plan.display_command(),
        cwd = ?plan.cwd,
        "starting operation process"
    );

    let mut cmd = Command::new(&plan.program);
    cmd.args(&plan.args)
        .envs(plan.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &plan.cwd {
        cmd.current_dir(cwd);
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(
                op = %handle.id(),
                program = %plan.program,
                error = %err,
                "failed to start operation process"
            );
            handle.apply(OperationEvent::SpawnFailed {
                message: format!("failed to start '{}': {}", plan.program, err),
            });
            return Ok(());
        }
    };

    let pid = child.id();
    handle.apply(OperationEvent::Spawned { pid });
    debug!(op = %handle.id(), ?pid, "operation process spawned");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (_, _, status) = tokio::join!(
        pump_stream(stdout, StreamKind::Stdout, handle),
        pump_stream(stderr, StreamKind::Stderr, handle),
        child.wait(),
    );

    let status =
        status.with_context(|| format!("waiting for process of operation '{}'", handle.id()))?;
    let code = status.code();

    info!(
        op = %handle.id(),
        exit_code = ?code,
        success = status.success(),
        "operation process exited"
    );

    handle.apply(OperationEvent::ProcessExited { code });
    Ok(())
}

/// Read one pipe to EOF, feeding complete lines to the multiplexer, then
/// flush the trailing fragment and mark the stream closed.
async fn pump_stream<R>(reader: Option<R>, stream: StreamKind, handle: &OperationHandle)
where
    R: AsyncRead + Unpin,
{
    if let Some(mut reader) = reader {
        let mut splitter = LineSplitter::new();
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    for line in splitter.push(&buf[..n]) {
                        handle.ingest_line(stream, line);
                    }
                }
                Err(err) => {
                    warn!(op = %handle.id(), %stream, error = %err, "error reading process output");
                    break;
                }
            }
        }

        if let Some(fragment) = splitter.finish() {
            handle.ingest_line(stream, fragment);
        }
    }

    debug!(op = %handle.id(), %stream, "output stream closed");
    handle.apply(OperationEvent::StreamClosed { stream });
}
