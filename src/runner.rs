// src/runner.rs

//! Drives a set of operations for the CLI: launch, subscribe, render.
//!
//! Each subscription is forwarded by its own Tokio task into one channel of
//! rendered chunks, which a single writer drains. Output of different
//! operations may interleave; within one operation the order is exactly
//! the append order.

use std::io::Write;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::errors::Result;
use crate::exec::LauncherBackend;
use crate::operation::{LaunchRequest, LogEntry, OperationRecord, OperationSnapshot};
use crate::registry::check_launch_target;
use crate::stream::event_stream::{encode_event, encode_snapshot};
use crate::stream::{StatusUpdate, StreamEvent, Subscription};
use crate::supervisor::Supervisor;
use crate::types::OperationStatus;

/// Final tally of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Streams that closed without a terminal status (should not happen).
    pub unfinished: usize,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.unfinished == 0
    }

    fn record(&mut self, status: OperationStatus) {
        match status {
            OperationStatus::Success => self.succeeded += 1,
            OperationStatus::Error => self.failed += 1,
            OperationStatus::Running => self.unfinished += 1,
        }
    }
}

/// Launch every request, stream all events to `out` until each operation
/// has ended, and return the tally.
///
/// Every request is checked before any is launched, so a missing script or
/// working directory aborts the run without starting anything.
pub async fn drive<B, W>(
    supervisor: &Supervisor<B>,
    requests: Vec<LaunchRequest>,
    format: OutputFormat,
    out: &mut W,
) -> Result<RunSummary>
where
    B: LauncherBackend,
    W: Write,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut forwarders = Vec::with_capacity(requests.len());

    for request in &requests {
        check_launch_target(request)?;
    }

    for request in requests {
        let receipt = supervisor.launch(request)?;
        debug!(op = %receipt.operation.id, stream_url = %receipt.stream_url, "operation launched");
        let subscription = supervisor.subscribe(&receipt.operation.id)?;
        forwarders.push(tokio::spawn(forward_subscription(
            subscription,
            format,
            tx.clone(),
        )));
    }
    drop(tx);

    while let Some(chunk) = rx.recv().await {
        out.write_all(chunk.as_bytes())?;
        out.flush()?;
    }

    let mut summary = RunSummary::default();
    for forwarder in forwarders {
        match forwarder.await {
            Ok(status) => summary.record(status),
            Err(err) => {
                warn!(error = %err, "subscription forwarder failed");
                summary.unfinished += 1;
            }
        }
    }

    Ok(summary)
}

/// Render one subscription into `tx`; returns the operation's final status
/// as observed on the stream.
async fn forward_subscription(
    mut subscription: Subscription,
    format: OutputFormat,
    tx: mpsc::UnboundedSender<String>,
) -> OperationStatus {
    let record = subscription.snapshot().operation.clone();
    let mut final_status = record.status;

    send_rendered(&tx, render_snapshot(subscription.snapshot(), format));

    while let Some(event) = subscription.recv().await {
        if let StreamEvent::Status(update) = &event {
            final_status = update.status;
        }
        send_rendered(&tx, render_event(&record, &event, format));
    }

    final_status
}

fn send_rendered(tx: &mpsc::UnboundedSender<String>, rendered: Result<String>) {
    match rendered {
        Ok(chunk) if chunk.is_empty() => {}
        Ok(chunk) => {
            let _ = tx.send(chunk);
        }
        Err(err) => warn!(error = %err, "failed to render operation event"),
    }
}

/// Render the initial snapshot: every retained entry, plus the final status
/// line if the operation had already finished.
pub fn render_snapshot(snapshot: &OperationSnapshot, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::EventStream => encode_snapshot(snapshot),
        OutputFormat::Text => {
            let record = &snapshot.operation;
            let mut out = String::new();
            for entry in &snapshot.logs {
                out.push_str(&text_log_line(record, entry));
            }
            if record.status.is_terminal() {
                out.push_str(&text_status_line(
                    record,
                    &StatusUpdate {
                        status: record.status,
                        exit_code: record.exit_code,
                    },
                ));
            }
            Ok(out)
        }
    }
}

/// Render one live event.
pub fn render_event(
    record: &OperationRecord,
    event: &StreamEvent,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::EventStream => encode_event(event),
        OutputFormat::Text => Ok(match event {
            StreamEvent::Log(entry) => text_log_line(record, entry),
            StreamEvent::Status(update) => text_status_line(record, update),
            StreamEvent::End => String::new(),
        }),
    }
}

fn text_log_line(record: &OperationRecord, entry: &LogEntry) -> String {
    format!(
        "[{} {}] {} {}: {}\n",
        record.id, record.kind, entry.stream, entry.level, entry.line
    )
}

fn text_status_line(record: &OperationRecord, update: &StatusUpdate) -> String {
    match update.exit_code {
        Some(code) => format!(
            "[{} {}] finished: {} (exit code {})\n",
            record.id, record.kind, update.status, code
        ),
        None => format!(
            "[{} {}] finished: {} (no exit code)\n",
            record.id, record.kind, update.status
        ),
    }
}
