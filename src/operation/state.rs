// src/operation/state.rs

//! Pure per-operation state machine.
//!
//! `OperationState` consumes [`OperationEvent`]s and returns the
//! [`StreamEvent`]s that must be published as a result. It owns the record
//! and the bounded log, and has no channels, locks, or Tokio types, so the
//! lifecycle rules can be tested without spawning anything:
//!
//! - `Running -> Success | Error`, exactly once;
//! - nothing is appended and nothing changes after the terminal transition;
//! - the terminal transition waits until every opened output stream has
//!   closed, so all lines produced before exit are published first.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::stream::{StatusUpdate, StreamEvent};
use crate::types::{OperationStatus, Severity, StreamKind};

use super::log_buffer::LogBuffer;
use super::record::{LogEntry, OperationRecord, OperationSnapshot};

/// Discrete things that can happen to a launched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationEvent {
    /// The process was started; both output streams are now open.
    Spawned { pid: Option<u32> },
    /// The multiplexer produced one classified line.
    LineReceived(LogEntry),
    /// One output stream reached EOF (after its last fragment was emitted).
    StreamClosed { stream: StreamKind },
    /// The process exited. `code` is `None` when it was killed by a signal.
    ProcessExited { code: Option<i32> },
    /// The process could not be started at all.
    SpawnFailed { message: String },
}

/// Result of applying one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateStep {
    /// Events to fan out, in order.
    pub published: Vec<StreamEvent>,
    /// True when this step performed the terminal transition.
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct OperationState {
    record: OperationRecord,
    log: LogBuffer,
    stdout_open: bool,
    stderr_open: bool,
    pending_exit: Option<Option<i32>>,
}

impl OperationState {
    pub fn new(record: OperationRecord, log_capacity: usize) -> Self {
        Self {
            record,
            log: LogBuffer::new(log_capacity),
            stdout_open: false,
            stderr_open: false,
            pending_exit: None,
        }
    }

    pub fn record(&self) -> &OperationRecord {
        &self.record
    }

    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    pub fn status(&self) -> OperationStatus {
        self.record.status
    }

    pub fn is_terminal(&self) -> bool {
        self.record.status.is_terminal()
    }

    /// Record plus the entire retained log.
    pub fn snapshot(&self) -> OperationSnapshot {
        OperationSnapshot {
            operation: self.record.clone(),
            logs: self.log.to_vec(),
        }
    }

    /// Record plus the most recent `tail` log entries.
    pub fn snapshot_tail(&self, tail: usize) -> OperationSnapshot {
        OperationSnapshot {
            operation: self.record.clone(),
            logs: self.log.tail(tail),
        }
    }

    /// Apply one event at time `now`.
    pub fn apply(&mut self, event: OperationEvent, now: DateTime<Utc>) -> StateStep {
        if self.is_terminal() {
            debug!(
                op = %self.record.id,
                status = %self.record.status,
                ?event,
                "ignoring event for finished operation"
            );
            return StateStep::default();
        }

        match event {
            OperationEvent::Spawned { pid } => {
                self.record.pid = pid;
                self.stdout_open = true;
                self.stderr_open = true;
                StateStep::default()
            }
            OperationEvent::LineReceived(entry) => StateStep {
                published: vec![self.append(entry)],
                finished: false,
            },
            OperationEvent::StreamClosed { stream } => {
                match stream {
                    StreamKind::Stdout => self.stdout_open = false,
                    StreamKind::Stderr => self.stderr_open = false,
                }
                match self.pending_exit {
                    Some(code) if !self.streams_open() => {
                        self.pending_exit = None;
                        self.finalize(code, now, Vec::new())
                    }
                    _ => StateStep::default(),
                }
            }
            OperationEvent::ProcessExited { code } => {
                if self.streams_open() {
                    // Output still draining; finish on the last StreamClosed.
                    self.pending_exit = Some(code);
                    StateStep::default()
                } else {
                    self.finalize(code, now, Vec::new())
                }
            }
            OperationEvent::SpawnFailed { message } => {
                let entry = LogEntry {
                    ts: now,
                    level: Severity::Error,
                    status: OperationStatus::Error,
                    stream: StreamKind::Stderr,
                    line: message,
                };
                let published = vec![self.append(entry)];
                self.record.pid = None;
                self.finalize(None, now, published)
            }
        }
    }

    fn streams_open(&self) -> bool {
        self.stdout_open || self.stderr_open
    }

    fn append(&mut self, entry: LogEntry) -> StreamEvent {
        if entry.level == Severity::Error {
            self.record.last_error = Some(entry.line.clone());
        }
        self.log.push(entry.clone());
        StreamEvent::Log(entry)
    }

    fn finalize(
        &mut self,
        code: Option<i32>,
        now: DateTime<Utc>,
        mut published: Vec<StreamEvent>,
    ) -> StateStep {
        let status = if code == Some(0) {
            OperationStatus::Success
        } else {
            OperationStatus::Error
        };

        self.record.status = status;
        self.record.exit_code = code;
        self.record.ended_at = Some(now);

        published.push(StreamEvent::Status(StatusUpdate {
            status,
            exit_code: code,
        }));
        published.push(StreamEvent::End);

        StateStep {
            published,
            finished: true,
        }
    }
}
