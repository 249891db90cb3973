// src/stream/mod.rs

//! Stream publisher.
//!
//! - [`subscription`] is the per-observer handle returned by `subscribe`:
//!   an initial snapshot plus a live channel of [`StreamEvent`]s.
//! - [`event_stream`] encodes snapshots and events as `text/event-stream`
//!   frames.

use serde::Serialize;

use crate::operation::LogEntry;
use crate::types::OperationStatus;

pub mod event_stream;
pub mod subscription;

pub use subscription::Subscription;

/// Terminal status published once when an operation finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: OperationStatus,
    pub exit_code: Option<i32>,
}

/// Live event delivered to subscribers after their snapshot.
///
/// Per operation the sequence is: any number of `Log`, then exactly one
/// `Status`, then `End`, after which the channel closes.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Log(LogEntry),
    Status(StatusUpdate),
    End,
}

impl StreamEvent {
    /// Event name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Log(_) => "log",
            StreamEvent::Status(_) => "status",
            StreamEvent::End => "end",
        }
    }
}
