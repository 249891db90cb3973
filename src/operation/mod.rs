// src/operation/mod.rs

//! Operation data model and lifecycle.
//!
//! - [`record`] holds the launch request, the record, log entries and
//!   snapshots.
//! - [`log_buffer`] is the bounded FIFO log kept per operation.
//! - [`state`] is the pure `Running -> Success | Error` state machine driven
//!   by launcher and multiplexer events.

pub mod log_buffer;
pub mod record;
pub mod state;

pub use log_buffer::LogBuffer;
pub use record::{LaunchRequest, LogEntry, OperationRecord, OperationSnapshot};
pub use state::{OperationEvent, OperationState, StateStep};
