// src/stream/event_stream.rs

//! `text/event-stream` framing for operation streams.
//!
//! A stream consists of one `snapshot` frame followed by `log` frames, one
//! `status` frame and a final `end` frame:
//!
//! ```text
//! event: log
//! data: {"ts":"...","level":"info","status":"running","stream":"stdout","line":"hello"}
//!
//! ```

use serde::Serialize;
use serde_json::json;

use crate::errors::Result;
use crate::operation::OperationSnapshot;

use super::StreamEvent;

/// Content type an HTTP surface should announce for these frames.
pub const CONTENT_TYPE: &str = "text/event-stream";

/// Encode one named frame with a JSON payload.
pub fn encode_frame<T: Serialize + ?Sized>(event: &str, data: &T) -> Result<String> {
    let payload = serde_json::to_string(data)?;
    Ok(format!("event: {event}\ndata: {payload}\n\n"))
}

/// The initial `snapshot` frame (`{"op": ..., "logs": [...]}`).
pub fn encode_snapshot(snapshot: &OperationSnapshot) -> Result<String> {
    encode_frame("snapshot", snapshot)
}

/// A live event frame.
pub fn encode_event(event: &StreamEvent) -> Result<String> {
    match event {
        StreamEvent::Log(entry) => encode_frame(event.name(), entry),
        StreamEvent::Status(update) => encode_frame(event.name(), update),
        StreamEvent::End => encode_frame(event.name(), &json!({ "ok": true })),
    }
}
