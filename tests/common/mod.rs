#![allow(dead_code)]

pub mod builders;

use std::sync::{Arc, Once};
use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::{EnvFilter, fmt};

use opvisor::multiplex::{Classifier, OperationHandle};
use opvisor::operation::{LaunchRequest, LogEntry, OperationRecord};
use opvisor::stream::{StreamEvent, Subscription};
use opvisor::types::{OperationId, StreamKind};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

pub fn classifier() -> Arc<Classifier> {
    Arc::new(Classifier::standard().expect("built-in patterns compile"))
}

pub fn running_record(seq: u64, request: &LaunchRequest) -> OperationRecord {
    OperationRecord::running(OperationId::new(1_700_000_000_000, seq), request, Utc::now())
}

/// A standalone handle that no registry knows about.
pub fn standalone_handle(log_capacity: usize) -> OperationHandle {
    let request = LaunchRequest::new("test", "true");
    OperationHandle::new(running_record(0, &request), 0, log_capacity, classifier())
}

pub fn entry(stream: StreamKind, line: &str) -> LogEntry {
    classifier().entry(stream, line.to_string(), Utc::now())
}

/// Lines of every `Log` event, in order.
pub fn log_lines(events: &[StreamEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Log(entry) => Some(entry.line.clone()),
            _ => None,
        })
        .collect()
}

/// Snapshot entries followed by every live entry until the stream ends.
pub async fn drain(subscription: Subscription) -> (Vec<LogEntry>, Vec<StreamEvent>) {
    let mut logs = subscription.snapshot().logs.clone();
    let events = tokio::time::timeout(Duration::from_secs(10), subscription.collect())
        .await
        .expect("operation stream did not end in time");
    logs.extend(events.iter().filter_map(|e| match e {
        StreamEvent::Log(entry) => Some(entry.clone()),
        _ => None,
    }));
    (logs, events)
}
