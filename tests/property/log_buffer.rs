use chrono::Utc;
use proptest::prelude::*;

use opvisor::operation::{LogBuffer, LogEntry};
use opvisor::types::{OperationStatus, Severity, StreamKind};

fn entry(i: usize, level: Severity) -> LogEntry {
    LogEntry {
        ts: Utc::now(),
        level,
        status: OperationStatus::Running,
        stream: StreamKind::Stdout,
        line: format!("line {i}"),
    }
}

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Info),
        Just(Severity::Warn),
        Just(Severity::Error),
        Just(Severity::Success),
    ]
}

proptest! {
    #[test]
    fn buffer_keeps_exactly_the_most_recent_entries(
        capacity in 1usize..64,
        levels in proptest::collection::vec(severity(), 0..256),
    ) {
        let mut buffer = LogBuffer::new(capacity);
        let mut evicted = 0usize;
        for (i, level) in levels.iter().enumerate() {
            if buffer.push(entry(i, *level)).is_some() {
                evicted += 1;
            }
            prop_assert!(buffer.len() <= capacity);
        }

        let n = levels.len();
        prop_assert_eq!(buffer.len(), n.min(capacity));
        prop_assert_eq!(evicted, n.saturating_sub(capacity));

        // Severity never protects an entry from eviction.
        let kept: Vec<String> = buffer.iter().map(|e| e.line.clone()).collect();
        let expected: Vec<String> = (n.saturating_sub(capacity)..n).map(|i| format!("line {i}")).collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn tail_is_a_suffix_of_the_buffer(
        capacity in 1usize..32,
        pushes in 0usize..64,
        tail in 0usize..48,
    ) {
        let mut buffer = LogBuffer::new(capacity);
        for i in 0..pushes {
            buffer.push(entry(i, Severity::Info));
        }

        let all = buffer.to_vec();
        let tail_entries = buffer.tail(tail);
        prop_assert_eq!(tail_entries.len(), tail.min(all.len()));
        prop_assert_eq!(&all[all.len() - tail_entries.len()..], tail_entries.as_slice());
    }
}
