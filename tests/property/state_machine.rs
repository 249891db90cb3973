use chrono::Utc;
use proptest::prelude::*;

use opvisor::operation::{LaunchRequest, LogEntry, OperationEvent, OperationRecord, OperationState};
use opvisor::stream::StreamEvent;
use opvisor::types::{OperationId, OperationStatus, Severity, StreamKind};

fn stream() -> impl Strategy<Value = StreamKind> {
    prop_oneof![Just(StreamKind::Stdout), Just(StreamKind::Stderr)]
}

fn event() -> impl Strategy<Value = OperationEvent> {
    prop_oneof![
        proptest::option::of(any::<u32>()).prop_map(|pid| OperationEvent::Spawned { pid }),
        (stream(), "[a-z ]{1,8}").prop_map(|(stream, line)| {
            OperationEvent::LineReceived(LogEntry {
                ts: Utc::now(),
                level: Severity::Info,
                status: OperationStatus::Running,
                stream,
                line,
            })
        }),
        stream().prop_map(|stream| OperationEvent::StreamClosed { stream }),
        proptest::option::of(-2i32..3).prop_map(|code| OperationEvent::ProcessExited { code }),
        "[a-z]{1,8}".prop_map(|message| OperationEvent::SpawnFailed { message }),
    ]
}

proptest! {
    #[test]
    fn terminal_transition_happens_at_most_once(
        events in proptest::collection::vec(event(), 0..40),
    ) {
        let request = LaunchRequest::new("prop", "true");
        let record = OperationRecord::running(OperationId::new(0, 0), &request, Utc::now());
        let mut state = OperationState::new(record, 1000);

        let mut finished_steps = 0;
        let mut published_after_finish = 0;
        let mut appended = 0;
        for event in events {
            let was_terminal = state.is_terminal();
            let step = state.apply(event, Utc::now());
            if was_terminal {
                published_after_finish += step.published.len();
                prop_assert!(!step.finished);
            }
            if step.finished {
                finished_steps += 1;
                prop_assert_eq!(step.published.last(), Some(&StreamEvent::End));
                prop_assert!(matches!(
                    step.published[step.published.len() - 2],
                    StreamEvent::Status(_)
                ));
            }
            appended += step
                .published
                .iter()
                .filter(|e| matches!(e, StreamEvent::Log(_)))
                .count();
        }

        prop_assert!(finished_steps <= 1);
        prop_assert_eq!(published_after_finish, 0);
        prop_assert_eq!(state.log().len(), appended);
        prop_assert_eq!(state.is_terminal(), finished_steps == 1);
        if state.is_terminal() {
            prop_assert_eq!(
                state.status() == OperationStatus::Success,
                state.record().exit_code == Some(0)
            );
        }
    }
}
