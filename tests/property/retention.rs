use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use opvisor::registry::retention::{RetentionCandidate, select_evictions};
use opvisor::types::OperationId;

fn candidates(flags: &[(i64, bool)]) -> Vec<RetentionCandidate> {
    flags
        .iter()
        .enumerate()
        .map(|(seq, (offset, running))| RetentionCandidate {
            id: OperationId::new(*offset, seq as u64),
            started_at: Utc.timestamp_millis_opt(1_700_000_000_000 + offset).unwrap(),
            sequence: seq as u64,
            running: *running,
        })
        .collect()
}

proptest! {
    #[test]
    fn evicts_only_the_oldest_finished_operations(
        flags in proptest::collection::vec((0i64..20, any::<bool>()), 0..80),
        limit in 1usize..60,
    ) {
        let all = candidates(&flags);
        let evicted = select_evictions(all.clone(), limit);

        let excess = all.len().saturating_sub(limit);
        let finished = all.iter().filter(|c| !c.running).count();
        prop_assert_eq!(evicted.len(), excess.min(finished));

        let mut by_age = all.clone();
        by_age.sort_by_key(|c| (c.started_at, c.sequence));
        let expected: Vec<OperationId> = by_age
            .into_iter()
            .filter(|c| !c.running)
            .take(evicted.len())
            .map(|c| c.id)
            .collect();
        prop_assert_eq!(evicted, expected);
    }
}
