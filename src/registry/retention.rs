// src/registry/retention.rs

//! Retention policy for tracked operations.

use chrono::{DateTime, Utc};

use crate::types::OperationId;

/// What the policy needs to know about one tracked operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionCandidate {
    pub id: OperationId,
    pub started_at: DateTime<Utc>,
    pub sequence: u64,
    pub running: bool,
}

/// Pick the operations to evict so that at most `limit` remain.
///
/// Candidates are considered oldest first (by start time, then creation
/// sequence). Running operations are never selected; they are skipped and
/// the next oldest finished one is taken instead. If only running
/// operations are left above the limit, fewer than needed are returned.
pub fn select_evictions(mut candidates: Vec<RetentionCandidate>, limit: usize) -> Vec<OperationId> {
    let mut excess = candidates.len().saturating_sub(limit);
    if excess == 0 {
        return Vec::new();
    }

    candidates.sort_by(|a, b| {
        a.started_at
            .cmp(&b.started_at)
            .then(a.sequence.cmp(&b.sequence))
    });

    let mut evict = Vec::with_capacity(excess);
    for candidate in candidates {
        if excess == 0 {
            break;
        }
        if candidate.running {
            continue;
        }
        evict.push(candidate.id);
        excess -= 1;
    }
    evict
}
