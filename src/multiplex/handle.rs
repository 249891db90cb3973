// src/multiplex/handle.rs

//! Shared per-operation cell: state machine, bounded log and subscribers
//! behind one lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::operation::{
    OperationEvent, OperationRecord, OperationSnapshot, OperationState, StateStep,
};
use crate::stream::{StreamEvent, Subscription};
use crate::types::{OperationId, OperationStatus, StreamKind};

use super::classify::Classifier;
use super::fanout::{Fanout, SubscriberId};

struct OperationCell {
    id: OperationId,
    sequence: u64,
    classifier: Arc<Classifier>,
    state: Mutex<CellState>,
}

struct CellState {
    machine: OperationState,
    fanout: Fanout,
}

/// Cloneable handle to one operation.
///
/// Every mutation goes through [`OperationHandle::apply`], which applies the
/// event to the state machine and publishes the resulting events while
/// still holding the operation's lock. Readers therefore never see a torn
/// record, and every subscriber observes the exact append order.
#[derive(Clone)]
pub struct OperationHandle {
    cell: Arc<OperationCell>,
}

impl std::fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationHandle")
            .field("id", &self.cell.id)
            .field("sequence", &self.cell.sequence)
            .finish_non_exhaustive()
    }
}

impl OperationHandle {
    pub fn new(
        record: OperationRecord,
        sequence: u64,
        log_capacity: usize,
        classifier: Arc<Classifier>,
    ) -> Self {
        let id = record.id.clone();
        let cell = OperationCell {
            id,
            sequence,
            classifier,
            state: Mutex::new(CellState {
                machine: OperationState::new(record, log_capacity),
                fanout: Fanout::new(),
            }),
        };
        Self {
            cell: Arc::new(cell),
        }
    }

    pub fn id(&self) -> &OperationId {
        &self.cell.id
    }

    /// Creation order within the owning registry.
    pub fn sequence(&self) -> u64 {
        self.cell.sequence
    }

    /// Apply one lifecycle event and fan out whatever it publishes.
    pub fn apply(&self, event: OperationEvent) -> StateStep {
        let mut state = self.lock();
        let step = state.machine.apply(event, Utc::now());

        for published in &step.published {
            state.fanout.broadcast(published);
        }

        if step.finished {
            let record = state.machine.record();
            info!(
                op = %record.id,
                kind = %record.kind,
                status = %record.status,
                exit_code = ?record.exit_code,
                subscribers = state.fanout.len(),
                "operation finished"
            );
            state.fanout.close();
        }

        step
    }

    /// Classify one output line and append it.
    pub fn ingest_line(&self, stream: StreamKind, line: String) {
        let entry = self.cell.classifier.entry(stream, line, Utc::now());
        self.apply(OperationEvent::LineReceived(entry));
    }

    pub fn record(&self) -> OperationRecord {
        self.lock().machine.record().clone()
    }

    pub fn status(&self) -> OperationStatus {
        self.lock().machine.status()
    }

    pub fn is_running(&self) -> bool {
        !self.status().is_terminal()
    }

    pub fn snapshot(&self) -> OperationSnapshot {
        self.lock().machine.snapshot()
    }

    pub fn snapshot_tail(&self, tail: usize) -> OperationSnapshot {
        self.lock().machine.snapshot_tail(tail)
    }

    /// Register a new subscriber.
    ///
    /// The snapshot is taken under the same lock as the registration, so the
    /// live channel starts exactly after the last entry in the snapshot. An
    /// operation that already finished yields its snapshot and an immediate
    /// `End`.
    pub fn subscribe(&self) -> Subscription {
        let mut state = self.lock();
        let snapshot = state.machine.snapshot();

        if state.machine.is_terminal() {
            let (tx, rx) = mpsc::unbounded_channel();
            let _ = tx.send(StreamEvent::End);
            return Subscription::new(snapshot, None, rx, self.downgrade());
        }

        let (subscriber, rx) = state.fanout.subscribe();
        debug!(
            op = %self.cell.id,
            subscriber,
            subscribers = state.fanout.len(),
            "subscriber attached"
        );
        Subscription::new(snapshot, Some(subscriber), rx, self.downgrade())
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().fanout.len()
    }

    pub(crate) fn unsubscribe(&self, subscriber: SubscriberId) {
        if self.lock().fanout.unsubscribe(subscriber) {
            debug!(op = %self.cell.id, subscriber, "subscriber detached");
        }
    }

    pub(crate) fn downgrade(&self) -> WeakHandle {
        WeakHandle(Arc::downgrade(&self.cell))
    }

    fn lock(&self) -> MutexGuard<'_, CellState> {
        self.cell
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Non-owning reference held by subscriptions.
#[derive(Clone)]
pub(crate) struct WeakHandle(Weak<OperationCell>);

impl std::fmt::Debug for WeakHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakHandle")
            .field("alive", &(self.0.strong_count() > 0))
            .finish()
    }
}

impl WeakHandle {
    pub(crate) fn upgrade(&self) -> Option<OperationHandle> {
        self.0.upgrade().map(|cell| OperationHandle { cell })
    }
}
