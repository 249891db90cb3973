// src/stream/subscription.rs

use tokio::sync::mpsc;

use crate::multiplex::SubscriberId;
use crate::multiplex::handle::WeakHandle;
use crate::operation::OperationSnapshot;
use crate::types::OperationId;

use super::StreamEvent;

/// One observer of one operation.
///
/// Holds the snapshot taken at subscription time and receives every later
/// event in append order. Dropping the subscription (or calling
/// [`Subscription::unsubscribe`]) detaches it without affecting other
/// subscribers or the operation.
#[derive(Debug)]
pub struct Subscription {
    snapshot: OperationSnapshot,
    subscriber: Option<SubscriberId>,
    rx: mpsc::UnboundedReceiver<StreamEvent>,
    owner: WeakHandle,
}

impl Subscription {
    pub(crate) fn new(
        snapshot: OperationSnapshot,
        subscriber: Option<SubscriberId>,
        rx: mpsc::UnboundedReceiver<StreamEvent>,
        owner: WeakHandle,
    ) -> Self {
        Self {
            snapshot,
            subscriber,
            rx,
            owner,
        }
    }

    pub fn operation_id(&self) -> &OperationId {
        &self.snapshot.operation.id
    }

    /// Record and full retained log as of subscription time.
    pub fn snapshot(&self) -> &OperationSnapshot {
        &self.snapshot
    }

    /// Next live event; `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Option<StreamEvent> {
        self.rx.try_recv().ok()
    }

    /// Collect every remaining event until the stream closes.
    pub async fn collect(mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.recv().await {
            events.push(event);
        }
        events
    }

    /// Detach early.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let (Some(subscriber), Some(handle)) = (self.subscriber, self.owner.upgrade()) {
            handle.unsubscribe(subscriber);
        }
    }
}
