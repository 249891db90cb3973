// src/multiplex/fanout.rs

//! Subscriber list for one operation.

use tokio::sync::mpsc;
use tracing::trace;

use crate::stream::StreamEvent;

pub type SubscriberId = u64;

/// Broadcast list of per-subscriber channels.
///
/// Each subscriber gets its own unbounded channel, so a send never blocks
/// and a slow reader cannot hold up the others. Receivers that were dropped
/// are pruned on the next broadcast.
#[derive(Debug, Default)]
pub struct Fanout {
    next_id: SubscriberId,
    subscribers: Vec<(SubscriberId, mpsc::UnboundedSender<StreamEvent>)>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> (SubscriberId, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, tx));
        (id, rx)
    }

    /// Remove a subscriber; returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn broadcast(&mut self, event: &StreamEvent) {
        self.subscribers.retain(|(id, tx)| {
            let delivered = tx.send(event.clone()).is_ok();
            if !delivered {
                trace!(subscriber = *id, "dropping closed subscriber");
            }
            delivered
        });
    }

    /// Drop every sender, closing all subscriber channels.
    pub fn close(&mut self) {
        self.subscribers.clear();
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
