//! Subscription fan-out for live updates.
//!
//! [`SubscriberRegistry`] owns one bounded channel per viewer. Broadcasting
//! walks the registry under a read lock and hands each subscriber a copy of
//! the update with `try_send`, so a slow viewer never stalls ingestion.
//! An open subscription sees every update in order or none at all: a viewer
//! whose buffer is full is dropped along with closed ones, ending its
//! receiver after the queued updates drain. Nothing is replayed.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::LiveUpdate;

/// Default per-subscriber buffer.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Identifier of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receiving end of a subscription.
///
/// Dropping it closes the channel; the registry prunes it on the next
/// broadcast.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<LiveUpdate>,
}

impl Subscription {
    /// Returns the subscription id, used to unsubscribe.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next update. Returns `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<LiveUpdate> {
        self.receiver.recv().await
    }

    /// Returns the next update if one is already queued.
    pub fn try_recv(&mut self) -> Option<LiveUpdate> {
        self.receiver.try_recv().ok()
    }
}

/// Concurrent registry of live-update subscribers.
pub struct SubscriberRegistry {
    senders: RwLock<HashMap<SubscriptionId, mpsc::Sender<LiveUpdate>>>,
    buffer: usize,
}

impl SubscriberRegistry {
    /// Creates an empty registry with the given per-subscriber buffer.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Registers a new subscriber. It receives every update broadcast from
    /// now on.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let id = SubscriptionId::new();
        self.senders.write().insert(id, sender);
        debug!(subscription = %id, "Subscriber added");
        Subscription { id, receiver }
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.senders.write().remove(&id).is_some();
        if removed {
            debug!(subscription = %id, "Subscriber removed");
        }
        removed
    }

    /// Hands the update to every active subscriber.
    ///
    /// Returns the number of subscribers it was queued for.
    pub fn broadcast(&self, update: &LiveUpdate) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let senders = self.senders.read();
            for (id, sender) in senders.iter() {
                match sender.try_send(update.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(subscription = %id, kind = update.kind(), "Subscriber buffer full, dropping subscriber");
                        closed.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut senders = self.senders.write();
            for id in &closed {
                senders.remove(id);
            }
            debug!(count = closed.len(), "Pruned failed subscribers");
        }

        delivered
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.read().len()
    }

    /// Returns true if nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.read().is_empty()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .field("buffer", &self.buffer)
            .finish()
    }
}
