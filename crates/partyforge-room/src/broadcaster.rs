//! Per-room event fan-out.
//!
//! Every viewer gets its own bounded queue. Publishing never blocks: a
//! viewer whose queue is full simply misses that event. Events carry no
//! payload, so the next event it does receive makes it re-fetch the same
//! state it would have fetched for the missed one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use partyforge_protocol::RoomEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use crate::lock;

/// Queue depth for each subscriber.
pub const SUBSCRIBER_CAPACITY: usize = 10;

/// Handle identifying one subscription within its broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Fan-out of [`RoomEvent`]s to a dynamic set of subscribers.
#[derive(Default)]
pub struct Broadcaster {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<RoomEvent>>>,
    next_id: AtomicU64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber with an empty queue of
    /// [`SUBSCRIBER_CAPACITY`] events.
    ///
    /// Dropping the returned [`Subscription`] is enough to leave: its
    /// sender is pruned on the next publish.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        lock(&self.subscribers).insert(id, tx);
        tracing::debug!(subscriber = %id, "subscribed");
        Subscription { id, receiver: rx }
    }

    /// Removes a subscriber and closes its queue.
    ///
    /// Events already queued stay readable; after them the subscription
    /// reports closed. Returns `false` if the id was not subscribed, so a
    /// second call is a harmless no-op.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = lock(&self.subscribers).remove(&id).is_some();
        if removed {
            tracing::debug!(subscriber = %id, "unsubscribed");
        }
        removed
    }

    /// Offers `event` to every subscriber without blocking.
    ///
    /// Returns how many queues accepted it. Full queues drop the event;
    /// queues whose receiver is gone are removed.
    pub fn publish(&self, event: RoomEvent) -> usize {
        let mut subscribers = lock(&self.subscribers);
        let mut delivered = 0;
        subscribers.retain(|id, tx| match tx.try_send(event) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::trace!(subscriber = %id, %event, "subscriber lagging, event dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(subscriber = %id, "subscriber gone, pruned");
                false
            }
        });
        delivered
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Receiving end of one subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<RoomEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next event. `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        self.receiver.recv().await
    }

    /// Takes the next queued event without waiting.
    pub fn try_recv(&mut self) -> Result<RoomEvent, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drains everything currently queued.
    pub fn drain(&mut self) -> Vec<RoomEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}
