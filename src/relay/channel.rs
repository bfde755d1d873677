//! Broadcast relay for move events
//!
//! One channel exists per arena session. It opens on the first subscription
//! and closes when the last subscription is dropped; publishing into a
//! closed channel fails with [`RelayError::ChannelUnavailable`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::arena::Direction;

/// Default per-subscriber backlog before a slow receiver starts skipping
pub const DEFAULT_RELAY_CAPACITY: usize = 64;

/// A directional command, tagged with the connection that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEvent {
    pub direction: Direction,
    pub origin: Uuid,
}

/// Relay errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("Relay channel unavailable")]
    ChannelUnavailable,
}

struct Slot {
    sender: Option<broadcast::Sender<MoveEvent>>,
    subscribers: usize,
}

struct Inner {
    capacity: usize,
    slot: Mutex<Slot>,
}

/// Handle to the relay channel; clones share the same channel
#[derive(Clone)]
pub struct RelayChannel {
    inner: Arc<Inner>,
}

impl RelayChannel {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                capacity: capacity.max(1),
                slot: Mutex::new(Slot {
                    sender: None,
                    subscribers: 0,
                }),
            }),
        }
    }

    /// Whether at least one subscriber keeps the channel open
    pub fn is_open(&self) -> bool {
        self.inner.slot.lock().sender.is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.slot.lock().subscribers
    }

    /// Join the channel, opening it if needed.
    ///
    /// Only events published after this call are delivered.
    pub fn subscribe(&self, conn_id: Uuid) -> Subscription {
        let mut slot = self.inner.slot.lock();
        let sender = slot.sender.get_or_insert_with(|| {
            info!("Relay channel opened");
            broadcast::channel(self.inner.capacity).0
        });
        let rx = sender.subscribe();
        slot.subscribers += 1;
        debug!(conn_id = %conn_id, subscribers = slot.subscribers, "Relay subscribe");

        Subscription {
            conn_id,
            rx,
            inner: self.inner.clone(),
        }
    }

    /// Fan a move event out to every current subscriber.
    ///
    /// Returns how many subscribers the event was handed to.
    pub fn publish(&self, event: MoveEvent) -> Result<usize, RelayError> {
        let sender = self
            .inner
            .slot
            .lock()
            .sender
            .clone()
            .ok_or(RelayError::ChannelUnavailable)?;

        let delivered = sender.send(event).unwrap_or(0);
        debug!(
            origin = %event.origin,
            direction = %event.direction,
            delivered,
            "Relayed move"
        );
        Ok(delivered)
    }
}

impl Default for RelayChannel {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_CAPACITY)
    }
}

/// Membership in the relay channel; dropping it unsubscribes
pub struct Subscription {
    conn_id: Uuid,
    rx: broadcast::Receiver<MoveEvent>,
    inner: Arc<Inner>,
}

impl Subscription {
    /// Next delivered event; `None` once the channel is gone
    pub async fn recv(&mut self) -> Option<MoveEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(conn_id = %self.conn_id, skipped = n, "Relay subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-delivered event, without waiting
    pub fn try_recv(&mut self) -> Option<MoveEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(conn_id = %self.conn_id, skipped = n, "Relay subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut slot = self.inner.slot.lock();
        slot.subscribers = slot.subscribers.saturating_sub(1);
        debug!(conn_id = %self.conn_id, subscribers = slot.subscribers, "Relay unsubscribe");

        if slot.subscribers == 0 && slot.sender.take().is_some() {
            info!("Relay channel closed");
        }
    }
}
