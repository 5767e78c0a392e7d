//! Event hub: bounded newest-first event buffer plus live fan-out.
//!
//! Every published event is prepended to the buffer (truncated to
//! capacity) and offered to each subscriber's bounded queue. Offers never
//! block: a subscriber whose queue is full misses that event and nobody
//! else notices.
//!
//! Buffer and subscriber set share one reader/writer lock. The lock is
//! never held across an await point.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc::{self, error::TrySendError};

use meshgate_core::config::HubConfig;
use meshgate_core::PeerEvent;

/// Identity of a registered subscriber queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct HubState {
    /// Newest first.
    buffer: VecDeque<PeerEvent>,
    subscribers: HashMap<SubscriberId, mpsc::Sender<PeerEvent>>,
}

struct HubInner {
    state: RwLock<HubState>,
    capacity: usize,
    queue_depth: usize,
    next_id: AtomicU64,
}

/// Cheap to clone; all clones share the same buffer and subscribers.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl EventHub {
    pub fn new(capacity: usize, queue_depth: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                state: RwLock::new(HubState {
                    buffer: VecDeque::with_capacity(capacity.min(4096)),
                    subscribers: HashMap::new(),
                }),
                capacity,
                // mpsc::channel panics on zero capacity
                queue_depth: queue_depth.max(1),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn from_config(config: &HubConfig) -> Self {
        Self::new(config.buffer_capacity, config.subscriber_queue)
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    // Hub state is consistent after every mutation, so a poisoned lock is
    // safe to keep using.
    fn read(&self) -> RwLockReadGuard<'_, HubState> {
        self.inner.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HubState> {
        self.inner.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the buffer, newest first.
    pub fn snapshot(&self) -> Vec<PeerEvent> {
        self.read().buffer.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().buffer.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.read().subscribers.len()
    }

    /// Register a new bounded queue. Only events published after this call
    /// are delivered to it.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.inner.queue_depth);
        self.write().subscribers.insert(id, tx);
        tracing::debug!(subscriber = id.0, "subscriber registered");
        Subscription {
            id,
            rx,
            hub: self.clone(),
        }
    }

    /// Deregister a subscriber and close its queue.
    ///
    /// Returns false if it was already gone; calling twice is harmless.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.write().subscribers.remove(&id).is_some();
        if removed {
            tracing::debug!(subscriber = id.0, "subscriber removed");
        }
        removed
    }

    /// Buffer `event` and offer it to every subscriber without blocking.
    ///
    /// Returns how many subscribers accepted it.
    pub fn publish(&self, event: PeerEvent) -> usize {
        let mut state = self.write();
        let capacity = self.inner.capacity;

        state.buffer.push_front(event.clone());
        state.buffer.truncate(capacity);

        let mut delivered = 0;
        state.subscribers.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::trace!(subscriber = id.0, "subscriber queue full, event dropped");
                true
            }
            // Receiver gone without unsubscribing.
            Err(TrySendError::Closed(_)) => false,
        });
        delivered
    }
}

/// A live registration with the hub. Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<PeerEvent>,
    hub: EventHub,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event in publish order; `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<PeerEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<PeerEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}
