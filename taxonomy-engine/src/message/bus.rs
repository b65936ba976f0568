//! Notification bus for taxonomy snapshots
//!
//! # 架构
//!
//! ```text
//! TaxonomyEngine ──▶ publish(TreeReplaced) ──┬──▶ sync handlers (forms, nav, filters)
//!                                            └──▶ broadcast::Sender ──▶ async receivers
//! ```
//!
//! Handlers run synchronously on the publishing thread, in registration
//! order. Async consumers that cannot run inline take a
//! [`broadcast::Receiver`] via [`NotificationBus::receiver`] instead.
//!
//! A publish made from inside a handler is queued and delivered once every
//! handler has seen the current event, so the last snapshot each consumer
//! receives is always the newest one.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, RwLock};
use tokio::sync::broadcast;

use super::{TreeReplaced, DEFAULT_BUS_CAPACITY};

type Handler = Arc<dyn Fn(&TreeReplaced) + Send + Sync>;

struct BusInner {
    handlers: RwLock<Vec<(u64, Handler)>>,
    next_id: AtomicU64,
    tx: broadcast::Sender<TreeReplaced>,
    /// Serializes delivery; re-entered only by the delivering thread
    dispatch: ReentrantMutex<RefCell<Dispatch>>,
}

#[derive(Default)]
struct Dispatch {
    delivering: bool,
    pending: VecDeque<TreeReplaced>,
}

/// Clears the delivering flag even if a handler panics
struct DeliveringGuard<'a>(&'a RefCell<Dispatch>);

impl Drop for DeliveringGuard<'_> {
    fn drop(&mut self) {
        let mut dispatch = self.0.borrow_mut();
        dispatch.delivering = false;
        dispatch.pending.clear();
    }
}

/// Publish/subscribe channel carrying full tree snapshots
///
/// Cheap to clone; every clone publishes to the same subscribers.
#[derive(Clone)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("handlers", &self.inner.handlers.read().len())
            .field("receivers", &self.inner.tx.receiver_count())
            .finish()
    }
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Create a bus whose async receivers buffer `capacity` snapshots
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(BusInner {
                handlers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                tx,
                dispatch: ReentrantMutex::new(RefCell::new(Dispatch::default())),
            }),
        }
    }

    /// Register a synchronous handler
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// dropped or [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&TreeReplaced) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers.write().push((id, Arc::new(handler)));
        tracing::debug!(subscription = id, "Taxonomy subscriber registered");
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Subscribe as an async consumer
    pub fn receiver(&self) -> broadcast::Receiver<TreeReplaced> {
        self.inner.tx.subscribe()
    }

    /// Deliver `event` to every handler, then to async receivers
    ///
    /// Called from inside a handler, the event is queued behind the one
    /// being delivered and this returns immediately.
    pub fn publish(&self, event: TreeReplaced) {
        let dispatch = self.inner.dispatch.lock();
        {
            let mut state = dispatch.borrow_mut();
            state.pending.push_back(event);
            if state.delivering {
                tracing::trace!(queued = state.pending.len(), "Taxonomy snapshot queued");
                return;
            }
            state.delivering = true;
        }

        let _delivering = DeliveringGuard(&*dispatch);
        loop {
            let next = dispatch.borrow_mut().pending.pop_front();
            let Some(event) = next else { break };
            self.deliver(event);
        }
    }

    fn deliver(&self, event: TreeReplaced) {
        // Copy the handler list so handlers may subscribe/unsubscribe re-entrantly
        let handlers: Vec<Handler> = self
            .inner
            .handlers
            .read()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        for handler in &handlers {
            handler(&event);
        }

        let receivers = self.inner.tx.receiver_count();
        if receivers > 0 {
            let _ = self.inner.tx.send(event);
        }
        tracing::trace!(handlers = handlers.len(), receivers, "Taxonomy snapshot published");
    }

    /// Number of registered synchronous handlers
    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.read().len()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`NotificationBus::subscribe`]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Detach the handler; equivalent to dropping the handle
    pub fn unsubscribe(self) {}

    fn detach(&self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.handlers.write().retain(|(id, _)| *id != self.id);
            tracing::debug!(subscription = self.id, "Taxonomy subscriber removed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
