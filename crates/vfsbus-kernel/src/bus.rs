//! Topic bus — in-process publish/subscribe keyed by topic string.
//!
//! Every dispatched event is republished here under its topic
//! (`CREATE_DIR`, `SET_FILE_CONTENT`, ...) so editors, indexers and other
//! observers can react without being wired into the dispatch path.
//!
//! Delivery is synchronous: `publish` returns after every current
//! subscriber of the topic has run. The registry lock is released before
//! handlers are called, so a handler may subscribe or unsubscribe (itself
//! included) without deadlocking.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tokio::sync::mpsc;
use vfsbus_types::VfsEvent;

/// Callback invoked for each event published on a subscribed topic.
pub type Handler = Arc<dyn Fn(&VfsEvent) + Send + Sync>;

/// Handle returned by [`TopicBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    topic: String,
    id: u64,
}

impl SubscriptionToken {
    /// Topic this subscription listens on.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uid_{}", self.id)
    }
}

struct Subscriber {
    id: u64,
    handler: Handler,
}

struct BusInner {
    next_id: AtomicU64,
    topics: RwLock<HashMap<String, Vec<Subscriber>>>,
}

/// In-process publish/subscribe bus.
///
/// Cheap to clone; clones share the same subscriber registry. Use
/// [`TopicBus::global`] for the process-wide instance, or [`TopicBus::new`]
/// for an isolated one (tests, embedded peers).
#[derive(Clone)]
pub struct TopicBus {
    inner: Arc<BusInner>,
}

static GLOBAL_BUS: OnceLock<TopicBus> = OnceLock::new();

impl Default for TopicBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicBus {
    /// Create a new bus with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(1),
                topics: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide bus.
    pub fn global() -> TopicBus {
        GLOBAL_BUS.get_or_init(TopicBus::new).clone()
    }

    /// Subscribe `handler` to `topic`.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> SubscriptionToken
    where
        F: Fn(&VfsEvent) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        // Handlers never run under this lock, so a poisoned map is still consistent.
        let mut topics = self
            .inner
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        topics.entry(topic.clone()).or_default().push(Subscriber {
            id,
            handler: Arc::new(handler),
        });

        tracing::trace!(topic = %topic, id, "subscribed");
        SubscriptionToken { topic, id }
    }

    /// Subscribe to `topic` and receive events on a channel instead of a callback.
    ///
    /// The subscription outlives the receiver; call [`TopicBus::unsubscribe`]
    /// with the returned token when done.
    pub fn subscribe_channel(
        &self,
        topic: impl Into<String>,
    ) -> (SubscriptionToken, mpsc::UnboundedReceiver<VfsEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = self.subscribe(topic, move |event: &VfsEvent| {
            // Receiver gone: nothing left to deliver to.
            let _ = tx.send(event.clone());
        });
        (token, rx)
    }

    /// Remove a single subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, token: &SubscriptionToken) -> bool {
        let mut topics = self
            .inner
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(subscribers) = topics.get_mut(&token.topic) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != token.id);
        let removed = subscribers.len() != before;

        if subscribers.is_empty() {
            topics.remove(&token.topic);
        }
        removed
    }

    /// Remove every subscription on `topic`. Returns how many were removed.
    pub fn unsubscribe_topic(&self, topic: &str) -> usize {
        self.inner
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(topic)
            .map_or(0, |subscribers| subscribers.len())
    }

    /// Remove every subscription on every topic.
    pub fn clear(&self) {
        self.inner
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Deliver `event` to every subscriber of `topic`.
    ///
    /// Returns the number of handlers invoked; 0 means nobody was listening.
    pub fn publish(&self, topic: &str, event: &VfsEvent) -> usize {
        let handlers: Vec<Handler> = {
            let topics = self
                .inner
                .topics
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match topics.get(topic) {
                Some(subscribers) => subscribers.iter().map(|s| s.handler.clone()).collect(),
                None => return 0,
            }
        };

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// True if `topic` has at least one subscriber.
    pub fn has_subscribers(&self, topic: &str) -> bool {
        self.subscriber_count(topic) > 0
    }

    /// Number of subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for TopicBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self
            .inner
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut counts: Vec<_> = topics.iter().map(|(t, s)| (t.clone(), s.len())).collect();
        counts.sort();
        f.debug_struct("TopicBus").field("topics", &counts).finish()
    }
}
