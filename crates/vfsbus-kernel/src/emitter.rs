//! Outbound event emitter.
//!
//! An [`EventEmitter`] is what a virtual file tree uses to talk to its peer:
//! `emit_event` hands an event to the transport sink (a websocket writer, an
//! IPC channel, a test recorder), while `subscribe` listens on the topic bus
//! for events that dispatch republishes.

use std::fmt;
use std::sync::Arc;

use vfsbus_types::{EventType, VfsEvent};

use crate::bus::{SubscriptionToken, TopicBus};

/// Transport callback that carries an event to the peer.
pub type EventSink = Arc<dyn Fn(VfsEvent) + Send + Sync>;

/// Sends events to a peer and subscribes to republished ones.
#[derive(Clone)]
pub struct EventEmitter {
    sink: EventSink,
    bus: TopicBus,
}

impl EventEmitter {
    /// Create an emitter bound to the process-wide bus.
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(VfsEvent) + Send + Sync + 'static,
    {
        Self::with_bus(TopicBus::global(), sink)
    }

    /// Create an emitter bound to a specific bus.
    pub fn with_bus<F>(bus: TopicBus, sink: F) -> Self
    where
        F: Fn(VfsEvent) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
            bus,
        }
    }

    /// An emitter whose sink discards everything. Useful for peers that only
    /// consume events.
    pub fn detached(bus: TopicBus) -> Self {
        Self::with_bus(bus, |_| {})
    }

    /// Send an event to the peer.
    pub fn emit_event(&self, event: VfsEvent) {
        tracing::debug!(event_type = %event.event_type(), "emitting event");
        (self.sink)(event);
    }

    /// Subscribe to events of `event_type` republished on the bus.
    pub fn subscribe<F>(&self, event_type: EventType, handler: F) -> SubscriptionToken
    where
        F: Fn(&VfsEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(event_type.topic(), handler)
    }

    /// Drop a subscription made through [`EventEmitter::subscribe`].
    pub fn unsubscribe(&self, token: &SubscriptionToken) -> bool {
        self.bus.unsubscribe(token)
    }

    /// The bus this emitter subscribes on and dispatch publishes to.
    pub fn bus(&self) -> &TopicBus {
        &self.bus
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_emit_goes_to_sink() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = sent.clone();
        let emitter = EventEmitter::with_bus(TopicBus::new(), move |e| sink.lock().unwrap().push(e));

        emitter.emit_event(VfsEvent::delete_file("/old.txt"));

        assert_eq!(*sent.lock().unwrap(), vec![VfsEvent::delete_file("/old.txt")]);
    }

    #[test]
    fn test_emit_does_not_touch_bus() {
        let bus = TopicBus::new();
        let emitter = EventEmitter::detached(bus.clone());
        let (_token, mut rx) = bus.subscribe_channel("DELETE_FILE");

        emitter.emit_event(VfsEvent::delete_file("/old.txt"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subscribe_by_event_type() {
        let bus = TopicBus::new();
        let emitter = EventEmitter::detached(bus.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        let token = emitter.subscribe(EventType::RenameFile, move |e| {
            log.lock().unwrap().push(e.clone());
        });
        assert_eq!(token.topic(), "RENAME_FILE");

        let event = VfsEvent::rename_file("/a.txt", "b.txt");
        bus.publish("RENAME_FILE", &event);
        assert_eq!(*seen.lock().unwrap(), vec![event.clone()]);

        assert!(emitter.unsubscribe(&token));
        bus.publish("RENAME_FILE", &event);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_new_binds_to_global_bus() {
        let emitter = EventEmitter::new(|_| {});
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        let token = emitter.subscribe(EventType::ResetFiles, move |e| {
            log.lock().unwrap().push(e.clone());
        });
        assert!(TopicBus::global().has_subscribers("RESET_VIRTUAL_FILE"));

        TopicBus::global().publish("RESET_VIRTUAL_FILE", &VfsEvent::reset_files());
        assert_eq!(*seen.lock().unwrap(), vec![VfsEvent::reset_files()]);

        assert!(emitter.unsubscribe(&token));
        assert!(!TopicBus::global().unsubscribe(&token));
    }
}
