//! Event Bus for playback events.
//!
//! The EventBus provides a push-based subscription model: engine and surface
//! adapters emit through per-binding [`EventSink`]s, and subscribers (in
//! practice the playback state projector) receive every event synchronously.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use streamtorrent_domain::BindingId;

use crate::ports::outbound::{EventSink, PlaybackEvent};

type Subscriber = Arc<dyn Fn(PlaybackEvent) + Send + Sync + 'static>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Event bus for playback events.
///
/// Dispatch copies the subscriber list before invoking callbacks, so a
/// callback may itself dispatch (e.g. a control call that makes the surface
/// emit a native event) without deadlocking.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<(SubscriptionId, Subscriber)>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new EventBus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all events.
    pub fn subscribe(&self, callback: impl Fn(PlaybackEvent) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    /// Dispatch an event to all subscribers.
    ///
    /// Each subscriber's callback is invoked with a clone of the event.
    pub fn dispatch(&self, event: PlaybackEvent) {
        let subscribers: Vec<Subscriber> = self.lock().iter().map(|(_, s)| Arc::clone(s)).collect();
        for subscriber in subscribers {
            subscriber(event.clone());
        }
    }

    /// Create a live sink that tags events with `binding`.
    pub fn sink_for(&self, binding: BindingId) -> EventSink {
        let bus = self.clone();
        EventSink::new(binding, Arc::new(move |event| bus.dispatch(event)))
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Clear all subscribers.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Subscriber)>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MediaElementEvent;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_subscribe_and_dispatch() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU32::new(0));

        let count_clone = Arc::clone(&count);
        bus.subscribe(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.subscriber_count(), 1);

        let binding = BindingId::new();
        bus.dispatch(PlaybackEvent::BindingCleared { binding });
        bus.dispatch(PlaybackEvent::BindingCleared { binding });

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU32::new(0));

        let count_clone = Arc::clone(&count);
        let id = bus.subscribe(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.dispatch(PlaybackEvent::BindingCleared {
            binding: BindingId::new(),
        });

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_sink_tags_events_and_stops_after_close() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        bus.subscribe(move |event| seen_clone.lock().expect("lock").push(event));

        let binding = BindingId::new();
        let sink = bus.sink_for(binding);
        sink.element(MediaElementEvent::Play);
        sink.close();
        sink.element(MediaElementEvent::Pause);

        let seen = seen.lock().expect("lock");
        assert_eq!(
            *seen,
            vec![PlaybackEvent::Element {
                binding,
                event: MediaElementEvent::Play
            }]
        );
    }

    #[test]
    fn test_reentrant_dispatch_does_not_deadlock() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU32::new(0));

        let inner_bus = bus.clone();
        let count_clone = Arc::clone(&count);
        bus.subscribe(move |event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
            if let PlaybackEvent::BindingReady { binding, .. } = event {
                inner_bus.dispatch(PlaybackEvent::BindingCleared { binding });
            }
        });

        bus.dispatch(PlaybackEvent::BindingReady {
            binding: BindingId::new(),
            ladder: Default::default(),
        });

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
