//! Playback events
//!
//! Native element and engine callbacks are funnelled into one closed set of
//! [`PlaybackEvent`]s. Adapters never hold the event bus directly: each
//! binding hands them an [`EventSink`] that is closed on teardown, after
//! which every emit is dropped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use streamtorrent_domain::{BindingId, QualityLadder, VariantTrack};

/// Events raised by the adaptive-streaming engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Error { message: String },
    BufferingChanged(bool),
    /// The engine switched renditions; `active` is the newly active variant.
    AdaptationChanged { active: Option<VariantTrack> },
    TrackListChanged { tracks: Vec<VariantTrack> },
}

/// Events raised by the native media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaElementEvent {
    TimeUpdate,
    DurationChange,
    Play,
    Pause,
    VolumeChange,
    RateChange,
    Waiting,
    Stalled,
    CanPlay,
    Playing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Engine {
        binding: BindingId,
        event: EngineEvent,
    },
    Element {
        binding: BindingId,
        event: MediaElementEvent,
    },
    /// A binding finished loading and is now current.
    BindingReady {
        binding: BindingId,
        ladder: QualityLadder,
    },
    /// `binding` was torn down.
    BindingCleared { binding: BindingId },
}

/// Per-binding handle adapters use to report native callbacks.
#[derive(Clone)]
pub struct EventSink {
    binding: BindingId,
    live: Arc<AtomicBool>,
    deliver: Arc<dyn Fn(PlaybackEvent) + Send + Sync>,
}

impl EventSink {
    pub fn new(binding: BindingId, deliver: Arc<dyn Fn(PlaybackEvent) + Send + Sync>) -> Self {
        Self {
            binding,
            live: Arc::new(AtomicBool::new(true)),
            deliver,
        }
    }

    pub fn binding(&self) -> BindingId {
        self.binding
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn engine(&self, event: EngineEvent) {
        if self.is_live() {
            (self.deliver)(PlaybackEvent::Engine {
                binding: self.binding,
                event,
            });
        }
    }

    pub fn element(&self, event: MediaElementEvent) {
        if self.is_live() {
            (self.deliver)(PlaybackEvent::Element {
                binding: self.binding,
                event,
            });
        }
    }

    /// Stop delivering. Shared by every clone of this sink.
    pub fn close(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("binding", &self.binding)
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closed_sink_drops_events_for_all_clones() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = Arc::clone(&received);
        let sink = EventSink::new(
            BindingId::new(),
            Arc::new(move |event| received_clone.lock().expect("lock").push(event)),
        );
        let adapter_copy = sink.clone();

        adapter_copy.element(MediaElementEvent::TimeUpdate);
        sink.close();
        adapter_copy.element(MediaElementEvent::TimeUpdate);
        adapter_copy.engine(EngineEvent::BufferingChanged(true));

        assert_eq!(received.lock().expect("lock").len(), 1);
        assert!(!adapter_copy.is_live());
    }
}
