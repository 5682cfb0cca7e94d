//! Playback State Projector
//!
//! The single subscriber to the playback event bus. Every event from the
//! current binding recomputes the [`PlaybackSnapshot`] from the surface and
//! publishes it; events tagged with any other binding are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use streamtorrent_domain::{
    buffered_fraction, known_duration, BindingId, PlaybackRate, PlaybackSnapshot, QualityLabel,
    QualityLadder,
};
use tokio::sync::watch;

use crate::infrastructure::messaging::{EventBus, SubscriptionId};
use crate::ports::outbound::{
    EngineEvent, MediaElementEvent, MediaSurfacePort, PlaybackEvent, PlaybackNotifier,
};

#[derive(Default)]
struct ProjectorState {
    binding: Option<BindingId>,
    is_buffering: bool,
    active_quality: Option<QualityLabel>,
    selected_quality: QualityLabel,
    ladder: QualityLadder,
}

/// Callbacks collected under the lock and fired after it is released.
enum Notification {
    Error(String),
    Buffering(bool),
    Quality(QualityLabel),
    Time(f64, f64),
}

pub struct PlaybackStateProjector {
    surface: Arc<dyn MediaSurfacePort>,
    notifier: Arc<dyn PlaybackNotifier>,
    state: Mutex<ProjectorState>,
    snapshot: watch::Sender<PlaybackSnapshot>,
}

impl PlaybackStateProjector {
    pub fn new(surface: Arc<dyn MediaSurfacePort>, notifier: Arc<dyn PlaybackNotifier>) -> Self {
        Self {
            surface,
            notifier,
            state: Mutex::new(ProjectorState::default()),
            snapshot: watch::Sender::new(PlaybackSnapshot::default()),
        }
    }

    /// Subscribe this projector to `bus`.
    pub fn attach_to(self: &Arc<Self>, bus: &EventBus) -> SubscriptionId {
        let projector = Arc::clone(self);
        bus.subscribe(move |event| projector.handle(event))
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.subscribe()
    }

    /// Forget the binding and publish the empty snapshot.
    pub fn clear(&self) {
        let mut state = self.lock();
        *state = ProjectorState::default();
        self.snapshot.send_replace(PlaybackSnapshot::default());
    }

    /// Remember the user's explicit quality choice.
    pub fn record_selected_quality(&self, label: QualityLabel) {
        let mut state = self.lock();
        state.selected_quality = label;
        self.publish(&state);
    }

    pub fn handle(&self, event: PlaybackEvent) {
        let mut notifications = Vec::new();

        {
            let mut state = self.lock();
            match event {
                PlaybackEvent::BindingReady { binding, ladder } => {
                    *state = ProjectorState {
                        binding: Some(binding),
                        ladder,
                        ..ProjectorState::default()
                    };
                }
                PlaybackEvent::BindingCleared { binding } => {
                    if state.binding != Some(binding) {
                        return;
                    }
                    *state = ProjectorState::default();
                }
                PlaybackEvent::Engine { binding, event } => {
                    if state.binding != Some(binding) {
                        return;
                    }
                    Self::apply_engine(&mut state, event, &mut notifications);
                }
                PlaybackEvent::Element { binding, event } => {
                    if state.binding != Some(binding) {
                        return;
                    }
                    self.apply_element(&mut state, event, &mut notifications);
                }
            }
            self.publish(&state);
        }

        for notification in notifications {
            match notification {
                Notification::Error(message) => self.notifier.on_error(&message),
                Notification::Buffering(buffering) => self.notifier.on_buffering_changed(buffering),
                Notification::Quality(label) => self.notifier.on_quality_changed(&label),
                Notification::Time(current, duration) => {
                    self.notifier.on_time_update(current, duration)
                }
            }
        }
    }

    fn apply_engine(state: &mut ProjectorState, event: EngineEvent, out: &mut Vec<Notification>) {
        match event {
            EngineEvent::Error { message } => {
                tracing::warn!(error = %message, "Media engine error");
                out.push(Notification::Error(message));
            }
            EngineEvent::BufferingChanged(buffering) => {
                Self::set_buffering(state, buffering, out);
            }
            EngineEvent::AdaptationChanged { active } => {
                let label = active
                    .and_then(|track| track.height)
                    .map(QualityLabel::Height);
                if label.is_some() && label != state.active_quality {
                    state.active_quality = label;
                    out.extend(label.map(Notification::Quality));
                }
            }
            EngineEvent::TrackListChanged { tracks } => {
                state.ladder = QualityLadder::from_tracks(&tracks);
            }
        }
    }

    fn apply_element(
        &self,
        state: &mut ProjectorState,
        event: MediaElementEvent,
        out: &mut Vec<Notification>,
    ) {
        match event {
            MediaElementEvent::Waiting | MediaElementEvent::Stalled => {
                Self::set_buffering(state, true, out);
            }
            MediaElementEvent::CanPlay | MediaElementEvent::Playing => {
                Self::set_buffering(state, false, out);
            }
            MediaElementEvent::TimeUpdate => {
                let duration = known_duration(self.surface.duration()).unwrap_or(0.0);
                out.push(Notification::Time(self.surface.current_time(), duration));
            }
            MediaElementEvent::DurationChange
            | MediaElementEvent::Play
            | MediaElementEvent::Pause
            | MediaElementEvent::VolumeChange
            | MediaElementEvent::RateChange => {}
        }
    }

    fn set_buffering(state: &mut ProjectorState, buffering: bool, out: &mut Vec<Notification>) {
        if state.is_buffering != buffering {
            state.is_buffering = buffering;
            out.push(Notification::Buffering(buffering));
        }
    }

    /// Publishing under the state lock keeps snapshots in event order.
    fn publish(&self, state: &ProjectorState) {
        self.snapshot.send_replace(self.derive(state));
    }

    fn derive(&self, state: &ProjectorState) -> PlaybackSnapshot {
        if state.binding.is_none() {
            return PlaybackSnapshot::default();
        }

        let surface = &self.surface;
        let current_time = surface.current_time();
        let raw_duration = surface.duration();

        PlaybackSnapshot {
            current_time,
            duration: known_duration(raw_duration).unwrap_or(0.0),
            volume: surface.volume(),
            is_muted: surface.is_muted(),
            is_playing: !surface.is_paused(),
            is_buffering: state.is_buffering,
            buffered_fraction: buffered_fraction(&surface.buffered(), current_time, raw_duration),
            active_quality_label: state.active_quality,
            selected_quality: state.selected_quality,
            quality_ladder: state.ladder.clone(),
            playback_rate: PlaybackRate::new(surface.playback_rate()).unwrap_or_default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProjectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::{FakeMediaSurface, RecordingNotifier};
    use streamtorrent_domain::{TimeRange, VariantTrack};

    fn setup() -> (
        Arc<PlaybackStateProjector>,
        EventBus,
        Arc<FakeMediaSurface>,
        Arc<RecordingNotifier>,
    ) {
        let surface = Arc::new(FakeMediaSurface::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let projector = Arc::new(PlaybackStateProjector::new(surface.clone(), notifier.clone()));
        let bus = EventBus::new();
        projector.attach_to(&bus);
        (projector, bus, surface, notifier)
    }

    fn ready(bus: &EventBus, heights: &[u32]) -> BindingId {
        let binding = BindingId::new();
        bus.dispatch(PlaybackEvent::BindingReady {
            binding,
            ladder: QualityLadder::from_heights(heights.iter().copied()),
        });
        binding
    }

    fn track(height: u32) -> VariantTrack {
        VariantTrack {
            id: u64::from(height),
            height: Some(height),
            width: None,
            bandwidth: u64::from(height) * 3000,
            active: true,
        }
    }

    #[test]
    fn time_update_recomputes_position_and_buffer() {
        let (projector, bus, surface, notifier) = setup();
        let binding = ready(&bus, &[1080, 720]);
        surface.set_timeline(50.0, 200.0, vec![TimeRange::new(0.0, 20.0), TimeRange::new(40.0, 100.0)]);

        bus.dispatch(PlaybackEvent::Element {
            binding,
            event: MediaElementEvent::TimeUpdate,
        });

        let snapshot = projector.snapshot();
        assert_eq!(snapshot.current_time, 50.0);
        assert_eq!(snapshot.duration, 200.0);
        assert_eq!(snapshot.buffered_fraction, 0.5);
        assert_eq!(snapshot.quality_ladder.heights(), &[1080, 720]);
        assert_eq!(notifier.time_updates(), vec![(50.0, 200.0)]);
    }

    #[test]
    fn unknown_duration_reports_zero_buffered() {
        let (projector, bus, surface, _) = setup();
        let binding = ready(&bus, &[]);
        surface.set_timeline(5.0, f64::NAN, vec![TimeRange::new(0.0, 30.0)]);

        bus.dispatch(PlaybackEvent::Element {
            binding,
            event: MediaElementEvent::DurationChange,
        });

        let snapshot = projector.snapshot();
        assert_eq!(snapshot.duration, 0.0);
        assert_eq!(snapshot.buffered_fraction, 0.0);
    }

    #[test]
    fn waiting_and_can_play_toggle_buffering_once() {
        let (projector, bus, _, notifier) = setup();
        let binding = ready(&bus, &[]);

        for event in [
            MediaElementEvent::Waiting,
            MediaElementEvent::Stalled,
            MediaElementEvent::CanPlay,
        ] {
            bus.dispatch(PlaybackEvent::Element { binding, event });
        }

        assert_eq!(notifier.buffering_changes(), vec![true, false]);
        assert!(!projector.snapshot().is_buffering);
    }

    #[test]
    fn adaptation_sets_active_quality_and_notifies() {
        let (projector, bus, _, notifier) = setup();
        let binding = ready(&bus, &[1080, 720]);

        bus.dispatch(PlaybackEvent::Engine {
            binding,
            event: EngineEvent::AdaptationChanged {
                active: Some(track(720)),
            },
        });

        assert_eq!(
            projector.snapshot().active_quality_label,
            Some(QualityLabel::Height(720))
        );
        assert_eq!(notifier.quality_changes(), vec![QualityLabel::Height(720)]);
    }

    #[test]
    fn track_list_change_rebuilds_ladder() {
        let (projector, bus, _, _) = setup();
        let binding = ready(&bus, &[720]);

        bus.dispatch(PlaybackEvent::Engine {
            binding,
            event: EngineEvent::TrackListChanged {
                tracks: vec![track(480), track(1080), track(480)],
            },
        });

        assert_eq!(projector.snapshot().quality_ladder.heights(), &[1080, 480]);
    }

    #[test]
    fn engine_error_is_forwarded() {
        let (_, bus, _, notifier) = setup();
        let binding = ready(&bus, &[]);

        bus.dispatch(PlaybackEvent::Engine {
            binding,
            event: EngineEvent::Error {
                message: "segment fetch failed".into(),
            },
        });

        assert_eq!(notifier.errors(), vec!["segment fetch failed".to_string()]);
    }

    #[test]
    fn events_from_previous_binding_are_ignored() {
        let (projector, bus, _, notifier) = setup();
        let old = ready(&bus, &[]);
        let _current = ready(&bus, &[]);

        bus.dispatch(PlaybackEvent::Engine {
            binding: old,
            event: EngineEvent::BufferingChanged(true),
        });

        assert!(notifier.buffering_changes().is_empty());
        assert!(!projector.snapshot().is_buffering);
    }

    #[test]
    fn cleared_binding_resets_snapshot() {
        let (projector, bus, surface, _) = setup();
        let binding = ready(&bus, &[720]);
        surface.set_timeline(10.0, 100.0, vec![]);
        bus.dispatch(PlaybackEvent::Element {
            binding,
            event: MediaElementEvent::TimeUpdate,
        });

        bus.dispatch(PlaybackEvent::BindingCleared { binding });

        assert_eq!(projector.snapshot(), PlaybackSnapshot::default());
    }

    #[test]
    fn clearing_a_replaced_binding_keeps_the_current_one() {
        let (projector, bus, surface, notifier) = setup();
        let old = ready(&bus, &[480]);
        let current = ready(&bus, &[1080]);
        surface.set_timeline(42.0, 120.0, vec![]);

        bus.dispatch(PlaybackEvent::BindingCleared { binding: old });
        bus.dispatch(PlaybackEvent::Element {
            binding: current,
            event: MediaElementEvent::TimeUpdate,
        });

        let snapshot = projector.snapshot();
        assert_eq!(snapshot.current_time, 42.0);
        assert_eq!(snapshot.quality_ladder.heights(), &[1080]);
        assert_eq!(notifier.time_updates(), vec![(42.0, 120.0)]);
    }

    #[test]
    fn concurrent_events_leave_the_latest_snapshot_published() {
        let (projector, bus, surface, _) = setup();
        let binding = ready(&bus, &[]);

        std::thread::scope(|scope| {
            for worker in 0..4u32 {
                let bus = bus.clone();
                let surface = Arc::clone(&surface);
                scope.spawn(move || {
                    for step in 0..200u32 {
                        surface.set_timeline(f64::from(worker * 1000 + step), 5000.0, vec![]);
                        bus.dispatch(PlaybackEvent::Element {
                            binding,
                            event: MediaElementEvent::DurationChange,
                        });
                    }
                });
            }
        });

        assert_eq!(projector.snapshot().current_time, surface.current_time());
    }

    #[test]
    fn selected_quality_is_recorded() {
        let (projector, bus, _, _) = setup();
        ready(&bus, &[1080, 720]);

        projector.record_selected_quality(QualityLabel::Height(1080));

        assert_eq!(projector.snapshot().selected_quality, QualityLabel::Height(1080));
        assert_eq!(projector.snapshot().active_quality_label, None);
    }
}
