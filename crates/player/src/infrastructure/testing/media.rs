use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use streamtorrent_domain::{TimeRange, VariantTrack};

use crate::ports::outbound::{
    EngineEvent, EventSink, FullscreenPort, MediaElementEvent, MediaEngineFactory,
    MediaEnginePort, MediaError, MediaSurfacePort,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered record of engine calls across every engine a factory created,
/// e.g. `create:1`, `load:1:<uri>`, `destroy:1`.
#[derive(Clone, Default)]
pub struct EngineLog(Arc<Mutex<Vec<String>>>);

impl EngineLog {
    pub fn push(&self, entry: impl Into<String>) {
        lock(&self.0).push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }
}

#[derive(Default)]
struct Faults {
    failing_loads: HashSet<String>,
    fail_destroy: bool,
    destroy_delay: Option<Duration>,
}

pub struct FakeEngineFactory {
    log: EngineLog,
    supported: AtomicBool,
    live: Arc<AtomicUsize>,
    faults: Arc<Mutex<Faults>>,
    tracks: Mutex<Vec<VariantTrack>>,
    engines: Mutex<Vec<Arc<FakeMediaEngine>>>,
}

impl FakeEngineFactory {
    /// Engines created by this factory expose a 1080p and a 480p rendition.
    pub fn new(log: EngineLog) -> Self {
        Self {
            log,
            supported: AtomicBool::new(true),
            live: Arc::new(AtomicUsize::new(0)),
            faults: Arc::new(Mutex::new(Faults::default())),
            tracks: Mutex::new(vec![
                VariantTrack {
                    id: 1,
                    height: Some(1080),
                    width: Some(1920),
                    bandwidth: 5_000_000,
                    active: false,
                },
                VariantTrack {
                    id: 2,
                    height: Some(480),
                    width: Some(854),
                    bandwidth: 1_200_000,
                    active: true,
                },
            ]),
            engines: Mutex::new(Vec::new()),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    pub fn set_tracks(&self, tracks: Vec<VariantTrack>) {
        *lock(&self.tracks) = tracks;
    }

    pub fn fail_load_for(&self, uri: &str) {
        lock(&self.faults).failing_loads.insert(uri.to_string());
    }

    pub fn fail_destroy(&self, fail: bool) {
        lock(&self.faults).fail_destroy = fail;
    }

    /// Engines stay alive for `delay` once `destroy` is called.
    pub fn slow_destroy(&self, delay: Duration) {
        lock(&self.faults).destroy_delay = Some(delay);
    }

    pub fn clear_failures(&self) {
        *lock(&self.faults) = Faults::default();
    }

    pub fn created(&self) -> usize {
        lock(&self.engines).len()
    }

    /// Engines created and not yet destroyed.
    pub fn live_engines(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// The `n`th engine created, counting from 1.
    pub fn engine(&self, n: usize) -> Option<Arc<FakeMediaEngine>> {
        lock(&self.engines).get(n.checked_sub(1)?).cloned()
    }
}

impl MediaEngineFactory for FakeEngineFactory {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    fn create(&self) -> Result<Arc<dyn MediaEnginePort>, MediaError> {
        let mut engines = lock(&self.engines);
        let engine = Arc::new(FakeMediaEngine {
            number: engines.len() + 1,
            log: self.log.clone(),
            live: Arc::clone(&self.live),
            faults: Arc::clone(&self.faults),
            tracks: lock(&self.tracks).clone(),
            sink: Mutex::new(None),
            destroyed: AtomicBool::new(false),
        });
        self.live.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("create:{}", engine.number));
        engines.push(Arc::clone(&engine));
        Ok(engine)
    }
}

pub struct FakeMediaEngine {
    number: usize,
    log: EngineLog,
    live: Arc<AtomicUsize>,
    faults: Arc<Mutex<Faults>>,
    tracks: Vec<VariantTrack>,
    sink: Mutex<Option<EventSink>>,
    destroyed: AtomicBool,
}

impl FakeMediaEngine {
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn emit(&self, event: EngineEvent) {
        let sink = lock(&self.sink).clone();
        if let Some(sink) = sink {
            sink.engine(event);
        }
    }

    pub fn emit_buffering(&self, buffering: bool) {
        self.emit(EngineEvent::BufferingChanged(buffering));
    }
}

#[async_trait::async_trait]
impl MediaEnginePort for FakeMediaEngine {
    async fn attach(&self, _surface: Arc<dyn MediaSurfacePort>) -> Result<(), MediaError> {
        self.log.push(format!("attach:{}", self.number));
        Ok(())
    }

    fn configure(&self, _options: &Value) -> Result<(), MediaError> {
        self.log.push(format!("configure:{}", self.number));
        Ok(())
    }

    async fn load(&self, uri: &str) -> Result<(), MediaError> {
        self.log.push(format!("load:{}:{uri}", self.number));
        // manifest fetch
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        if lock(&self.faults).failing_loads.contains(uri) {
            return Err(MediaError::engine("load", format!("manifest request failed for {uri}")));
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<(), MediaError> {
        let delay = lock(&self.faults).destroy_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if !self.destroyed.swap(true, Ordering::SeqCst) {
            self.live.fetch_sub(1, Ordering::SeqCst);
            self.log.push(format!("destroy:{}", self.number));
        }
        *lock(&self.sink) = None;
        if lock(&self.faults).fail_destroy {
            return Err(MediaError::engine("destroy", "media source already detached"));
        }
        Ok(())
    }

    fn variant_tracks(&self) -> Vec<VariantTrack> {
        self.tracks.clone()
    }

    fn select_variant_track(&self, track: &VariantTrack, _clear_buffer: bool) -> Result<(), MediaError> {
        self.log.push(format!("select:{}:{}", self.number, track.id));
        Ok(())
    }

    fn install_listeners(&self, sink: EventSink) {
        self.log.push(format!("listen:{}", self.number));
        *lock(&self.sink) = Some(sink);
    }
}

struct SurfaceState {
    paused: bool,
    current_time: f64,
    duration: f64,
    volume: f64,
    muted: bool,
    rate: f64,
    buffered: Vec<TimeRange>,
    reject_play: bool,
    play_attempts: usize,
    sink: Option<EventSink>,
}

/// Media element stand-in. Setters emit the native event a real element
/// would, after releasing the internal lock.
pub struct FakeMediaSurface {
    state: Mutex<SurfaceState>,
}

impl Default for FakeMediaSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeMediaSurface {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SurfaceState {
                paused: true,
                current_time: 0.0,
                duration: f64::NAN,
                volume: 1.0,
                muted: false,
                rate: 1.0,
                buffered: Vec::new(),
                reject_play: false,
                play_attempts: 0,
                sink: None,
            }),
        }
    }

    /// Set position, duration and buffered ranges without emitting events.
    pub fn set_timeline(&self, current_time: f64, duration: f64, buffered: Vec<TimeRange>) {
        let mut state = lock(&self.state);
        state.current_time = current_time;
        state.duration = duration;
        state.buffered = buffered;
    }

    pub fn reject_play(&self, reject: bool) {
        lock(&self.state).reject_play = reject;
    }

    pub fn play_attempts(&self) -> usize {
        lock(&self.state).play_attempts
    }

    pub fn has_listeners(&self) -> bool {
        lock(&self.state).sink.is_some()
    }

    /// Raise a native event through the installed listeners, if any.
    pub fn emit(&self, event: MediaElementEvent) {
        let sink = lock(&self.state).sink.clone();
        if let Some(sink) = sink {
            sink.element(event);
        }
    }

    fn update(&self, events: &[MediaElementEvent], change: impl FnOnce(&mut SurfaceState)) {
        let sink = {
            let mut state = lock(&self.state);
            change(&mut state);
            state.sink.clone()
        };
        if let Some(sink) = sink {
            for event in events {
                sink.element(*event);
            }
        }
    }
}

#[async_trait::async_trait]
impl MediaSurfacePort for FakeMediaSurface {
    async fn play(&self) -> Result<(), MediaError> {
        let rejected = {
            let mut state = lock(&self.state);
            state.play_attempts += 1;
            state.reject_play
        };
        if rejected {
            return Err(MediaError::PlaybackRejected(
                "play() can only be initiated by a user gesture".into(),
            ));
        }
        self.update(&[MediaElementEvent::Play, MediaElementEvent::Playing], |s| {
            s.paused = false;
        });
        Ok(())
    }

    fn pause(&self) {
        self.update(&[MediaElementEvent::Pause], |s| s.paused = true);
    }

    fn is_paused(&self) -> bool {
        lock(&self.state).paused
    }

    fn current_time(&self) -> f64 {
        lock(&self.state).current_time
    }

    fn set_current_time(&self, seconds: f64) {
        self.update(&[MediaElementEvent::TimeUpdate], |s| s.current_time = seconds);
    }

    fn duration(&self) -> f64 {
        lock(&self.state).duration
    }

    fn volume(&self) -> f64 {
        lock(&self.state).volume
    }

    fn set_volume(&self, volume: f64) {
        self.update(&[MediaElementEvent::VolumeChange], |s| s.volume = volume);
    }

    fn is_muted(&self) -> bool {
        lock(&self.state).muted
    }

    fn set_muted(&self, muted: bool) {
        self.update(&[MediaElementEvent::VolumeChange], |s| s.muted = muted);
    }

    fn playback_rate(&self) -> f64 {
        lock(&self.state).rate
    }

    fn set_playback_rate(&self, rate: f64) {
        self.update(&[MediaElementEvent::RateChange], |s| s.rate = rate);
    }

    fn buffered(&self) -> Vec<TimeRange> {
        lock(&self.state).buffered.clone()
    }

    fn container_id(&self) -> String {
        "player-container".to_string()
    }

    fn install_listeners(&self, sink: EventSink) {
        lock(&self.state).sink = Some(sink);
    }

    fn remove_listeners(&self) {
        lock(&self.state).sink = None;
    }
}

/// Fullscreen capability that just tracks the requested target.
#[derive(Default)]
pub struct FakeFullscreen {
    target: Mutex<Option<String>>,
}

impl FakeFullscreen {
    pub fn target(&self) -> Option<String> {
        lock(&self.target).clone()
    }
}

impl FullscreenPort for FakeFullscreen {
    fn is_fullscreen(&self) -> bool {
        lock(&self.target).is_some()
    }

    fn request_fullscreen(&self, container_id: &str) -> Result<(), MediaError> {
        *lock(&self.target) = Some(container_id.to_string());
        Ok(())
    }

    fn exit_fullscreen(&self) -> Result<(), MediaError> {
        *lock(&self.target) = None;
        Ok(())
    }
}
