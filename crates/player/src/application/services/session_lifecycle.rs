//! Session Lifecycle Controller
//!
//! Owns the single engine binding for the playback surface. Binding is a
//! single-slot in-flight operation: a request for the URI already being
//! bound joins that operation, a request for any other URI while one is in
//! flight is rejected. Teardown always completes before a new engine is
//! created, and teardown errors never block rebinding.
//!
//! Binds and unbinds run one at a time, in the order they were requested.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use streamtorrent_domain::{BindingId, EngineConfiguration, QualityLabel};
use tokio::sync::oneshot;

use crate::application::services::engine_adapter::{MediaEngineAdapter, QualitySelection};
use crate::config::PlaybackConfig;
use crate::infrastructure::messaging::EventBus;
use crate::ports::outbound::{
    EventSink, MediaEngineFactory, MediaError, MediaSurfacePort, PlaybackEvent, PlaybackNotifier,
};
use crate::state::{Platform, SessionContext};

/// How a `bind_source` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    /// The URI was already bound; nothing happened
    AlreadyBound,
    /// Another URI is being bound; nothing happened
    Rejected,
    /// `unbind` ran while this bind was in flight
    Cancelled,
    /// Reported through `on_error`; the bound source is cleared
    Failed(String),
}

struct EngineBinding {
    id: BindingId,
    source_uri: String,
    engine: MediaEngineAdapter,
    sink: EventSink,
}

/// Resolves once the operation queued before it has finished.
type Turn = Shared<BoxFuture<'static, ()>>;

struct InFlightBind {
    seq: u64,
    uri: String,
    completion: Shared<BoxFuture<'static, BindOutcome>>,
}

#[derive(Default)]
struct ControllerState {
    binding: Option<EngineBinding>,
    in_flight: Option<InFlightBind>,
    /// Bumped by `unbind`; a bind that started under an older generation
    /// discards its engine instead of committing it
    generation: u64,
    next_seq: u64,
    unsupported_reported: bool,
    last_turn: Option<Turn>,
}

impl ControllerState {
    /// Queue an operation behind every bind or unbind requested so far.
    /// Dropping the returned sender lets the next one run.
    fn take_turn(&mut self) -> (Option<Turn>, oneshot::Sender<()>) {
        let (release, released) = oneshot::channel::<()>();
        let turn = async move {
            let _ = released.await;
        }
        .boxed()
        .shared();
        (self.last_turn.replace(turn), release)
    }
}

struct ControllerInner {
    engines: Arc<dyn MediaEngineFactory>,
    surface: Arc<dyn MediaSurfacePort>,
    bus: EventBus,
    platform: Platform,
    notifier: Arc<dyn PlaybackNotifier>,
    engine_config: EngineConfiguration,
    playback: PlaybackConfig,
    state: Mutex<ControllerState>,
}

#[derive(Clone)]
pub struct SessionLifecycleController {
    inner: Arc<ControllerInner>,
}

/// Clears the in-flight slot when the bind task ends, however it ends.
struct InFlightGuard {
    inner: Arc<ControllerInner>,
    seq: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        if state.in_flight.as_ref().is_some_and(|f| f.seq == self.seq) {
            state.in_flight = None;
        }
    }
}

impl SessionLifecycleController {
    pub fn new(ctx: &SessionContext) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                engines: Arc::clone(&ctx.engines),
                surface: Arc::clone(&ctx.surface),
                bus: ctx.bus.clone(),
                platform: ctx.platform.clone(),
                notifier: Arc::clone(&ctx.notifier),
                engine_config: ctx.config.engine.clone(),
                playback: ctx.config.playback.clone(),
                state: Mutex::new(ControllerState::default()),
            }),
        }
    }

    /// Bind `uri` to the playback surface, replacing any previous binding.
    ///
    /// Never returns an error: failures are reported through the notifier
    /// and as [`BindOutcome::Failed`].
    pub async fn bind_source(&self, uri: &str) -> BindOutcome {
        self.bind(uri, None).await
    }

    /// Like [`bind_source`](Self::bind_source), but `Cancelled` if `unbind`
    /// has run since `generation` was read.
    pub async fn bind_source_within(&self, uri: &str, generation: u64) -> BindOutcome {
        self.bind(uri, Some(generation)).await
    }

    /// Bumped by every `unbind`.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    async fn bind(&self, uri: &str, expected_generation: Option<u64>) -> BindOutcome {
        let completion = {
            let mut state = self.inner.lock();

            if expected_generation.is_some_and(|g| g != state.generation) {
                tracing::debug!(uri, "Unbound since bind was requested, skipping");
                return BindOutcome::Cancelled;
            }

            if let Some(in_flight) = &state.in_flight {
                if in_flight.uri != uri {
                    tracing::debug!(
                        requested = uri,
                        in_flight = %in_flight.uri,
                        "Bind already in progress, rejecting"
                    );
                    return BindOutcome::Rejected;
                }
                in_flight.completion.clone()
            } else if state
                .binding
                .as_ref()
                .is_some_and(|b| b.source_uri == uri)
            {
                return BindOutcome::AlreadyBound;
            } else {
                let seq = state.next_seq;
                state.next_seq += 1;
                let generation = state.generation;
                let (previous, release) = state.take_turn();

                let inner = Arc::clone(&self.inner);
                let target = uri.to_string();
                // Spawned so that dropping the caller's future cannot strand
                // a half-initialized engine.
                let task = tokio::spawn(async move {
                    let _guard = InFlightGuard {
                        inner: Arc::clone(&inner),
                        seq,
                    };
                    let _release = release;
                    if let Some(previous) = previous {
                        previous.await;
                    }
                    inner.run_bind(target, generation).await
                });
                let completion = async move {
                    task.await.unwrap_or_else(|e| {
                        BindOutcome::Failed(format!("bind task did not complete: {e}"))
                    })
                }
                .boxed()
                .shared();

                state.in_flight = Some(InFlightBind {
                    seq,
                    uri: uri.to_string(),
                    completion: completion.clone(),
                });
                completion
            }
        };

        completion.await
    }

    /// Destroy the current binding, if any. Idempotent.
    ///
    /// A bind still in flight is cancelled and awaited, so no engine is
    /// alive once this returns.
    pub async fn unbind(&self) {
        self.begin_unbind().await;
    }

    /// Order an unbind now and return the work that completes it.
    ///
    /// Binds requested after this call wait for the returned future, so it
    /// can be spawned from synchronous code.
    pub fn begin_unbind(&self) -> impl Future<Output = ()> + Send + 'static {
        let (binding, previous, release) = {
            let mut state = self.inner.lock();
            state.generation += 1;
            // a cancelled bind must not absorb binds requested after this
            state.in_flight = None;
            let (previous, release) = state.take_turn();
            (state.binding.take(), previous, release)
        };

        let inner = Arc::clone(&self.inner);
        async move {
            let _release = release;
            if let Some(previous) = previous {
                previous.await;
            }
            if let Some(binding) = binding {
                let id = binding.id;
                inner.teardown(binding).await;
                inner.bus.dispatch(PlaybackEvent::BindingCleared { binding: id });
            }
        }
    }

    pub fn bound_source(&self) -> Option<String> {
        self.inner
            .lock()
            .binding
            .as_ref()
            .map(|b| b.source_uri.clone())
    }

    pub fn current_binding(&self) -> Option<BindingId> {
        self.inner.lock().binding.as_ref().map(|b| b.id)
    }

    pub fn is_binding(&self) -> bool {
        self.inner.lock().in_flight.is_some()
    }

    /// Forward a quality change to the bound engine. Engine errors are
    /// logged and reported as `NoMatch`.
    pub fn select_quality(&self, label: &QualityLabel) -> QualitySelection {
        let engine = self.inner.lock().binding.as_ref().map(|b| b.engine.clone());
        let Some(engine) = engine else {
            return QualitySelection::Unbound;
        };
        engine.select_quality(label).unwrap_or_else(|e| {
            tracing::warn!(quality = %label, error = %e, "Quality change failed");
            QualitySelection::NoMatch
        })
    }
}

impl ControllerInner {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    async fn run_bind(self: &Arc<Self>, uri: String, generation: u64) -> BindOutcome {
        if !self.is_current(generation) {
            tracing::debug!(uri = %uri, "Bind cancelled before it started");
            return BindOutcome::Cancelled;
        }
        if !self.engines.is_supported() {
            let first_report = {
                let mut state = self.lock();
                !std::mem::replace(&mut state.unsupported_reported, true)
            };
            if first_report {
                self.notifier.on_error(&MediaError::Unsupported.to_string());
            }
            tracing::warn!(uri = %uri, "Media engine unsupported, not binding");
            return BindOutcome::Failed(MediaError::Unsupported.to_string());
        }

        let previous = self.lock().binding.take();
        if let Some(previous) = previous {
            let id = previous.id;
            self.teardown(previous).await;
            self.bus.dispatch(PlaybackEvent::BindingCleared { binding: id });
        }
        if !self.is_current(generation) {
            return BindOutcome::Cancelled;
        }

        let engine = match self.engines.create() {
            Ok(engine) => MediaEngineAdapter::new(engine),
            Err(e) => return self.fail(&uri, e),
        };
        let binding_id = BindingId::new();
        let sink = self.bus.sink_for(binding_id);

        if let Err(e) = self.initialize(&engine, &sink, &uri).await {
            self.discard(&engine, &sink).await;
            return self.fail(&uri, e);
        }

        let committed = {
            let mut state = self.lock();
            let current = state.generation == generation;
            if current {
                state.binding = Some(EngineBinding {
                    id: binding_id,
                    source_uri: uri.clone(),
                    engine: engine.clone(),
                    sink: sink.clone(),
                });
            }
            current
        };
        if !committed {
            tracing::debug!(uri = %uri, "Bind cancelled while loading, discarding engine");
            self.discard(&engine, &sink).await;
            return BindOutcome::Cancelled;
        }

        tracing::info!(binding_id = %binding_id, uri = %uri, "Engine bound");
        self.bus.dispatch(PlaybackEvent::BindingReady {
            binding: binding_id,
            ladder: engine.available_qualities(),
        });
        self.notifier.on_ready();

        if self.playback.autoplay {
            self.schedule_autoplay(binding_id);
        }
        BindOutcome::Bound
    }

    async fn initialize(
        &self,
        engine: &MediaEngineAdapter,
        sink: &EventSink,
        uri: &str,
    ) -> Result<(), MediaError> {
        engine.attach(Arc::clone(&self.surface)).await?;
        engine.configure(&self.engine_config)?;
        engine.install_listeners(sink.clone());
        self.surface.remove_listeners();
        self.surface.install_listeners(sink.clone());
        self.surface.set_muted(self.playback.start_muted);
        engine.load(uri).await
    }

    fn fail(&self, uri: &str, error: MediaError) -> BindOutcome {
        let message = error.to_string();
        tracing::warn!(uri, error = %message, "Failed to bind source");
        self.notifier.on_error(&message);
        BindOutcome::Failed(message)
    }

    /// Tear down an engine that never became the current binding.
    async fn discard(&self, engine: &MediaEngineAdapter, sink: &EventSink) {
        sink.close();
        self.surface.remove_listeners();
        if let Err(e) = engine.destroy().await {
            tracing::warn!(error = %e, "Failed to destroy discarded engine, ignoring");
        }
    }

    async fn teardown(&self, binding: EngineBinding) {
        binding.sink.close();
        self.surface.remove_listeners();
        if let Err(e) = binding.engine.destroy().await {
            tracing::warn!(
                binding_id = %binding.id,
                error = %e,
                "Engine teardown failed, ignoring"
            );
        }
        tracing::debug!(binding_id = %binding.id, uri = %binding.source_uri, "Engine destroyed");
    }

    fn schedule_autoplay(self: &Arc<Self>, binding_id: BindingId) {
        let inner = Arc::clone(self);
        let delay_ms = self.playback.autoplay_delay.as_millis() as u64;
        tokio::spawn(async move {
            inner.platform.sleep_ms(delay_ms).await;
            let still_bound = inner
                .lock()
                .binding
                .as_ref()
                .is_some_and(|b| b.id == binding_id);
            if !still_bound {
                return;
            }
            if let Err(e) = inner.surface.play().await {
                tracing::info!(binding_id = %binding_id, reason = %e, "Autoplay blocked");
            }
        });
    }
}
