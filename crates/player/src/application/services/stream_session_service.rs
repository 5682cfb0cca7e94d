//! Stream session service
//!
//! Entry point for the surrounding UI. Owns the session-scoped context and
//! wires the poller, controller, projector and controls together: once the
//! poller publishes a manifest URI, it is bound exactly once.
//!
//! Disposal order is always poller, then engine binding, then projected
//! state, so the poller can never hand a URI to an engine mid-teardown.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use streamtorrent_domain::{
    ContentLocator, PlaybackSnapshot, ProvisioningView, Session, SessionId,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::error::SessionError;
use crate::application::services::keyboard::KeyboardDispatcher;
use crate::application::services::playback_controls::PlaybackControls;
use crate::application::services::playback_projector::PlaybackStateProjector;
use crate::application::services::provisioning_poller::ProvisioningPoller;
use crate::application::services::session_lifecycle::SessionLifecycleController;
use crate::state::SessionContext;

struct ActiveSession {
    session: Session,
    poller: ProvisioningPoller,
    /// Spawned once any session this one replaced is disposed
    binder: Option<JoinHandle<()>>,
}

pub struct StreamSessionService {
    ctx: SessionContext,
    controller: SessionLifecycleController,
    projector: Arc<PlaybackStateProjector>,
    controls: PlaybackControls,
    keyboard: KeyboardDispatcher,
    active: Mutex<Option<ActiveSession>>,
}

impl StreamSessionService {
    pub fn new(ctx: SessionContext) -> Self {
        let controller = SessionLifecycleController::new(&ctx);
        let projector = Arc::new(PlaybackStateProjector::new(
            Arc::clone(&ctx.surface),
            Arc::clone(&ctx.notifier),
        ));
        projector.attach_to(&ctx.bus);
        let controls = PlaybackControls::new(
            Arc::clone(&ctx.surface),
            Arc::clone(&ctx.fullscreen),
            controller.clone(),
            Arc::clone(&projector),
        );
        let keyboard = KeyboardDispatcher::new(controls.clone());

        Self {
            ctx,
            controller,
            projector,
            controls,
            keyboard,
            active: Mutex::new(None),
        }
    }

    /// Submit a content locator and start provisioning it, replacing any
    /// current session.
    ///
    /// # Errors
    ///
    /// `InvalidLocator` if the input is blank (no request is made), or
    /// `Create` if the backend rejects the request. Both are also reported
    /// through `on_error`.
    pub async fn start(&self, input: &str) -> Result<SessionId, SessionError> {
        let result = self.try_start(input).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Failed to start stream session");
            self.ctx.notifier.on_error(&e.user_message());
        }
        result
    }

    async fn try_start(&self, input: &str) -> Result<SessionId, SessionError> {
        let locator = ContentLocator::parse(input)?;
        self.stop().await;

        let id = self.ctx.api.create_session(&locator).await?;
        tracing::info!(session_id = %id, kind = ?locator.kind(), "Stream session created");

        let session = Session::new(id.clone(), locator, self.ctx.platform.now());
        let poller = ProvisioningPoller::spawn(
            Arc::clone(&self.ctx.api),
            self.ctx.platform.clone(),
            Arc::clone(&self.ctx.notifier),
            self.ctx.config.poll.clone(),
            id.clone(),
        );
        let view = poller.subscribe();

        let previous = self.lock().replace(ActiveSession {
            session,
            poller,
            binder: None,
        });
        if let Some(previous) = previous {
            // a concurrent start won the race for the slot
            self.dispose(previous).await;
        }

        let binder = tokio::spawn(bind_when_ready(
            view.clone(),
            self.controller.clone(),
            self.controller.generation(),
        ));
        match self.lock().as_mut() {
            Some(active) if active.poller.subscribe().same_channel(&view) => {
                active.binder = Some(binder);
            }
            // replaced before it could bind
            _ => binder.abort(),
        }
        Ok(id)
    }

    /// Stop the current session and notify the backend. Idempotent.
    pub async fn stop(&self) {
        let active = self.lock().take();
        if let Some(active) = active {
            self.dispose(active).await;
        }
    }

    /// Synchronous teardown for page unload: nothing is awaited and the
    /// backend DELETE is fire-and-forget.
    pub fn on_unload(&self) {
        let Some(active) = self.lock().take() else {
            return;
        };
        active.poller.cancel();
        if let Some(binder) = &active.binder {
            binder.abort();
        }
        // Ordered now, so a session started right after unload binds only
        // once this teardown is done.
        tokio::spawn(self.controller.begin_unbind());

        let api = Arc::clone(&self.ctx.api);
        let id = active.session.id().clone();
        tokio::spawn(async move {
            if let Err(e) = api.delete_session(&id).await {
                tracing::debug!(session_id = %id, error = %e, "Unload delete failed");
            }
        });
    }

    async fn dispose(&self, active: ActiveSession) {
        let id = active.session.id().clone();

        active.poller.stop().await;
        if let Some(binder) = active.binder {
            binder.abort();
            // an aborted task may still be running on another worker
            if let Err(e) = binder.await {
                if e.is_panic() {
                    tracing::warn!(session_id = %id, error = %e, "Binder task panicked");
                }
            }
        }
        self.controller.unbind().await;
        self.projector.clear();

        match self.ctx.api.delete_session(&id).await {
            Ok(()) => tracing::info!(session_id = %id, "Stream session stopped"),
            Err(e) => tracing::warn!(session_id = %id, error = %e, "Failed to delete stream session"),
        }
    }

    /// The current session, synced with the latest provisioning view.
    pub fn session(&self) -> Option<Session> {
        let active = self.lock();
        let active = active.as_ref()?;
        let mut session = active.session.clone();
        if let Err(e) = session.observe(&active.poller.current()) {
            tracing::warn!(error = %e, "Provisioning view disagrees with session");
        }
        Some(session)
    }

    pub fn controls(&self) -> &PlaybackControls {
        &self.controls
    }

    pub fn keyboard(&self) -> &KeyboardDispatcher {
        &self.keyboard
    }

    pub fn playback(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.projector.subscribe()
    }

    pub fn provisioning(&self) -> Option<watch::Receiver<ProvisioningView>> {
        self.lock().as_ref().map(|active| active.poller.subscribe())
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wait for the first manifest URI and bind it, unless the controller has
/// been unbound since `generation`.
async fn bind_when_ready(
    mut view: watch::Receiver<ProvisioningView>,
    controller: SessionLifecycleController,
    generation: u64,
) {
    let uri = match view.wait_for(|v| v.manifest_uri.is_some()).await {
        Ok(ready) => ready.manifest_uri.clone(),
        // poller finished without a manifest
        Err(_) => None,
    };
    if let Some(uri) = uri {
        let outcome = controller.bind_source_within(&uri, generation).await;
        tracing::debug!(uri = %uri, ?outcome, "Bind requested for ready session");
    }
}
