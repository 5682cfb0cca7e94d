//! Provisioning Status Poller
//!
//! One background task per session. It fetches the status record, folds it
//! into a [`ProvisioningTracker`] and publishes the resulting view on a
//! watch channel. Transport failures are logged and retried after a longer
//! delay; they never reach the UI as errors.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use streamtorrent_domain::{
    ProvisioningState, ProvisioningTracker, ProvisioningView, SessionId, TrackerUpdate,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::PollConfig;
use crate::ports::outbound::{PlaybackNotifier, ProvisioningApiPort};
use crate::state::Platform;

pub struct ProvisioningPoller {
    session_id: SessionId,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    view: watch::Receiver<ProvisioningView>,
}

struct PollLoop {
    api: Arc<dyn ProvisioningApiPort>,
    platform: Platform,
    notifier: Arc<dyn PlaybackNotifier>,
    config: PollConfig,
    session_id: SessionId,
    cancel: CancellationToken,
    view: watch::Sender<ProvisioningView>,
}

impl ProvisioningPoller {
    /// Start polling `session_id` immediately.
    pub fn spawn(
        api: Arc<dyn ProvisioningApiPort>,
        platform: Platform,
        notifier: Arc<dyn PlaybackNotifier>,
        config: PollConfig,
        session_id: SessionId,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(ProvisioningView::default());

        let poll_loop = PollLoop {
            api,
            platform,
            notifier,
            config,
            session_id: session_id.clone(),
            cancel: cancel.clone(),
            view: tx,
        };
        let task = tokio::spawn(poll_loop.run());

        Self {
            session_id,
            cancel,
            task: Mutex::new(Some(task)),
            view: rx,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn subscribe(&self) -> watch::Receiver<ProvisioningView> {
        self.view.clone()
    }

    pub fn current(&self) -> ProvisioningView {
        self.view.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
            && self
                .task
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .as_ref()
                .is_some_and(|t| !t.is_finished())
    }

    /// Request a stop without waiting. No callback fires after the task
    /// observes the cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop and wait for the task to exit. Idempotent.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(session_id = %self.session_id, error = %e, "Poll task ended abnormally");
            }
        }
    }
}

impl Drop for ProvisioningPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl PollLoop {
    async fn run(self) {
        let mut tracker = ProvisioningTracker::new();
        let mut failures: u32 = 0;

        tracing::debug!(session_id = %self.session_id, "Provisioning poll started");

        loop {
            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.api.fetch_status(&self.session_id) => result,
            };

            let delay = match fetched {
                Ok(Some(record)) => {
                    failures = 0;
                    let update = tracker.apply(&record, self.platform.now_millis());
                    if update == TrackerUpdate::Ignored {
                        break;
                    }
                    self.publish(tracker.view());
                    self.report(&update);

                    if !tracker.should_continue_polling() {
                        break;
                    }
                    if tracker.state() == ProvisioningState::Ready
                        && !self.config.continue_after_ready
                    {
                        tracing::debug!(session_id = %self.session_id, "Ready, polling no longer needed");
                        break;
                    }
                    self.config.interval
                }
                Ok(None) => {
                    failures = 0;
                    tracing::debug!(session_id = %self.session_id, "Session not known to backend yet");
                    self.config.interval
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        session_id = %self.session_id,
                        attempt = failures,
                        delay_ms = millis(self.config.transport_backoff),
                        error = %e,
                        "Status poll failed, backing off"
                    );
                    self.config.transport_backoff
                }
            };

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = self.platform.sleep_ms(millis(delay)) => {}
            }
        }

        if self.cancel.is_cancelled() {
            tracker.stop();
            self.view.send_replace(tracker.view().clone());
        }
        tracing::debug!(
            session_id = %self.session_id,
            state = %tracker.state(),
            "Provisioning poll finished"
        );
    }

    fn publish(&self, view: &ProvisioningView) {
        self.view.send_replace(view.clone());
        self.notifier.on_provisioning_changed(view);
    }

    fn report(&self, update: &TrackerUpdate) {
        match update {
            TrackerUpdate::BecameReady(uri) => {
                tracing::info!(session_id = %self.session_id, manifest = %uri, "Stream ready");
            }
            TrackerUpdate::Failed(message) => {
                tracing::warn!(session_id = %self.session_id, error = %message, "Provisioning failed");
                self.notifier.on_error(message);
            }
            TrackerUpdate::Halted(message) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %message,
                    "Backend reported an error after ready, stopping poll"
                );
            }
            TrackerUpdate::Updated | TrackerUpdate::Ignored => {}
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
