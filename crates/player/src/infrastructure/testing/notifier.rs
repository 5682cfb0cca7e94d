use std::sync::{Mutex, MutexGuard, PoisonError};

use streamtorrent_domain::{ProvisioningView, QualityLabel};

use crate::ports::outbound::PlaybackNotifier;

#[derive(Default)]
struct Recorded {
    ready: usize,
    errors: Vec<String>,
    buffering: Vec<bool>,
    times: Vec<(f64, f64)>,
    qualities: Vec<QualityLabel>,
    provisioning: Vec<ProvisioningView>,
}

/// Notifier that remembers every callback.
#[derive(Default)]
pub struct RecordingNotifier {
    recorded: Mutex<Recorded>,
}

impl RecordingNotifier {
    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ready_count(&self) -> usize {
        self.lock().ready
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock().errors.clone()
    }

    pub fn buffering_changes(&self) -> Vec<bool> {
        self.lock().buffering.clone()
    }

    pub fn time_updates(&self) -> Vec<(f64, f64)> {
        self.lock().times.clone()
    }

    pub fn quality_changes(&self) -> Vec<QualityLabel> {
        self.lock().qualities.clone()
    }

    pub fn provisioning_updates(&self) -> Vec<ProvisioningView> {
        self.lock().provisioning.clone()
    }
}

impl PlaybackNotifier for RecordingNotifier {
    fn on_ready(&self) {
        self.lock().ready += 1;
    }

    fn on_error(&self, message: &str) {
        self.lock().errors.push(message.to_string());
    }

    fn on_buffering_changed(&self, buffering: bool) {
        self.lock().buffering.push(buffering);
    }

    fn on_time_update(&self, current: f64, duration: f64) {
        self.lock().times.push((current, duration));
    }

    fn on_quality_changed(&self, label: &QualityLabel) {
        self.lock().qualities.push(*label);
    }

    fn on_provisioning_changed(&self, view: &ProvisioningView) {
        self.lock().provisioning.push(view.clone());
    }
}
