//! Notification boundary towards the surrounding UI
//!
//! Every callback has an empty default so adapters only implement what
//! they render.

use streamtorrent_domain::{ProvisioningView, QualityLabel};

pub trait PlaybackNotifier: Send + Sync {
    fn on_ready(&self) {}

    /// One human-readable message per fatal condition.
    fn on_error(&self, _message: &str) {}

    fn on_buffering_changed(&self, _buffering: bool) {}

    fn on_time_update(&self, _current: f64, _duration: f64) {}

    fn on_quality_changed(&self, _label: &QualityLabel) {}

    fn on_provisioning_changed(&self, _view: &ProvisioningView) {}
}
