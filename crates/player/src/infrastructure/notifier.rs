//! Notification adapter that reports every playback callback as a log line.

use streamtorrent_domain::display::{format_size, format_throughput};
use streamtorrent_domain::{ProvisioningView, QualityLabel};

use crate::ports::outbound::PlaybackNotifier;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl PlaybackNotifier for TracingNotifier {
    fn on_ready(&self) {
        tracing::info!("Playback ready");
    }

    fn on_error(&self, message: &str) {
        tracing::error!(error = message, "Playback error");
    }

    fn on_buffering_changed(&self, buffering: bool) {
        tracing::debug!(buffering, "Buffering changed");
    }

    fn on_time_update(&self, current: f64, duration: f64) {
        tracing::trace!(current, duration, "Time update");
    }

    fn on_quality_changed(&self, label: &QualityLabel) {
        tracing::info!(quality = %label, "Quality changed");
    }

    fn on_provisioning_changed(&self, view: &ProvisioningView) {
        tracing::info!(
            state = %view.state,
            progress = view.progress_percent,
            peers = view.peer_count,
            speed = %format_throughput(view.throughput_mbps),
            peak = %format_throughput(view.peak_throughput_mbps),
            downloaded = %format_size(view.transferred_mb),
            file = view.file_name.as_deref().unwrap_or("-"),
            "Provisioning update"
        );
    }
}
