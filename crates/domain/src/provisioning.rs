//! Provisioning status records and the client-side state machine over them
//!
//! The backend is pulled, never pushed: every status fetch yields a
//! [`ProvisioningStatusRecord`] which the [`ProvisioningTracker`] folds into a
//! [`ProvisioningView`]. The tracker owns the state machine rules:
//!
//! - `ready` and `error` are terminal; nothing transitions out of them
//! - the manifest URI is set once and never overwritten
//! - once polling has halted no record is applied

use std::fmt;

use serde::{Deserialize, Serialize};

/// Client-side provisioning state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningState {
    #[default]
    Pending,
    Downloading,
    Transcoding,
    Ready,
    Error,
    Stopped,
}

impl ProvisioningState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Transcoding => "transcoding",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status string as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisioningStatus {
    Downloading,
    Transcoding,
    Ready,
    Error,
    #[serde(other)]
    Unknown,
}

/// Wire shape of `GET /api/stream/{id}/status`.
///
/// The backend sends empty strings rather than omitting `error`, `fileName`
/// and `hlsUrl`, and always sends `hlsUrl` regardless of status; use the
/// accessor methods rather than the raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningStatusRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub status: ProvisioningStatus,
    #[serde(default, rename = "progress")]
    pub progress_percent: f64,
    #[serde(default, rename = "peers")]
    pub peer_count: u32,
    /// MB/s, instantaneous
    #[serde(default, rename = "speed")]
    pub throughput_mbps: Option<f64>,
    /// Cumulative MB
    #[serde(default, rename = "downloaded")]
    pub transferred_mb: Option<f64>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default, rename = "hlsUrl")]
    pub manifest_uri: Option<String>,
    #[serde(default, rename = "error")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub qualities: Option<Vec<String>>,
    #[serde(default)]
    pub source_width: Option<u32>,
    #[serde(default)]
    pub source_height: Option<u32>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ProvisioningStatusRecord {
    /// A bare record with only the status set.
    pub fn with_status(status: ProvisioningStatus) -> Self {
        Self {
            id: None,
            status,
            progress_percent: 0.0,
            peer_count: 0,
            throughput_mbps: None,
            transferred_mb: None,
            file_name: None,
            manifest_uri: None,
            error_message: None,
            qualities: None,
            source_width: None,
            source_height: None,
        }
    }

    /// The manifest URI, honoured only once the backend reports `ready`.
    pub fn ready_manifest(&self) -> Option<&str> {
        match self.status {
            ProvisioningStatus::Ready => non_empty(&self.manifest_uri),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        non_empty(&self.error_message)
    }

    pub fn file(&self) -> Option<&str> {
        non_empty(&self.file_name)
    }

    pub fn source_resolution(&self) -> Option<(u32, u32)> {
        match (self.source_width, self.source_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// UI-observable projection of provisioning progress.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningView {
    pub state: ProvisioningState,
    pub progress_percent: f64,
    pub peer_count: u32,
    pub throughput_mbps: f64,
    pub peak_throughput_mbps: f64,
    pub transferred_mb: f64,
    pub file_name: Option<String>,
    pub manifest_uri: Option<String>,
    pub error_message: Option<String>,
    pub qualities: Vec<String>,
    pub source_resolution: Option<(u32, u32)>,
}

/// What applying a record changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerUpdate {
    /// Polling already halted; the record was discarded
    Ignored,
    /// Stats and/or the non-terminal state changed
    Updated,
    /// The manifest URI appeared for the first time
    BecameReady(String),
    /// Backend reported an error before the session was ready
    Failed(String),
    /// Backend reported an error after the session was ready; the state
    /// stays `ready` but polling must stop
    Halted(String),
}

#[derive(Debug, Clone, Default)]
pub struct ProvisioningTracker {
    view: ProvisioningView,
    /// (cumulative MB, observed at ms) of the previous record with a byte count
    last_sample: Option<(f64, u64)>,
    halted: bool,
}

impl ProvisioningTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &ProvisioningView {
        &self.view
    }

    pub fn state(&self) -> ProvisioningState {
        self.view.state
    }

    pub fn should_continue_polling(&self) -> bool {
        !self.halted
            && !matches!(
                self.view.state,
                ProvisioningState::Error | ProvisioningState::Stopped
            )
    }

    /// Fold one status record into the view.
    ///
    /// `observed_at_ms` is the wall-clock time the record was received; it is
    /// only used when the backend omits `speed` and throughput has to be
    /// derived from cumulative bytes.
    pub fn apply(&mut self, record: &ProvisioningStatusRecord, observed_at_ms: u64) -> TrackerUpdate {
        if !self.should_continue_polling() {
            return TrackerUpdate::Ignored;
        }

        self.record_stats(record, observed_at_ms);

        match record.status {
            ProvisioningStatus::Error => {
                let message = record
                    .error()
                    .unwrap_or("provisioning failed")
                    .to_string();
                if self.view.state == ProvisioningState::Ready {
                    self.halted = true;
                    TrackerUpdate::Halted(message)
                } else {
                    self.view.state = ProvisioningState::Error;
                    self.view.error_message = Some(message.clone());
                    TrackerUpdate::Failed(message)
                }
            }
            ProvisioningStatus::Ready => match record.ready_manifest() {
                Some(uri) if self.view.manifest_uri.is_none() => {
                    self.view.manifest_uri = Some(uri.to_string());
                    self.view.state = ProvisioningState::Ready;
                    TrackerUpdate::BecameReady(uri.to_string())
                }
                _ => TrackerUpdate::Updated,
            },
            ProvisioningStatus::Downloading => {
                self.advance(ProvisioningState::Downloading);
                TrackerUpdate::Updated
            }
            ProvisioningStatus::Transcoding => {
                self.advance(ProvisioningState::Transcoding);
                TrackerUpdate::Updated
            }
            ProvisioningStatus::Unknown => TrackerUpdate::Updated,
        }
    }

    /// Explicit disposal. Non-terminal states become `stopped`; `ready` and
    /// `error` are kept as they are.
    pub fn stop(&mut self) {
        self.halted = true;
        if !self.view.state.is_terminal() {
            self.view.state = ProvisioningState::Stopped;
        }
    }

    fn advance(&mut self, next: ProvisioningState) {
        if !self.view.state.is_terminal() {
            self.view.state = next;
        }
    }

    fn record_stats(&mut self, record: &ProvisioningStatusRecord, observed_at_ms: u64) {
        self.view.progress_percent = record.progress_percent.clamp(0.0, 100.0);
        self.view.peer_count = record.peer_count;

        let derived = match (record.transferred_mb, self.last_sample) {
            (Some(now_mb), Some((prev_mb, prev_ms))) if observed_at_ms > prev_ms => {
                let elapsed_secs = (observed_at_ms - prev_ms) as f64 / 1000.0;
                Some(((now_mb - prev_mb) / elapsed_secs).max(0.0))
            }
            _ => None,
        };
        let throughput = record.throughput_mbps.or(derived);
        if let Some(throughput) = throughput.filter(|t| t.is_finite()) {
            let throughput = throughput.max(0.0);
            self.view.throughput_mbps = throughput;
            self.view.peak_throughput_mbps = self.view.peak_throughput_mbps.max(throughput);
        }

        if let Some(mb) = record.transferred_mb {
            self.view.transferred_mb = mb;
            self.last_sample = Some((mb, observed_at_ms));
        }
        if let Some(name) = record.file() {
            self.view.file_name = Some(name.to_string());
        }
        if let Some(qualities) = &record.qualities {
            self.view.qualities = qualities.clone();
        }
        if let Some(resolution) = record.source_resolution() {
            self.view.source_resolution = Some(resolution);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: ProvisioningStatus) -> ProvisioningStatusRecord {
        ProvisioningStatusRecord::with_status(status)
    }

    fn ready(uri: &str) -> ProvisioningStatusRecord {
        ProvisioningStatusRecord {
            manifest_uri: Some(uri.to_string()),
            ..record(ProvisioningStatus::Ready)
        }
    }

    fn failed(message: &str) -> ProvisioningStatusRecord {
        ProvisioningStatusRecord {
            error_message: Some(message.to_string()),
            ..record(ProvisioningStatus::Error)
        }
    }

    #[test]
    fn deserializes_backend_status_payload() {
        let json = r#"{
            "id": "abc123",
            "status": "downloading",
            "progress": 42.0,
            "fileName": "movie.mkv",
            "error": "",
            "peers": 7,
            "downloaded": 120.5,
            "speed": 2.25,
            "qualities": null,
            "sourceWidth": 1920,
            "sourceHeight": 1080,
            "hlsUrl": "/api/stream/abc123/master.m3u8"
        }"#;
        let record: ProvisioningStatusRecord = serde_json::from_str(json).expect("parse");

        assert_eq!(record.status, ProvisioningStatus::Downloading);
        assert_eq!(record.progress_percent, 42.0);
        assert_eq!(record.peer_count, 7);
        assert_eq!(record.throughput_mbps, Some(2.25));
        assert_eq!(record.file(), Some("movie.mkv"));
        assert_eq!(record.error(), None);
        // hlsUrl is always sent but only honoured when ready
        assert_eq!(record.ready_manifest(), None);
        assert_eq!(record.source_resolution(), Some((1920, 1080)));
    }

    #[test]
    fn unknown_status_strings_do_not_fail_parsing() {
        let record: ProvisioningStatusRecord =
            serde_json::from_str(r#"{"status":"queued"}"#).expect("parse");
        assert_eq!(record.status, ProvisioningStatus::Unknown);
    }

    #[test]
    fn pending_moves_to_reported_state_on_first_fetch() {
        let mut tracker = ProvisioningTracker::new();
        assert_eq!(tracker.state(), ProvisioningState::Pending);

        let update = tracker.apply(
            &ProvisioningStatusRecord {
                progress_percent: 42.0,
                peer_count: 7,
                ..record(ProvisioningStatus::Downloading)
            },
            0,
        );

        assert_eq!(update, TrackerUpdate::Updated);
        assert_eq!(tracker.state(), ProvisioningState::Downloading);
        assert_eq!(tracker.view().progress_percent, 42.0);
        assert_eq!(tracker.view().peer_count, 7);
    }

    #[test]
    fn downloading_and_transcoding_alternate() {
        let mut tracker = ProvisioningTracker::new();
        tracker.apply(&record(ProvisioningStatus::Downloading), 0);
        tracker.apply(&record(ProvisioningStatus::Transcoding), 1000);
        assert_eq!(tracker.state(), ProvisioningState::Transcoding);
        tracker.apply(&record(ProvisioningStatus::Downloading), 2000);
        assert_eq!(tracker.state(), ProvisioningState::Downloading);
    }

    #[test]
    fn ready_is_reported_once_and_manifest_never_overwritten() {
        let mut tracker = ProvisioningTracker::new();
        tracker.apply(&record(ProvisioningStatus::Transcoding), 0);

        let first = tracker.apply(&ready("https://cdn.test/a/master.m3u8"), 1000);
        assert_eq!(
            first,
            TrackerUpdate::BecameReady("https://cdn.test/a/master.m3u8".to_string())
        );

        let second = tracker.apply(&ready("https://cdn.test/b/master.m3u8"), 2000);
        assert_eq!(second, TrackerUpdate::Updated);
        assert_eq!(
            tracker.view().manifest_uri.as_deref(),
            Some("https://cdn.test/a/master.m3u8")
        );
    }

    #[test]
    fn ready_without_manifest_keeps_current_state() {
        let mut tracker = ProvisioningTracker::new();
        tracker.apply(&record(ProvisioningStatus::Transcoding), 0);
        let update = tracker.apply(&ready("   "), 1000);
        assert_eq!(update, TrackerUpdate::Updated);
        assert_eq!(tracker.state(), ProvisioningState::Transcoding);
    }

    #[test]
    fn ready_is_never_left() {
        let mut tracker = ProvisioningTracker::new();
        tracker.apply(&ready("https://cdn.test/master.m3u8"), 0);

        tracker.apply(&record(ProvisioningStatus::Downloading), 1000);
        assert_eq!(tracker.state(), ProvisioningState::Ready);

        let update = tracker.apply(&failed("torrent removed"), 2000);
        assert_eq!(update, TrackerUpdate::Halted("torrent removed".to_string()));
        assert_eq!(tracker.state(), ProvisioningState::Ready);
        assert!(!tracker.should_continue_polling());

        tracker.stop();
        assert_eq!(tracker.state(), ProvisioningState::Ready);
    }

    #[test]
    fn error_is_terminal_and_stops_polling() {
        let mut tracker = ProvisioningTracker::new();
        tracker.apply(&record(ProvisioningStatus::Downloading), 0);

        let update = tracker.apply(&failed("no peers"), 1000);
        assert_eq!(update, TrackerUpdate::Failed("no peers".to_string()));
        assert_eq!(tracker.view().error_message.as_deref(), Some("no peers"));
        assert!(!tracker.should_continue_polling());

        assert_eq!(
            tracker.apply(&ready("https://cdn.test/master.m3u8"), 2000),
            TrackerUpdate::Ignored
        );
        assert_eq!(tracker.state(), ProvisioningState::Error);
        assert_eq!(tracker.view().manifest_uri, None);
    }

    #[test]
    fn error_without_message_gets_a_default() {
        let mut tracker = ProvisioningTracker::new();
        let update = tracker.apply(&record(ProvisioningStatus::Error), 0);
        assert_eq!(update, TrackerUpdate::Failed("provisioning failed".to_string()));
    }

    #[test]
    fn stop_moves_non_terminal_state_to_stopped() {
        let mut tracker = ProvisioningTracker::new();
        tracker.apply(&record(ProvisioningStatus::Downloading), 0);
        tracker.stop();

        assert_eq!(tracker.state(), ProvisioningState::Stopped);
        assert_eq!(
            tracker.apply(&record(ProvisioningStatus::Transcoding), 1000),
            TrackerUpdate::Ignored
        );
    }

    #[test]
    fn peak_throughput_is_the_running_maximum() {
        let mut tracker = ProvisioningTracker::new();
        for (i, speed) in [1.5, 4.0, 2.0].into_iter().enumerate() {
            tracker.apply(
                &ProvisioningStatusRecord {
                    throughput_mbps: Some(speed),
                    ..record(ProvisioningStatus::Downloading)
                },
                i as u64 * 1000,
            );
        }
        assert_eq!(tracker.view().throughput_mbps, 2.0);
        assert_eq!(tracker.view().peak_throughput_mbps, 4.0);
    }

    #[test]
    fn throughput_without_speed_is_normalized_by_elapsed_time() {
        let mut tracker = ProvisioningTracker::new();
        let sample = |mb: f64| ProvisioningStatusRecord {
            transferred_mb: Some(mb),
            ..record(ProvisioningStatus::Downloading)
        };

        tracker.apply(&sample(10.0), 1_000);
        // no previous sample, nothing derived yet
        assert_eq!(tracker.view().throughput_mbps, 0.0);

        // 6 MB over an uneven 4 s gap
        tracker.apply(&sample(16.0), 5_000);
        assert_eq!(tracker.view().throughput_mbps, 1.5);
        assert_eq!(tracker.view().transferred_mb, 16.0);
    }
}
