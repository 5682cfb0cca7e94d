//! Playback snapshot and the pure computations behind it

use serde::{Deserialize, Serialize};

use crate::{PlaybackRate, QualityLabel, QualityLadder};

/// One contiguous buffered span, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, position: f64) -> bool {
        self.start <= position && position <= self.end
    }
}

/// A rendition exposed by the media engine's track enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantTrack {
    pub id: u64,
    /// Vertical resolution; absent for audio-only variants
    pub height: Option<u32>,
    pub width: Option<u32>,
    /// Bits per second
    pub bandwidth: u64,
    pub active: bool,
}

/// Duration in seconds, or `None` when the element has not reported one yet.
///
/// Media elements report `NaN` before metadata loads and `+inf` for live
/// streams; both count as unknown, as does zero.
pub fn known_duration(duration: f64) -> Option<f64> {
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

/// Fraction of the media buffered up to the end of the range that holds the
/// playhead. Zero when duration is unknown or no range contains the playhead.
pub fn buffered_fraction(ranges: &[TimeRange], position: f64, duration: f64) -> f64 {
    let Some(duration) = known_duration(duration) else {
        return 0.0;
    };

    ranges
        .iter()
        .filter(|r| r.contains(position))
        .map(|r| r.end)
        .fold(None, |furthest: Option<f64>, end| {
            Some(furthest.map_or(end, |f| f.max(end)))
        })
        .map_or(0.0, |end| (end / duration).clamp(0.0, 1.0))
}

/// UI-facing cache of the latest derivation from the bound element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub current_time: f64,
    /// Zero while unknown
    pub duration: f64,
    pub volume: f64,
    pub is_muted: bool,
    pub is_playing: bool,
    pub is_buffering: bool,
    pub buffered_fraction: f64,
    pub active_quality_label: Option<QualityLabel>,
    pub selected_quality: QualityLabel,
    pub quality_ladder: QualityLadder,
    pub playback_rate: PlaybackRate,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            is_muted: false,
            is_playing: false,
            is_buffering: false,
            buffered_fraction: 0.0,
            active_quality_label: None,
            selected_quality: QualityLabel::Auto,
            quality_ladder: QualityLadder::default(),
            playback_rate: PlaybackRate::NORMAL,
        }
    }
}
