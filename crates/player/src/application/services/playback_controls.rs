//! Control Surface
//!
//! Imperative playback operations for the surrounding UI. Every operation
//! acts on the playback surface directly; the projector picks up the
//! resulting native events.

use std::sync::Arc;

use streamtorrent_domain::{known_duration, PlaybackRate, QualityLabel};

use crate::application::services::engine_adapter::QualitySelection;
use crate::application::services::playback_projector::PlaybackStateProjector;
use crate::application::services::session_lifecycle::SessionLifecycleController;
use crate::ports::outbound::{FullscreenPort, MediaSurfacePort};

/// Volume change per arrow-key press
pub const VOLUME_STEP: f64 = 0.1;
/// Seek distance per arrow-key press, in seconds
pub const SEEK_STEP_SECS: f64 = 10.0;

#[derive(Clone)]
pub struct PlaybackControls {
    surface: Arc<dyn MediaSurfacePort>,
    fullscreen: Arc<dyn FullscreenPort>,
    controller: SessionLifecycleController,
    projector: Arc<PlaybackStateProjector>,
}

impl PlaybackControls {
    pub fn new(
        surface: Arc<dyn MediaSurfacePort>,
        fullscreen: Arc<dyn FullscreenPort>,
        controller: SessionLifecycleController,
        projector: Arc<PlaybackStateProjector>,
    ) -> Self {
        Self {
            surface,
            fullscreen,
            controller,
            projector,
        }
    }

    pub async fn play(&self) {
        if let Err(e) = self.surface.play().await {
            tracing::info!(reason = %e, "Play request refused");
        }
    }

    pub fn pause(&self) {
        self.surface.pause();
    }

    pub async fn toggle_play_pause(&self) {
        if self.surface.is_paused() {
            self.play().await;
        } else {
            self.pause();
        }
    }

    /// Seek to `fraction` of the duration. Ignored while the duration is
    /// unknown.
    pub fn seek_to_fraction(&self, fraction: f64) {
        let Some(duration) = known_duration(self.surface.duration()) else {
            tracing::debug!(fraction, "Duration unknown, ignoring seek");
            return;
        };
        if !fraction.is_finite() {
            return;
        }
        self.surface
            .set_current_time(fraction.clamp(0.0, 1.0) * duration);
    }

    pub fn seek_to(&self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let upper = known_duration(self.surface.duration()).unwrap_or(f64::INFINITY);
        self.surface.set_current_time(seconds.clamp(0.0, upper));
    }

    pub fn seek_by(&self, delta_secs: f64) {
        self.seek_to(self.surface.current_time() + delta_secs);
    }

    /// Zero mutes, anything above zero unmutes.
    pub fn set_volume(&self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.surface.set_volume(volume);
        self.surface.set_muted(volume == 0.0);
    }

    pub fn adjust_volume(&self, delta: f64) {
        let next = ((self.surface.volume() + delta) * 100.0).round() / 100.0;
        self.set_volume(next);
    }

    pub fn toggle_mute(&self) {
        self.surface.set_muted(!self.surface.is_muted());
    }

    /// Rates that are not finite and positive are ignored.
    pub fn set_playback_rate(&self, rate: f64) {
        match PlaybackRate::new(rate) {
            Ok(rate) => self.surface.set_playback_rate(rate.value()),
            Err(e) => tracing::debug!(rate, error = %e, "Ignoring playback rate"),
        }
    }

    /// Fullscreen targets the surface container so the custom controls
    /// stay visible.
    pub fn toggle_fullscreen(&self) {
        let result = if self.fullscreen.is_fullscreen() {
            self.fullscreen.exit_fullscreen()
        } else {
            self.fullscreen
                .request_fullscreen(&self.surface.container_id())
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Fullscreen toggle failed");
        }
    }

    pub fn change_quality(&self, label: QualityLabel) -> QualitySelection {
        let selection = self.controller.select_quality(&label);
        if selection == QualitySelection::Applied {
            self.projector.record_selected_quality(label);
        }
        selection
    }
}
