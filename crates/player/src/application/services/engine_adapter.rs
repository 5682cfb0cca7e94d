//! Media Engine Adapter
//!
//! Thin wrapper over one [`MediaEnginePort`] instance exposing exactly what
//! the lifecycle controller needs. Buffering and retry behaviour stay inside
//! the engine; this layer only passes configuration through and translates
//! quality labels into track selections.

use std::sync::Arc;

use serde_json::json;
use streamtorrent_domain::{EngineConfiguration, QualityLabel, QualityLadder};

use crate::ports::outbound::{EventSink, MediaEnginePort, MediaError, MediaSurfacePort};

/// Result of a quality change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualitySelection {
    Applied,
    /// No rendition with that exact height; nothing changed
    NoMatch,
    /// No engine is bound
    Unbound,
}

#[derive(Clone)]
pub struct MediaEngineAdapter {
    engine: Arc<dyn MediaEnginePort>,
}

impl MediaEngineAdapter {
    pub fn new(engine: Arc<dyn MediaEnginePort>) -> Self {
        Self { engine }
    }

    pub async fn attach(&self, surface: Arc<dyn MediaSurfacePort>) -> Result<(), MediaError> {
        self.engine.attach(surface).await
    }

    pub fn configure(&self, config: &EngineConfiguration) -> Result<(), MediaError> {
        let options = serde_json::to_value(config)
            .map_err(|e| MediaError::engine("configure", e.to_string()))?;
        self.engine.configure(&options)
    }

    pub async fn load(&self, uri: &str) -> Result<(), MediaError> {
        self.engine.load(uri).await
    }

    pub async fn destroy(&self) -> Result<(), MediaError> {
        self.engine.destroy().await
    }

    pub fn install_listeners(&self, sink: EventSink) {
        self.engine.install_listeners(sink);
    }

    pub fn available_qualities(&self) -> QualityLadder {
        QualityLadder::from_tracks(&self.engine.variant_tracks())
    }

    /// `auto` re-enables adaptation. A fixed label disables adaptation and
    /// pins the highest-bandwidth rendition with exactly that height.
    pub fn select_quality(&self, label: &QualityLabel) -> Result<QualitySelection, MediaError> {
        let Some(height) = label.height() else {
            self.engine.configure(&json!({ "abr": { "enabled": true } }))?;
            return Ok(QualitySelection::Applied);
        };

        let tracks = self.engine.variant_tracks();
        let Some(track) = tracks
            .iter()
            .filter(|t| t.height == Some(height))
            .max_by_key(|t| t.bandwidth)
        else {
            tracing::debug!(
                quality = %label,
                available = ?QualityLadder::from_tracks(&tracks).heights(),
                "No rendition for requested quality, ignoring"
            );
            return Ok(QualitySelection::NoMatch);
        };

        self.engine.configure(&json!({ "abr": { "enabled": false } }))?;
        self.engine.select_variant_track(track, true)?;
        Ok(QualitySelection::Applied)
    }
}
