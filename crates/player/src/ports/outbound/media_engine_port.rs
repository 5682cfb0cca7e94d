//! Media engine capability port
//!
//! The adaptive-streaming engine (manifest parsing, segment fetching, ABR)
//! is external. This port is the capability set the player consumes:
//! attach, configure, load, destroy, track enumeration, track selection and
//! event subscription.

use std::sync::Arc;

use serde_json::Value;
use streamtorrent_domain::VariantTrack;
use thiserror::Error;

use super::{EventSink, MediaSurfacePort};

/// Errors from the engine or the playback surface
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MediaError {
    /// The host cannot run the media engine
    #[error("Media engine is not supported in this environment")]
    Unsupported,

    #[error("Media engine {operation} failed: {message}")]
    Engine {
        operation: &'static str,
        message: String,
    },

    /// Autoplay policy or similar refused playback
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    #[error("Host error: {0}")]
    Host(String),
}

impl MediaError {
    pub fn engine(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Engine {
            operation,
            message: message.into(),
        }
    }
}

/// One live engine instance.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait::async_trait]
pub trait MediaEnginePort: Send + Sync {
    async fn attach(&self, surface: Arc<dyn MediaSurfacePort>) -> Result<(), MediaError>;

    /// Merge a partial configuration tree (engine option names) into the
    /// engine's current configuration.
    fn configure(&self, options: &Value) -> Result<(), MediaError>;

    async fn load(&self, uri: &str) -> Result<(), MediaError>;

    async fn destroy(&self) -> Result<(), MediaError>;

    fn variant_tracks(&self) -> Vec<VariantTrack>;

    fn select_variant_track(&self, track: &VariantTrack, clear_buffer: bool)
        -> Result<(), MediaError>;

    /// Route error, buffering, adaptation and track-list callbacks to `sink`.
    fn install_listeners(&self, sink: EventSink);
}

/// Creates engine instances.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait MediaEngineFactory: Send + Sync {
    fn is_supported(&self) -> bool;

    fn create(&self) -> Result<Arc<dyn MediaEnginePort>, MediaError>;
}
