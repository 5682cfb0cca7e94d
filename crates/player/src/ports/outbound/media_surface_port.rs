//! Playback surface ports
//!
//! `MediaSurfacePort` is the native media element the engine renders into.
//! Property access is synchronous, matching how hosts expose element state;
//! only `play` suspends because hosts may refuse it (autoplay policy).
//!
//! `FullscreenPort` is the host's fullscreen capability. It targets the
//! surface's container rather than the element so custom controls stay
//! visible.

use streamtorrent_domain::TimeRange;

use super::{EventSink, MediaError};

#[async_trait::async_trait]
pub trait MediaSurfacePort: Send + Sync {
    async fn play(&self) -> Result<(), MediaError>;
    fn pause(&self);
    fn is_paused(&self) -> bool;

    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// `NaN` until metadata is available
    fn duration(&self) -> f64;

    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);
    fn is_muted(&self) -> bool;
    fn set_muted(&self, muted: bool);

    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&self, rate: f64);

    fn buffered(&self) -> Vec<TimeRange>;

    /// Identifier of the element wrapping the surface and its controls.
    fn container_id(&self) -> String;

    /// Route native element callbacks to `sink`, replacing any previous sink.
    fn install_listeners(&self, sink: EventSink);
    fn remove_listeners(&self);
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait FullscreenPort: Send + Sync {
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&self, container_id: &str) -> Result<(), MediaError>;
    fn exit_fullscreen(&self) -> Result<(), MediaError>;
}
