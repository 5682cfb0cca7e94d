//! Validated value objects shared by the player layers

mod content_locator;
mod engine_config;
mod playback_rate;
mod quality;

pub use content_locator::{ContentLocator, LocatorKind};
pub use engine_config::{AbrConfig, EngineConfiguration, RetryParameters, StreamingConfig};
pub use playback_rate::PlaybackRate;
pub use quality::{QualityLabel, QualityLadder};
