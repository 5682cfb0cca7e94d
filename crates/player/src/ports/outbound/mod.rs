//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing application services to drive the media engine, the playback
//! surface and the provisioning backend without depending on concrete
//! implementations.

pub mod api_port;
pub mod media_engine_port;
pub mod media_surface_port;
pub mod platform;
pub mod playback_events;
pub mod playback_notifier;
pub mod raw_api_port;

pub use api_port::{ApiError, ProvisioningApiPort};
pub use media_engine_port::{MediaEngineFactory, MediaEnginePort, MediaError};
pub use media_surface_port::{FullscreenPort, MediaSurfacePort};
pub use platform::{SleepProvider, TimeProvider};
pub use playback_events::{EngineEvent, EventSink, MediaElementEvent, PlaybackEvent};
pub use playback_notifier::PlaybackNotifier;
pub use raw_api_port::RawApiPort;

#[cfg(any(test, feature = "testing"))]
pub use api_port::MockProvisioningApiPort;
#[cfg(any(test, feature = "testing"))]
pub use media_engine_port::{MockMediaEngineFactory, MockMediaEnginePort};
#[cfg(any(test, feature = "testing"))]
pub use media_surface_port::MockFullscreenPort;
#[cfg(any(test, feature = "testing"))]
pub use raw_api_port::MockRawApiPort;
