//! Application services
//!
//! This module contains the playback session use cases. Services depend on
//! port traits, not concrete infrastructure implementations.

pub mod engine_adapter;
pub mod keyboard;
pub mod playback_controls;
pub mod playback_projector;
pub mod provisioning_poller;
pub mod session_lifecycle;
pub mod stream_session_service;

pub use engine_adapter::{MediaEngineAdapter, QualitySelection};
pub use keyboard::{FocusTarget, KeyOutcome, KeyboardDispatcher, Shortcut};
pub use playback_controls::PlaybackControls;
pub use playback_projector::PlaybackStateProjector;
pub use provisioning_poller::ProvisioningPoller;
pub use session_lifecycle::{BindOutcome, SessionLifecycleController};
pub use stream_session_service::StreamSessionService;
