//! StreamTorrent Player crate.
//!
//! Playback session manager: provisions a stream through the backend API,
//! binds the resulting manifest to an adaptive-streaming engine and projects
//! playback state for the surrounding UI. Engines, surfaces and the backend
//! are reached only through the traits in [`ports::outbound`].

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;
pub mod state;

pub use application::{SessionError, StreamSessionService};
pub use config::PlayerConfig;
pub use state::{Platform, SessionContext};
