//! State containers for player-side dependency injection
//!
//! This module contains DI containers that aggregate services and adapters.
//! These are concrete implementations that belong in the adapters layer,
//! not the ports layer.

mod platform;
mod session_context;

pub use platform::Platform;
pub use session_context::SessionContext;
