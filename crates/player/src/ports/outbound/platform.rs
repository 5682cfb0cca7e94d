//! Platform abstraction ports
//!
//! Time and sleeping go through these traits so the poller cadence and the
//! deferred autoplay can be driven deterministically in tests.
//!
//! NOTE: The `Platform` struct (DI container) that aggregates these traits
//! lives in `state/platform.rs`, not here.

use std::{future::Future, pin::Pin};

/// Time operations abstraction
pub trait TimeProvider: Send + Sync + 'static {
    /// Get current time as Unix timestamp in seconds
    fn now_unix_secs(&self) -> u64;

    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> u64;
}

/// Async sleep abstraction
pub trait SleepProvider: Send + Sync + 'static {
    fn sleep_ms(&self, ms: u64) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
}
