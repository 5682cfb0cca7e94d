//! Platform DI Container
//!
//! `Platform` aggregates the time and sleep providers behind their port
//! traits. It is created by `create_platform()` in
//! `infrastructure/platform/desktop.rs`, or assembled from fakes in tests.

use std::{future::Future, pin::Pin, sync::Arc};

use chrono::{DateTime, Utc};

use crate::ports::outbound::{SleepProvider, TimeProvider};

/// Unified platform services container
#[derive(Clone)]
pub struct Platform {
    time: Arc<dyn TimeProvider>,
    sleep: Arc<dyn SleepProvider>,
}

impl Platform {
    pub fn new(time: Arc<dyn TimeProvider>, sleep: Arc<dyn SleepProvider>) -> Self {
        Self { time, sleep }
    }

    pub fn now_unix_secs(&self) -> u64 {
        self.time.now_unix_secs()
    }

    pub fn now_millis(&self) -> u64 {
        self.time.now_millis()
    }

    /// Current time as a timestamp; falls back to the epoch if the provider
    /// reports something out of range.
    pub fn now(&self) -> DateTime<Utc> {
        i64::try_from(self.time.now_millis())
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_default()
    }

    pub fn sleep_ms(&self, ms: u64) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        self.sleep.sleep_ms(ms)
    }
}
