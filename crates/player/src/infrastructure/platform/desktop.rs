//! Desktop platform implementations
//!
//! Backed by `std::time` for the clock and tokio timers for sleeping.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use std::{future::Future, pin::Pin, sync::Arc};

use crate::ports::outbound::platform::{SleepProvider, TimeProvider};
use crate::state::Platform;

/// Desktop time provider using std::time
#[derive(Clone, Default)]
pub struct DesktopTimeProvider;

impl TimeProvider for DesktopTimeProvider {
    fn now_unix_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Desktop sleep provider using tokio timers
#[derive(Clone, Default)]
pub struct DesktopSleepProvider;

impl SleepProvider for DesktopSleepProvider {
    fn sleep_ms(&self, ms: u64) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        Box::pin(tokio::time::sleep(Duration::from_millis(ms)))
    }
}

/// Create the desktop platform container
pub fn create_platform() -> Platform {
    Platform::new(
        Arc::new(DesktopTimeProvider),
        Arc::new(DesktopSleepProvider),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_reports_consistent_units() {
        let time = DesktopTimeProvider;
        let secs = time.now_unix_secs();
        let millis = time.now_millis();
        assert!(millis / 1000 >= secs);
        assert!(secs > 1_600_000_000);
    }

    #[tokio::test]
    async fn platform_sleep_completes() {
        let platform = create_platform();
        platform.sleep_ms(1).await;
        assert!(platform.now().timestamp() > 1_600_000_000);
    }
}
