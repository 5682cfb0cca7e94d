use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::{future::Future, pin::Pin};

use crate::ports::outbound::{SleepProvider, TimeProvider};
use crate::state::Platform;

pub fn platform_with(clock: Arc<FixedClock>, sleeper: Arc<RecordingSleeper>) -> Platform {
    Platform::new(clock, sleeper)
}

/// Clock that only moves when told to.
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn new(millis: u64) -> Self {
        Self(AtomicU64::new(millis))
    }

    pub fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeProvider for FixedClock {
    fn now_unix_secs(&self) -> u64 {
        self.now_millis() / 1000
    }

    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Records requested delays and returns after a single yield.
#[derive(Default)]
pub struct RecordingSleeper {
    calls: Mutex<Vec<u64>>,
}

impl RecordingSleeper {
    pub fn calls(&self) -> Vec<u64> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SleepProvider for RecordingSleeper {
    fn sleep_ms(&self, ms: u64) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ms);
        Box::pin(tokio::task::yield_now())
    }
}
