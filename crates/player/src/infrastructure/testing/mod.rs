//! In-memory fakes for the outbound ports.
//!
//! Available to unit tests and, through the `testing` feature, to
//! downstream crates that want to drive a session without a real engine or
//! backend.

mod api;
mod media;
mod notifier;
mod platform;

use std::sync::Arc;

pub use api::ScriptedProvisioningApi;
pub use media::{EngineLog, FakeEngineFactory, FakeFullscreen, FakeMediaEngine, FakeMediaSurface};
pub use notifier::RecordingNotifier;
pub use platform::{platform_with, FixedClock, RecordingSleeper};

use crate::config::PlayerConfig;
use crate::state::SessionContext;

/// Context over fakes, with a provisioning API that never answers.
pub fn test_context(
    engines: Arc<FakeEngineFactory>,
    surface: Arc<FakeMediaSurface>,
    notifier: Arc<RecordingNotifier>,
) -> SessionContext {
    context_with(
        Arc::new(ScriptedProvisioningApi::new(Vec::new())),
        engines,
        surface,
        notifier,
    )
}

pub fn context_with(
    api: Arc<ScriptedProvisioningApi>,
    engines: Arc<FakeEngineFactory>,
    surface: Arc<FakeMediaSurface>,
    notifier: Arc<RecordingNotifier>,
) -> SessionContext {
    SessionContext::new(
        api,
        engines,
        surface,
        Arc::new(FakeFullscreen::default()),
        platform_with(
            Arc::new(FixedClock::new(1_700_000_000_000)),
            Arc::new(RecordingSleeper::default()),
        ),
        notifier,
        PlayerConfig::default(),
    )
}
