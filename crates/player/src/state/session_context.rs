//! Session-scoped dependency container
//!
//! Everything a playback session needs, owned by the caller and passed into
//! the controller, poller and projector constructors. Nothing here is
//! process-global.

use std::sync::Arc;

use crate::config::PlayerConfig;
use crate::infrastructure::messaging::EventBus;
use crate::ports::outbound::{
    FullscreenPort, MediaEngineFactory, MediaSurfacePort, PlaybackNotifier, ProvisioningApiPort,
};
use crate::state::Platform;

#[derive(Clone)]
pub struct SessionContext {
    pub api: Arc<dyn ProvisioningApiPort>,
    pub engines: Arc<dyn MediaEngineFactory>,
    pub surface: Arc<dyn MediaSurfacePort>,
    pub fullscreen: Arc<dyn FullscreenPort>,
    pub platform: Platform,
    pub notifier: Arc<dyn PlaybackNotifier>,
    pub config: PlayerConfig,
    pub bus: EventBus,
}

impl SessionContext {
    pub fn new(
        api: Arc<dyn ProvisioningApiPort>,
        engines: Arc<dyn MediaEngineFactory>,
        surface: Arc<dyn MediaSurfacePort>,
        fullscreen: Arc<dyn FullscreenPort>,
        platform: Platform,
        notifier: Arc<dyn PlaybackNotifier>,
        config: PlayerConfig,
    ) -> Self {
        Self {
            api,
            engines,
            surface,
            fullscreen,
            platform,
            notifier,
            config,
            bus: EventBus::new(),
        }
    }
}
