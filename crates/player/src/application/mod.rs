pub mod api;
pub mod dto;
pub mod error;
pub mod services;

pub use api::ProvisioningApi;
pub use error::SessionError;
pub use services::{
    BindOutcome, KeyboardDispatcher, PlaybackControls, ProvisioningPoller,
    SessionLifecycleController, StreamSessionService,
};
