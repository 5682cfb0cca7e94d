extern crate self as streamtorrent_domain;

pub mod display;
pub mod error;
pub mod ids;
pub mod playback;
pub mod provisioning;
pub mod session;
pub mod value_objects;

pub use error::DomainError;

pub use ids::{BindingId, SessionId};

pub use playback::{buffered_fraction, known_duration, PlaybackSnapshot, TimeRange, VariantTrack};

pub use provisioning::{
    ProvisioningState, ProvisioningStatus, ProvisioningStatusRecord, ProvisioningTracker,
    ProvisioningView, TrackerUpdate,
};

pub use session::Session;

pub use value_objects::{
    AbrConfig, ContentLocator, EngineConfiguration, LocatorKind, PlaybackRate, QualityLabel,
    QualityLadder, RetryParameters, StreamingConfig,
};
