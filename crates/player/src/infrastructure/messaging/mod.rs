//! Playback event messaging.
//!
//! - `EventBus`: fans playback events out to subscribers (push-based)
//! - `EventSink` (from the ports layer): per-binding producer handle given
//!   to engine and surface adapters

pub mod event_bus;

pub use event_bus::{EventBus, SubscriptionId};
