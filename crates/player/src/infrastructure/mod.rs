pub mod http_client;
pub mod messaging;
pub mod notifier;
pub mod platform;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use http_client::HttpApiClient;
pub use messaging::{EventBus, SubscriptionId};
pub use notifier::TracingNotifier;
