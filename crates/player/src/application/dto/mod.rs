//! Data transfer objects
//!
//! Wire shapes of the provisioning API that are not domain types. The
//! status record lives in the domain crate because the provisioning state
//! machine folds it directly.

pub mod requests;

pub use requests::{CreateStreamRequest, CreateStreamResponse};
