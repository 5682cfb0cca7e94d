//! Raw API Port - Object-safe HTTP boundary
//!
//! `RawApiPort` moves untyped JSON over HTTP and is implemented by adapters.
//! The application layer provides a typed wrapper (`ProvisioningApi`) that
//! implements `ProvisioningApiPort` on top.

use serde_json::Value;

use super::ApiError;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait::async_trait]
pub trait RawApiPort: Send + Sync {
    /// GET that maps a 404 to `Ok(None)`.
    async fn get_optional_json(&self, path: &str) -> Result<Option<Value>, ApiError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    async fn delete(&self, path: &str) -> Result<(), ApiError>;

    /// Base URL requests are issued against, used to resolve relative links.
    fn base_url(&self) -> String;
}
