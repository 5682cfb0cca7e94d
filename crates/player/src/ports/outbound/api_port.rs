//! Provisioning API port
//!
//! Typed boundary to the backend that turns a content locator into a
//! playable manifest:
//!
//! - `POST /api/stream` with `{input}` creates a session
//! - `GET /api/stream/{id}/status` reports progress (404 while unknown)
//! - `DELETE /api/stream/{id}` tears the session down (idempotent)

use streamtorrent_domain::{ContentLocator, ProvisioningStatusRecord, SessionId};
use thiserror::Error;

/// Errors from the provisioning transport
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Network failure or timeout; no HTTP status was received
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Failed to serialize request: {0}")]
    SerializeError(String),
}

impl ApiError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::HttpError {
            status,
            message: message.into(),
        }
    }

    /// Transport failures are retried with backoff by the poller.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::RequestFailed(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpError { status: 404, .. })
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait::async_trait]
pub trait ProvisioningApiPort: Send + Sync {
    /// Submit a content locator; returns the backend-assigned session id.
    async fn create_session(&self, locator: &ContentLocator) -> Result<SessionId, ApiError>;

    /// Fetch the current status. `Ok(None)` means the backend does not know
    /// the session (yet); the manifest URI, if any, is absolute.
    async fn fetch_status(
        &self,
        id: &SessionId,
    ) -> Result<Option<ProvisioningStatusRecord>, ApiError>;

    async fn delete_session(&self, id: &SessionId) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert!(ApiError::RequestFailed("connection refused".into()).is_transport());
        assert!(!ApiError::http(500, "boom").is_transport());
        assert!(ApiError::http(404, "Stream not found").is_not_found());
        assert_eq!(
            ApiError::http(400, "input required").to_string(),
            "HTTP 400: input required"
        );
    }
}
