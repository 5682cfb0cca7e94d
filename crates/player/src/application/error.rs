//! Service layer error types

use streamtorrent_domain::DomainError;
use thiserror::Error;

use crate::ports::outbound::ApiError;

/// Errors returned by `StreamSessionService`
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    /// The content locator was rejected before any request was made
    #[error("Invalid content locator: {0}")]
    InvalidLocator(#[from] DomainError),

    /// The backend refused or could not be reached when creating the session
    #[error("Could not start stream: {0}")]
    Create(#[from] ApiError),
}

impl SessionError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidLocator(DomainError::Validation(msg)) => msg.clone(),
            Self::Create(ApiError::HttpError { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}
