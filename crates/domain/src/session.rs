//! A single user-initiated playback request

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ContentLocator, DomainError, ProvisioningState, ProvisioningView, SessionId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    locator: ContentLocator,
    source_uri: Option<String>,
    provisioning_state: ProvisioningState,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, locator: ContentLocator, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            locator,
            source_uri: None,
            provisioning_state: ProvisioningState::Pending,
            created_at,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn locator(&self) -> &ContentLocator {
        &self.locator
    }

    pub fn source_uri(&self) -> Option<&str> {
        self.source_uri.as_deref()
    }

    pub fn provisioning_state(&self) -> ProvisioningState {
        self.provisioning_state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Record the playable source. Setting the same URI again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` if a different source
    /// was already recorded.
    pub fn set_source_uri(&mut self, uri: &str) -> Result<(), DomainError> {
        match &self.source_uri {
            Some(existing) if existing != uri => Err(DomainError::invalid_state_transition(
                format!("session {} already has source {existing}", self.id),
            )),
            Some(_) => Ok(()),
            None => {
                self.source_uri = Some(uri.to_string());
                Ok(())
            }
        }
    }

    /// Sync with the latest provisioning view.
    pub fn observe(&mut self, view: &ProvisioningView) -> Result<(), DomainError> {
        self.provisioning_state = view.state;
        if let Some(uri) = &view.manifest_uri {
            self.set_source_uri(uri)?;
        }
        Ok(())
    }
}
