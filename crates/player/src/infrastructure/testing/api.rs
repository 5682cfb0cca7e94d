use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use streamtorrent_domain::{ContentLocator, ProvisioningStatusRecord, SessionId};

use crate::ports::outbound::{ApiError, ProvisioningApiPort};

type StatusResponse = Result<Option<ProvisioningStatusRecord>, ApiError>;

/// Provisioning backend that replays scripted status responses in order.
///
/// Once the script runs out, `fetch_status` never completes, which parks the
/// poller until it is cancelled.
pub struct ScriptedProvisioningApi {
    session_ids: Mutex<VecDeque<Result<SessionId, ApiError>>>,
    responses: Mutex<VecDeque<StatusResponse>>,
    submitted: Mutex<Vec<String>>,
    deleted: Mutex<Vec<SessionId>>,
    fetches: AtomicUsize,
}

impl ScriptedProvisioningApi {
    pub fn new(responses: Vec<StatusResponse>) -> Self {
        Self {
            session_ids: Mutex::new(VecDeque::new()),
            responses: Mutex::new(responses.into()),
            submitted: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Queue the result of the next `create_session`. Without one, sessions
    /// are created as `abc123`.
    pub fn push_session(&self, result: Result<SessionId, ApiError>) {
        self.session_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    pub fn push_status(&self, response: StatusResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn deleted(&self) -> Vec<SessionId> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl ProvisioningApiPort for ScriptedProvisioningApi {
    async fn create_session(&self, locator: &ContentLocator) -> Result<SessionId, ApiError> {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(locator.as_str().to_string());
        let scripted = self
            .session_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match scripted {
            Some(result) => result,
            None => SessionId::new("abc123").map_err(|e| ApiError::ParseError(e.to_string())),
        }
    }

    async fn fetch_status(&self, _id: &SessionId) -> StatusResponse {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(response) => response,
            None => std::future::pending().await,
        }
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), ApiError> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id.clone());
        Ok(())
    }
}
