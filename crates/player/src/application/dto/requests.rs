//! Provisioning API request/response DTOs

use serde::{Deserialize, Serialize};

/// Body of `POST /api/stream`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateStreamRequest {
    pub input: String,
}

/// Success body of `POST /api/stream`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateStreamResponse {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
}
