//! Typed provisioning API for application services.
//!
//! `ProvisioningApi` wraps an `Arc<dyn RawApiPort>` and implements
//! `ProvisioningApiPort` via serde_json conversions. Relative manifest
//! links in status records are resolved against the raw port's base URL.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use streamtorrent_domain::{ContentLocator, ProvisioningStatusRecord, SessionId};
use url::Url;

use crate::application::dto::{CreateStreamRequest, CreateStreamResponse};
use crate::ports::outbound::{ApiError, ProvisioningApiPort, RawApiPort};

const STREAM_PATH: &str = "/api/stream";

#[derive(Clone)]
pub struct ProvisioningApi {
    raw: Arc<dyn RawApiPort>,
}

impl ProvisioningApi {
    pub fn new(raw: Arc<dyn RawApiPort>) -> Self {
        Self { raw }
    }

    fn resolve(&self, uri: &str) -> String {
        match Url::parse(uri) {
            Ok(absolute) => absolute.to_string(),
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&self.raw.base_url())
                .and_then(|base| base.join(uri))
                .map(String::from)
                .unwrap_or_else(|e| {
                    tracing::warn!(uri, error = %e, "Could not resolve manifest URI");
                    uri.to_string()
                }),
            Err(_) => uri.to_string(),
        }
    }
}

fn parse<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::ParseError(e.to_string()))
}

#[async_trait::async_trait]
impl ProvisioningApiPort for ProvisioningApi {
    async fn create_session(&self, locator: &ContentLocator) -> Result<SessionId, ApiError> {
        let body = serde_json::to_value(CreateStreamRequest {
            input: locator.as_str().to_string(),
        })
        .map_err(|e| ApiError::SerializeError(e.to_string()))?;

        let value = self.raw.post_json(STREAM_PATH, &body).await?;
        let response: CreateStreamResponse = parse(value)?;
        SessionId::new(response.id).map_err(|e| ApiError::ParseError(e.to_string()))
    }

    async fn fetch_status(
        &self,
        id: &SessionId,
    ) -> Result<Option<ProvisioningStatusRecord>, ApiError> {
        let path = format!("{STREAM_PATH}/{id}/status");
        let Some(value) = self.raw.get_optional_json(&path).await? else {
            return Ok(None);
        };

        let mut record: ProvisioningStatusRecord = parse(value)?;
        if let Some(uri) = record.manifest_uri.as_deref().map(str::trim) {
            if !uri.is_empty() {
                record.manifest_uri = Some(self.resolve(uri));
            }
        }
        Ok(Some(record))
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), ApiError> {
        self.raw.delete(&format!("{STREAM_PATH}/{id}")).await
    }
}
