//! Request builder, envelope parser and fetch for the 100p article API.
//!
//! # Design
//! `ApiClient` holds an injected `ApiConfig` and a `Transport`. Fetching an
//! article is split into `build_fetch_article`, which produces an
//! `HttpRequest`, and `parse_fetch_article`, which consumes an
//! `HttpResponse`; `fetch` runs the transport between the two. No retries
//! happen at this layer.

use tracing::{error, info};

use crate::config::ApiConfig;
use crate::error::{Result, SyncError};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{ApiEnvelope, FlatFieldMap};

/// Something that can look up an article's flat field map by identifier.
pub trait ArticleSource {
    fn fetch(&self, identifier: &str) -> Result<FlatFieldMap>;
}

/// Blocking client for `GET {base_url}/articles/{identifier}`.
#[derive(Debug, Clone)]
pub struct ApiClient<T = UreqTransport> {
    config: ApiConfig,
    transport: T,
}

impl ApiClient<UreqTransport> {
    pub fn new(config: ApiConfig) -> Self {
        Self::with_transport(config, UreqTransport)
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ApiConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Fails with `SyncError::Config` when no bearer token is configured.
    pub fn build_fetch_article(&self, identifier: &str) -> Result<HttpRequest> {
        if !self.config.has_credential() {
            return Err(SyncError::Config(
                "bearer token not configured, set the 'api_100p.bearer_token' parameter".to_string(),
            ));
        }
        Ok(HttpRequest {
            url: format!(
                "{}/articles/{}",
                self.config.base_url,
                urlencoding::encode(identifier)
            ),
            headers: vec![
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.config.bearer_token),
                ),
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            timeout: self.config.timeout,
        })
    }

    pub fn parse_fetch_article(&self, response: HttpResponse) -> Result<FlatFieldMap> {
        if !response.is_success() {
            return Err(SyncError::Transport(format!(
                "HTTP {}: {}",
                response.status, response.body
            )));
        }
        let body: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| SyncError::Protocol(format!("invalid JSON response from API: {e}")))?;
        if !body.is_object() {
            return Err(SyncError::Protocol(
                "invalid JSON response from API: expected an object".to_string(),
            ));
        }
        let envelope: ApiEnvelope = serde_json::from_value(body)
            .map_err(|e| SyncError::Protocol(format!("invalid JSON response from API: {e}")))?;

        let message = envelope.message_text();
        envelope.into_data().ok_or_else(|| {
            SyncError::Protocol(format!(
                "API returned unsuccessful status: {}",
                message.as_deref().unwrap_or("Unknown error")
            ))
        })
    }
}

impl<T: Transport> ArticleSource for ApiClient<T> {
    fn fetch(&self, identifier: &str) -> Result<FlatFieldMap> {
        let request = self.build_fetch_article(identifier)?;
        info!(identifier, "calling article API");
        let result = self
            .transport
            .execute(&request)
            .and_then(|response| self.parse_fetch_article(response));
        if let Err(e) = &result {
            error!(identifier, error = %e, "article API call failed");
        }
        result
    }
}
