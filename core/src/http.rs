//! HTTP transport types and the blocking transport used in production.
//!
//! # Design
//! Requests and responses are plain data. `ApiClient` builds an
//! `HttpRequest` and parses an `HttpResponse`; whatever sits in between is a
//! `Transport`. `UreqTransport` performs the round-trip with ureq, tests
//! substitute their own implementation to count or script calls.

use std::time::Duration;

use crate::error::{Result, SyncError};

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes an `HttpRequest`.
///
/// Implementations return every received response as data, whatever its
/// status; only failures to complete the exchange are errors.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking transport over ureq.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        // Status interpretation belongs to the client, so 4xx/5xx come back as data.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(request.timeout))
            .build()
            .new_agent();

        let mut builder = agent.get(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .call()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest {
            url: "http://localhost/articles/1".to_string(),
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            timeout: Duration::from_secs(30),
        };
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn success_range_is_2xx() {
        let ok = HttpResponse { status: 204, body: String::new() };
        let redirect = HttpResponse { status: 301, body: String::new() };
        let err = HttpResponse { status: 500, body: String::new() };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
        assert!(!err.is_success());
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        // Bind then drop to obtain a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let req = HttpRequest {
            url: format!("http://127.0.0.1:{port}/articles/1"),
            headers: Vec::new(),
            timeout: Duration::from_secs(5),
        };
        let err = UreqTransport.execute(&req).unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }
}
