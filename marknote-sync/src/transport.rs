//! HTTP transport for the single multiplexing server endpoint.
//!
//! The server exposes exactly one URL; the logical operation path
//! travels in the `api_path` query parameter instead of the URL path.
//! The trait keeps that quirk behind a capability interface so a true
//! REST backend could be swapped in without touching callers.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Fixed request timeout for every call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP methods the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A transport that can reach the remote note store.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a request for a logical operation path and returns the
    /// parsed JSON body.
    ///
    /// Implementations must never parse a non-200 response as a success
    /// payload.
    async fn request_json(
        &self,
        method: Method,
        logical_path: &str,
        body: Option<Value>,
        query: &[(&str, &str)],
    ) -> SyncResult<Value>;

    /// Pre-flight connectivity check: a bare GET carrying a diagnostic
    /// query flag, success only on HTTP 200.
    async fn test_connection(&self) -> SyncResult<()>;
}

/// Transport over the real HTTP endpoint.
///
/// TLS certificate validation is mandatory and never bypassed; no proxy
/// is used. The base URL and API key are bound at construction.
pub struct ApiTransport {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ApiTransport {
    /// Creates a transport for the given endpoint and API key with the
    /// fixed production timeout.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_timeout(base_url, api_key, REQUEST_TIMEOUT)
    }

    /// Creates a transport with an explicit timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .expect("failed to create HTTP client");
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn classify(err: reqwest::Error) -> SyncError {
        classify_request_error(err.is_timeout(), err.is_connect(), &err)
    }
}

/// Maps a failed request onto the transport error taxonomy.
///
/// reqwest surfaces certificate failures as connect errors; the source
/// chain is the only place they can be told apart.
fn classify_request_error(
    timeout: bool,
    connect: bool,
    err: &(dyn std::error::Error + 'static),
) -> SyncError {
    if timeout {
        return SyncError::Timeout;
    }
    if chain_mentions_certificate(err) {
        return SyncError::TlsValidation(err.to_string());
    }
    if connect {
        return SyncError::Connection(err.to_string());
    }
    SyncError::Protocol(err.to_string())
}

/// Whether any error in the source chain reports a certificate problem.
///
/// rustls renders these as e.g. "invalid peer certificate"; casing
/// varies between layers, so both forms are checked.
fn chain_mentions_certificate(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let message = e.to_string();
        if message.contains("certificate") || message.contains("Certificate") {
            return true;
        }
        current = e.source();
    }
    false
}

#[async_trait]
impl Transport for ApiTransport {
    async fn request_json(
        &self,
        method: Method,
        logical_path: &str,
        body: Option<Value>,
        query: &[(&str, &str)],
    ) -> SyncResult<Value> {
        let mut request = match method {
            Method::Get => self.client.get(&self.base_url),
            Method::Post => self.client.post(&self.base_url),
            Method::Delete => self.client.delete(&self.base_url),
        };

        let logical = logical_path.trim_start_matches('/');
        if !logical.is_empty() {
            request = request.query(&[("api_path", logical)]);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        request = request.bearer_auth(&self.api_key);
        if let Some(body) = &body {
            request = request.json(body);
        }

        debug!(api_path = %logical, ?method, "sending request");

        let response = request.send().await.map_err(Self::classify)?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SyncError::Server {
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SyncError::Protocol(format!("malformed response body: {e}")))
    }

    async fn test_connection(&self) -> SyncResult<()> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("test_connection", "1")])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(Self::classify)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SyncError::Server {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct Layer {
        message: &'static str,
        source: Option<Box<Layer>>,
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Layer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn StdError + 'static))
        }
    }

    /// Builds a chain where the first message is the outermost error.
    fn chain(messages: &[&'static str]) -> Layer {
        let mut source = None;
        for message in messages.iter().rev() {
            source = Some(Box::new(Layer { message, source }));
        }
        *source.unwrap()
    }

    #[test]
    fn certificate_failure_in_the_chain_maps_to_tls_validation() {
        let err = chain(&[
            "error sending request",
            "client error (Connect)",
            "invalid peer certificate: UnknownIssuer",
        ]);
        let classified = classify_request_error(false, true, &err);
        assert!(matches!(classified, SyncError::TlsValidation(_)), "got {classified:?}");
    }

    #[test]
    fn connection_refusal_maps_to_connection_not_tls() {
        let err = chain(&[
            "error sending request",
            "tcp connect error",
            "Connection refused (os error 111)",
        ]);
        let classified = classify_request_error(false, true, &err);
        assert!(matches!(classified, SyncError::Connection(_)), "got {classified:?}");
    }

    #[test]
    fn timeout_wins_over_everything_else() {
        let err = chain(&["operation timed out"]);
        let classified = classify_request_error(true, true, &err);
        assert!(matches!(classified, SyncError::Timeout));
    }

    #[test]
    fn non_connect_failures_map_to_protocol() {
        let err = chain(&["error decoding response body"]);
        let classified = classify_request_error(false, false, &err);
        assert!(matches!(classified, SyncError::Protocol(_)));
    }
}
