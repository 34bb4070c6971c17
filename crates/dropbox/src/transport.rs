//! HTTP transport
//!
//! Thin execution wrapper around reqwest. The transport performs exactly
//! one attempt per call and fails only on connection-level errors; every
//! completed exchange is returned with its status and raw body so the
//! client can map statuses to the typed error taxonomy. TLS can be pinned
//! to a PEM bundle supplied at construction.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use ipd_core::{Error, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use url::Url;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A fully prepared request: final URL, headers, and optional body
///
/// Built fresh per call and discarded after execution; never cached.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl SignedRequest {
    /// Look up a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON, reporting malformed bodies as transport
    /// failures carrying the status for diagnostics
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::transport(self.status, format!("malformed response body: {e}")))
    }

    /// The body as lossy UTF-8, for diagnostics
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes one signed request against the network
///
/// Exactly one attempt per call; no retry, no backoff, no cancellation
/// once issued. The configured timeout is the only bound on duration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: SignedRequest) -> Result<HttpResponse>;
}

/// Transport backed by a reqwest client
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the given timeout and an optional pinned
    /// certificate bundle for TLS validation
    pub fn new(timeout: Duration, ca_bundle: Option<&Path>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(timeout);

        if let Some(path) = ca_bundle {
            let pem = std::fs::read(path)?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem)
                .map_err(|e| Error::Config(format!("invalid CA bundle {}: {e}", path.display())))?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::connection(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: SignedRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::connection(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::connection(e.to_string()))?;

        tracing::debug!(status, bytes = body.len(), "request completed");
        Ok(HttpResponse { status, body })
    }
}
