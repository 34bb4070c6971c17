//! Endpoint routing and request URL construction
//!
//! The Dropbox API splits across two hosts: a control-plane host for
//! metadata and account operations, and a content-transfer host for raw
//! upload/download. Every endpoint pairs a target path with a routing
//! decision (host, HTTP method, whether the version prefix applies), and
//! URLs are assembled deterministically so requests are reproducible in
//! tests.

use std::collections::BTreeMap;

use ipd_core::Result;
use reqwest::Method;
use url::Url;

/// Default control-plane API host
pub const API_HOST: &str = "api.dropboxapi.com";

/// Default content-transfer host
pub const CONTENT_HOST: &str = "content.dropboxapi.com";

/// API generation used for the version prefix in request paths
pub const API_VERSION: u32 = 2;

/// Query/body parameter mapping
///
/// A BTreeMap keeps encoding order stable for a given mapping.
pub type Params = BTreeMap<String, String>;

/// Host and version configuration, injected at client construction
///
/// Immutable for the client's lifetime; there is no process-global host or
/// version state.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Control-plane API host
    pub api_host: String,
    /// Content-transfer host
    pub content_host: String,
    /// Version number prepended to request paths
    pub api_version: u32,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_host: API_HOST.to_string(),
            content_host: CONTENT_HOST.to_string(),
            api_version: API_VERSION,
        }
    }
}

impl Endpoints {
    /// The host a target routes to
    pub fn host_for(&self, target: ApiTarget) -> &str {
        if target.on_content_host() {
            &self.content_host
        } else {
            &self.api_host
        }
    }

    /// Build the full request URL for a target
    pub fn url_for(&self, target: ApiTarget, query: &Params) -> Result<Url> {
        build_url(
            self.host_for(target),
            self.api_version,
            target.path(),
            target.versioned(),
            query,
        )
    }
}

/// The API endpoints this client speaks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiTarget {
    /// Identity of the authenticated account
    GetCurrentAccount,
    /// Metadata for a single path
    GetMetadata,
    /// Children of a folder
    ListFolder,
    /// Raw file upload
    Upload,
    /// Raw file download
    Download,
}

impl ApiTarget {
    /// Target path below the version prefix
    pub fn path(self) -> &'static str {
        match self {
            ApiTarget::GetCurrentAccount => "/users/get_current_account",
            ApiTarget::GetMetadata => "/files/get_metadata",
            ApiTarget::ListFolder => "/files/list_folder",
            ApiTarget::Upload => "/files/upload",
            ApiTarget::Download => "/files/download",
        }
    }

    /// Whether this target routes to the content-transfer host
    pub fn on_content_host(self) -> bool {
        matches!(self, ApiTarget::Upload | ApiTarget::Download)
    }

    /// HTTP method used when signing and executing this target
    pub fn method(self) -> Method {
        match self {
            ApiTarget::GetMetadata => Method::GET,
            _ => Method::POST,
        }
    }

    /// Whether the request path carries the version prefix
    pub fn versioned(self) -> bool {
        true
    }

    /// Whether parameters ride in the `Dropbox-API-Arg` header instead of
    /// the query string or body
    pub fn arg_header(self) -> bool {
        self.on_content_host()
    }
}

/// Compose a versioned API URL
///
/// `https://` + host, optionally `/<version>`, the percent-encoded target,
/// and a deterministic URL-encoded query string when `query` is non-empty.
/// Malformed targets are not validated; they encode to whatever
/// percent-encoding produces.
pub fn build_url(
    host: &str,
    version: u32,
    target: &str,
    versioned: bool,
    query: &Params,
) -> Result<Url> {
    let mut url = Url::parse(&format!("https://{host}"))?;
    if versioned {
        url.set_path(&format!("/{version}{target}"));
    } else {
        url.set_path(target);
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}
