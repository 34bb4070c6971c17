//! Dropbox client implementation
//!
//! Composes the endpoint router, credential validator, request signer, and
//! transport into the RemoteStore façade. Construction validates the token
//! shape and either yields a ready client or fails immediately; there is no
//! other state. A token the service has revoked does not change local
//! state — the client stays ready and every call surfaces
//! `Error::AuthExpired` until the caller re-authenticates.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use ipd_core::{AccountInfo, EntryInfo, Error, RemotePath, RemoteStore, Result};

use crate::credential::AccessToken;
use crate::endpoint::{ApiTarget, Endpoints, Params};
use crate::signer::{ParamPlacement, RequestSigner};
use crate::transport::{HttpResponse, HttpTransport, SignedRequest, Transport, DEFAULT_TIMEOUT};

/// Connection configuration for a client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Host and version routing
    pub endpoints: Endpoints,
    /// Per-request timeout
    pub timeout: Duration,
    /// Optional pinned CA bundle (PEM)
    pub ca_bundle: Option<PathBuf>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            timeout: DEFAULT_TIMEOUT,
            ca_bundle: None,
        }
    }
}

/// Path-addressed client for one Dropbox account
///
/// Owns exactly one credential and one endpoint configuration for its
/// lifetime; not shared across accounts. Every operation is a single
/// round trip.
pub struct DropboxClient {
    endpoints: Endpoints,
    signer: RequestSigner,
    transport: Arc<dyn Transport>,
}

impl DropboxClient {
    /// Create a client with default options
    ///
    /// Fails with `Error::InvalidCredential` when the token's shape is
    /// invalid; no request is issued.
    pub fn new(access_token: &str) -> Result<Self> {
        Self::with_options(access_token, ClientOptions::default())
    }

    /// Create a client with explicit connection options
    pub fn with_options(access_token: &str, options: ClientOptions) -> Result<Self> {
        let token = AccessToken::new(access_token)?;
        let transport = HttpTransport::new(options.timeout, options.ca_bundle.as_deref())?;
        Ok(Self {
            endpoints: options.endpoints,
            signer: RequestSigner::new(token),
            transport: Arc::new(transport),
        })
    }

    /// Create a client over a caller-supplied transport
    pub fn with_transport(
        access_token: &str,
        endpoints: Endpoints,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let token = AccessToken::new(access_token)?;
        Ok(Self {
            endpoints,
            signer: RequestSigner::new(token),
            transport,
        })
    }

    /// Sign a target and derive its final URL
    ///
    /// Query-placed parameters are folded into the URL here; body-placed
    /// parameters stay with the caller, which serializes them into the
    /// JSON body or the `Dropbox-API-Arg` header.
    fn prepare(&self, target: ApiTarget, params: &Params) -> Result<SignedRequest> {
        let method = target.method();
        let outcome = self.signer.sign(&method, params);

        let mut request = SignedRequest {
            method,
            url: match outcome.placement {
                ParamPlacement::Query => self.endpoints.url_for(target, params)?,
                ParamPlacement::Body => self.endpoints.url_for(target, &Params::new())?,
            },
            headers: outcome.headers,
            body: None,
        };

        if target.arg_header() {
            request
                .headers
                .push(("Dropbox-API-Arg".into(), serde_json::to_string(params)?));
        }

        Ok(request)
    }

    /// Map a completed exchange to the typed error taxonomy
    ///
    /// `probed` is the path whose absence a 409 `path/not_found` reply
    /// should be reported as; other failures carry status and raw body.
    fn check(response: HttpResponse, probed: Option<&RemotePath>) -> Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }

        let body = response.body_text();
        match response.status {
            401 => Err(Error::AuthExpired(error_summary(&body))),
            409 if probed.is_some() && body.contains("not_found") => {
                Err(Error::NotFound(probed.unwrap().to_string()))
            }
            status => Err(Error::transport(status, body)),
        }
    }
}

/// Extract `error_summary` from a Dropbox error body, falling back to the
/// raw body when it is not the expected JSON shape
fn error_summary(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error_summary: String,
    }
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error_summary)
        .unwrap_or_else(|_| body.to_string())
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account_id: String,
    #[serde(default)]
    name: Option<AccountName>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountName {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntryResponse {
    #[serde(rename = ".tag", default)]
    tag: Option<String>,
    name: String,
    #[serde(default)]
    path_display: Option<String>,
    #[serde(default)]
    server_modified: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

impl EntryResponse {
    fn into_entry(self, fallback: &RemotePath) -> EntryInfo {
        let path = self
            .path_display
            .as_deref()
            .map(RemotePath::new)
            .unwrap_or_else(|| fallback.clone());
        EntryInfo {
            name: self.name,
            path,
            is_dir: self.tag.as_deref() == Some("folder"),
            size_bytes: self.size,
            modified: self.server_modified.and_then(|s| s.parse().ok()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    entries: Vec<EntryResponse>,
}

#[async_trait]
impl RemoteStore for DropboxClient {
    async fn account_info(&self) -> Result<AccountInfo> {
        let request = self.prepare(ApiTarget::GetCurrentAccount, &Params::new())?;
        let response = Self::check(self.transport.execute(request).await?, None)?;
        let account: AccountResponse = response.json()?;

        Ok(AccountInfo {
            account_id: account.account_id,
            display_name: account.name.and_then(|n| n.display_name),
            email: account.email,
        })
    }

    async fn metadata(&self, path: &RemotePath) -> Result<EntryInfo> {
        let mut params = Params::new();
        params.insert("path".into(), path.as_str().to_string());

        let mut request = self.prepare(ApiTarget::GetMetadata, &params)?;
        request
            .headers
            .push(("Content-Type".into(), "application/json".into()));

        tracing::debug!(path = %path, "get_metadata");
        let response = Self::check(self.transport.execute(request).await?, Some(path))?;
        Ok(response.json::<EntryResponse>()?.into_entry(path))
    }

    async fn list_folder(&self, path: &RemotePath) -> Result<Vec<EntryInfo>> {
        let mut params = Params::new();
        params.insert("path".into(), path.as_str().to_string());

        let mut request = self.prepare(ApiTarget::ListFolder, &params)?;
        request
            .headers
            .push(("Content-Type".into(), "application/json".into()));
        request.body = Some(Bytes::from(serde_json::to_vec(&params)?));

        tracing::debug!(path = %path, "list_folder");
        let response = Self::check(self.transport.execute(request).await?, Some(path))?;
        let listing: ListFolderResponse = response.json()?;
        Ok(listing
            .entries
            .into_iter()
            .map(|entry| {
                let fallback = path.join(&entry.name);
                entry.into_entry(&fallback)
            })
            .collect())
    }

    async fn put_file(&self, path: &RemotePath, content: Bytes) -> Result<EntryInfo> {
        let mut params = Params::new();
        params.insert("path".into(), path.as_str().to_string());
        params.insert("mode".into(), "overwrite".into());

        let mut request = self.prepare(ApiTarget::Upload, &params)?;
        request
            .headers
            .push(("Content-Type".into(), "application/octet-stream".into()));
        request.body = Some(content);

        tracing::debug!(path = %path, "upload");
        let response = Self::check(self.transport.execute(request).await?, None)?;
        Ok(response.json::<EntryResponse>()?.into_entry(path))
    }

    async fn get_file(&self, path: &RemotePath) -> Result<Bytes> {
        let mut params = Params::new();
        params.insert("path".into(), path.as_str().to_string());

        let request = self.prepare(ApiTarget::Download, &params)?;

        tracing::debug!(path = %path, "download");
        let response = Self::check(self.transport.execute(request).await?, Some(path))?;
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    const TOKEN: &str = "sl.test-token_123";

    fn client(mock: MockTransport) -> DropboxClient {
        DropboxClient::with_transport(TOKEN, Endpoints::default(), Arc::new(mock)).unwrap()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_invalid_token_never_reaches_ready() {
        let result = DropboxClient::new("abc 123");
        assert!(matches!(result, Err(Error::InvalidCredential(_))));
    }

    #[tokio::test]
    async fn test_metadata_not_found_is_typed() {
        let mut mock = MockTransport::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(response(
                409,
                r#"{"error_summary": "path/not_found/...", "error": {".tag": "path"}}"#,
            ))
        });

        let err = client(mock)
            .metadata(&RemotePath::new("/Deployment"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(ref p) if p == "/Deployment"));
    }

    #[tokio::test]
    async fn test_metadata_401_is_auth_expired() {
        let mut mock = MockTransport::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(response(
                401,
                r#"{"error_summary": "expired_access_token/", "error": {".tag": "expired_access_token"}}"#,
            ))
        });

        let err = client(mock)
            .metadata(&RemotePath::new("/Deployment"))
            .await
            .unwrap_err();
        match err {
            Error::AuthExpired(summary) => assert!(summary.contains("expired_access_token")),
            other => panic!("expected AuthExpired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_metadata_is_get_with_query_path() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.method == reqwest::Method::GET
                    && req.url.host_str() == Some("api.dropboxapi.com")
                    && req.url.path() == "/2/files/get_metadata"
                    && req.url.query() == Some("path=%2FDeployment")
                    && req.header("Authorization") == Some(format!("Bearer {TOKEN}").as_str())
                    && req.body.is_none()
            })
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{".tag": "folder", "name": "Deployment", "path_display": "/Deployment"}"#,
                ))
            });

        let entry = client(mock)
            .metadata(&RemotePath::new("/Deployment"))
            .await
            .unwrap();
        assert!(entry.is_dir);
        assert_eq!(entry.path.as_str(), "/Deployment");
    }

    #[tokio::test]
    async fn test_account_info_parses_identity() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.method == reqwest::Method::POST
                    && req.url.as_str() == "https://api.dropboxapi.com/2/users/get_current_account"
            })
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"account_id": "dbid:abc", "name": {"display_name": "Dev"}, "email": "dev@example.com"}"#,
                ))
            });

        let account = client(mock).account_info().await.unwrap();
        assert_eq!(account.account_id, "dbid:abc");
        assert_eq!(account.display_name.as_deref(), Some("Dev"));
    }

    #[tokio::test]
    async fn test_put_file_sends_one_overwrite_upload() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                let arg = req.header("Dropbox-API-Arg").unwrap_or_default();
                req.method == reqwest::Method::POST
                    && req.url.host_str() == Some("content.dropboxapi.com")
                    && req.url.path() == "/2/files/upload"
                    && arg.contains(r#""path":"/Public/Deployment/App/1.0/app.ipa""#)
                    && arg.contains(r#""mode":"overwrite""#)
                    && req.header("Content-Type") == Some("application/octet-stream")
                    && req.body.as_deref() == Some(b"ipa bytes".as_slice())
            })
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"name": "app.ipa", "path_display": "/Public/Deployment/App/1.0/app.ipa", "size": 9}"#,
                ))
            });

        let entry = client(mock)
            .put_file(
                &RemotePath::new("/Public/Deployment/App/1.0/app.ipa"),
                Bytes::from_static(b"ipa bytes"),
            )
            .await
            .unwrap();
        assert!(!entry.is_dir);
        assert_eq!(entry.size_bytes, Some(9));
    }

    #[tokio::test]
    async fn test_get_file_returns_raw_bytes() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.url.host_str() == Some("content.dropboxapi.com")
                    && req.url.path() == "/2/files/download"
                    && req.header("Dropbox-API-Arg").is_some()
                    && req.body.is_none()
            })
            .returning(|_| Ok(response(200, "raw content")));

        let bytes = client(mock)
            .get_file(&RemotePath::new("/Deployment/app.ipa"))
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"raw content");
    }

    #[tokio::test]
    async fn test_list_folder_preserves_remote_order() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.method == reqwest::Method::POST
                    && req.url.path() == "/2/files/list_folder"
                    && req.header("Content-Type") == Some("application/json")
                    && req.body.as_deref() == Some(br#"{"path":"/Deployment"}"#.as_slice())
            })
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"entries": [
                        {".tag": "file", "name": "b.ipa", "path_display": "/Deployment/b.ipa", "size": 2},
                        {".tag": "folder", "name": "old", "path_display": "/Deployment/old"},
                        {".tag": "file", "name": "a.ipa", "path_display": "/Deployment/a.ipa", "size": 1}
                    ]}"#,
                ))
            });

        let entries = client(mock)
            .list_folder(&RemotePath::new("/Deployment"))
            .await
            .unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b.ipa", "old", "a.ipa"]);
        assert!(entries[1].is_dir);
    }

    #[tokio::test]
    async fn test_transport_error_propagates_unchanged() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(response(500, "internal error")));

        let err = client(mock)
            .list_folder(&RemotePath::new("/Deployment"))
            .await
            .unwrap_err();
        match err {
            Error::Transport { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "internal error");
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }
}
