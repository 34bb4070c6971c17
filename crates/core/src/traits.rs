//! RemoteStore trait definition
//!
//! This trait defines the interface for path-addressed storage operations.
//! It decouples the CLI from the concrete backend client and can be mocked
//! for testing.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::RemotePath;

/// Identity of the authenticated storage account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Unique account identifier, used to build public URLs
    pub account_id: String,

    /// Display name, when the backend reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Account email, when the backend reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Metadata for a remote file or folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryInfo {
    /// Entry name (final path segment)
    pub name: String,

    /// Full normalized remote path
    pub path: RemotePath,

    /// Whether this entry is a folder
    pub is_dir: bool,

    /// Size in bytes (None for folders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<jiff::Timestamp>,
}

impl EntryInfo {
    /// Create a new EntryInfo for a file
    pub fn file(path: RemotePath, size: u64) -> Self {
        Self {
            name: path.name().unwrap_or_default().to_string(),
            path,
            is_dir: false,
            size_bytes: Some(size),
            modified: None,
        }
    }

    /// Create a new EntryInfo for a folder
    pub fn folder(path: RemotePath) -> Self {
        Self {
            name: path.name().unwrap_or_default().to_string(),
            path,
            is_dir: true,
            size_bytes: None,
            modified: None,
        }
    }
}

/// Trait for path-addressed remote storage operations
///
/// Every method issues exactly one network round trip and blocks the task
/// until it completes. There is no internal retry, batching, or caching;
/// a failed call is re-initiated entirely by the caller.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the authenticated account's identity
    async fn account_info(&self) -> Result<AccountInfo>;

    /// Fetch metadata for a path
    ///
    /// Returns `Error::NotFound` when the remote reports no such path, so
    /// callers can probe for existence without treating it as fatal.
    async fn metadata(&self, path: &RemotePath) -> Result<EntryInfo>;

    /// List the children of a folder, in the order the remote returns them
    async fn list_folder(&self, path: &RemotePath) -> Result<Vec<EntryInfo>>;

    /// Upload a file, overwriting any existing entry at the path
    async fn put_file(&self, path: &RemotePath, content: Bytes) -> Result<EntryInfo>;

    /// Download a file's raw content
    async fn get_file(&self, path: &RemotePath) -> Result<Bytes>;
}
