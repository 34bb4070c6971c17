//! ipd-core: Core library for the ipadeploy CLI
//!
//! This crate provides the core functionality for the `ipd` tool, including:
//! - Configuration management
//! - Remote path normalization
//! - The RemoteStore trait for storage operations
//!
//! This crate is designed to be independent of any specific storage backend,
//! allowing for easy testing and potential future support for other hosts.

pub mod config;
pub mod error;
pub mod path;
pub mod traits;

pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use path::RemotePath;
pub use traits::{AccountInfo, EntryInfo, RemoteStore};
