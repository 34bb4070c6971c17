//! ipd-dropbox: Dropbox adapter for the ipd CLI
//!
//! This crate provides the implementation of the RemoteStore trait over the
//! Dropbox HTTP API. It owns the bearer-token lifecycle: the token's shape
//! is validated once at client construction, every request carries it as an
//! `Authorization: Bearer` header, and a token the service has revoked
//! surfaces as `Error::AuthExpired` on each subsequent call.

pub mod client;
pub mod credential;
pub mod endpoint;
pub mod signer;
pub mod transport;

pub use client::{ClientOptions, DropboxClient};
pub use credential::AccessToken;
pub use endpoint::{build_url, ApiTarget, Endpoints};
pub use transport::{HttpResponse, HttpTransport, SignedRequest, Transport};
