//! Request signing
//!
//! Attaches the bearer credential to a request and decides where the
//! call's parameters belong: GET and PUT fold them into the URL query
//! string (the caller re-derives the URL), everything else carries them in
//! the request body or, for content-transfer endpoints, the
//! `Dropbox-API-Arg` header. Parameters themselves pass through unchanged.
//!
//! No authentication failure can occur here: the token's shape was checked
//! at construction, and a revoked token is only detected by the server.

use reqwest::Method;

use crate::credential::AccessToken;
use crate::endpoint::Params;

/// Where the caller must place the request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPlacement {
    /// Fold into the URL query string (GET, PUT)
    Query,
    /// Serialize into the request body (or the upload-intent header)
    Body,
}

/// Headers plus the placement decision for one request
#[derive(Debug)]
pub struct SigningOutcome {
    /// Headers to attach, including `Authorization`
    pub headers: Vec<(String, String)>,
    /// Where the parameters belong
    pub placement: ParamPlacement,
}

/// Signs requests with one immutable credential
#[derive(Debug, Clone)]
pub struct RequestSigner {
    token: AccessToken,
}

impl RequestSigner {
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }

    /// Produce authentication headers and the parameter placement for a
    /// method. `params` is untouched; re-signing is stateless and
    /// idempotent, so a failed call can simply be signed again.
    pub fn sign(&self, method: &Method, _params: &Params) -> SigningOutcome {
        let headers = vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.token.as_str()),
        )];
        let placement = if *method == Method::GET || *method == Method::PUT {
            ParamPlacement::Query
        } else {
            ParamPlacement::Body
        };
        SigningOutcome { headers, placement }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> RequestSigner {
        RequestSigner::new(AccessToken::new("tok123").unwrap())
    }

    fn authorization(outcome: &SigningOutcome) -> &str {
        outcome
            .headers
            .iter()
            .find(|(name, _)| name == "Authorization")
            .map(|(_, value)| value.as_str())
            .expect("missing Authorization header")
    }

    #[test]
    fn test_get_and_put_place_params_in_query() {
        let mut params = Params::new();
        params.insert("path".into(), "/foo".into());

        let outcome = signer().sign(&Method::GET, &params);
        assert_eq!(outcome.placement, ParamPlacement::Query);
        assert_eq!(authorization(&outcome), "Bearer tok123");

        let outcome = signer().sign(&Method::PUT, &params);
        assert_eq!(outcome.placement, ParamPlacement::Query);
    }

    #[test]
    fn test_post_places_params_in_body() {
        let mut params = Params::new();
        params.insert("path".into(), "/foo".into());

        let outcome = signer().sign(&Method::POST, &params);
        assert_eq!(outcome.placement, ParamPlacement::Body);
        assert_eq!(authorization(&outcome), "Bearer tok123");

        // params are the caller's to serialize, unchanged
        assert_eq!(params.get("path").map(String::as_str), Some("/foo"));
    }

    #[test]
    fn test_signing_is_idempotent() {
        let params = Params::new();
        let s = signer();
        let first = s.sign(&Method::POST, &params);
        let second = s.sign(&Method::POST, &params);
        assert_eq!(first.headers, second.headers);
        assert_eq!(first.placement, second.placement);
    }
}
