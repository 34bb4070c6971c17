//! Bearer-token validation
//!
//! OAuth2 access tokens are opaque, but their shape is known: one or more
//! characters from a restricted charset, then optional `=` padding. The
//! check runs once, at client construction; a token that passes here can
//! still have been revoked server-side, which only shows up at execution
//! time.

use ipd_core::{Error, Result};

/// A syntactically valid OAuth2 access token
///
/// Constructing one is the only way to get a token in front of the signer,
/// so the signer never has to re-validate.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Validate a raw token string
    ///
    /// Accepts exactly `[A-Za-z0-9._+~/-]+` followed by zero or more `=`,
    /// anchored at both ends. Anything else fails with
    /// `Error::InvalidCredential`.
    pub fn new(token: &str) -> Result<Self> {
        let payload = token.trim_end_matches('=');
        let valid = !payload.is_empty()
            && payload
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-' | '_' | '~' | '/'));
        if !valid {
            return Err(Error::InvalidCredential(
                "token does not match the accepted token grammar".into(),
            ));
        }
        Ok(Self(token.to_string()))
    }

    /// The raw token string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// The token is a credential; keep it out of debug output.
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_charset() {
        assert!(AccessToken::new("abc123.-_~/+=").is_ok());
        assert!(AccessToken::new("sl.ABCdef0123456789").is_ok());
        assert!(AccessToken::new("token==").is_ok());
    }

    #[test]
    fn test_rejects_whitespace() {
        assert!(matches!(
            AccessToken::new("abc 123"),
            Err(Error::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_rejects_empty_and_padding_only() {
        assert!(AccessToken::new("").is_err());
        assert!(AccessToken::new("===").is_err());
    }

    #[test]
    fn test_rejects_interior_padding() {
        assert!(AccessToken::new("abc=def").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let token = AccessToken::new("secret123").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret123"));
    }
}
