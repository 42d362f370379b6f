//! Authentication module for the generation client.
//!
//! The bearer token is acquired by the embedding application (environment,
//! keychain, ...) and handed in at construction.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

use crate::errors::CoachError;

/// Authentication provider trait.
///
/// Implementations of this trait provide authentication credentials
/// for API requests.
pub trait AuthProvider: Send + Sync {
    /// Apply authentication to request headers.
    fn apply_auth(&self, headers: &mut HashMap<String, String>);

    /// Get the authentication scheme name.
    fn scheme(&self) -> &str;

    /// Validate the credentials.
    fn validate(&self) -> Result<(), CoachError>;
}

/// Bearer token authentication provider.
pub struct BearerTokenAuth {
    token: SecretString,
}

impl BearerTokenAuth {
    /// Creates a new provider.
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    /// Creates from a plain string token.
    pub fn from_string(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
        }
    }

    /// Gets a hint of the token for debugging (last 4 characters).
    pub fn key_hint(&self) -> String {
        key_hint(self.token.expose_secret())
    }
}

impl AuthProvider for BearerTokenAuth {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) {
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.token.expose_secret()),
        );
    }

    fn scheme(&self) -> &str {
        "Bearer"
    }

    fn validate(&self) -> Result<(), CoachError> {
        if self.token.expose_secret().trim().is_empty() {
            return Err(CoachError::Authentication {
                message: "API token cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for BearerTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenAuth")
            .field("token", &"[REDACTED]")
            .field("key_hint", &self.key_hint())
            .finish()
    }
}

/// Last four characters of a secret, or `****` for short ones.
pub(crate) fn key_hint(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 4 {
        format!("...{}", chars[chars.len() - 4..].iter().collect::<String>())
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_auth_apply() {
        let auth = BearerTokenAuth::from_string("sk_test_key_12345");
        let mut headers = HashMap::new();

        auth.apply_auth(&mut headers);

        assert_eq!(
            headers.get("Authorization"),
            Some(&"Bearer sk_test_key_12345".to_string())
        );
        assert_eq!(auth.scheme(), "Bearer");
    }

    #[test]
    fn test_bearer_auth_validate() {
        assert!(BearerTokenAuth::from_string("sk_test").validate().is_ok());
        assert!(matches!(
            BearerTokenAuth::from_string("  ").validate(),
            Err(CoachError::Authentication { .. })
        ));
    }

    #[test]
    fn test_key_hint() {
        assert_eq!(key_hint("sk_test_key_12345"), "...2345");
        assert_eq!(key_hint("abc"), "****");
    }

    #[test]
    fn test_debug_redacts_token() {
        let auth = BearerTokenAuth::from_string("sk_secret_token");
        let debug_str = format!("{auth:?}");

        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("sk_secret_token"));
    }
}
