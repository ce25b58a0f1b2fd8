//! Credential provider seam
//!
//! The facade resolves credentials once per request so refreshable
//! providers (session tokens, instance metadata) are picked up
//! without rebuilding the handle.

use std::fmt;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Signing material for one request
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Session token for temporary credentials
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

// Secrets never show up in logs or panics.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Supplies signing material, refreshed on demand
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Resolve the credentials to sign the next request with
    async fn resolve(&self) -> Result<Credentials>;
}

#[async_trait]
impl<C: CredentialProvider + ?Sized> CredentialProvider for std::sync::Arc<C> {
    async fn resolve(&self) -> Result<Credentials> {
        (**self).resolve().await
    }
}

/// Fixed credentials supplied at construction time
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn resolve(&self) -> Result<Credentials> {
        if self.credentials.access_key.is_empty() || self.credentials.secret_key.is_empty() {
            return Err(Error::Auth("access key and secret key must be set".into()));
        }
        Ok(self.credentials.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("AKIDEXAMPLE", "topsecret").with_session_token("tok");
        let debug = format!("{creds:?}");
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("tok\""));
    }

    #[tokio::test]
    async fn test_static_credentials_resolve() {
        let provider = StaticCredentials::new(Credentials::new("a", "b"));
        let creds = provider.resolve().await.unwrap();
        assert_eq!(creds.access_key, "a");
        assert_eq!(creds.secret_key, "b");
    }

    #[tokio::test]
    async fn test_static_credentials_empty_is_auth_error() {
        let provider = StaticCredentials::new(Credentials::new("", ""));
        let err = provider.resolve().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
