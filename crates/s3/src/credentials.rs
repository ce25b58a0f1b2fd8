//! Credential providers backed by the environment and the AWS SDK chain

use std::sync::Arc;

use async_trait::async_trait;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use bk_core::{CredentialProvider, Credentials, Error, Result};

/// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and
/// `AWS_SESSION_TOKEN` on every resolution
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    pub fn new() -> Self {
        Self
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let access_key = get("AWS_ACCESS_KEY_ID")
            .ok_or_else(|| Error::Auth("AWS_ACCESS_KEY_ID is not set".into()))?;
        let secret_key = get("AWS_SECRET_ACCESS_KEY")
            .ok_or_else(|| Error::Auth("AWS_SECRET_ACCESS_KEY is not set".into()))?;

        let credentials = Credentials::new(access_key, secret_key);
        Ok(match get("AWS_SESSION_TOKEN") {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn resolve(&self) -> Result<Credentials> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// The AWS default credential chain (environment, shared profile files,
/// SSO, web identity, container and instance metadata)
///
/// The SDK provider caches and refreshes temporary credentials itself.
#[derive(Debug, Clone)]
pub struct SdkCredentials {
    provider: SharedCredentialsProvider,
}

impl SdkCredentials {
    /// Load the default chain for `region`
    pub async fn load(region: &str) -> Result<Self> {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        let provider = config
            .credentials_provider()
            .ok_or_else(|| Error::Auth("no AWS credential provider is configured".into()))?;
        Ok(Self { provider })
    }

    pub fn from_provider(provider: impl ProvideCredentials + 'static) -> Self {
        Self {
            provider: SharedCredentialsProvider::new(provider),
        }
    }
}

#[async_trait]
impl CredentialProvider for SdkCredentials {
    async fn resolve(&self) -> Result<Credentials> {
        let resolved = self
            .provider
            .provide_credentials()
            .await
            .map_err(|e| Error::Auth(format!("Failed to load AWS credentials: {e}")))?;

        let credentials = Credentials::new(resolved.access_key_id(), resolved.secret_access_key());
        Ok(match resolved.session_token() {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }
}

/// Type-erased provider handle
pub type SharedProvider = Arc<dyn CredentialProvider>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_credentials_complete() {
        let creds = EnvCredentials::from_lookup(lookup(&[
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_SESSION_TOKEN", "token"),
        ]))
        .unwrap();
        assert_eq!(creds.access_key, "AKID");
        assert_eq!(creds.session_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_env_credentials_missing_secret() {
        let err =
            EnvCredentials::from_lookup(lookup(&[("AWS_ACCESS_KEY_ID", "AKID")])).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_sdk_credentials_from_static_provider() {
        let provider = SdkCredentials::from_provider(aws_credential_types::Credentials::new(
            "AKID",
            "secret",
            Some("token".to_string()),
            None,
            "test",
        ));
        let creds = provider.resolve().await.unwrap();
        assert_eq!(creds.access_key, "AKID");
        assert_eq!(creds.secret_key, "secret");
        assert_eq!(creds.session_token.as_deref(), Some("token"));
    }
}
