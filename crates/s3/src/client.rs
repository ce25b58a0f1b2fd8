//! Facade construction from a profile

use std::sync::Arc;

use bk_core::profile::ENV_PROFILE;
use bk_core::{MultipartConfig, ObjectStoreFacade, Profile, Result, StaticCredentials};
use tracing::debug;

use crate::credentials::{EnvCredentials, SdkCredentials, SharedProvider};
use crate::transport::HttpTransport;

/// Build a facade for `profile`
///
/// The `env` profile re-reads the environment on every request, other
/// profiles with static keys sign with them, and anything else falls back
/// to the AWS default chain.
pub async fn connect(profile: &Profile, multipart: MultipartConfig) -> Result<ObjectStoreFacade> {
    let transport = HttpTransport::new(profile)?;

    let credentials: SharedProvider = if profile.name == ENV_PROFILE && profile.has_static_keys() {
        Arc::new(EnvCredentials::new())
    } else if profile.has_static_keys() {
        Arc::new(StaticCredentials::new(profile.credentials()))
    } else {
        debug!(profile = %profile.name, "using the AWS default credential chain");
        Arc::new(SdkCredentials::load(&profile.region).await?)
    };

    Ok(ObjectStoreFacade::new(transport, credentials)
        .with_region(&profile.region)
        .with_multipart(multipart))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_with_static_keys() {
        let mut profile = Profile::new("local", "http://localhost:9000", "ak", "sk");
        profile.region = "sa-east-1".to_string();

        let facade = connect(&profile, MultipartConfig::default()).await.unwrap();
        assert_eq!(facade.region(), "sa-east-1");
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_endpoint() {
        let profile = Profile::new("broken", "not a url", "ak", "sk");
        assert!(connect(&profile, MultipartConfig::default()).await.is_err());
    }
}
