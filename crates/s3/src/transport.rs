//! HTTP transport for the S3 REST API
//!
//! Builds URLs for path-style or virtual-hosted addressing, signs each
//! attempt with SigV4 and retries throttling, 5xx and connection failures
//! with exponential backoff. Everything else is handed back to the facade
//! as a plain response.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bk_core::profile::{Profile, RetryConfig};
use bk_core::{Credentials, Error, Method, Request, Response, Result, Transport};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, warn};
use url::Url;

use crate::signer::Signer;

/// Escaped in path segments; `/` separates segments and is kept
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Escaped in query names and values
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// How buckets are placed in request URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// `https://host/bucket/key`
    Path,
    /// `https://bucket.host/key`
    VirtualHosted,
    /// Virtual-hosted on AWS endpoints when the bucket name allows it
    Auto,
}

impl Addressing {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "path" => Ok(Addressing::Path),
            "dns" | "virtual" => Ok(Addressing::VirtualHosted),
            "auto" | "" => Ok(Addressing::Auto),
            other => Err(Error::Config(format!(
                "bucket_lookup must be auto, path or dns, got '{other}'"
            ))),
        }
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    addressing: Addressing,
    signer: Signer,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Create a transport for a profile
    pub fn new(profile: &Profile) -> Result<Self> {
        let endpoint = if profile.endpoint.is_empty() {
            format!("https://s3.{}.amazonaws.com", profile.region)
        } else {
            profile.endpoint.clone()
        };
        let endpoint = Url::parse(&endpoint)?;
        if endpoint.host_str().is_none() {
            return Err(Error::Config(format!("endpoint '{endpoint}' has no host")));
        }

        let timeout = profile.timeout_config();
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(timeout.connect_ms))
            .read_timeout(Duration::from_millis(timeout.read_ms))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            addressing: Addressing::parse(&profile.bucket_lookup)?,
            signer: Signer::new(&profile.region),
            retry: profile.retry_config(),
        })
    }

    /// Absolute URL for a request
    pub fn url_for(&self, request: &Request) -> Result<Url> {
        let (bucket, key) = request.bucket_and_key();
        let base_path = self.endpoint.path().trim_end_matches('/');
        let mut url = self.endpoint.clone();

        let path = if !bucket.is_empty() && self.virtual_hosted(bucket) {
            let host = self.endpoint.host_str().unwrap_or_default();
            url.set_host(Some(&format!("{bucket}.{host}")))?;
            format!("{base_path}/{}", key.map(encode_path).unwrap_or_default())
        } else {
            format!("{base_path}{}", encode_path(&request.path))
        };
        url.set_path(&path);

        let query = request
            .query
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_ENCODE_SET),
                    utf8_percent_encode(v, QUERY_ENCODE_SET)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        url.set_query((!query.is_empty()).then_some(query.as_str()));

        Ok(url)
    }

    fn virtual_hosted(&self, bucket: &str) -> bool {
        match self.addressing {
            Addressing::Path => false,
            Addressing::VirtualHosted => true,
            Addressing::Auto => {
                let aws = self
                    .endpoint
                    .host_str()
                    .is_some_and(|h| h.ends_with(".amazonaws.com"));
                aws && !bucket.contains('.')
            }
        }
    }

    /// Request headers plus a fresh SigV4 signature
    fn signed_headers(
        &self,
        request: &Request,
        url: &Url,
        credentials: &Credentials,
    ) -> Result<Vec<(String, String)>> {
        let mut headers = request.headers.clone();
        headers.insert("host".to_string(), host_header(url));

        let signature = self.signer.sign(
            request.method.as_str(),
            url.as_str(),
            &headers,
            &request.body,
            credentials,
        )?;

        headers.remove("host");
        Ok(headers.into_iter().chain(signature).collect())
    }

    async fn attempt(
        &self,
        request: &Request,
        url: &Url,
        headers: &[(String, String)],
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let mut builder = self.client.request(to_reqwest(request.method), url.clone());
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }
        builder.send().await
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self
            .retry
            .initial_backoff_ms
            .saturating_mul(1u64 << attempt.saturating_sub(1).min(20))
            .min(self.retry.max_backoff_ms);
        Duration::from_millis(base + (base as f64 * 0.2 * jitter()) as u64)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request, credentials: &Credentials) -> Result<Response> {
        let url = self.url_for(&request)?;
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            debug!(method = %request.method, %url, attempt, "sending request");

            // Re-signed per attempt; the signature covers the timestamp.
            let headers = self.signed_headers(&request, &url, credentials)?;
            match self.attempt(&request, &url, &headers).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if RETRYABLE_STATUSES.contains(&status) && attempt < max_attempts {
                        let delay = self.backoff(attempt);
                        warn!(status, attempt, ?delay, %url, "retrying request");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return read_response(response).await;
                }
                Err(err) if (err.is_connect() || err.is_timeout()) && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(error = %err, attempt, ?delay, %url, "retrying request");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    return Err(Error::Transport(format!(
                        "{} {url}: {err}",
                        request.method
                    )));
                }
            }
        }

        Err(Error::Transport(format!(
            "{} {url}: retries exhausted",
            request.method
        )))
    }
}

async fn read_response(response: reqwest::Response) -> Result<Response> {
    let status = response.status().as_u16();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::Transport(format!("Failed to read response body: {e}")))?;

    Ok(Response {
        status,
        headers,
        body,
    })
}

fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ENCODE_SET).to_string()
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Pseudo-random value in `[0, 1)` from the clock's sub-second nanos
fn jitter() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    f64::from(nanos % 1000) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(endpoint: &str, lookup: &str) -> HttpTransport {
        let mut profile = Profile::new("test", endpoint, "ak", "sk");
        profile.bucket_lookup = lookup.to_string();
        HttpTransport::new(&profile).unwrap()
    }

    #[test]
    fn test_path_style_url() {
        let transport = transport("http://localhost:9000", "auto");
        let request = Request::new(Method::Get, "photos", Some("2024/my cat.jpg"));
        let url = transport.url_for(&request).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/photos/2024/my%20cat.jpg");
    }

    #[test]
    fn test_query_is_encoded() {
        let transport = transport("http://localhost:9000", "path");
        let request = Request::new(Method::Get, "photos", None)
            .query("list-type", "2")
            .query("prefix", "a b/");
        let url = transport.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/photos?list-type=2&prefix=a%20b%2F"
        );
    }

    #[test]
    fn test_virtual_hosted_on_aws() {
        let transport = transport("", "auto");
        let request = Request::new(Method::Put, "photos", Some("a.txt"));
        let url = transport.url_for(&request).unwrap();
        assert_eq!(url.as_str(), "https://photos.s3.us-east-1.amazonaws.com/a.txt");
    }

    #[test]
    fn test_dotted_bucket_stays_path_style() {
        let transport = transport("", "auto");
        let request = Request::new(Method::Head, "my.bucket", None);
        let url = transport.url_for(&request).unwrap();
        assert_eq!(url.as_str(), "https://s3.us-east-1.amazonaws.com/my.bucket");
    }

    #[test]
    fn test_service_request_url() {
        let transport = transport("http://localhost:9000/", "dns");
        let url = transport.url_for(&Request::service(Method::Get)).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/");
    }

    #[test]
    fn test_unknown_lookup_is_config_error() {
        let mut profile = Profile::new("test", "http://localhost:9000", "ak", "sk");
        profile.bucket_lookup = "sideways".to_string();
        assert!(matches!(
            HttpTransport::new(&profile).unwrap_err(),
            Error::Config(_)
        ));
    }

    #[test]
    fn test_backoff_is_capped() {
        let mut profile = Profile::new("test", "http://localhost:9000", "ak", "sk");
        profile.retry = Some(RetryConfig {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 300,
        });
        let transport = HttpTransport::new(&profile).unwrap();

        let first = transport.backoff(1);
        assert!(first >= Duration::from_millis(100) && first < Duration::from_millis(121));
        let capped = transport.backoff(4);
        assert!(capped >= Duration::from_millis(300) && capped < Duration::from_millis(361));
    }

    #[test]
    fn test_host_header_keeps_custom_port() {
        let url = Url::parse("http://localhost:9000/b").unwrap();
        assert_eq!(host_header(&url), "localhost:9000");
        let url = Url::parse("https://s3.amazonaws.com/b").unwrap();
        assert_eq!(host_header(&url), "s3.amazonaws.com");
    }
}
