//! Transport seam
//!
//! A `Transport` performs one signed request against the storage REST API.
//! Non-success statuses come back as a normal [`Response`]; only a failure to
//! obtain any response at all is an `Err`.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::credentials::Credentials;
use crate::error::Result;

/// HTTP methods used by the S3 REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Put,
    Post,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unsigned request
///
/// `path` is the raw, unencoded `/bucket[/key]` path; transports encode it
/// for the wire. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, bucket: &str, key: Option<&str>) -> Self {
        let path = match key {
            Some(key) => format!("/{bucket}/{key}"),
            None if bucket.is_empty() => "/".to_string(),
            None => format!("/{bucket}"),
        };
        Self {
            method,
            path,
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    /// Request against the service root (ListBuckets)
    pub fn service(method: Method) -> Self {
        Self::new(method, "", None)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Bucket and key components of the path
    pub fn bucket_and_key(&self) -> (&str, Option<&str>) {
        let trimmed = self.path.trim_start_matches('/');
        match trimmed.split_once('/') {
            Some((bucket, key)) => (bucket, Some(key)),
            None => (trimmed, None),
        }
    }

    /// Value of a query parameter
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_query(&self, name: &str) -> bool {
        self.query.iter().any(|(k, _)| k == name)
    }
}

/// A raw response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header lookup by lowercase name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Performs signed requests against the storage service
///
/// Implementations must be safe for concurrent use; multipart operations
/// issue several requests at once over the same transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sign `request` with `credentials` and send it
    async fn send(&self, request: Request, credentials: &Credentials) -> Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: Request, credentials: &Credentials) -> Result<Response> {
        (**self).send(request, credentials).await
    }
}
