//! Bucket and object metadata returned by the facade

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A bucket owned by the authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Globally unique bucket name
    pub name: String,

    /// Region the bucket lives in, when the listing reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,
}

impl Bucket {
    /// Create a bucket entry with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: None,
            created: None,
        }
    }
}

/// Metadata for an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Bucket the object belongs to
    pub bucket: String,

    /// Object key
    pub key: String,

    /// Size in bytes
    pub size_bytes: u64,

    /// Human-readable size
    pub size_human: String,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag without surrounding quotes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Storage class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object of the given size
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, size: u64) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            size_bytes: size,
            size_human: humansize::format_size(size, humansize::BINARY),
            last_modified: None,
            etag: None,
            storage_class: None,
            content_type: None,
        }
    }

    /// Set the ETag, stripping the quotes providers wrap it in
    pub fn with_etag(mut self, etag: Option<&str>) -> Self {
        self.etag = etag.map(trim_etag);
        self
    }
}

/// One page of a ListObjectsV2 listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Objects on this page
    pub objects: Vec<ObjectInfo>,

    /// Token for the next page, `None` on the last page
    pub next_token: Option<String>,
}

/// Strip surrounding quotes from an ETag value
pub fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

/// Parse an RFC 3339 timestamp as returned in S3 listings
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    value.parse::<Timestamp>().ok()
}

/// Parse an HTTP date header (`Tue, 02 Jan 2024 03:04:05 GMT`)
pub fn parse_http_date(value: &str) -> Option<Timestamp> {
    jiff::fmt::rfc2822::parse(value)
        .ok()
        .map(|zoned| zoned.timestamp())
}

/// Format a timestamp as an HTTP date header
pub fn format_http_date(ts: Timestamp) -> String {
    ts.strftime("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
