//! Remote path parsing
//!
//! Commands address objects as `bucket/key`, optionally written with an
//! `s3://` scheme. Listing commands also accept a bare `bucket` or a
//! `bucket/prefix`.

use std::fmt;

use crate::error::{Error, Result};

const SCHEME: &str = "s3://";

/// A bucket plus an optional key or prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath {
    pub bucket: String,
    /// Object key or listing prefix; empty for the bucket root
    pub key: String,
}

impl ObjectPath {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse `bucket[/key]`
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.strip_prefix(SCHEME).unwrap_or(path);
        if trimmed.is_empty() {
            return Err(Error::InvalidPath("Path cannot be empty".into()));
        }
        if trimmed.starts_with('/') {
            return Err(Error::InvalidPath(format!(
                "'{path}' must start with a bucket name"
            )));
        }

        let (bucket, key) = match trimmed.split_once('/') {
            Some((bucket, key)) => (bucket, key),
            None => (trimmed, ""),
        };
        if bucket.is_empty() {
            return Err(Error::InvalidPath(format!("'{path}' has no bucket name")));
        }

        Ok(Self::new(bucket, key))
    }

    /// Parse `bucket/key`, requiring a non-empty key
    pub fn parse_object(path: &str) -> Result<Self> {
        let parsed = Self::parse(path)?;
        if parsed.key.is_empty() || parsed.key.ends_with('/') {
            return Err(Error::InvalidPath(format!(
                "'{path}' must name an object as bucket/key"
            )));
        }
        Ok(parsed)
    }

    /// Key as an optional listing prefix
    pub fn prefix(&self) -> Option<&str> {
        (!self.key.is_empty()).then_some(self.key.as_str())
    }

    /// Last path segment of the key
    pub fn file_name(&self) -> Option<&str> {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.bucket)
        } else {
            write!(f, "{}/{}", self.bucket, self.key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_only() {
        let path = ObjectPath::parse("photos").unwrap();
        assert_eq!(path.bucket, "photos");
        assert_eq!(path.key, "");
        assert_eq!(path.prefix(), None);
    }

    #[test]
    fn test_parse_nested_key() {
        let path = ObjectPath::parse("photos/2024/jan/cat.jpg").unwrap();
        assert_eq!(path.bucket, "photos");
        assert_eq!(path.key, "2024/jan/cat.jpg");
        assert_eq!(path.file_name(), Some("cat.jpg"));
        assert_eq!(path.to_string(), "photos/2024/jan/cat.jpg");
    }

    #[test]
    fn test_parse_with_scheme() {
        let path = ObjectPath::parse("s3://photos/a.txt").unwrap();
        assert_eq!(path, ObjectPath::new("photos", "a.txt"));
    }

    #[test]
    fn test_parse_prefix() {
        let path = ObjectPath::parse("photos/2024/").unwrap();
        assert_eq!(path.prefix(), Some("2024/"));
        assert_eq!(path.file_name(), Some("2024"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ObjectPath::parse("").is_err());
        assert!(ObjectPath::parse("s3://").is_err());
        assert!(ObjectPath::parse("/abs/path").is_err());
    }

    #[test]
    fn test_parse_object_requires_key() {
        assert!(ObjectPath::parse_object("photos").is_err());
        assert!(ObjectPath::parse_object("photos/").is_err());
        assert!(ObjectPath::parse_object("photos/dir/").is_err());
        assert!(ObjectPath::parse_object("photos/a.txt").is_ok());
    }
}
