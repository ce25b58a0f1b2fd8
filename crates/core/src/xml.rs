//! S3 REST XML documents
//!
//! Each document is modelled once and used in both directions: the facade
//! serializes request bodies and deserializes responses, the in-memory
//! transport does the reverse.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{Error, Result};

/// Namespace attached to response documents
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Deserialize a response body
pub fn from_bytes<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(body).map_err(|e| Error::Xml(e.to_string()))?;
    Ok(quick_xml::de::from_str(text)?)
}

/// Serialize a document with an XML declaration
pub fn to_string<T: Serialize>(document: &T) -> Result<String> {
    let body = quick_xml::se::to_string(document).map_err(|e| Error::Xml(e.to_string()))?;
    Ok(format!(r#"<?xml version="1.0" encoding="UTF-8"?>{body}"#))
}

/// Whether a body is an `<Error>` document
///
/// CopyObject and CompleteMultipartUpload can fail after sending a 200
/// status, in which case the failure only shows up in the body.
pub fn is_error_document(body: &[u8]) -> bool {
    let text = String::from_utf8_lossy(body);
    let trimmed = match text.find("?>") {
        Some(pos) if text.trim_start().starts_with("<?xml") => &text[pos + 2..],
        _ => &text[..],
    };
    trimmed.trim_start().starts_with("<Error>")
}

/// `<Error>` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "Error")]
pub struct ErrorDocument {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "Resource", default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(rename = "RequestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// ListBuckets response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "ListAllMyBucketsResult")]
pub struct ListAllMyBucketsResult {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    pub xmlns: Option<String>,
    #[serde(rename = "Buckets", default)]
    pub buckets: BucketList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketList {
    #[serde(rename = "Bucket", default)]
    pub bucket: Vec<BucketEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "CreationDate", default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(rename = "BucketRegion", default, skip_serializing_if = "Option::is_none")]
    pub bucket_region: Option<String>,
}

/// ListObjectsV2 response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "ListBucketResult")]
pub struct ListBucketResult {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    pub xmlns: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Prefix", default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(rename = "KeyCount", default)]
    pub key_count: u64,
    #[serde(rename = "MaxKeys", default)]
    pub max_keys: u64,
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    #[serde(rename = "Contents", default)]
    pub contents: Vec<ObjectEntry>,
    #[serde(
        rename = "ContinuationToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub continuation_token: Option<String>,
    #[serde(
        rename = "NextContinuationToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_continuation_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectEntry {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "LastModified", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(rename = "ETag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "Size", default)]
    pub size: u64,
    #[serde(rename = "StorageClass", default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

/// CreateBucket request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "CreateBucketConfiguration")]
pub struct CreateBucketConfiguration {
    #[serde(rename = "LocationConstraint")]
    pub location_constraint: String,
}

/// CreateMultipartUpload response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "InitiateMultipartUploadResult")]
pub struct InitiateMultipartUploadResult {
    #[serde(rename = "Bucket", default)]
    pub bucket: String,
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "UploadId")]
    pub upload_id: String,
}

/// CompleteMultipartUpload request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "CompleteMultipartUpload")]
pub struct CompleteMultipartUpload {
    #[serde(rename = "Part", default)]
    pub parts: Vec<PartEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartEntry {
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

/// CompleteMultipartUpload response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "CompleteMultipartUploadResult")]
pub struct CompleteMultipartUploadResult {
    #[serde(rename = "Location", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "Bucket", default)]
    pub bucket: String,
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "ETag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// CopyObject response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "CopyObjectResult")]
pub struct CopyObjectResult {
    #[serde(rename = "ETag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "LastModified", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// DeleteObjects request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "Delete")]
pub struct Delete {
    #[serde(rename = "Quiet", default)]
    pub quiet: bool,
    #[serde(rename = "Object", default)]
    pub objects: Vec<ObjectIdentifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectIdentifier {
    #[serde(rename = "Key")]
    pub key: String,
}

/// DeleteObjects response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "DeleteResult")]
pub struct DeleteResult {
    #[serde(rename = "Deleted", default)]
    pub deleted: Vec<DeletedEntry>,
    #[serde(rename = "Error", default)]
    pub errors: Vec<DeleteErrorEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedEntry {
    #[serde(rename = "Key")]
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteErrorEntry {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_buckets() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Owner><ID>abc</ID><DisplayName>me</DisplayName></Owner>
  <Buckets>
    <Bucket><Name>alpha</Name><CreationDate>2024-01-02T03:04:05.000Z</CreationDate></Bucket>
    <Bucket><Name>beta</Name><CreationDate>2024-02-02T03:04:05.000Z</CreationDate><BucketRegion>sa-east-1</BucketRegion></Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#;
        let parsed: ListAllMyBucketsResult = from_bytes(body).unwrap();
        assert_eq!(parsed.buckets.bucket.len(), 2);
        assert_eq!(parsed.buckets.bucket[0].name, "alpha");
        assert_eq!(
            parsed.buckets.bucket[1].bucket_region.as_deref(),
            Some("sa-east-1")
        );
    }

    #[test]
    fn test_parse_empty_bucket_list() {
        let body = br#"<ListAllMyBucketsResult><Buckets></Buckets></ListAllMyBucketsResult>"#;
        let parsed: ListAllMyBucketsResult = from_bytes(body).unwrap();
        assert!(parsed.buckets.bucket.is_empty());
    }

    #[test]
    fn test_parse_list_objects_page() {
        let body = br#"<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>photos</Name>
  <Prefix>2024/</Prefix>
  <KeyCount>2</KeyCount>
  <MaxKeys>2</MaxKeys>
  <IsTruncated>true</IsTruncated>
  <Contents><Key>2024/a.jpg</Key><LastModified>2024-01-02T03:04:05.000Z</LastModified><ETag>&quot;e1&quot;</ETag><Size>10</Size><StorageClass>STANDARD</StorageClass></Contents>
  <Contents><Key>2024/b.jpg</Key><Size>20</Size></Contents>
  <NextContinuationToken>tok-1</NextContinuationToken>
</ListBucketResult>"#;
        let parsed: ListBucketResult = from_bytes(body).unwrap();
        assert!(parsed.is_truncated);
        assert_eq!(parsed.contents.len(), 2);
        assert_eq!(parsed.contents[0].etag.as_deref(), Some("\"e1\""));
        assert_eq!(parsed.contents[1].size, 20);
        assert_eq!(parsed.next_continuation_token.as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_parse_error_document() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message><RequestId>1</RequestId></Error>"#;
        assert!(is_error_document(body));
        let parsed: ErrorDocument = from_bytes(body).unwrap();
        assert_eq!(parsed.code, "NoSuchKey");
    }

    #[test]
    fn test_is_error_document_rejects_results() {
        assert!(!is_error_document(
            br#"<?xml version="1.0"?><CopyObjectResult><ETag>x</ETag></CopyObjectResult>"#
        ));
        assert!(!is_error_document(b""));
    }

    #[test]
    fn test_complete_multipart_body() {
        let doc = CompleteMultipartUpload {
            parts: vec![
                PartEntry {
                    part_number: 1,
                    etag: "a".into(),
                },
                PartEntry {
                    part_number: 2,
                    etag: "b".into(),
                },
            ],
        };
        let xml = to_string(&doc).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(
            "<CompleteMultipartUpload><Part><PartNumber>1</PartNumber><ETag>a</ETag></Part>"
        ));

        let parsed: CompleteMultipartUpload = from_bytes(xml.as_bytes()).unwrap();
        assert_eq!(parsed.parts, doc.parts);
    }

    #[test]
    fn test_delete_result_with_errors() {
        let body = br#"<DeleteResult>
  <Deleted><Key>a</Key></Deleted>
  <Error><Key>b</Key><Code>AccessDenied</Code><Message>Access Denied</Message></Error>
  <Deleted><Key>c</Key></Deleted>
</DeleteResult>"#;
        let parsed: DeleteResult = from_bytes(body).unwrap();
        assert_eq!(parsed.deleted.len(), 2);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].key, "b");
    }
}
