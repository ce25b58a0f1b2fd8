//! Object storage facade
//!
//! `ObjectStoreFacade` is an explicitly constructed handle bound to one
//! endpoint, region and credential set. It speaks the S3 REST protocol
//! through a [`Transport`] and resolves credentials per request through a
//! [`CredentialProvider`]. It holds no mutable state; cloning is cheap and
//! clones share the transport.
//!
//! Listing is materialized by [`ObjectStoreFacade::list_objects`]. Very
//! large buckets can be walked lazily with
//! [`ObjectStoreFacade::list_objects_pages`], which can be restarted by
//! calling it again.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use base64::Engine as _;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, warn};

use crate::classify::{classify, classify_document};
use crate::credentials::CredentialProvider;
use crate::error::{Error, Result};
use crate::multipart::{
    MAX_SINGLE_UPLOAD, MultipartConfig, UploadSession, calculate_parts, part_byte_range,
    validate_part_size,
};
use crate::transport::{Method, Request, Response, Transport};
use crate::types::{Bucket, ListPage, ObjectInfo, parse_http_date, parse_timestamp, trim_etag};
use crate::xml::{self, ErrorDocument};

/// Region that takes no LocationConstraint on CreateBucket
pub const DEFAULT_REGION: &str = "us-east-1";

/// Maximum number of keys per DeleteObjects request
pub const MAX_DELETE_BATCH: usize = 1000;

/// Maximum key length in bytes
pub const MAX_KEY_LENGTH: usize = 1024;

/// Characters escaped in the `x-amz-copy-source` header; `/` is kept
const COPY_SOURCE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Handle for bucket and object operations against one storage endpoint
#[derive(Clone)]
pub struct ObjectStoreFacade {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    region: String,
    multipart: MultipartConfig,
}

impl std::fmt::Debug for ObjectStoreFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreFacade")
            .field("region", &self.region)
            .field("multipart", &self.multipart)
            .finish_non_exhaustive()
    }
}

impl ObjectStoreFacade {
    /// Create a facade over a transport and credential provider
    pub fn new(
        transport: impl Transport + 'static,
        credentials: impl CredentialProvider + 'static,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            credentials: Arc::new(credentials),
            region: DEFAULT_REGION.to_string(),
            multipart: MultipartConfig::default(),
        }
    }

    /// Default region used by [`Self::create_bucket_default`]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Part size default and worker pool size for multipart transfers
    pub fn with_multipart(mut self, config: MultipartConfig) -> Self {
        self.multipart = config;
        self
    }

    /// Worker pool size; a zero from a hand-built config means one worker
    fn workers(&self) -> usize {
        self.multipart.concurrency.max(1)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn multipart_config(&self) -> &MultipartConfig {
        &self.multipart
    }

    // ---------------------------------------------------------------------
    // Buckets
    // ---------------------------------------------------------------------

    /// List all buckets owned by the authenticated principal
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let response = self
            .execute_ok(Request::service(Method::Get), "bucket list")
            .await?;
        let result: xml::ListAllMyBucketsResult = xml::from_bytes(&response.body)?;

        Ok(result
            .buckets
            .bucket
            .into_iter()
            .map(|entry| Bucket {
                name: entry.name,
                region: entry.bucket_region,
                created: entry.creation_date.as_deref().and_then(parse_timestamp),
            })
            .collect())
    }

    /// Probe whether a bucket exists
    ///
    /// A missing bucket is `Ok(false)`. Any other failure, including a
    /// bucket that exists but is forbidden to the caller, is an error.
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        require_bucket(bucket)?;
        let response = self.execute(Request::new(Method::Head, bucket, None)).await?;

        if response.is_success() {
            debug!(bucket, "bucket exists");
            return Ok(true);
        }
        match classify(&response, bucket) {
            Error::NotFound(_) => {
                debug!(bucket, "bucket is available");
                Ok(false)
            }
            err => Err(err),
        }
    }

    /// Create a bucket in `region`
    ///
    /// Re-creating a bucket the caller already owns succeeds. A name owned
    /// by another principal fails with [`Error::NameConflict`].
    pub async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        validate_bucket_name(bucket)?;
        validate_region(region)?;

        let mut request = Request::new(Method::Put, bucket, None);
        if region != DEFAULT_REGION {
            let body = xml::to_string(&xml::CreateBucketConfiguration {
                location_constraint: region.to_string(),
            })?;
            request = request
                .header("content-type", "application/xml")
                .body(body);
        }

        match self.execute_ok(request, bucket).await {
            Ok(_) => {
                debug!(bucket, region, "bucket created");
                Ok(())
            }
            Err(Error::AlreadyOwned(_)) => {
                debug!(bucket, "bucket already owned by caller");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Create a bucket in the facade's configured region
    pub async fn create_bucket_default(&self, bucket: &str) -> Result<()> {
        self.create_bucket(bucket, &self.region).await
    }

    /// Delete an empty bucket
    pub async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        require_bucket(bucket)?;
        self.execute_ok(Request::new(Method::Delete, bucket, None), bucket)
            .await?;
        debug!(bucket, "bucket deleted");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Objects
    // ---------------------------------------------------------------------

    /// Fetch object metadata
    pub async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        require_object(bucket, key)?;
        let resource = format!("{bucket}/{key}");
        let response = self
            .execute_ok(Request::new(Method::Head, bucket, Some(key)), &resource)
            .await?;

        let size = response
            .header("content-length")
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| {
                Error::Transport(format!("{resource}: response has no valid content-length"))
            })?;
        let mut info = ObjectInfo::new(bucket, key, size).with_etag(response.header("etag"));
        info.last_modified = response.header("last-modified").and_then(parse_http_date);
        info.content_type = response.header("content-type").map(str::to_string);
        info.storage_class = response
            .header("x-amz-storage-class")
            .map(str::to_string);
        Ok(info)
    }

    /// Upload a payload in a single request
    pub async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
    ) -> Result<ObjectInfo> {
        self.upload_object_with_type(bucket, key, data, None).await
    }

    /// Upload a payload in a single request with an explicit content type
    pub async fn upload_object_with_type(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Result<ObjectInfo> {
        require_object(bucket, key)?;
        let data = data.into();
        let size = data.len() as u64;
        if size > MAX_SINGLE_UPLOAD {
            return Err(Error::Validation(format!(
                "{size} bytes exceeds the single upload limit; use a multipart upload"
            )));
        }

        let mut request = Request::new(Method::Put, bucket, Some(key)).body(data);
        if let Some(ct) = content_type {
            request = request.header("content-type", ct);
        }

        let resource = format!("{bucket}/{key}");
        let response = self.execute_ok(request, &resource).await?;
        debug!(bucket, key, size, "object uploaded");

        let mut info = ObjectInfo::new(bucket, key, size).with_etag(response.header("etag"));
        info.content_type = content_type.map(str::to_string);
        info.last_modified = Some(jiff::Timestamp::now());
        Ok(info)
    }

    /// Upload a payload as a multipart upload with parts of `part_size` bytes
    ///
    /// Parts are uploaded concurrently by a bounded worker pool. If any part
    /// fails the session is aborted and the part's error is returned; no
    /// object is left under `key`.
    pub async fn upload_large_object(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        part_size: u64,
    ) -> Result<ObjectInfo> {
        require_object(bucket, key)?;
        let data = data.into();
        let expected_parts = validate_part_size(data.len() as u64, part_size)?;

        let upload_id = self.initiate_upload(bucket, key).await?;
        let mut session = UploadSession::new(bucket, key, upload_id, expected_parts);
        debug!(
            bucket,
            key,
            upload_id = session.upload_id(),
            parts = expected_parts,
            "multipart upload initiated"
        );

        match self.run_upload(&mut session, &data, part_size).await {
            Ok(info) => Ok(info),
            Err(err) => {
                self.abort_upload(&mut session).await;
                Err(err)
            }
        }
    }

    /// Upload with the facade's configured part size
    pub async fn upload_large_object_default(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
    ) -> Result<ObjectInfo> {
        let data = data.into();
        let part_size = self.multipart.calculate_part_size(data.len() as u64);
        self.upload_large_object(bucket, key, data, part_size).await
    }

    /// Download an object in a single request
    pub async fn download_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        require_object(bucket, key)?;
        let resource = format!("{bucket}/{key}");
        let response = self
            .execute_ok(Request::new(Method::Get, bucket, Some(key)), &resource)
            .await?;
        Ok(response.body)
    }

    /// Download an object with concurrent ranged requests of `part_size` bytes
    ///
    /// Each range is written at its own offset as it arrives, so completion
    /// order does not matter.
    pub async fn download_large_object(
        &self,
        bucket: &str,
        key: &str,
        part_size: u64,
    ) -> Result<Bytes> {
        require_object(bucket, key)?;
        if part_size == 0 {
            return Err(Error::Validation("part size must be greater than zero".into()));
        }

        let info = self.head_object(bucket, key).await?;
        let total = info.size_bytes;
        if total == 0 {
            return Ok(Bytes::new());
        }

        let parts = part_count(validate_part_size(total, part_size)?)?;
        let etag = info.etag.clone();
        debug!(bucket, key, total, parts, "ranged download started");

        let buffer = stream::iter(1..=parts)
            .map(|part_number| {
                let (start, end) = part_byte_range(part_number, part_size, total);
                let etag = etag.clone();
                async move {
                    let bytes = self
                        .download_range(bucket, key, start, end, etag.as_deref())
                        .await?;
                    Ok::<_, Error>((start, bytes))
                }
            })
            .buffer_unordered(self.workers())
            .try_fold(vec![0u8; total as usize], |mut buffer, (start, bytes)| async move {
                let offset = start as usize;
                buffer[offset..offset + bytes.len()].copy_from_slice(&bytes);
                Ok(buffer)
            })
            .await?;

        Ok(Bytes::from(buffer))
    }

    /// Server-side copy
    pub async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<ObjectInfo> {
        require_object(src_bucket, src_key)?;
        require_object(dst_bucket, dst_key)?;

        let source = format!(
            "/{src_bucket}/{}",
            utf8_percent_encode(src_key, COPY_SOURCE_ENCODE_SET)
        );
        let request =
            Request::new(Method::Put, dst_bucket, Some(dst_key)).header("x-amz-copy-source", source);

        let resource = format!("{src_bucket}/{src_key}");
        let response = self.execute_ok(request, &resource).await?;
        let document = success_document::<xml::CopyObjectResult>(&response, &resource)?;
        debug!(src_bucket, src_key, dst_bucket, dst_key, "object copied");

        let mut info = self.head_object(dst_bucket, dst_key).await?;
        if let Some(etag) = document.etag.as_deref() {
            info.etag = Some(trim_etag(etag));
        }
        Ok(info)
    }

    /// Copy `bucket/key` to `bucket/folder/key`
    pub async fn copy_to_folder(&self, bucket: &str, key: &str, folder: &str) -> Result<ObjectInfo> {
        let folder = folder.trim_matches('/');
        if folder.is_empty() {
            return Err(Error::Validation("folder name cannot be empty".into()));
        }
        let dst_key = format!("{folder}/{key}");
        self.copy_object(bucket, key, bucket, &dst_key).await
    }

    /// List every object in a bucket, following continuation tokens
    pub async fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<ObjectInfo>> {
        let mut seen = HashSet::new();
        let mut objects = Vec::new();

        let mut pages = std::pin::pin!(self.list_objects_pages(bucket, prefix));
        while let Some(page) = pages.try_next().await? {
            for object in page.objects {
                if seen.insert(object.key.clone()) {
                    objects.push(object);
                }
            }
        }

        debug!(bucket, count = objects.len(), "objects listed");
        Ok(objects)
    }

    /// Lazily walk a listing one page at a time
    pub fn list_objects_pages<'a>(
        &'a self,
        bucket: &'a str,
        prefix: Option<&'a str>,
    ) -> impl Stream<Item = Result<ListPage>> + 'a {
        stream::try_unfold(Cursor::Start, move |cursor| async move {
            let token = match cursor {
                Cursor::Done => return Ok(None),
                Cursor::Start => None,
                Cursor::Next(token) => Some(token),
            };

            let page = self
                .list_objects_page(bucket, prefix, token.as_deref())
                .await?;
            let next = match &page.next_token {
                Some(next) if Some(next) == token.as_ref() => {
                    return Err(Error::Transport(format!(
                        "{bucket}: listing returned the same continuation token twice"
                    )));
                }
                Some(next) => Cursor::Next(next.clone()),
                None => Cursor::Done,
            };
            Ok::<_, Error>(Some((page, next)))
        })
    }

    /// Fetch a single ListObjectsV2 page
    pub async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ListPage> {
        require_bucket(bucket)?;

        let mut request = Request::new(Method::Get, bucket, None).query("list-type", "2");
        if let Some(token) = continuation_token {
            request = request.query("continuation-token", token);
        }
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            request = request.query("prefix", prefix);
        }

        let response = self.execute_ok(request, bucket).await?;
        let result: xml::ListBucketResult = xml::from_bytes(&response.body)?;

        let next_token = if result.is_truncated {
            match result.next_continuation_token.filter(|t| !t.is_empty()) {
                Some(token) => Some(token),
                None => {
                    return Err(Error::Transport(format!(
                        "{bucket}: truncated listing without a continuation token"
                    )));
                }
            }
        } else {
            None
        };

        let objects = result
            .contents
            .into_iter()
            .map(|entry| {
                let mut info =
                    ObjectInfo::new(bucket, entry.key, entry.size).with_etag(entry.etag.as_deref());
                info.last_modified = entry.last_modified.as_deref().and_then(parse_timestamp);
                info.storage_class = entry.storage_class;
                info
            })
            .collect();

        Ok(ListPage {
            objects,
            next_token,
        })
    }

    /// Delete a set of keys, returning the keys the provider confirmed
    ///
    /// Duplicate keys are sent once. Keys are sent in batches of
    /// [`MAX_DELETE_BATCH`]; any per-key failure fails the call.
    pub async fn delete_objects<S: AsRef<str>>(&self, bucket: &str, keys: &[S]) -> Result<Vec<String>> {
        require_bucket(bucket)?;
        let keys: BTreeSet<&str> = keys.iter().map(AsRef::as_ref).collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(bad) = keys.iter().find(|k| k.is_empty()) {
            return Err(Error::Validation(format!("invalid object key '{bad}'")));
        }

        let keys: Vec<&str> = keys.into_iter().collect();
        let mut deleted = Vec::with_capacity(keys.len());
        let mut failures = Vec::new();

        for batch in keys.chunks(MAX_DELETE_BATCH) {
            let body = xml::to_string(&xml::Delete {
                quiet: false,
                objects: batch
                    .iter()
                    .map(|k| xml::ObjectIdentifier { key: k.to_string() })
                    .collect(),
            })?;
            let digest = md5::compute(body.as_bytes());
            let request = Request::new(Method::Post, bucket, None)
                .query("delete", "")
                .header("content-type", "application/xml")
                .header(
                    "content-md5",
                    base64::engine::general_purpose::STANDARD.encode(digest.0),
                )
                .body(body);

            let response = self.execute_ok(request, bucket).await?;
            let result: xml::DeleteResult = xml::from_bytes(&response.body)?;
            deleted.extend(result.deleted.into_iter().map(|d| d.key));
            failures.extend(result.errors);
        }

        if !failures.is_empty() {
            let summary = failures
                .iter()
                .map(|f| format!("{} ({})", f.key, f.code))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::Transport(format!(
                "{bucket}: failed to delete {} object(s): {summary}",
                failures.len()
            )));
        }

        debug!(bucket, count = deleted.len(), "objects deleted");
        Ok(deleted)
    }

    // ---------------------------------------------------------------------
    // Multipart internals
    // ---------------------------------------------------------------------

    async fn initiate_upload(&self, bucket: &str, key: &str) -> Result<String> {
        let resource = format!("{bucket}/{key}");
        let request = Request::new(Method::Post, bucket, Some(key)).query("uploads", "");
        let response = self.execute_ok(request, &resource).await?;
        let result: xml::InitiateMultipartUploadResult = xml::from_bytes(&response.body)?;
        if result.upload_id.is_empty() {
            return Err(Error::Transport(format!(
                "{resource}: provider returned an empty upload id"
            )));
        }
        Ok(result.upload_id)
    }

    async fn run_upload(
        &self,
        session: &mut UploadSession,
        data: &Bytes,
        part_size: u64,
    ) -> Result<ObjectInfo> {
        session.begin_parts()?;

        let bucket = session.bucket().to_string();
        let key = session.key().to_string();
        let upload_id = session.upload_id().to_string();
        let total = data.len() as u64;
        let parts = part_count(calculate_parts(total, part_size))?;

        // Dropping the stream on the first error cancels parts still in flight.
        let acknowledged: Vec<(u32, String)> = stream::iter(1..=parts)
            .map(|part_number| {
                let (start, end) = part_byte_range(part_number, part_size, total);
                let chunk = data.slice(start as usize..end as usize);
                self.upload_part(&bucket, &key, &upload_id, part_number, chunk)
            })
            .buffer_unordered(self.workers())
            .try_collect()
            .await?;

        for (part_number, etag) in acknowledged {
            session.record_part(part_number, etag)?;
        }
        let manifest = session.manifest()?;

        let resource = format!("{bucket}/{key}");
        let body = xml::to_string(&xml::CompleteMultipartUpload { parts: manifest })?;
        let request = Request::new(Method::Post, &bucket, Some(&key))
            .query("uploadId", upload_id.as_str())
            .header("content-type", "application/xml")
            .body(body);
        let response = self.execute_ok(request, &resource).await?;
        let result = success_document::<xml::CompleteMultipartUploadResult>(&response, &resource)?;

        session.complete()?;
        debug!(bucket, key, upload_id, parts, "multipart upload completed");

        let mut info = ObjectInfo::new(&bucket, &key, total).with_etag(result.etag.as_deref());
        info.last_modified = Some(jiff::Timestamp::now());
        Ok(info)
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        chunk: Bytes,
    ) -> Result<(u32, String)> {
        let resource = format!("{bucket}/{key} part {part_number}");
        let request = Request::new(Method::Put, bucket, Some(key))
            .query("partNumber", part_number.to_string())
            .query("uploadId", upload_id)
            .body(chunk);

        let response = self.execute_ok(request, &resource).await?;
        let etag = response
            .header("etag")
            .map(str::to_string)
            .ok_or_else(|| Error::Transport(format!("{resource}: response carried no ETag")))?;
        debug!(bucket, key, part_number, "part uploaded");
        Ok((part_number, etag))
    }

    /// Best-effort abort; failures are logged, never returned
    async fn abort_upload(&self, session: &mut UploadSession) {
        if session.state().is_terminal() {
            return;
        }

        let request = Request::new(Method::Delete, session.bucket(), Some(session.key()))
            .query("uploadId", session.upload_id());
        let resource = format!("{}/{}", session.bucket(), session.key());
        match self.execute_ok(request, &resource).await {
            Ok(_) => debug!(upload_id = session.upload_id(), "multipart upload aborted"),
            Err(err) => warn!(
                upload_id = session.upload_id(),
                error = %err,
                "failed to abort multipart upload"
            ),
        }

        if let Err(err) = session.abort() {
            warn!(error = %err, "multipart session already finished");
        }
    }

    async fn download_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end: u64,
        etag: Option<&str>,
    ) -> Result<Bytes> {
        let resource = format!("{bucket}/{key} bytes {start}-{}", end - 1);
        let mut request = Request::new(Method::Get, bucket, Some(key))
            .header("range", format!("bytes={start}-{}", end - 1));
        if let Some(etag) = etag {
            request = request.header("if-match", format!("\"{etag}\""));
        }

        let response = self.execute_ok(request, &resource).await?;
        let expected = (end - start) as usize;
        if response.body.len() != expected {
            return Err(Error::Transport(format!(
                "{resource}: expected {expected} bytes, received {}",
                response.body.len()
            )));
        }
        Ok(response.body)
    }

    // ---------------------------------------------------------------------
    // Request plumbing
    // ---------------------------------------------------------------------

    async fn execute(&self, request: Request) -> Result<Response> {
        let credentials = self.credentials.resolve().await?;
        debug!(method = %request.method, path = %request.path, "sending request");
        self.transport.send(request, &credentials).await
    }

    async fn execute_ok(&self, request: Request, resource: &str) -> Result<Response> {
        let response = self.execute(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(classify(&response, resource))
        }
    }
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Decode a 200 body that may still carry an `<Error>` document
fn success_document<T>(response: &Response, resource: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if xml::is_error_document(&response.body) {
        let document: ErrorDocument = xml::from_bytes(&response.body)?;
        return Err(classify_document(&document, resource));
    }
    if response.body.is_empty() {
        return Ok(T::default());
    }
    xml::from_bytes(&response.body)
}

fn require_bucket(bucket: &str) -> Result<()> {
    if bucket.is_empty() {
        return Err(Error::Validation("bucket name cannot be empty".into()));
    }
    if bucket.contains('/') {
        return Err(Error::Validation(format!(
            "bucket name '{bucket}' cannot contain '/'"
        )));
    }
    Ok(())
}

fn require_object(bucket: &str, key: &str) -> Result<()> {
    require_bucket(bucket)?;
    if key.is_empty() {
        return Err(Error::Validation("object key cannot be empty".into()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(Error::Validation(format!(
            "object key is {} bytes; the limit is {MAX_KEY_LENGTH}",
            key.len()
        )));
    }
    Ok(())
}

/// Part count as a part number bound
fn part_count(parts: usize) -> Result<u32> {
    u32::try_from(parts)
        .map_err(|_| Error::Validation(format!("{parts} parts exceeds the part number range")))
}

/// Validate a bucket name against S3 naming rules
pub fn validate_bucket_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("bucket name cannot be empty".into()));
    }
    if name.len() < 3 || name.len() > 63 {
        return Err(Error::Validation(format!(
            "bucket name '{name}' must be between 3 and 63 characters"
        )));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(Error::Validation(format!(
            "bucket name '{name}' may only contain lowercase letters, digits, '-' and '.'"
        )));
    }
    let first = name.as_bytes()[0];
    let last = name.as_bytes()[name.len() - 1];
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return Err(Error::Validation(format!(
            "bucket name '{name}' must start and end with a letter or digit"
        )));
    }
    if name.contains("..") {
        return Err(Error::Validation(format!(
            "bucket name '{name}' cannot contain consecutive periods"
        )));
    }
    Ok(())
}

/// Validate a region identifier such as `sa-east-1`
pub fn validate_region(region: &str) -> Result<()> {
    let well_formed = (3..=32).contains(&region.len())
        && region.contains('-')
        && region
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && region.as_bytes()[0].is_ascii_lowercase()
        && region.as_bytes()[region.len() - 1].is_ascii_alphanumeric()
        && !region.contains("--");

    if well_formed {
        Ok(())
    } else {
        Err(Error::InvalidRegion(format!(
            "'{region}' is not a valid region identifier"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credentials, MockCredentialProvider, StaticCredentials};
    use crate::transport::MockTransport;

    fn facade_with(transport: MockTransport) -> ObjectStoreFacade {
        ObjectStoreFacade::new(transport, StaticCredentials::new(Credentials::new("ak", "sk")))
    }

    #[test]
    fn test_validate_bucket_name() {
        assert!(validate_bucket_name("my-bucket.logs").is_ok());
        assert!(validate_bucket_name("").is_err());
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name("UpperCase").is_err());
        assert!(validate_bucket_name("-leading").is_err());
        assert!(validate_bucket_name("trailing-").is_err());
        assert!(validate_bucket_name("double..dot").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_validate_region() {
        assert!(validate_region("us-east-1").is_ok());
        assert!(validate_region("sa-east-1").is_ok());
        assert!(validate_region("us-gov-west-1").is_ok());
        assert!(matches!(validate_region(""), Err(Error::InvalidRegion(_))));
        assert!(matches!(validate_region("useast1"), Err(Error::InvalidRegion(_))));
        assert!(matches!(validate_region("US-EAST-1"), Err(Error::InvalidRegion(_))));
        assert!(matches!(validate_region("us--east"), Err(Error::InvalidRegion(_))));
        assert!(matches!(validate_region("us-east-"), Err(Error::InvalidRegion(_))));
    }

    #[tokio::test]
    async fn test_bucket_exists_forbidden_is_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Head && req.path == "/secret")
            .times(1)
            .returning(|_, _| Ok(Response::new(403)));

        let err = facade_with(transport).bucket_exists("secret").await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_bucket_exists_404_is_false() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _| Ok(Response::new(404)));

        assert!(!facade_with(transport).bucket_exists("free").await.unwrap());
    }

    #[tokio::test]
    async fn test_bucket_exists_server_error_propagates() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _| Ok(Response::new(503)));

        let err = facade_with(transport).bucket_exists("busy").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_credentials_resolved_per_request() {
        let mut credentials = MockCredentialProvider::new();
        credentials
            .expect_resolve()
            .times(2)
            .returning(|| Ok(Credentials::new("ak", "sk")));

        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|_, creds| creds.access_key == "ak")
            .times(2)
            .returning(|_, _| Ok(Response::new(200)));

        let facade = ObjectStoreFacade::new(transport, credentials);
        assert!(facade.bucket_exists("a-bucket").await.unwrap());
        assert!(facade.bucket_exists("b-bucket").await.unwrap());
    }

    #[tokio::test]
    async fn test_credential_failure_skips_transport() {
        let mut credentials = MockCredentialProvider::new();
        credentials
            .expect_resolve()
            .returning(|| Err(Error::Auth("token expired".into())));

        let mut transport = MockTransport::new();
        transport.expect_send().never();

        let facade = ObjectStoreFacade::new(transport, credentials);
        let err = facade.list_buckets().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_create_bucket_sends_location_constraint() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req, _| {
                let body = String::from_utf8_lossy(&req.body);
                req.method == Method::Put
                    && req.path == "/reports"
                    && body.contains("<LocationConstraint>sa-east-1</LocationConstraint>")
            })
            .times(1)
            .returning(|_, _| Ok(Response::new(200)));

        facade_with(transport)
            .create_bucket("reports", "sa-east-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_bucket_us_east_1_has_no_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req, _| req.body.is_empty())
            .times(1)
            .returning(|_, _| Ok(Response::new(200)));

        facade_with(transport)
            .create_bucket("reports", "us-east-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_bucket_invalid_input_never_sent() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let facade = facade_with(transport);

        assert!(matches!(
            facade.create_bucket("", "us-east-1").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            facade.create_bucket("reports", "mars").await,
            Err(Error::InvalidRegion(_))
        ));
    }

    #[tokio::test]
    async fn test_copy_error_in_success_body() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_, _| {
            Ok(Response::new(200).with_body(
                "<?xml version=\"1.0\"?><Error><Code>InternalError</Code><Message>boom</Message></Error>",
            ))
        });

        let err = facade_with(transport)
            .copy_object("src", "a.txt", "dst", "b.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_copy_source_is_encoded() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Put)
            .times(1)
            .returning(|req, _| {
                assert_eq!(
                    req.headers.get("x-amz-copy-source").unwrap(),
                    "/src/dir/my%20file.txt"
                );
                Ok(Response::new(200).with_body(
                    "<CopyObjectResult><ETag>\"abc\"</ETag></CopyObjectResult>",
                ))
            });
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Head)
            .times(1)
            .returning(|_, _| {
                Ok(Response::new(200)
                    .with_header("content-length", "5")
                    .with_header("etag", "\"abc\""))
            });

        let info = facade_with(transport)
            .copy_object("src", "dir/my file.txt", "dst", "copy.txt")
            .await
            .unwrap();
        assert_eq!(info.size_bytes, 5);
        assert_eq!(info.etag.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_truncated_listing_without_token_fails() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_, _| {
            Ok(Response::new(200).with_body(
                "<ListBucketResult><Name>b</Name><IsTruncated>true</IsTruncated></ListBucketResult>",
            ))
        });

        let err = facade_with(transport)
            .list_objects("bucket", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_repeated_continuation_token_fails() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(2).returning(|_, _| {
            Ok(Response::new(200).with_body(
                "<ListBucketResult><IsTruncated>true</IsTruncated><Contents><Key>a</Key><Size>1</Size></Contents><NextContinuationToken>same</NextContinuationToken></ListBucketResult>",
            ))
        });

        let err = facade_with(transport)
            .list_objects("bucket", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_delete_objects_empty_set_is_noop() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();

        let keys: Vec<String> = Vec::new();
        let deleted = facade_with(transport)
            .delete_objects("bucket", &keys)
            .await
            .unwrap();
        assert!(deleted.is_empty());
    }

    #[tokio::test]
    async fn test_delete_objects_sends_content_md5() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req, _| {
                let digest = md5::compute(&req.body);
                let expected = base64::engine::general_purpose::STANDARD.encode(digest.0);
                req.has_query("delete")
                    && req.headers.get("content-md5") == Some(&expected)
            })
            .times(1)
            .returning(|_, _| {
                Ok(Response::new(200).with_body(
                    "<DeleteResult><Deleted><Key>a</Key></Deleted><Deleted><Key>b</Key></Deleted></DeleteResult>",
                ))
            });

        let deleted = facade_with(transport)
            .delete_objects("bucket", &["a", "b", "a"])
            .await
            .unwrap();
        assert_eq!(deleted, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_delete_objects_partial_failure_is_error() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_, _| {
            Ok(Response::new(200).with_body(
                "<DeleteResult><Deleted><Key>a</Key></Deleted><Error><Key>b</Key><Code>AccessDenied</Code><Message>Access Denied</Message></Error></DeleteResult>",
            ))
        });

        let err = facade_with(transport)
            .delete_objects("bucket", &["a", "b"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("b (AccessDenied)"));
    }

    #[tokio::test]
    async fn test_upload_part_without_etag_aborts() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Post && req.has_query("uploads"))
            .times(1)
            .returning(|_, _| {
                Ok(Response::new(200).with_body(
                    "<InitiateMultipartUploadResult><Bucket>b</Bucket><Key>k</Key><UploadId>up-1</UploadId></InitiateMultipartUploadResult>",
                ))
            });
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Put && req.has_query("partNumber"))
            .returning(|_, _| Ok(Response::new(200)));
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Delete && req.query_param("uploadId") == Some("up-1"))
            .times(1)
            .returning(|_, _| Ok(Response::new(204)));
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Post && req.has_query("uploadId"))
            .never();

        let err = facade_with(transport)
            .upload_large_object("bucket", "key", vec![1u8; 10], 4)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_abort_failure_surfaces_original_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Post && req.has_query("uploads"))
            .times(1)
            .returning(|_, _| {
                Ok(Response::new(200).with_body(
                    "<InitiateMultipartUploadResult><UploadId>up-2</UploadId></InitiateMultipartUploadResult>",
                ))
            });
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Put)
            .returning(|_, _| Ok(Response::new(403)));
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Delete)
            .times(1)
            .returning(|_, _| Err(Error::Transport("connection reset".into())));

        let err = facade_with(transport)
            .upload_large_object("bucket", "key", vec![1u8; 10], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_ranged_download_short_body_fails() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Head)
            .returning(|_, _| Ok(Response::new(200).with_header("content-length", "8")));
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Get)
            .returning(|_, _| Ok(Response::new(206).with_body(vec![0u8; 2])));

        let err = facade_with(transport)
            .download_large_object("bucket", "key", 4)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_head_without_content_length_fails() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Head)
            .times(2)
            .returning(|_, _| Ok(Response::new(200).with_header("etag", "\"abc\"")));
        transport
            .expect_send()
            .withf(|req, _| req.method == Method::Get)
            .never();

        let facade = facade_with(transport);
        let err = facade.head_object("bucket", "key").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));

        let err = facade
            .download_large_object("bucket", "key", 4)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn test_part_count_bounds() {
        assert_eq!(part_count(10_000).unwrap(), 10_000);
        assert_eq!(part_count(u32::MAX as usize).unwrap(), u32::MAX);
        #[cfg(target_pointer_width = "64")]
        assert!(matches!(
            part_count(u32::MAX as usize + 1),
            Err(Error::Validation(_))
        ));
    }
}
