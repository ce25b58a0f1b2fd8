//! In-process S3 emulation
//!
//! `InMemoryTransport` answers the subset of the S3 REST API the facade
//! speaks, with the same status codes and XML documents a real provider
//! returns. Tests drive the facade through it and then inspect the stored
//! state. Knobs exist for pagination, ownership, access denial, part
//! failures and part latency.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use jiff::Timestamp;
use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::Result;
use crate::transport::{Method, Request, Response, Transport};
use crate::types::format_http_date;
use crate::xml::{self, ErrorDocument};

/// Owner recorded for buckets seeded with [`InMemoryTransport::with_foreign_bucket`]
pub const FOREIGN_OWNER: &str = "foreign-principal";

const DEFAULT_PAGE_SIZE: usize = 1000;

/// A request as seen by the emulated service
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
}

impl RecordedRequest {
    pub fn has_query(&self, name: &str) -> bool {
        self.query.iter().any(|(k, _)| k == name)
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    etag: String,
    content_type: Option<String>,
    last_modified: Timestamp,
}

impl StoredObject {
    fn new(data: Bytes, content_type: Option<String>) -> Self {
        let etag = format!("\"{:x}\"", md5::compute(&data));
        Self::with_etag(data, etag, content_type)
    }

    fn with_etag(data: Bytes, etag: String, content_type: Option<String>) -> Self {
        Self {
            data,
            etag,
            content_type,
            last_modified: Timestamp::now(),
        }
    }
}

#[derive(Debug)]
struct BucketState {
    owner: String,
    region: String,
    created: Timestamp,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug)]
struct UploadState {
    bucket: String,
    key: String,
    parts: BTreeMap<u32, (Bytes, String)>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BucketState>,
    uploads: HashMap<String, UploadState>,
    aborted: Vec<String>,
    completed: Vec<String>,
    next_upload: u64,
    forbidden: HashSet<String>,
    failing_parts: HashSet<u32>,
    part_delays: HashMap<u32, Duration>,
    range_delays: HashMap<u64, Duration>,
    completion_fault: Option<CompletionFault>,
    log: Vec<RecordedRequest>,
}

/// How a CompleteMultipartUpload request is made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionFault {
    /// Reply 500 InternalError
    Status,
    /// Reply 200 with an `<Error>` document as the body
    ErrorInSuccess,
}

/// Decrements the in-flight part counter even when the request is cancelled
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// S3 emulation backed by process memory
#[derive(Debug)]
pub struct InMemoryTransport {
    state: Mutex<State>,
    page_size: usize,
    in_flight_parts: AtomicUsize,
    peak_parts: AtomicUsize,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
            in_flight_parts: AtomicUsize::new(0),
            peak_parts: AtomicUsize::new(0),
        }
    }

    /// Maximum number of keys per ListObjectsV2 page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Seed a bucket owned by another principal
    pub fn with_foreign_bucket(self, name: &str) -> Self {
        self.lock().buckets.insert(
            name.to_string(),
            BucketState {
                owner: FOREIGN_OWNER.to_string(),
                region: "us-east-1".to_string(),
                created: Timestamp::now(),
                objects: BTreeMap::new(),
            },
        );
        self
    }

    /// Seed a bucket that exists but denies every request
    pub fn with_forbidden_bucket(self, name: &str) -> Self {
        let mut state = self.lock();
        state.buckets.insert(
            name.to_string(),
            BucketState {
                owner: FOREIGN_OWNER.to_string(),
                region: "us-east-1".to_string(),
                created: Timestamp::now(),
                objects: BTreeMap::new(),
            },
        );
        state.forbidden.insert(name.to_string());
        drop(state);
        self
    }

    /// Make every upload of part `part_number` fail with a 500
    pub fn fail_part(&self, part_number: u32) {
        self.lock().failing_parts.insert(part_number);
    }

    /// Hold part `part_number` for `delay` before accepting it
    pub fn delay_part(&self, part_number: u32, delay: Duration) {
        self.lock().part_delays.insert(part_number, delay);
    }

    /// Hold ranged GETs starting at byte `start` for `delay`
    pub fn delay_range(&self, start: u64, delay: Duration) {
        self.lock().range_delays.insert(start, delay);
    }

    /// Make every CompleteMultipartUpload request fail
    pub fn fail_completion(&self, fault: CompletionFault) {
        self.lock().completion_fault = Some(fault);
    }

    /// Parts currently being received
    pub fn in_flight_parts(&self) -> usize {
        self.in_flight_parts.load(Ordering::SeqCst)
    }

    /// Stored object payload
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .map(|o| o.data.clone())
    }

    /// Stored object content type
    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .and_then(|o| o.content_type.clone())
    }

    /// Number of objects in a bucket, `None` if the bucket does not exist
    pub fn object_count(&self, bucket: &str) -> Option<usize> {
        self.lock().buckets.get(bucket).map(|b| b.objects.len())
    }

    /// Region a bucket was created in
    pub fn bucket_region(&self, bucket: &str) -> Option<String> {
        self.lock().buckets.get(bucket).map(|b| b.region.clone())
    }

    /// Upload ids that are neither completed nor aborted
    pub fn active_uploads(&self) -> Vec<String> {
        self.lock().uploads.keys().cloned().collect()
    }

    pub fn aborted_uploads(&self) -> Vec<String> {
        self.lock().aborted.clone()
    }

    pub fn completed_uploads(&self) -> Vec<String> {
        self.lock().completed.clone()
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().log.clone()
    }

    /// Highest number of part uploads observed in flight at once
    pub fn peak_concurrent_parts(&self) -> usize {
        self.peak_parts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, request: &Request, caller: &str) -> Response {
        let mut state = self.lock();
        state.log.push(RecordedRequest {
            method: request.method,
            path: request.path.clone(),
            query: request.query.clone(),
            headers: request.headers.clone(),
        });

        let (bucket, key) = request.bucket_and_key();
        if bucket.is_empty() {
            return match request.method {
                Method::Get => list_buckets(&state, caller),
                _ => error(405, "MethodNotAllowed", "unsupported service request"),
            };
        }
        if state.forbidden.contains(bucket) {
            return error(403, "AccessDenied", "Access Denied");
        }

        match key {
            None => self.handle_bucket(&mut state, request, bucket, caller),
            Some(key) => handle_object(&mut state, request, bucket, key),
        }
    }

    fn handle_bucket(
        &self,
        state: &mut State,
        request: &Request,
        bucket: &str,
        caller: &str,
    ) -> Response {
        match request.method {
            Method::Head if state.buckets.contains_key(bucket) => Response::new(200),
            Method::Head => Response::new(404),
            Method::Put => create_bucket(state, request, bucket, caller),
            Method::Delete => delete_bucket(state, bucket),
            Method::Get if request.query_param("list-type") == Some("2") => {
                list_objects(state, request, bucket, self.page_size)
            }
            Method::Post if request.has_query("delete") => delete_objects(state, request, bucket),
            _ => error(405, "MethodNotAllowed", "unsupported bucket request"),
        }
    }

    fn range_delay(&self, request: &Request) -> Option<Duration> {
        if request.method != Method::Get {
            return None;
        }
        let start: u64 = request
            .headers
            .get("range")?
            .strip_prefix("bytes=")?
            .split_once('-')?
            .0
            .parse()
            .ok()?;
        self.lock().range_delays.get(&start).copied()
    }

    async fn upload_part(&self, request: &Request, bucket: &str, key: &str) -> Response {
        let part_number: u32 = match request.query_param("partNumber").and_then(|n| n.parse().ok()) {
            Some(n) if (1..=10_000).contains(&n) => n,
            _ => return error(400, "InvalidArgument", "part number must be between 1 and 10000"),
        };
        let upload_id = request.query_param("uploadId").unwrap_or_default().to_string();

        let (delay, fail) = {
            let state = self.lock();
            (
                state.part_delays.get(&part_number).copied(),
                state.failing_parts.contains(&part_number),
            )
        };

        let in_flight = self.in_flight_parts.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_parts.fetch_max(in_flight, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight_parts);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        // Yield so concurrently scheduled parts overlap.
        tokio::task::yield_now().await;
        drop(guard);

        if fail {
            return error(500, "InternalError", "injected part failure");
        }

        let mut state = self.lock();
        if !state.buckets.contains_key(bucket) {
            return error(404, "NoSuchBucket", "The specified bucket does not exist");
        }
        let Some(upload) = state.uploads.get_mut(&upload_id) else {
            return error(404, "NoSuchUpload", "The specified upload does not exist");
        };
        if upload.bucket != bucket || upload.key != key {
            return error(404, "NoSuchUpload", "The specified upload does not exist");
        }

        let etag = format!("\"{:x}\"", md5::compute(&request.body));
        upload
            .parts
            .insert(part_number, (request.body.clone(), etag.clone()));
        Response::new(200).with_header("etag", etag)
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, request: Request, credentials: &Credentials) -> Result<Response> {
        debug!(method = %request.method, path = %request.path, "in-memory request");

        let (bucket, key) = request.bucket_and_key();
        let is_part = request.method == Method::Put
            && request.has_query("partNumber")
            && request.has_query("uploadId");

        if let (true, Some(key)) = (is_part, key) {
            let bucket = bucket.to_string();
            let key = key.to_string();
            {
                let mut state = self.lock();
                state.log.push(RecordedRequest {
                    method: request.method,
                    path: request.path.clone(),
                    query: request.query.clone(),
                    headers: request.headers.clone(),
                });
                if state.forbidden.contains(&bucket) {
                    return Ok(error(403, "AccessDenied", "Access Denied"));
                }
            }
            return Ok(self.upload_part(&request, &bucket, &key).await);
        }

        if let Some(delay) = self.range_delay(&request) {
            tokio::time::sleep(delay).await;
        }

        Ok(self.handle(&request, &credentials.access_key))
    }
}

fn error(status: u16, code: &str, message: &str) -> Response {
    let document = ErrorDocument {
        code: code.to_string(),
        message: message.to_string(),
        ..Default::default()
    };
    render(status, &document)
}

fn render<T: serde::Serialize>(status: u16, document: &T) -> Response {
    match xml::to_string(document) {
        Ok(body) => Response::new(status)
            .with_header("content-type", "application/xml")
            .with_body(body),
        Err(err) => Response::new(500).with_body(err.to_string()),
    }
}

fn no_such_bucket() -> Response {
    error(404, "NoSuchBucket", "The specified bucket does not exist")
}

fn list_buckets(state: &State, caller: &str) -> Response {
    let buckets = state
        .buckets
        .iter()
        .filter(|(_, b)| b.owner == caller)
        .map(|(name, b)| xml::BucketEntry {
            name: name.clone(),
            creation_date: Some(b.created.to_string()),
            bucket_region: Some(b.region.clone()),
        })
        .collect();

    render(
        200,
        &xml::ListAllMyBucketsResult {
            xmlns: Some(xml::S3_NAMESPACE.to_string()),
            buckets: xml::BucketList { bucket: buckets },
        },
    )
}

fn create_bucket(state: &mut State, request: &Request, bucket: &str, caller: &str) -> Response {
    if let Some(existing) = state.buckets.get(bucket) {
        return if existing.owner == caller {
            error(
                409,
                "BucketAlreadyOwnedByYou",
                "Your previous request to create the named bucket succeeded and you already own it",
            )
        } else {
            error(
                409,
                "BucketAlreadyExists",
                "The requested bucket name is not available",
            )
        };
    }

    let region = if request.body.is_empty() {
        "us-east-1".to_string()
    } else {
        match xml::from_bytes::<xml::CreateBucketConfiguration>(&request.body) {
            Ok(config) if config.location_constraint == "us-east-1" => {
                return error(
                    400,
                    "InvalidLocationConstraint",
                    "The specified location-constraint is not valid",
                );
            }
            Ok(config) => config.location_constraint,
            Err(_) => return error(400, "MalformedXML", "The XML you provided was not well-formed"),
        }
    };

    state.buckets.insert(
        bucket.to_string(),
        BucketState {
            owner: caller.to_string(),
            region,
            created: Timestamp::now(),
            objects: BTreeMap::new(),
        },
    );
    Response::new(200).with_header("location", format!("/{bucket}"))
}

fn delete_bucket(state: &mut State, bucket: &str) -> Response {
    match state.buckets.get(bucket) {
        None => no_such_bucket(),
        Some(b) if !b.objects.is_empty() => error(
            409,
            "BucketNotEmpty",
            "The bucket you tried to delete is not empty",
        ),
        Some(_) => {
            state.buckets.remove(bucket);
            Response::new(204)
        }
    }
}

fn list_objects(state: &State, request: &Request, bucket: &str, page_size: usize) -> Response {
    let Some(b) = state.buckets.get(bucket) else {
        return no_such_bucket();
    };
    let prefix = request.query_param("prefix").unwrap_or_default();
    let token = request.query_param("continuation-token");

    let mut matching = b
        .objects
        .iter()
        .filter(|(key, _)| key.starts_with(prefix))
        .filter(|(key, _)| token.is_none_or(|t| key.as_str() > t));

    let contents: Vec<xml::ObjectEntry> = matching
        .by_ref()
        .take(page_size)
        .map(|(key, o)| xml::ObjectEntry {
            key: key.clone(),
            last_modified: Some(o.last_modified.to_string()),
            etag: Some(o.etag.clone()),
            size: o.data.len() as u64,
            storage_class: Some("STANDARD".to_string()),
        })
        .collect();
    let is_truncated = matching.next().is_some();

    render(
        200,
        &xml::ListBucketResult {
            xmlns: Some(xml::S3_NAMESPACE.to_string()),
            name: bucket.to_string(),
            prefix: Some(prefix.to_string()),
            key_count: contents.len() as u64,
            max_keys: page_size as u64,
            is_truncated,
            next_continuation_token: if is_truncated {
                contents.last().map(|o| o.key.clone())
            } else {
                None
            },
            continuation_token: token.map(str::to_string),
            contents,
        },
    )
}

fn delete_objects(state: &mut State, request: &Request, bucket: &str) -> Response {
    let expected = base64_md5(&request.body);
    if request.headers.get("content-md5") != Some(&expected) {
        return error(
            400,
            "InvalidDigest",
            "The Content-MD5 you specified did not match what was received",
        );
    }
    let Some(b) = state.buckets.get_mut(bucket) else {
        return no_such_bucket();
    };
    let delete: xml::Delete = match xml::from_bytes(&request.body) {
        Ok(delete) => delete,
        Err(_) => return error(400, "MalformedXML", "The XML you provided was not well-formed"),
    };
    if delete.objects.len() > 1000 {
        return error(400, "MalformedXML", "Delete requests are limited to 1000 keys");
    }

    let deleted = delete
        .objects
        .into_iter()
        .map(|object| {
            b.objects.remove(&object.key);
            xml::DeletedEntry { key: object.key }
        })
        .collect();

    render(
        200,
        &xml::DeleteResult {
            deleted,
            errors: Vec::new(),
        },
    )
}

fn handle_object(state: &mut State, request: &Request, bucket: &str, key: &str) -> Response {
    if !state.buckets.contains_key(bucket) {
        return match request.method {
            Method::Head => Response::new(404),
            _ => no_such_bucket(),
        };
    }

    match request.method {
        Method::Post if request.has_query("uploads") => initiate_upload(state, bucket, key),
        Method::Post if request.has_query("uploadId") => complete_upload(state, request, bucket, key),
        Method::Delete if request.has_query("uploadId") => abort_upload(state, request),
        Method::Put if request.headers.contains_key("x-amz-copy-source") => {
            copy_object(state, request, bucket, key)
        }
        Method::Put => {
            let object = StoredObject::new(
                request.body.clone(),
                request.headers.get("content-type").cloned(),
            );
            let etag = object.etag.clone();
            if let Some(b) = state.buckets.get_mut(bucket) {
                b.objects.insert(key.to_string(), object);
            }
            Response::new(200).with_header("etag", etag)
        }
        Method::Get | Method::Head => get_object(state, request, bucket, key),
        Method::Delete => {
            if let Some(b) = state.buckets.get_mut(bucket) {
                b.objects.remove(key);
            }
            Response::new(204)
        }
        Method::Post => error(405, "MethodNotAllowed", "unsupported object request"),
    }
}

fn get_object(state: &State, request: &Request, bucket: &str, key: &str) -> Response {
    let head = request.method == Method::Head;
    let Some(object) = state.buckets.get(bucket).and_then(|b| b.objects.get(key)) else {
        return if head {
            Response::new(404)
        } else {
            error(404, "NoSuchKey", "The specified key does not exist")
        };
    };

    if let Some(expected) = request.headers.get("if-match")
        && expected != &object.etag
    {
        return if head {
            Response::new(412)
        } else {
            error(412, "PreconditionFailed", "At least one of the pre-conditions you specified did not hold")
        };
    }

    let total = object.data.len() as u64;
    let mut response = Response::new(200)
        .with_header("etag", object.etag.clone())
        .with_header("last-modified", format_http_date(object.last_modified))
        .with_header("accept-ranges", "bytes");
    if let Some(ct) = &object.content_type {
        response = response.with_header("content-type", ct.clone());
    }

    let body = match request.headers.get("range") {
        Some(range) => match parse_range(range, total) {
            Some((start, end)) => {
                response.status = 206;
                response = response.with_header(
                    "content-range",
                    format!("bytes {start}-{end}/{total}"),
                );
                object.data.slice(start as usize..=end as usize)
            }
            None => {
                return error(416, "InvalidRange", "The requested range is not satisfiable");
            }
        },
        None => object.data.clone(),
    };

    response = response.with_header("content-length", body.len().to_string());
    if head {
        response
    } else {
        response.with_body(body)
    }
}

/// Parse `bytes=a-b` into an inclusive range clamped to the object
fn parse_range(header: &str, total: u64) -> Option<(u64, u64)> {
    let (start, end) = header.strip_prefix("bytes=")?.split_once('-')?;
    let start: u64 = start.parse().ok()?;
    let end: u64 = if end.is_empty() {
        total.checked_sub(1)?
    } else {
        end.parse::<u64>().ok()?.min(total.checked_sub(1)?)
    };
    (start <= end).then_some((start, end))
}

fn copy_object(state: &mut State, request: &Request, bucket: &str, key: &str) -> Response {
    let source = request
        .headers
        .get("x-amz-copy-source")
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .unwrap_or_default();
    let Some((src_bucket, src_key)) = source.trim_start_matches('/').split_once('/') else {
        return error(400, "InvalidArgument", "Copy Source must mention the source bucket and key");
    };
    if state.forbidden.contains(src_bucket) {
        return error(403, "AccessDenied", "Access Denied");
    }
    let Some(src) = state.buckets.get(src_bucket) else {
        return no_such_bucket();
    };
    let Some(object) = src.objects.get(src_key) else {
        return error(404, "NoSuchKey", "The specified key does not exist");
    };

    let copy = StoredObject::with_etag(
        object.data.clone(),
        object.etag.clone(),
        object.content_type.clone(),
    );
    let result = xml::CopyObjectResult {
        etag: Some(copy.etag.clone()),
        last_modified: Some(copy.last_modified.to_string()),
    };
    if let Some(dst) = state.buckets.get_mut(bucket) {
        dst.objects.insert(key.to_string(), copy);
    }
    render(200, &result)
}

fn initiate_upload(state: &mut State, bucket: &str, key: &str) -> Response {
    state.next_upload += 1;
    let upload_id = format!("upload-{:06}", state.next_upload);
    state.uploads.insert(
        upload_id.clone(),
        UploadState {
            bucket: bucket.to_string(),
            key: key.to_string(),
            parts: BTreeMap::new(),
        },
    );

    render(
        200,
        &xml::InitiateMultipartUploadResult {
            bucket: bucket.to_string(),
            key: key.to_string(),
            upload_id,
        },
    )
}

fn complete_upload(state: &mut State, request: &Request, bucket: &str, key: &str) -> Response {
    match state.completion_fault {
        Some(CompletionFault::Status) => {
            return error(500, "InternalError", "injected completion failure");
        }
        Some(CompletionFault::ErrorInSuccess) => {
            let mut response = error(500, "InternalError", "injected completion failure");
            response.status = 200;
            return response;
        }
        None => {}
    }
    let upload_id = request.query_param("uploadId").unwrap_or_default().to_string();
    let manifest: xml::CompleteMultipartUpload = match xml::from_bytes(&request.body) {
        Ok(manifest) => manifest,
        Err(_) => return error(400, "MalformedXML", "The XML you provided was not well-formed"),
    };
    let Some(upload) = state.uploads.get(&upload_id) else {
        return error(404, "NoSuchUpload", "The specified upload does not exist");
    };
    if manifest.parts.is_empty() {
        return error(400, "MalformedXML", "The manifest lists no parts");
    }
    if manifest
        .parts
        .windows(2)
        .any(|pair| pair[0].part_number >= pair[1].part_number)
    {
        return error(400, "InvalidPartOrder", "The list of parts was not in ascending order");
    }

    let mut data = BytesMut::new();
    let mut digests = Vec::with_capacity(manifest.parts.len() * 16);
    for part in &manifest.parts {
        match upload.parts.get(&part.part_number) {
            Some((bytes, etag)) if *etag == part.etag => {
                data.extend_from_slice(bytes);
                digests.extend_from_slice(&md5::compute(bytes).0);
            }
            _ => {
                return error(400, "InvalidPart", "One or more of the specified parts could not be found");
            }
        }
    }

    let etag = format!(
        "\"{:x}-{}\"",
        md5::compute(&digests),
        manifest.parts.len()
    );
    let object = StoredObject::with_etag(data.freeze(), etag.clone(), None);
    if let Some(b) = state.buckets.get_mut(bucket) {
        b.objects.insert(key.to_string(), object);
    }
    state.uploads.remove(&upload_id);
    state.completed.push(upload_id);

    render(
        200,
        &xml::CompleteMultipartUploadResult {
            location: Some(format!("/{bucket}/{key}")),
            bucket: bucket.to_string(),
            key: key.to_string(),
            etag: Some(etag),
        },
    )
}

fn abort_upload(state: &mut State, request: &Request) -> Response {
    let upload_id = request.query_param("uploadId").unwrap_or_default().to_string();
    if state.uploads.remove(&upload_id).is_none() {
        return error(404, "NoSuchUpload", "The specified upload does not exist");
    }
    state.aborted.push(upload_id);
    Response::new(204)
}

fn base64_md5(body: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(md5::compute(body).0)
}
