//! Multipart transfer support
//!
//! Part sizing helpers and the upload session state machine. The session
//! tracks which parts have been acknowledged and refuses to produce a
//! completion manifest with gaps or duplicates.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::xml::PartEntry;

/// Default part size: 10 MiB
pub const DEFAULT_PART_SIZE: u64 = 10 * 1024 * 1024;

/// Minimum part size accepted by S3 for all but the last part: 5 MiB
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts: 10,000 (S3 limit)
pub const MAX_PARTS: usize = 10_000;

/// Largest payload accepted by a single PUT: 5 GiB
pub const MAX_SINGLE_UPLOAD: u64 = 5 * 1024 * 1024 * 1024;

/// Default number of concurrent part transfers
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Multipart transfer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartConfig {
    /// Part size in bytes
    pub part_size: u64,

    /// Number of concurrent part transfers
    pub concurrency: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part_size(mut self, size: u64) -> Self {
        self.part_size = size.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Calculate an appropriate part size for a payload
    pub fn calculate_part_size(&self, total_size: u64) -> u64 {
        if total_size <= MIN_PART_SIZE {
            return MIN_PART_SIZE;
        }

        let parts = total_size.div_ceil(self.part_size);

        if parts <= MAX_PARTS as u64 {
            self.part_size
        } else {
            // Grow parts to stay under the 10,000 part limit
            let required_size = total_size.div_ceil(MAX_PARTS as u64);
            required_size.clamp(MIN_PART_SIZE, MAX_PART_SIZE)
        }
    }
}

/// Calculate the number of parts for a payload
///
/// An empty payload still needs one (empty) part to complete an upload.
pub fn calculate_parts(total_size: u64, part_size: u64) -> usize {
    if total_size == 0 {
        return 1;
    }
    total_size.div_ceil(part_size) as usize
}

/// Byte range `[start, end)` covered by a 1-based part number
pub fn part_byte_range(part_number: u32, part_size: u64, total_size: u64) -> (u64, u64) {
    let start = (u64::from(part_number) - 1) * part_size;
    let end = (start + part_size).min(total_size);
    (start, end)
}

/// Validate a caller-supplied part size against a payload
pub fn validate_part_size(total_size: u64, part_size: u64) -> Result<usize> {
    if part_size == 0 {
        return Err(Error::Validation("part size must be greater than zero".into()));
    }
    if part_size > MAX_PART_SIZE {
        return Err(Error::Validation(format!(
            "part size {part_size} exceeds the maximum of {MAX_PART_SIZE} bytes"
        )));
    }
    let parts = calculate_parts(total_size, part_size);
    if parts > MAX_PARTS {
        return Err(Error::Validation(format!(
            "{parts} parts exceeds the limit of {MAX_PARTS}; use a larger part size"
        )));
    }
    Ok(parts)
}

/// Lifecycle of a multipart upload session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Initiated,
    PartsUploading,
    Completed,
    Aborted,
}

impl SessionState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Aborted)
    }
}

/// A part acknowledged by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// An in-progress multipart upload
#[derive(Debug, Clone)]
pub struct UploadSession {
    bucket: String,
    key: String,
    upload_id: String,
    expected_parts: usize,
    state: SessionState,
    parts: Vec<CompletedPart>,
}

impl UploadSession {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        upload_id: impl Into<String>,
        expected_parts: usize,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            upload_id: upload_id.into(),
            expected_parts,
            state: SessionState::Initiated,
            parts: Vec::new(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of parts acknowledged so far
    pub fn completed_parts(&self) -> usize {
        self.parts.len()
    }

    /// Move from `Initiated` to `PartsUploading`
    pub fn begin_parts(&mut self) -> Result<()> {
        self.transition(SessionState::Initiated, SessionState::PartsUploading)
    }

    /// Record an acknowledged part, in whatever order it arrived
    pub fn record_part(&mut self, part_number: u32, etag: impl Into<String>) -> Result<()> {
        if self.state != SessionState::PartsUploading {
            return Err(self.illegal("record a part"));
        }
        if part_number == 0 || part_number as usize > self.expected_parts {
            return Err(Error::Validation(format!(
                "part number {part_number} outside 1..={}",
                self.expected_parts
            )));
        }
        self.parts.push(CompletedPart {
            part_number,
            etag: etag.into(),
        });
        Ok(())
    }

    /// The completion manifest, in ascending part-number order
    ///
    /// Fails if any part is missing or was recorded twice.
    pub fn manifest(&self) -> Result<Vec<PartEntry>> {
        let mut parts = self.parts.clone();
        parts.sort_by_key(|p| p.part_number);

        if parts.len() != self.expected_parts {
            return Err(Error::Validation(format!(
                "upload {} has {} of {} parts",
                self.upload_id,
                parts.len(),
                self.expected_parts
            )));
        }
        for (index, part) in parts.iter().enumerate() {
            if part.part_number as usize != index + 1 {
                return Err(Error::Validation(format!(
                    "upload {} is missing part {}",
                    self.upload_id,
                    index + 1
                )));
            }
        }

        Ok(parts
            .into_iter()
            .map(|p| PartEntry {
                part_number: p.part_number,
                etag: p.etag,
            })
            .collect())
    }

    /// Mark the session completed
    pub fn complete(&mut self) -> Result<()> {
        self.transition(SessionState::PartsUploading, SessionState::Completed)
    }

    /// Mark the session aborted; allowed from any non-terminal state
    pub fn abort(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.illegal("abort"));
        }
        self.state = SessionState::Aborted;
        Ok(())
    }

    fn transition(&mut self, from: SessionState, to: SessionState) -> Result<()> {
        if self.state != from {
            return Err(self.illegal(&format!("move to {to:?}")));
        }
        self.state = to;
        Ok(())
    }

    fn illegal(&self, action: &str) -> Error {
        Error::Validation(format!(
            "cannot {action} for upload {} in state {:?}",
            self.upload_id, self.state
        ))
    }
}
