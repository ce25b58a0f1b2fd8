//! bk-core: object storage facade for bucketkit
//!
//! This crate provides:
//! - `ObjectStoreFacade`, bucket and object operations over the S3 REST API
//! - the `Transport` and `CredentialProvider` seams it is built on
//! - error classification and the error taxonomy
//! - the multipart session state machine
//! - an in-memory transport for tests
//! - configuration, profile and path handling for the CLI
//!
//! Nothing here depends on an HTTP client; see `bk-s3` for that.

pub mod classify;
pub mod config;
pub mod credentials;
pub mod error;
pub mod facade;
pub mod memory;
pub mod multipart;
pub mod path;
pub mod profile;
pub mod transport;
pub mod types;
pub mod xml;

pub use config::{Config, ConfigManager, Defaults};
pub use credentials::{CredentialProvider, Credentials, StaticCredentials};
pub use error::{Error, Result};
pub use facade::{ObjectStoreFacade, validate_bucket_name, validate_region};
pub use memory::{CompletionFault, InMemoryTransport};
pub use multipart::{MultipartConfig, SessionState, UploadSession};
pub use path::ObjectPath;
pub use profile::{Profile, ProfileManager, RetryConfig, TimeoutConfig};
pub use transport::{Method, Request, Response, Transport};
pub use types::{Bucket, ListPage, ObjectInfo};
