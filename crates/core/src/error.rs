//! Error types for bk-core
//!
//! Every facade operation either succeeds or returns one of these typed
//! failures. Each variant maps to a CLI exit code.

use thiserror::Error;

/// Result type alias for bk-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bk-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bad, expired or insufficient credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Bucket or object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bucket name is owned by another principal
    #[error("Bucket name conflict: {0}")]
    NameConflict(String),

    /// Bucket is already owned by the caller.
    ///
    /// Produced by classification only; `create_bucket` treats it as success.
    #[error("Bucket already owned by you: {0}")]
    AlreadyOwned(String),

    /// Malformed or rejected region identifier
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Bucket still contains objects
    #[error("Bucket not empty: {0}")]
    BucketNotEmpty(String),

    /// Network failure or server-side (5xx) error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed input (empty bucket name, bad part size, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid bucket/key path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Profile already exists
    #[error("Profile already exists: {0}")]
    ProfileExists(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body could not be decoded
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// General error
    #[error("{0}")]
    General(String),
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::InvalidPath(_) | Error::InvalidRegion(_) => 2, // UsageError
            Error::Config(_) => 2,                                                        // UsageError
            Error::Transport(_) | Error::Xml(_) => 3,                                     // NetworkError
            Error::Auth(_) => 4,                                                          // AuthError
            Error::NotFound(_) | Error::ProfileNotFound(_) => 5,                          // NotFound
            Error::NameConflict(_)
            | Error::AlreadyOwned(_)
            | Error::BucketNotEmpty(_)
            | Error::ProfileExists(_) => 6, // Conflict
            _ => 1,                         // GeneralError
        }
    }

    /// Whether this error means the target does not exist
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
