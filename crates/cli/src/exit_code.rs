//! Exit code definitions for the bk CLI
//!
//! Scripts rely on these values; changing one is a breaking change.

use bk_core::Error;

/// Exit codes for the bk CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// General/unspecified error
    GeneralError = 1,

    /// Invalid arguments, malformed path, bad bucket name or region
    UsageError = 2,

    /// Network failure or server-side error
    NetworkError = 3,

    /// Authentication or permission failure
    AuthError = 4,

    /// Bucket, object or profile does not exist
    NotFound = 5,

    /// Name conflict or non-empty bucket
    Conflict = 6,

    /// Operation was interrupted (e.g., Ctrl+C)
    Interrupted = 130,
}

impl ExitCode {
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::NetworkError),
            4 => Some(Self::AuthError),
            5 => Some(Self::NotFound),
            6 => Some(Self::Conflict),
            130 => Some(Self::Interrupted),
            _ => None,
        }
    }

    /// Exit code for a library error
    pub fn from_error(error: &Error) -> Self {
        Self::from_i32(error.exit_code()).unwrap_or(Self::GeneralError)
    }

    /// Exit code for an error chain, using the first library error in it
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<Error>())
            .map(Self::from_error)
            .unwrap_or(Self::GeneralError)
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments or path format",
            Self::NetworkError => "Network or server error",
            Self::AuthError => "Authentication or permission failure",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Conflict",
            Self::Interrupted => "Operation interrupted",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    const ALL: [(ExitCode, i32); 8] = [
        (ExitCode::Success, 0),
        (ExitCode::GeneralError, 1),
        (ExitCode::UsageError, 2),
        (ExitCode::NetworkError, 3),
        (ExitCode::AuthError, 4),
        (ExitCode::NotFound, 5),
        (ExitCode::Conflict, 6),
        (ExitCode::Interrupted, 130),
    ];

    #[test]
    fn test_codes_are_stable() {
        for (code, value) in ALL {
            assert_eq!(i32::from(code), value);
            assert_eq!(ExitCode::from_i32(value), Some(code));
        }
        assert_eq!(ExitCode::from_i32(7), None);
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ExitCode::from_error(&Error::NotFound("b".into())),
            ExitCode::NotFound
        );
        assert_eq!(
            ExitCode::from_error(&Error::BucketNotEmpty("b".into())),
            ExitCode::Conflict
        );
        assert_eq!(
            ExitCode::from_error(&Error::InvalidRegion("x".into())),
            ExitCode::UsageError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Transport("reset".into())),
            ExitCode::NetworkError
        );
    }

    #[test]
    fn test_from_anyhow_finds_library_error() {
        let result: std::result::Result<(), Error> = Err(Error::Auth("denied".into()));
        let err = result.context("connecting to profile 'local'").unwrap_err();
        assert_eq!(ExitCode::from_anyhow(&err), ExitCode::AuthError);

        let plain = anyhow::anyhow!("something else");
        assert_eq!(ExitCode::from_anyhow(&plain), ExitCode::GeneralError);
    }

    #[test]
    fn test_exit_code_display() {
        let display = format!("{}", ExitCode::NotFound);
        assert!(display.contains("5"));
        assert!(display.contains("not found"));
    }
}
