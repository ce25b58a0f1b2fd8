//! exists command - Check whether a bucket exists
//!
//! Exits 0 when the bucket exists and 5 when it does not, so scripts can
//! branch on the status alone.

use clap::Args;
use serde::Serialize;

use super::{GlobalOptions, open_session, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Check whether a bucket exists
#[derive(Args, Debug)]
pub struct ExistsArgs {
    /// Bucket name
    pub bucket: String,
}

#[derive(Debug, Serialize)]
struct ExistsOutput {
    bucket: String,
    exists: bool,
}

/// Execute the exists command
pub async fn execute(args: ExistsArgs, globals: &GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(globals.output.clone());

    let session = match open_session(globals, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    match session.facade.bucket_exists(&args.bucket).await {
        Ok(exists) => {
            if formatter.is_json() {
                formatter.json(&ExistsOutput {
                    bucket: args.bucket,
                    exists,
                });
            } else if exists {
                formatter.success(&format!("Bucket '{}' exists", args.bucket));
            } else {
                formatter.println(&format!("Bucket '{}' does not exist", args.bucket));
            }
            status_for(exists)
        }
        Err(e) => report(&formatter, &format!("Failed to check '{}'", args.bucket), &e),
    }
}

fn status_for(exists: bool) -> ExitCode {
    if exists {
        ExitCode::Success
    } else {
        ExitCode::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::memory_facade;

    #[test]
    fn test_status_for() {
        assert_eq!(status_for(true), ExitCode::Success);
        assert_eq!(status_for(false), ExitCode::NotFound);
    }

    #[tokio::test]
    async fn test_exists_after_create() {
        let (facade, _store) = memory_facade();
        assert!(!facade.bucket_exists("logs").await.unwrap());
        facade.create_bucket_default("logs").await.unwrap();
        assert!(facade.bucket_exists("logs").await.unwrap());
    }
}
