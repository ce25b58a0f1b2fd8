//! rb command - Remove bucket
//!
//! Removes an empty bucket. With `--force` every object is deleted first.

use bk_core::ObjectStoreFacade;
use clap::Args;
use serde::Serialize;

use super::{GlobalOptions, open_session, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};

/// Remove a bucket
#[derive(Args, Debug)]
pub struct RbArgs {
    /// Bucket name
    pub bucket: String,

    /// Delete all objects in the bucket before removing it
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct RbOutput {
    status: &'static str,
    bucket: String,
    objects_deleted: usize,
}

/// Execute the rb command
pub async fn execute(args: RbArgs, globals: &GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(globals.output.clone());

    let session = match open_session(globals, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let spinner = ProgressBar::spinner(&globals.output, &format!("Removing {}", args.bucket));
    let result = remove_bucket(&session.facade, &args.bucket, args.force).await;
    spinner.finish_and_clear();

    match result {
        Ok(objects_deleted) => {
            if formatter.is_json() {
                formatter.json(&RbOutput {
                    status: "success",
                    bucket: args.bucket,
                    objects_deleted,
                });
            } else {
                if objects_deleted > 0 {
                    formatter.println(&format!("Deleted {objects_deleted} object(s)"));
                }
                formatter.success(&format!("Bucket '{}' removed", args.bucket));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &format!("Failed to remove bucket '{}'", args.bucket), &e),
    }
}

/// Remove `bucket`, emptying it first when `force` is set
///
/// Returns the number of objects deleted.
async fn remove_bucket(facade: &ObjectStoreFacade, bucket: &str, force: bool) -> bk_core::Result<usize> {
    let mut deleted = 0;
    if force {
        let keys: Vec<String> = facade
            .list_objects(bucket, None)
            .await?
            .into_iter()
            .map(|o| o.key)
            .collect();
        deleted = facade.delete_objects(bucket, &keys).await?.len();
    }
    facade.delete_bucket(bucket).await?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::memory_facade;
    use bk_core::Error;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_remove_non_empty_bucket_needs_force() {
        let (facade, store) = memory_facade();
        facade.create_bucket_default("full").await.unwrap();
        facade
            .upload_object("full", "a.txt", Bytes::from_static(b"a"))
            .await
            .unwrap();

        let err = remove_bucket(&facade, "full", false).await.unwrap_err();
        assert!(matches!(err, Error::BucketNotEmpty(_)));

        let deleted = remove_bucket(&facade, "full", true).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.object_count("full").is_none());
    }

    #[tokio::test]
    async fn test_remove_missing_bucket() {
        let (facade, _store) = memory_facade();
        let err = remove_bucket(&facade, "ghost", false).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
