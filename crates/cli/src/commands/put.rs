//! put command - Upload a local file
//!
//! Small files go up in one request. `--large` (or a file over the single
//! upload limit) switches to a concurrent multipart upload.

use std::path::{Path, PathBuf};

use bk_core::multipart::MAX_SINGLE_UPLOAD;
use bk_core::{Error, ObjectInfo, ObjectPath, ObjectStoreFacade};
use bytes::Bytes;
use clap::Args;
use serde::Serialize;

use super::{GlobalOptions, open_session, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};

const MIB: u64 = 1024 * 1024;

/// Upload a file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub file: PathBuf,

    /// Destination as bucket/key, or bucket/prefix/ to keep the file name
    pub dest: String,

    /// Use a multipart upload
    #[arg(long)]
    pub large: bool,

    /// Multipart part size in MiB (defaults to the configured part size)
    #[arg(long, requires = "large")]
    pub part_size_mib: Option<u64>,

    /// Content type (guessed from the file extension when omitted)
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    source: String,
    multipart: bool,
    object: ObjectInfo,
}

/// How an upload is sent
#[derive(Debug, Clone, PartialEq, Eq)]
struct UploadPlan {
    /// `Some` for multipart, holding an explicit part size in bytes if given
    multipart: Option<Option<u64>>,
    content_type: Option<String>,
}

/// Execute the put command
pub async fn execute(args: PutArgs, globals: &GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(globals.output.clone());

    let target = match destination(&args.dest, &args.file) {
        Ok(target) => target,
        Err(e) => return report(&formatter, "Invalid destination", &e),
    };

    let data = match tokio::fs::read(&args.file).await {
        Ok(data) => Bytes::from(data),
        Err(e) => {
            formatter.error(&format!("Failed to read {}: {e}", args.file.display()));
            return ExitCode::from_error(&Error::Io(e));
        }
    };

    let plan = plan_upload(&args, data.len() as u64);
    if plan.multipart.is_some() && args.content_type.is_some() {
        formatter.warning("--content-type is not applied to multipart uploads");
    }

    let session = match open_session(globals, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let spinner = ProgressBar::spinner(
        &globals.output,
        &format!(
            "Uploading {} ({})",
            args.file.display(),
            humansize::format_size(data.len() as u64, humansize::BINARY)
        ),
    );
    let multipart = plan.multipart.is_some();
    let result = upload(&session.facade, &target, data, &plan).await;
    spinner.finish_and_clear();

    match result {
        Ok(object) => {
            if formatter.is_json() {
                formatter.json(&PutOutput {
                    status: "success",
                    source: args.file.display().to_string(),
                    multipart,
                    object,
                });
            } else {
                formatter.success(&format!(
                    "{} -> {} {}",
                    args.file.display(),
                    formatter.accent(&target.to_string()),
                    formatter.dim(&format!("({})", object.size_human))
                ));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &format!("Failed to upload to {target}"), &e),
    }
}

/// Resolve the object path, appending the file name for prefix targets
fn destination(dest: &str, file: &Path) -> bk_core::Result<ObjectPath> {
    let mut target = ObjectPath::parse(dest)?;
    if target.key.is_empty() || target.key.ends_with('/') {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidPath(format!("'{}' has no file name", file.display())))?;
        target.key.push_str(name);
    }
    Ok(target)
}

fn plan_upload(args: &PutArgs, size: u64) -> UploadPlan {
    let multipart = (args.large || size > MAX_SINGLE_UPLOAD)
        .then(|| args.part_size_mib.map(|mib| mib.saturating_mul(MIB)));
    let content_type = args.content_type.clone().or_else(|| {
        mime_guess::from_path(&args.file)
            .first()
            .map(|mime| mime.essence_str().to_string())
    });
    UploadPlan {
        multipart,
        content_type,
    }
}

async fn upload(
    facade: &ObjectStoreFacade,
    target: &ObjectPath,
    data: Bytes,
    plan: &UploadPlan,
) -> bk_core::Result<ObjectInfo> {
    match plan.multipart {
        Some(Some(part_size)) => {
            facade
                .upload_large_object(&target.bucket, &target.key, data, part_size)
                .await
        }
        Some(None) => {
            facade
                .upload_large_object_default(&target.bucket, &target.key, data)
                .await
        }
        None => {
            facade
                .upload_object_with_type(
                    &target.bucket,
                    &target.key,
                    data,
                    plan.content_type.as_deref(),
                )
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::memory_facade;

    fn args(file: &str, large: bool, part_size_mib: Option<u64>) -> PutArgs {
        PutArgs {
            file: PathBuf::from(file),
            dest: "bucket/".to_string(),
            large,
            part_size_mib,
            content_type: None,
        }
    }

    #[test]
    fn test_destination_keeps_explicit_key() {
        let target = destination("docs/report.pdf", Path::new("/tmp/x.pdf")).unwrap();
        assert_eq!(target.key, "report.pdf");
    }

    #[test]
    fn test_destination_appends_file_name() {
        let target = destination("docs/2024/", Path::new("/tmp/x.pdf")).unwrap();
        assert_eq!(target.key, "2024/x.pdf");

        let target = destination("s3://docs", Path::new("notes.txt")).unwrap();
        assert_eq!(target.bucket, "docs");
        assert_eq!(target.key, "notes.txt");
    }

    #[test]
    fn test_plan_guesses_content_type() {
        let plan = plan_upload(&args("photo.png", false, None), 10);
        assert_eq!(plan.multipart, None);
        assert_eq!(plan.content_type.as_deref(), Some("image/png"));

        let plan = plan_upload(&args("blob.unknownext", false, None), 10);
        assert_eq!(plan.content_type, None);
    }

    #[test]
    fn test_plan_multipart_part_size() {
        let plan = plan_upload(&args("a.bin", true, Some(8)), 10);
        assert_eq!(plan.multipart, Some(Some(8 * MIB)));

        let plan = plan_upload(&args("a.bin", true, None), 10);
        assert_eq!(plan.multipart, Some(None));
    }

    #[test]
    fn test_plan_forces_multipart_over_limit() {
        let plan = plan_upload(&args("a.bin", false, None), MAX_SINGLE_UPLOAD + 1);
        assert_eq!(plan.multipart, Some(None));
    }

    #[tokio::test]
    async fn test_upload_single_sets_content_type() {
        let (facade, store) = memory_facade();
        facade.create_bucket_default("docs").await.unwrap();

        let target = ObjectPath::new("docs", "a.json");
        let plan = plan_upload(&args("a.json", false, None), 2);
        upload(&facade, &target, Bytes::from_static(b"{}"), &plan)
            .await
            .unwrap();

        assert_eq!(
            store.content_type("docs", "a.json").as_deref(),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_upload_multipart_with_small_parts() {
        let (facade, store) = memory_facade();
        facade.create_bucket_default("docs").await.unwrap();

        let target = ObjectPath::new("docs", "big.bin");
        let plan = UploadPlan {
            multipart: Some(Some(4)),
            content_type: None,
        };
        let data = Bytes::from_static(b"0123456789");
        let info = upload(&facade, &target, data.clone(), &plan).await.unwrap();

        assert_eq!(info.size_bytes, 10);
        assert_eq!(store.object("docs", "big.bin"), Some(data));
        assert_eq!(store.completed_uploads().len(), 1);
    }
}
