//! get command - Download an object to a local file
//!
//! `--large` fetches the object with concurrent ranged requests.

use std::path::{Path, PathBuf};

use bk_core::{Error, ObjectPath, ObjectStoreFacade};
use bytes::Bytes;
use clap::Args;
use serde::Serialize;

use super::{GlobalOptions, open_session, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};

const MIB: u64 = 1024 * 1024;

/// Download an object
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Source object as bucket/key
    pub source: String,

    /// Local file or directory to write to
    pub file: PathBuf,

    /// Download with concurrent ranged requests
    #[arg(long)]
    pub large: bool,

    /// Range size in MiB (defaults to the configured part size)
    #[arg(long, requires = "large")]
    pub part_size_mib: Option<u64>,
}

#[derive(Debug, Serialize)]
struct GetOutput {
    status: &'static str,
    source: String,
    target: String,
    size_bytes: u64,
    size_human: String,
}

/// Execute the get command
pub async fn execute(args: GetArgs, globals: &GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(globals.output.clone());

    let source = match ObjectPath::parse_object(&args.source) {
        Ok(source) => source,
        Err(e) => return report(&formatter, "Invalid source", &e),
    };
    let target = match local_target(&args.file, &source) {
        Ok(target) => target,
        Err(e) => return report(&formatter, "Invalid target", &e),
    };

    let session = match open_session(globals, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let range_size = args.large.then(|| {
        args.part_size_mib
            .map(|mib| mib.saturating_mul(MIB))
            .unwrap_or(session.facade.multipart_config().part_size)
    });

    let spinner = ProgressBar::spinner(&globals.output, &format!("Downloading {source}"));
    let result = download(&session.facade, &source, range_size).await;
    spinner.finish_and_clear();

    let data = match result {
        Ok(data) => data,
        Err(e) => return report(&formatter, &format!("Failed to download {source}"), &e),
    };

    if let Err(e) = tokio::fs::write(&target, &data).await {
        formatter.error(&format!("Failed to write {}: {e}", target.display()));
        return ExitCode::from_error(&Error::Io(e));
    }

    let size = data.len() as u64;
    let size_human = humansize::format_size(size, humansize::BINARY);
    if formatter.is_json() {
        formatter.json(&GetOutput {
            status: "success",
            source: source.to_string(),
            target: target.display().to_string(),
            size_bytes: size,
            size_human,
        });
    } else {
        formatter.success(&format!(
            "{source} -> {} {}",
            formatter.accent(&target.display().to_string()),
            formatter.dim(&format!("({size_human})"))
        ));
    }
    ExitCode::Success
}

/// Write into `file`, or into `file/<object name>` when it is a directory
fn local_target(file: &Path, source: &ObjectPath) -> bk_core::Result<PathBuf> {
    if !file.is_dir() {
        return Ok(file.to_path_buf());
    }
    let name = source
        .file_name()
        .ok_or_else(|| Error::InvalidPath(format!("'{source}' has no file name")))?;
    Ok(file.join(name))
}

async fn download(
    facade: &ObjectStoreFacade,
    source: &ObjectPath,
    range_size: Option<u64>,
) -> bk_core::Result<Bytes> {
    match range_size {
        Some(part_size) => {
            facade
                .download_large_object(&source.bucket, &source.key, part_size)
                .await
        }
        None => facade.download_object(&source.bucket, &source.key).await,
    }
}
