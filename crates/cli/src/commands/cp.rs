//! cp command - Server-side object copy
//!
//! Copies `bucket/key` to another `bucket/key`. A destination ending in `/`
//! is treated as a folder and keeps the source key under it.

use bk_core::{ObjectInfo, ObjectPath, ObjectStoreFacade};
use clap::Args;
use serde::Serialize;

use super::{GlobalOptions, open_session, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};

/// Copy an object
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source object as bucket/key
    pub source: String,

    /// Destination as bucket/key, or bucket/folder/
    pub dest: String,
}

#[derive(Debug, Serialize)]
struct CpOutput {
    status: &'static str,
    source: String,
    target: String,
    object: ObjectInfo,
}

/// Execute the cp command
pub async fn execute(args: CpArgs, globals: &GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(globals.output.clone());

    let source = match ObjectPath::parse_object(&args.source) {
        Ok(path) => path,
        Err(e) => return report(&formatter, "Invalid source", &e),
    };
    let dest = match ObjectPath::parse(&args.dest) {
        Ok(path) => path,
        Err(e) => return report(&formatter, "Invalid destination", &e),
    };

    let session = match open_session(globals, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let spinner = ProgressBar::spinner(&globals.output, &format!("Copying {source}"));
    let result = copy(&session.facade, &source, &dest).await;
    spinner.finish_and_clear();

    match result {
        Ok(object) => {
            let target = ObjectPath::new(&object.bucket, &object.key);
            if formatter.is_json() {
                formatter.json(&CpOutput {
                    status: "success",
                    source: source.to_string(),
                    target: target.to_string(),
                    object,
                });
            } else {
                formatter.success(&format!("{source} -> {target}"));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &format!("Failed to copy {source}"), &e),
    }
}

async fn copy(
    facade: &ObjectStoreFacade,
    source: &ObjectPath,
    dest: &ObjectPath,
) -> bk_core::Result<ObjectInfo> {
    let into_folder = dest.key.is_empty() || dest.key.ends_with('/');

    if !into_folder {
        return facade
            .copy_object(&source.bucket, &source.key, &dest.bucket, &dest.key)
            .await;
    }

    if dest.bucket == source.bucket && !dest.key.is_empty() {
        return facade
            .copy_to_folder(&source.bucket, &source.key, &dest.key)
            .await;
    }

    let dst_key = format!("{}{}", dest.key, source.key);
    facade
        .copy_object(&source.bucket, &source.key, &dest.bucket, &dst_key)
        .await
}
