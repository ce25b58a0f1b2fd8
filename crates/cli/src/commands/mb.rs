//! mb command - Make bucket
//!
//! Creates a bucket. Creating a bucket the caller already owns succeeds.

use bk_core::ObjectStoreFacade;
use clap::Args;
use serde::Serialize;

use super::{GlobalOptions, open_session, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};

/// Create a new bucket
#[derive(Args, Debug)]
pub struct MbArgs {
    /// Bucket name
    pub bucket: String,

    /// Region to create the bucket in (defaults to the profile's region)
    #[arg(long)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
struct MbOutput {
    status: &'static str,
    bucket: String,
    region: String,
}

/// Execute the mb command
pub async fn execute(args: MbArgs, globals: &GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(globals.output.clone());

    let session = match open_session(globals, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let region = args
        .region
        .unwrap_or_else(|| session.facade.region().to_string());

    let spinner = ProgressBar::spinner(&globals.output, &format!("Creating {}", args.bucket));
    let result = make_bucket(&session.facade, &args.bucket, &region).await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&MbOutput {
                    status: "success",
                    bucket: args.bucket,
                    region,
                });
            } else {
                formatter.success(&format!(
                    "Bucket {} created in {region}",
                    formatter.accent(&args.bucket)
                ));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, &format!("Failed to create bucket '{}'", args.bucket), &e),
    }
}

async fn make_bucket(facade: &ObjectStoreFacade, bucket: &str, region: &str) -> bk_core::Result<()> {
    facade.create_bucket(bucket, region).await
}
