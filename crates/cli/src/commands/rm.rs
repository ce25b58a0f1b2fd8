//! rm command - Remove objects
//!
//! Deletes the named keys and/or every key matching `--pattern` in one
//! batched request sequence.

use bk_core::{Error, ObjectStoreFacade};
use clap::Args;
use glob::Pattern;
use serde::Serialize;

use super::{GlobalOptions, open_session, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};

/// Remove objects
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Bucket to delete from
    pub bucket: String,

    /// Object keys to delete
    #[arg(required_unless_present = "pattern")]
    pub keys: Vec<String>,

    /// Also delete every key matching this glob (e.g. "logs/2023-*.gz")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Only show what would be deleted
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    bucket: String,
    dry_run: bool,
    deleted: Vec<String>,
    total: usize,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, globals: &GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(globals.output.clone());

    let pattern = match args.pattern.as_deref().map(compile_pattern).transpose() {
        Ok(pattern) => pattern,
        Err(e) => return report(&formatter, "Invalid pattern", &e),
    };

    let session = match open_session(globals, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let spinner = ProgressBar::spinner(&globals.output, &format!("Removing from {}", args.bucket));
    let result = remove(
        &session.facade,
        &args.bucket,
        &args.keys,
        pattern.as_ref(),
        args.dry_run,
    )
    .await;
    spinner.finish_and_clear();

    let deleted = match result {
        Ok(deleted) => deleted,
        Err(e) => return report(&formatter, &format!("Failed to remove from '{}'", args.bucket), &e),
    };

    if formatter.is_json() {
        formatter.json(&RmOutput {
            status: "success",
            bucket: args.bucket,
            dry_run: args.dry_run,
            total: deleted.len(),
            deleted,
        });
        return ExitCode::Success;
    }

    let verb = if args.dry_run { "Would remove" } else { "Removed" };
    for key in &deleted {
        formatter.println(&format!("{verb} {}/{key}", args.bucket));
    }
    if deleted.is_empty() {
        formatter.warning("No objects matched");
    } else {
        formatter.success(&format!("{verb} {} object(s)", deleted.len()));
    }
    ExitCode::Success
}

fn compile_pattern(pattern: &str) -> bk_core::Result<Pattern> {
    Pattern::new(pattern).map_err(|e| Error::Validation(format!("'{pattern}': {e}")))
}

/// Literal prefix of a glob, used to narrow the listing
fn literal_prefix(pattern: &Pattern) -> Option<&str> {
    let raw = pattern.as_str();
    let end = raw.find(['*', '?', '[']).unwrap_or(raw.len());
    (end > 0).then(|| &raw[..end])
}

/// Collect the keys to delete and delete them unless `dry_run`
///
/// Returns the keys removed, or the keys that would be removed.
async fn remove(
    facade: &ObjectStoreFacade,
    bucket: &str,
    keys: &[String],
    pattern: Option<&Pattern>,
    dry_run: bool,
) -> bk_core::Result<Vec<String>> {
    let mut selected: Vec<String> = keys.to_vec();

    if let Some(pattern) = pattern {
        let matches = facade
            .list_objects(bucket, literal_prefix(pattern))
            .await?
            .into_iter()
            .map(|o| o.key)
            .filter(|key| pattern.matches(key));
        selected.extend(matches);
    }

    selected.sort();
    selected.dedup();

    if dry_run {
        return Ok(selected);
    }
    facade.delete_objects(bucket, &selected).await
}
