//! ls command - List buckets and objects
//!
//! Lists buckets when called without a path, or objects under a bucket and
//! optional prefix. `--default-bucket` lists the profile's default bucket.

use bk_core::{Bucket, Error, ObjectInfo, ObjectPath, ObjectStoreFacade, Profile};
use clap::Args;
use jiff::Timestamp;
use serde::Serialize;

use super::{GlobalOptions, open_session, report};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};

/// List buckets or objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Bucket with optional prefix (bucket[/prefix]); omit to list buckets
    pub path: Option<String>,

    /// List the profile's default bucket
    #[arg(long, conflicts_with = "path")]
    pub default_bucket: bool,

    /// Print totals after the listing
    #[arg(long)]
    pub summarize: bool,
}

/// JSON output for object listings
#[derive(Debug, Serialize)]
struct LsOutput {
    bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
    items: Vec<ObjectInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

/// JSON output for bucket listings
#[derive(Debug, Serialize)]
struct BucketsOutput {
    buckets: Vec<Bucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Summary {
    total_objects: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn of(items: &[ObjectInfo]) -> Self {
        let total_size_bytes = items.iter().map(|i| i.size_bytes).sum();
        Self {
            total_objects: items.len(),
            total_size_bytes,
            total_size_human: humansize::format_size(total_size_bytes, humansize::BINARY),
        }
    }
}

/// Execute the ls command
pub async fn execute(args: LsArgs, globals: &GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(globals.output.clone());

    let session = match open_session(globals, &formatter).await {
        Ok(session) => session,
        Err(code) => return code,
    };

    let target = match resolve_target(args.path.as_deref(), args.default_bucket, &session.profile) {
        Ok(target) => target,
        Err(e) => return report(&formatter, "Invalid path", &e),
    };

    let spinner = ProgressBar::spinner(&globals.output, "Listing");
    match target {
        None => {
            let result = session.facade.list_buckets().await;
            spinner.finish_and_clear();
            match result {
                Ok(buckets) => {
                    print_buckets(&formatter, buckets, args.summarize);
                    ExitCode::Success
                }
                Err(e) => report(&formatter, "Failed to list buckets", &e),
            }
        }
        Some(path) => {
            let result = list_path(&session.facade, &path).await;
            spinner.finish_and_clear();
            match result {
                Ok(items) => {
                    print_objects(&formatter, &path, items, args.summarize);
                    ExitCode::Success
                }
                Err(e) => report(&formatter, &format!("Failed to list {path}"), &e),
            }
        }
    }
}

/// Work out what to list; `None` means the bucket list
fn resolve_target(
    path: Option<&str>,
    default_bucket: bool,
    profile: &Profile,
) -> bk_core::Result<Option<ObjectPath>> {
    if default_bucket {
        let bucket = profile.default_bucket.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "Profile '{}' has no default bucket (set AWS_S3_BUCKET or --default-bucket)",
                profile.name
            ))
        })?;
        return ObjectPath::parse(bucket).map(Some);
    }

    path.map(ObjectPath::parse).transpose()
}

async fn list_path(facade: &ObjectStoreFacade, path: &ObjectPath) -> bk_core::Result<Vec<ObjectInfo>> {
    facade.list_objects(&path.bucket, path.prefix()).await
}

fn format_date(ts: Option<Timestamp>) -> String {
    ts.map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn print_buckets(formatter: &Formatter, buckets: Vec<Bucket>, summarize: bool) {
    if formatter.is_json() {
        let summary = summarize.then(|| Summary {
            total_objects: buckets.len(),
            total_size_bytes: 0,
            total_size_human: "0 B".to_string(),
        });
        formatter.json(&BucketsOutput { buckets, summary });
        return;
    }

    if buckets.is_empty() {
        formatter.println("No buckets.");
    } else {
        let mut table = formatter.table(&["Created", "Bucket", "Region"]);
        for bucket in &buckets {
            table.add_row(vec![
                format_date(bucket.created),
                bucket.name.clone(),
                bucket.region.clone().unwrap_or_default(),
            ]);
        }
        formatter.print_table(&table);
    }

    if summarize {
        formatter.println(&format!("\nTotal: {} buckets", buckets.len()));
    }
}

fn print_objects(formatter: &Formatter, path: &ObjectPath, items: Vec<ObjectInfo>, summarize: bool) {
    let summary = Summary::of(&items);

    if formatter.is_json() {
        formatter.json(&LsOutput {
            bucket: path.bucket.clone(),
            prefix: path.prefix().map(str::to_string),
            items,
            summary: summarize.then_some(summary),
        });
        return;
    }

    if items.is_empty() {
        formatter.println(&format!("No objects in {path}"));
    } else {
        let mut table = formatter.table(&["Last Modified", "Size", "Key"]);
        for item in &items {
            table.add_row(vec![
                format_date(item.last_modified),
                item.size_human.clone(),
                item.key.clone(),
            ]);
        }
        formatter.print_table(&table);
    }

    if summarize {
        formatter.println(&format!(
            "\nTotal: {} objects, {}",
            summary.total_objects, summary.total_size_human
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::memory_facade;

    fn profile_with_bucket(bucket: Option<&str>) -> Profile {
        let mut profile = Profile::new("local", "http://localhost:9000", "ak", "sk");
        profile.default_bucket = bucket.map(str::to_string);
        profile
    }

    #[test]
    fn test_resolve_target_buckets() {
        let target = resolve_target(None, false, &profile_with_bucket(None)).unwrap();
        assert!(target.is_none());
    }

    #[test]
    fn test_resolve_target_with_prefix() {
        let target = resolve_target(Some("photos/2024/"), false, &profile_with_bucket(None))
            .unwrap()
            .unwrap();
        assert_eq!(target.bucket, "photos");
        assert_eq!(target.prefix(), Some("2024/"));
    }

    #[test]
    fn test_resolve_target_default_bucket() {
        let profile = profile_with_bucket(Some("scratch"));
        let target = resolve_target(None, true, &profile).unwrap().unwrap();
        assert_eq!(target.bucket, "scratch");
        assert_eq!(target.prefix(), None);

        let err = resolve_target(None, true, &profile_with_bucket(None)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_summary_totals() {
        let items = vec![
            ObjectInfo::new("b", "a", 1024),
            ObjectInfo::new("b", "c", 1024),
        ];
        let summary = Summary::of(&items);
        assert_eq!(summary.total_objects, 2);
        assert_eq!(summary.total_size_bytes, 2048);
        assert_eq!(summary.total_size_human, "2 KiB");
    }

    #[tokio::test]
    async fn test_list_path_uses_prefix() {
        let (facade, _store) = memory_facade();
        facade.create_bucket_default("photos").await.unwrap();
        for key in ["2024/a.jpg", "2024/b.jpg", "2025/c.jpg"] {
            facade
                .upload_object("photos", key, bytes::Bytes::from_static(b"x"))
                .await
                .unwrap();
        }

        let path = ObjectPath::parse("photos/2024/").unwrap();
        let items = list_path(&facade, &path).await.unwrap();
        let keys: Vec<_> = items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["2024/a.jpg", "2024/b.jpg"]);
    }

    #[tokio::test]
    async fn test_list_missing_bucket_is_not_found() {
        let (facade, _store) = memory_facade();
        let path = ObjectPath::parse("missing").unwrap();
        let err = list_path(&facade, &path).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
