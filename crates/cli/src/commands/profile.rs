//! Profile management commands
//!
//! A profile is a named endpoint plus credentials stored in the config file.
//! Secrets are never printed.

use bk_core::{Error, Profile, ProfileManager, validate_region};
use bk_s3::Addressing;
use clap::Subcommand;
use serde::Serialize;

use super::{GlobalOptions, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or update a profile
    Set(SetArgs),

    /// List configured profiles
    List(ListArgs),

    /// Remove a profile
    Remove(RemoveArgs),
}

/// Arguments for `profile set`
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Profile name (e.g., "default", "local", "prod")
    pub name: String,

    /// Endpoint URL; omit for AWS S3 in the profile's region
    #[arg(long, default_value = "")]
    pub endpoint: String,

    /// Access key ID; omit to use the AWS default credential chain
    #[arg(long, requires = "secret_key")]
    pub access_key: Option<String>,

    /// Secret access key
    #[arg(long, requires = "access_key")]
    pub secret_key: Option<String>,

    /// Session token for temporary credentials
    #[arg(long, requires = "access_key")]
    pub session_token: Option<String>,

    /// Region used for signing and bucket creation
    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// Bucket addressing: auto, path, or dns
    #[arg(long, default_value = "auto")]
    pub bucket_lookup: String,

    /// Bucket used by `ls --default-bucket`
    #[arg(long)]
    pub default_bucket: Option<String>,
}

/// Arguments for `profile list`
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show endpoint, region and addressing
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for `profile remove`
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the profile to remove
    pub name: String,
}

#[derive(Serialize)]
struct ProfileListOutput {
    profiles: Vec<ProfileInfo>,
}

/// Profile details without secrets
#[derive(Serialize)]
struct ProfileInfo {
    name: String,
    endpoint: String,
    region: String,
    bucket_lookup: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_bucket: Option<String>,
    static_keys: bool,
}

impl From<&Profile> for ProfileInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            endpoint: profile.endpoint.clone(),
            region: profile.region.clone(),
            bucket_lookup: profile.bucket_lookup.clone(),
            default_bucket: profile.default_bucket.clone(),
            static_keys: profile.has_static_keys(),
        }
    }
}

#[derive(Serialize)]
struct ProfileOperationOutput {
    success: bool,
    profile: String,
    message: String,
}

/// Execute a profile subcommand
pub async fn execute(cmd: ProfileCommands, globals: &GlobalOptions) -> ExitCode {
    let formatter = Formatter::new(globals.output.clone());

    let manager = match ProfileManager::new() {
        Ok(manager) => manager,
        Err(e) => return report(&formatter, "Failed to locate configuration", &e),
    };

    match cmd {
        ProfileCommands::Set(args) => {
            let name = args.name.clone();
            match set_profile(&manager, args) {
                Ok(()) => {
                    announce(&formatter, &name, format!("Profile '{name}' saved"));
                    ExitCode::Success
                }
                Err(e) => report(&formatter, "Failed to save profile", &e),
            }
        }
        ProfileCommands::List(args) => match manager.list() {
            Ok(profiles) => {
                print_profiles(&formatter, &profiles, args.long);
                ExitCode::Success
            }
            Err(e) => report(&formatter, "Failed to list profiles", &e),
        },
        ProfileCommands::Remove(args) => match manager.remove(&args.name) {
            Ok(()) => {
                let message = format!("Profile '{}' removed", args.name);
                announce(&formatter, &args.name, message);
                ExitCode::Success
            }
            Err(e) => report(&formatter, "Failed to remove profile", &e),
        },
    }
}

/// Validate the arguments and store the resulting profile
fn set_profile(manager: &ProfileManager, args: SetArgs) -> bk_core::Result<()> {
    manager.set(build_profile(args)?)
}

fn build_profile(args: SetArgs) -> bk_core::Result<Profile> {
    if args.name.trim().is_empty() {
        return Err(Error::Validation("Profile name cannot be empty".into()));
    }
    validate_region(&args.region)?;
    Addressing::parse(&args.bucket_lookup)?;
    if !args.endpoint.is_empty() {
        url::Url::parse(&args.endpoint)
            .map_err(|e| Error::Validation(format!("Invalid endpoint '{}': {e}", args.endpoint)))?;
    }

    let mut profile = Profile::new(
        args.name,
        args.endpoint,
        args.access_key.unwrap_or_default(),
        args.secret_key.unwrap_or_default(),
    );
    profile.session_token = args.session_token;
    profile.region = args.region;
    profile.bucket_lookup = args.bucket_lookup;
    profile.default_bucket = args.default_bucket;
    Ok(profile)
}

fn announce(formatter: &Formatter, name: &str, message: String) {
    if formatter.is_json() {
        formatter.json(&ProfileOperationOutput {
            success: true,
            profile: name.to_string(),
            message,
        });
    } else {
        formatter.success(&message);
    }
}

fn print_profiles(formatter: &Formatter, profiles: &[Profile], long: bool) {
    if formatter.is_json() {
        formatter.json(&ProfileListOutput {
            profiles: profiles.iter().map(ProfileInfo::from).collect(),
        });
        return;
    }

    if profiles.is_empty() {
        formatter.println("No profiles configured.");
        return;
    }

    if !long {
        for profile in profiles {
            formatter.println(&profile.name);
        }
        return;
    }

    let mut table = formatter.table(&["Name", "Endpoint", "Region", "Lookup", "Keys"]);
    for profile in profiles {
        let endpoint = if profile.endpoint.is_empty() {
            "(aws)"
        } else {
            profile.endpoint.as_str()
        };
        let keys = if profile.has_static_keys() {
            "static"
        } else {
            "default chain"
        };
        table.add_row(vec![
            profile.name.as_str(),
            endpoint,
            profile.region.as_str(),
            profile.bucket_lookup.as_str(),
            keys,
        ]);
    }
    formatter.print_table(&table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bk_core::ConfigManager;
    use tempfile::TempDir;

    fn temp_manager() -> (ProfileManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigManager::with_path(temp_dir.path().join("config.toml"));
        (ProfileManager::with_config_manager(config), temp_dir)
    }

    fn set_args(name: &str) -> SetArgs {
        SetArgs {
            name: name.to_string(),
            endpoint: "http://localhost:9000".to_string(),
            access_key: Some("ak".to_string()),
            secret_key: Some("sk".to_string()),
            session_token: None,
            region: "us-east-1".to_string(),
            bucket_lookup: "path".to_string(),
            default_bucket: Some("scratch".to_string()),
        }
    }

    #[test]
    fn test_set_profile_stores_fields() {
        let (manager, _dir) = temp_manager();
        set_profile(&manager, set_args("local")).unwrap();

        let profile = manager.get("local").unwrap();
        assert_eq!(profile.endpoint, "http://localhost:9000");
        assert_eq!(profile.bucket_lookup, "path");
        assert_eq!(profile.default_bucket.as_deref(), Some("scratch"));
        assert!(profile.has_static_keys());
    }

    #[test]
    fn test_set_profile_overwrites() {
        let (manager, _dir) = temp_manager();
        set_profile(&manager, set_args("local")).unwrap();

        let mut args = set_args("local");
        args.region = "eu-west-1".to_string();
        set_profile(&manager, args).unwrap();

        assert_eq!(manager.list().unwrap().len(), 1);
        assert_eq!(manager.get("local").unwrap().region, "eu-west-1");
    }

    #[test]
    fn test_set_profile_rejects_bad_input() {
        let (manager, _dir) = temp_manager();

        let mut args = set_args("local");
        args.bucket_lookup = "sideways".to_string();
        assert!(set_profile(&manager, args).is_err());

        let mut args = set_args("local");
        args.region = "Not A Region".to_string();
        assert!(matches!(
            set_profile(&manager, args),
            Err(Error::InvalidRegion(_))
        ));

        let mut args = set_args("local");
        args.endpoint = "::nope".to_string();
        assert!(matches!(
            set_profile(&manager, args),
            Err(Error::Validation(_))
        ));

        assert!(set_profile(&manager, set_args("  ")).is_err());
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn test_profile_info_hides_secrets() {
        let profile = Profile::new("local", "http://localhost:9000", "ak", "very-secret");
        let json = serde_json::to_string(&ProfileInfo::from(&profile)).unwrap();
        assert!(!json.contains("very-secret"));
        assert!(json.contains("\"static_keys\":true"));
    }
}
