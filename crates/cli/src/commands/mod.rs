//! CLI command definitions and execution
//!
//! Each command module exposes an `Args` struct and an `execute` function
//! returning an `ExitCode`. Commands that talk to a service open a
//! [`Session`] first and keep the facade calls in small functions that the
//! unit tests drive against the in-memory transport.

use anyhow::Context as _;
use bk_core::profile::ENV_PROFILE;
use bk_core::{ConfigManager, Defaults, Error, ObjectStoreFacade, Profile, ProfileManager};
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod completions;
mod cp;
mod exists;
mod get;
mod ls;
mod mb;
mod profile;
mod put;
mod rb;
mod rm;

/// Profile used when `--profile` is not given and it exists
pub const DEFAULT_PROFILE: &str = "default";

/// bk - bucket toolkit for S3-compatible object storage
///
/// Works with AWS S3, MinIO, RustFS and other S3-compatible services.
#[derive(Parser, Debug)]
#[command(name = "bk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Profile to use (defaults to "default", then the AWS_* environment)
    #[arg(long, short = 'p', global = true, env = "BK_PROFILE")]
    pub profile: Option<String>,

    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinners
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage connection profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// List buckets, or objects in a bucket
    Ls(ls::LsArgs),

    /// Check whether a bucket exists
    Exists(exists::ExistsArgs),

    /// Create a bucket
    Mb(mb::MbArgs),

    /// Remove an empty bucket
    Rb(rb::RbArgs),

    /// Upload a local file
    Put(put::PutArgs),

    /// Download an object to a local file
    Get(get::GetArgs),

    /// Copy an object server-side
    Cp(cp::CpArgs),

    /// Remove objects
    Rm(rm::RmArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Options every command receives
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub profile: Option<String>,
    pub output: OutputConfig,
    pub defaults: Defaults,
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let flags = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    let defaults = match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config.defaults,
        Err(e) => {
            Formatter::new(flags).error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let globals = GlobalOptions {
        profile: cli.profile,
        output: flags.resolve(&defaults),
        defaults,
    };

    match cli.command {
        Commands::Profile(cmd) => profile::execute(cmd, &globals).await,
        Commands::Ls(args) => ls::execute(args, &globals).await,
        Commands::Exists(args) => exists::execute(args, &globals).await,
        Commands::Mb(args) => mb::execute(args, &globals).await,
        Commands::Rb(args) => rb::execute(args, &globals).await,
        Commands::Put(args) => put::execute(args, &globals).await,
        Commands::Get(args) => get::execute(args, &globals).await,
        Commands::Cp(args) => cp::execute(args, &globals).await,
        Commands::Rm(args) => rm::execute(args, &globals).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// A connected facade plus the profile it was built from
pub struct Session {
    pub facade: ObjectStoreFacade,
    pub profile: Profile,
}

impl Session {
    /// Resolve the selected profile and connect to its endpoint
    pub async fn open(globals: &GlobalOptions) -> anyhow::Result<Self> {
        let manager = ProfileManager::new().context("Failed to locate configuration")?;
        let profile = resolve_profile(&manager, globals.profile.as_deref())?;
        debug!(profile = %profile.name, endpoint = %profile.endpoint, "opening session");

        let facade = bk_s3::connect(&profile, globals.defaults.multipart())
            .await
            .with_context(|| format!("Failed to connect with profile '{}'", profile.name))?;

        Ok(Self { facade, profile })
    }
}

/// Pick the profile named on the command line, else `default`, else `env`
pub fn resolve_profile(manager: &ProfileManager, name: Option<&str>) -> bk_core::Result<Profile> {
    match name {
        Some(name) => manager.get(name),
        None if manager.exists(DEFAULT_PROFILE)? => manager.get(DEFAULT_PROFILE),
        None => manager.get(ENV_PROFILE),
    }
}

/// Open a session, reporting failure through the formatter
pub(crate) async fn open_session(
    globals: &GlobalOptions,
    formatter: &Formatter,
) -> Result<Session, ExitCode> {
    Session::open(globals).await.map_err(|e| {
        formatter.error(&format!("{e:#}"));
        ExitCode::from_anyhow(&e)
    })
}

/// Print a library error and map it to an exit code
pub(crate) fn report(formatter: &Formatter, context: &str, error: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from_error(error)
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_manager() -> (ProfileManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigManager::with_path(temp_dir.path().join("config.toml"));
        (ProfileManager::with_config_manager(config), temp_dir)
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from(["bk", "--json", "-p", "local", "ls"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.profile.as_deref(), Some("local"));
        assert!(matches!(cli.command, Commands::Ls(_)));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["bk"]).is_err());
    }

    #[test]
    fn test_resolve_named_profile() {
        let (manager, _dir) = temp_manager();
        manager
            .set(Profile::new("local", "http://localhost:9000", "ak", "sk"))
            .unwrap();

        let profile = resolve_profile(&manager, Some("local")).unwrap();
        assert_eq!(profile.endpoint, "http://localhost:9000");

        let err = resolve_profile(&manager, Some("missing")).unwrap_err();
        assert!(matches!(err, Error::ProfileNotFound(_)));
    }

    #[test]
    fn test_resolve_prefers_default_profile() {
        let (manager, _dir) = temp_manager();
        manager
            .set(Profile::new(DEFAULT_PROFILE, "http://minio:9000", "ak", "sk"))
            .unwrap();

        let profile = resolve_profile(&manager, None).unwrap();
        assert_eq!(profile.name, DEFAULT_PROFILE);
    }
}
