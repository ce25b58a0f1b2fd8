//! bk - bucket toolkit for S3-compatible object storage
//!
//! Thin command-line front end over the `bk-core` facade.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bucketkit::commands::{self, Cli};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
