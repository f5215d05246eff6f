//! spot-launch: multi-region EC2 spot capacity launcher

use anyhow::Result;
use clap::Parser;
use spot_launch::config::{DEFAULT_CATALOG_FILE, DEFAULT_LAUNCH_PROFILE};
use spot_launch::orchestrator::{self, LaunchOptions};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "spot-launch")]
#[command(about = "Launch EC2 spot capacity across regions from a launch plan")]
#[command(version)]
struct Args {
    /// Directory holding all the configuration files
    #[arg(long, default_value = "../configs")]
    config_dir: PathBuf,

    /// Launch plan file name inside the config directory
    #[arg(long, default_value = DEFAULT_LAUNCH_PROFILE)]
    launch_profile: String,

    /// Region catalog file name inside the config directory
    #[arg(long, default_value = DEFAULT_CATALOG_FILE)]
    aws_profile: String,

    /// Raise debug output level (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// Tag embedded in instance names (default: $WHOAMI)
    #[arg(long, env = "WHOAMI")]
    tag: Option<String>,

    /// Override the user-data file named by the launch plan
    #[arg(long)]
    user_data: Option<String>,
}

/// Fall back to the login name when no tag was given anywhere.
fn resolve_tag(tag: Option<String>) -> String {
    tag.or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "unknown".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.debug {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let tag = resolve_tag(args.tag);

    info!(
        config_dir = %args.config_dir.display(),
        launch_profile = %args.launch_profile,
        aws_profile = %args.aws_profile,
        tag = %tag,
        "Starting spot-launch"
    );

    orchestrator::run_launch(LaunchOptions {
        config_dir: args.config_dir,
        launch_profile: args.launch_profile,
        aws_profile: args.aws_profile,
        tag,
        user_data: args.user_data,
    })
    .await
}
