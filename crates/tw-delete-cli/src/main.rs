use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tw_delete_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "tw-delete")]
#[command(
    author,
    version,
    about = "Deletes old tweets. Note: if --save is not given data is not saved!"
)]
struct Cli {
    /// Path to file with auth details (default: ~/.config/tw-delete/auth)
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with_all = ["consumer_key", "consumer_secret", "access_token", "access_secret"]
    )]
    auth: Option<PathBuf>,

    /// Consumer (API) key
    #[arg(long, env = "TW_CONSUMER_KEY", hide_env_values = true)]
    consumer_key: Option<String>,

    /// Consumer (API) secret
    #[arg(long, env = "TW_CONSUMER_SECRET", hide_env_values = true)]
    consumer_secret: Option<String>,

    /// Access token
    #[arg(long, env = "TW_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Access token secret
    #[arg(long, env = "TW_ACCESS_SECRET", hide_env_values = true)]
    access_secret: Option<String>,

    /// Duration to delete after, e.g. 120h, 1h30m, 30d (default: '120h')
    #[arg(long, value_name = "DUR")]
    after: Option<String>,

    /// Directory to save tweets to
    #[arg(long, value_name = "DIR")]
    save: Option<PathBuf>,

    /// Don't delete tweets
    #[arg(long)]
    no_delete: bool,

    /// Path to config file (default: ~/.config/tw-delete/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let options = commands::prune::PruneOptions {
        auth: cli.auth,
        consumer_key: cli.consumer_key,
        consumer_secret: cli.consumer_secret,
        access_token: cli.access_token,
        access_secret: cli.access_secret,
        after: cli.after,
        save: cli.save,
        no_delete: cli.no_delete,
    };

    commands::prune::run(&config, options).await
}
