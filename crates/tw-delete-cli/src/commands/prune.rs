use std::path::PathBuf;

use anyhow::{Context, Result};

use tw_delete_core::{
    age::{parse_duration, to_chrono},
    archive::FileArchiver,
    timeline::{DryRunDeleter, PostDeleter, TwitterClient},
    AppConfig, Credentials, Pruner,
};

/// Command-line overrides for a prune run
pub struct PruneOptions {
    pub auth: Option<PathBuf>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_secret: Option<String>,
    pub after: Option<String>,
    pub save: Option<PathBuf>,
    pub no_delete: bool,
}

/// Posts are lost only when they are really deleted without being archived
fn warns_unsaved(archiving: bool, no_delete: bool) -> bool {
    !archiving && !no_delete
}

pub async fn run(config: &AppConfig, options: PruneOptions) -> Result<()> {
    let discrete = Credentials::from_parts(
        options.consumer_key,
        options.consumer_secret,
        options.access_token,
        options.access_secret,
    )?;
    let credentials = Credentials::resolve(discrete, options.auth.as_deref())?;

    let after = options.after.as_deref().unwrap_or(&config.general.after);
    let threshold = to_chrono(parse_duration(after)?)?;

    let archive_dir = options
        .save
        .map(|dir| tw_delete_core::config::expand_tilde(&dir))
        .or_else(|| config.archive_dir());

    let client = TwitterClient::new(config, credentials)?;
    let screen_name = client
        .verify_credentials()
        .await
        .context("Failed to verify credentials")?;
    tracing::info!("Authenticated as @{}", screen_name);

    let deleter: &dyn PostDeleter = if options.no_delete {
        &DryRunDeleter
    } else {
        &client
    };

    let archiver = archive_dir.map(|dir| FileArchiver::new(dir, &client));

    if let Some(archiver) = &archiver {
        tokio::fs::create_dir_all(archiver.root())
            .await
            .with_context(|| format!("Failed to create {}", archiver.root().display()))?;
        println!("Saving posts to {}", archiver.root().display());
    }
    if warns_unsaved(archiver.is_some(), options.no_delete) {
        tracing::warn!("--save not given, deleted posts will not be kept");
    }

    println!("Deleting posts older than {}...", after);

    let mut pruner = Pruner::new(&client, deleter, threshold, config.page_size());
    if let Some(archiver) = &archiver {
        pruner = pruner.with_archiver(archiver);
    }

    let stats = pruner.run().await?;

    if options.no_delete {
        println!(
            "Dry run: {} of {} posts would be deleted.",
            stats.deleted, stats.scanned
        );
    } else if stats.deleted > 0 {
        println!("Deleted {} old posts.", stats.deleted);
    } else {
        println!("No posts to delete.");
    }

    if archiver.is_some() {
        println!("Archived {} posts.", stats.archived);
    }
    if stats.skipped > 0 {
        println!(
            "Kept {} posts that could not be archived.",
            stats.skipped
        );
    }

    Ok(())
}
