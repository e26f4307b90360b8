//! Local archive of posts and their media, written before a post is deleted
//!
//! Layout: `<root>/<post id>/data.json` plus one `<media id><ext>` file per
//! attached media.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::timeline::{MediaFetcher, Post};
use crate::Result;

const DATA_FILE: &str = "data.json";

/// Persists a post before it is deleted
#[async_trait::async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, post: &Post) -> Result<()>;
}

/// Archives posts into one directory per post under `root`
pub struct FileArchiver<M> {
    root: PathBuf,
    media: M,
}

impl<M: MediaFetcher> FileArchiver<M> {
    pub fn new(root: impl Into<PathBuf>, media: M) -> Self {
        Self {
            root: root.into(),
            media,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a post is archived into
    pub fn post_dir(&self, post: &Post) -> PathBuf {
        self.root.join(&post.id_str)
    }
}

#[async_trait::async_trait]
impl<M: MediaFetcher> Archiver for FileArchiver<M> {
    async fn archive(&self, post: &Post) -> Result<()> {
        let post_dir = self.post_dir(post);

        // Reused if present so a rerun after --no-delete still archives
        fs::create_dir_all(&post_dir).await?;

        let data = serde_json::to_vec_pretty(&post.raw)?;
        let data_path = post_dir.join(DATA_FILE);
        tracing::info!("writing: {}", data_path.display());
        fs::write(&data_path, data).await?;

        for media in &post.media {
            let content = self.media.fetch_media(&media.url).await?;

            let media_path = post_dir.join(media.file_name());
            tracing::info!("writing: {}", media_path.display());
            fs::write(&media_path, &content).await?;
        }

        Ok(())
    }
}
