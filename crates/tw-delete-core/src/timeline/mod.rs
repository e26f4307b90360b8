mod client;
mod models;
pub mod oauth;

pub use client::TwitterClient;
pub use models::{Media, Post};

use bytes::Bytes;

use crate::Result;

/// Source of timeline pages, newest first
#[async_trait::async_trait]
pub trait TimelineSource: Send + Sync {
    /// Fetch up to `count` posts with an id less than or equal to `max_id`
    /// (or the newest posts when `max_id` is `None`)
    async fn fetch_page(&self, max_id: Option<u64>, count: u32) -> Result<Vec<Post>>;
}

/// Removes a post remotely
#[async_trait::async_trait]
pub trait PostDeleter: Send + Sync {
    async fn delete(&self, post: &Post) -> Result<()>;
}

/// Downloads attached media
#[async_trait::async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch_media(&self, url: &str) -> Result<Bytes>;
}

#[async_trait::async_trait]
impl<T: MediaFetcher + ?Sized> MediaFetcher for &T {
    async fn fetch_media(&self, url: &str) -> Result<Bytes> {
        (**self).fetch_media(url).await
    }
}

/// Deleter used with `--no-delete`: reports what would be deleted and
/// leaves the post in place
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunDeleter;

#[async_trait::async_trait]
impl PostDeleter for DryRunDeleter {
    async fn delete(&self, post: &Post) -> Result<()> {
        tracing::info!(id = %post.id_str, created_at = %post.created_at, "Would delete post (dry run)");
        Ok(())
    }
}
