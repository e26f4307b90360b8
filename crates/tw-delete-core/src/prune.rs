use chrono::{DateTime, Utc};

use crate::age::is_expired;
use crate::archive::Archiver;
use crate::timeline::{Post, PostDeleter, TimelineSource};
use crate::Result;

/// Counters for a prune run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub pages: u32,
    pub scanned: u32,
    /// Posts past the age threshold
    pub expired: u32,
    pub archived: u32,
    /// Expired posts kept because archiving them failed
    pub skipped: u32,
    pub deleted: u32,
}

/// Cursor for the next, older page: one below the smallest id on this page
pub fn next_cursor(page: &[Post]) -> Option<u64> {
    page.iter()
        .map(|post| post.id)
        .min()
        .and_then(|oldest| oldest.checked_sub(1))
}

/// Walks the timeline oldest-ward, archiving and deleting expired posts
pub struct Pruner<'a> {
    source: &'a dyn TimelineSource,
    deleter: &'a dyn PostDeleter,
    archiver: Option<&'a dyn Archiver>,
    threshold: chrono::Duration,
    page_size: u32,
}

impl<'a> Pruner<'a> {
    pub fn new(
        source: &'a dyn TimelineSource,
        deleter: &'a dyn PostDeleter,
        threshold: chrono::Duration,
        page_size: u32,
    ) -> Self {
        Self {
            source,
            deleter,
            archiver: None,
            threshold,
            page_size,
        }
    }

    /// Archive each expired post before deleting it
    pub fn with_archiver(mut self, archiver: &'a dyn Archiver) -> Self {
        self.archiver = Some(archiver);
        self
    }

    pub async fn run(&self) -> Result<PruneStats> {
        self.run_at(Utc::now()).await
    }

    /// Run with a fixed notion of "now"
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<PruneStats> {
        let mut stats = PruneStats::default();
        let mut cursor: Option<u64> = None;

        loop {
            tracing::info!(max_id = ?cursor, "Fetching timeline page");
            let page = self.source.fetch_page(cursor, self.page_size).await?;

            if page.is_empty() {
                break;
            }
            stats.pages += 1;

            for post in &page {
                stats.scanned += 1;

                if !is_expired(post.created_at, self.threshold, now) {
                    continue;
                }
                stats.expired += 1;

                self.prune_post(post, &mut stats).await?;
            }

            match next_cursor(&page) {
                Some(next) if cursor.map_or(true, |current| next < current) => {
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        tracing::info!(
            pages = stats.pages,
            scanned = stats.scanned,
            expired = stats.expired,
            archived = stats.archived,
            skipped = stats.skipped,
            deleted = stats.deleted,
            "Prune finished"
        );

        Ok(stats)
    }

    async fn prune_post(&self, post: &Post, stats: &mut PruneStats) -> Result<()> {
        if let Some(archiver) = self.archiver {
            // Never delete a post that could not be saved
            if let Err(e) = archiver.archive(post).await {
                tracing::warn!(id = %post.id_str, error = %e, "Failed to archive post, not deleting it");
                stats.skipped += 1;
                return Ok(());
            }
            stats.archived += 1;
        }

        self.deleter.delete(post).await?;
        stats.deleted += 1;
        Ok(())
    }
}
