use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::Result;
use crate::database::models::{Bookmark, BookmarkUpdate};
use crate::database::repositories::BookmarkRepository;
use crate::database::retry::retry_on_sqlite_busy;

/// Bookmarked videos. Callers keep one bookmark per `video_id`; the table
/// does not enforce it.
pub struct BookmarkStore {
    repo: Arc<dyn BookmarkRepository>,
    bookmarks: watch::Sender<Vec<Bookmark>>,
    /// Held across a write and its publish so snapshots go out in commit order.
    writes: Mutex<()>,
}

impl BookmarkStore {
    pub async fn open(repo: Arc<dyn BookmarkRepository>) -> Result<Self> {
        let initial = repo.list_all().await?;
        let (bookmarks, _) = watch::channel(initial);
        Ok(Self {
            repo,
            bookmarks,
            writes: Mutex::new(()),
        })
    }

    /// Live view, newest first.
    pub fn load_all(&self) -> watch::Receiver<Vec<Bookmark>> {
        self.bookmarks.subscribe()
    }

    pub fn snapshot(&self) -> Vec<Bookmark> {
        self.bookmarks.borrow().clone()
    }

    pub async fn get_by_video_id(&self, video_id: &str) -> Result<Option<Bookmark>> {
        self.repo.get_by_video_id(video_id).await
    }

    pub async fn exists_by_video_id(&self, video_id: &str) -> Result<bool> {
        self.repo.exists_by_video_id(video_id).await
    }

    pub async fn insert(&self, bookmark: &Bookmark) -> Result<i64> {
        let _guard = self.writes.lock().await;
        self.insert_locked(bookmark).await
    }

    pub async fn delete_by_video_id(&self, video_id: &str) -> Result<u64> {
        let _guard = self.writes.lock().await;
        self.delete_locked(video_id).await
    }

    /// Add the bookmark if absent, remove it otherwise. Returns whether the
    /// video is bookmarked afterwards.
    pub async fn toggle(&self, bookmark: &Bookmark) -> Result<bool> {
        let _guard = self.writes.lock().await;
        if self.repo.exists_by_video_id(&bookmark.video_id).await? {
            self.delete_locked(&bookmark.video_id).await?;
            Ok(false)
        } else {
            self.insert_locked(bookmark).await?;
            Ok(true)
        }
    }

    pub async fn update_metadata(&self, video_id: &str, update: &BookmarkUpdate) -> Result<u64> {
        let _guard = self.writes.lock().await;
        let repo = &self.repo;
        let updated = retry_on_sqlite_busy("update bookmark", || {
            repo.update_metadata(video_id, update)
        })
        .await?;
        if updated > 0 {
            self.publish().await;
        }
        Ok(updated)
    }

    async fn insert_locked(&self, bookmark: &Bookmark) -> Result<i64> {
        let repo = &self.repo;
        let id = retry_on_sqlite_busy("insert bookmark", || repo.insert(bookmark)).await?;
        debug!(id, video_id = %bookmark.video_id, "bookmark added");
        self.publish().await;
        Ok(id)
    }

    async fn delete_locked(&self, video_id: &str) -> Result<u64> {
        let repo = &self.repo;
        let removed =
            retry_on_sqlite_busy("delete bookmark", || repo.delete_by_video_id(video_id)).await?;
        debug!(video_id, removed, "bookmark removed");
        self.publish().await;
        Ok(removed)
    }

    async fn publish(&self) {
        match self.repo.list_all().await {
            Ok(bookmarks) => {
                self.bookmarks.send_replace(bookmarks);
            }
            Err(e) => warn!(error = %e, "failed to refresh bookmark list"),
        }
    }
}
