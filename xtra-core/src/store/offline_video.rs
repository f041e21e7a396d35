use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::database::models::OfflineVideo;
use crate::database::repositories::OfflineVideoRepository;
use crate::database::retry::retry_on_sqlite_busy;
use crate::{Error, Result};

/// Catalog of downloaded and queued videos.
///
/// Only touches the database; files on disk are the download manager's job.
pub struct OfflineVideoStore {
    repo: Arc<dyn OfflineVideoRepository>,
    videos: watch::Sender<Vec<OfflineVideo>>,
    /// Held across a write and its publish so snapshots go out in commit order.
    writes: Mutex<()>,
}

impl OfflineVideoStore {
    pub async fn open(repo: Arc<dyn OfflineVideoRepository>) -> Result<Self> {
        let initial = repo.list_all().await?;
        let (videos, _) = watch::channel(initial);
        Ok(Self {
            repo,
            videos,
            writes: Mutex::new(()),
        })
    }

    /// Live view of the catalog, most recent download first.
    pub fn load_all(&self) -> watch::Receiver<Vec<OfflineVideo>> {
        self.videos.subscribe()
    }

    pub fn snapshot(&self) -> Vec<OfflineVideo> {
        self.videos.borrow().clone()
    }

    pub async fn get(&self, id: i64) -> Result<OfflineVideo> {
        self.repo.get(id).await
    }

    pub async fn find_by_video_id(&self, video_id: &str) -> Result<Option<OfflineVideo>> {
        self.repo.find_by_video_id(video_id).await
    }

    pub async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<OfflineVideo>> {
        self.repo.list_by_channel(channel_id).await
    }

    /// Downloads that have not completed yet, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<OfflineVideo>> {
        self.repo.list_pending().await
    }

    /// Persist `video`, returning its id.
    pub async fn insert(&self, video: &OfflineVideo) -> Result<i64> {
        let _guard = self.writes.lock().await;
        let repo = &self.repo;
        let id = retry_on_sqlite_busy("insert offline video", || repo.insert(video)).await?;
        debug!(id, video_id = ?video.video_id, "offline video inserted");
        self.publish().await;
        Ok(id)
    }

    /// Remove the catalog row. Files are left alone.
    pub async fn delete(&self, video: &OfflineVideo) -> Result<bool> {
        let id = video
            .id
            .ok_or_else(|| Error::validation("offline video has no id"))?;
        let _guard = self.writes.lock().await;
        let repo = &self.repo;
        let removed = retry_on_sqlite_busy("delete offline video", || repo.delete(id)).await?;
        debug!(id, removed, "offline video deleted");
        self.publish().await;
        Ok(removed)
    }

    pub async fn update_progress(&self, id: i64, progress: i64, max_progress: i64) -> Result<()> {
        let _guard = self.writes.lock().await;
        let repo = &self.repo;
        retry_on_sqlite_busy("update download progress", || {
            repo.update_progress(id, progress, max_progress)
        })
        .await?;
        self.publish().await;
        Ok(())
    }

    pub async fn mark_downloaded(&self, id: i64, url: &str) -> Result<()> {
        let _guard = self.writes.lock().await;
        let repo = &self.repo;
        retry_on_sqlite_busy("mark downloaded", || repo.mark_downloaded(id, url)).await?;
        self.publish().await;
        Ok(())
    }

    pub async fn update_position(&self, id: i64, position_ms: i64) -> Result<()> {
        let _guard = self.writes.lock().await;
        let repo = &self.repo;
        retry_on_sqlite_busy("update watch position", || {
            repo.update_position(id, position_ms)
        })
        .await?;
        self.publish().await;
        Ok(())
    }

    async fn publish(&self) {
        match self.repo.list_all().await {
            Ok(videos) => {
                self.videos.send_replace(videos);
            }
            Err(e) => warn!(error = %e, "failed to refresh offline video list"),
        }
    }
}
