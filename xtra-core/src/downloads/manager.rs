//! Download lifecycle: catalog rows, queue hand-off and on-disk cleanup.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xtra_sources::Video;

use super::playlist;
use super::queue::{FetchJob, FetchQueue};
use crate::database::models::OfflineVideo;
use crate::database::time::{now_ms, to_ms};
use crate::store::OfflineVideoStore;
use crate::utils::fs::{self, RemoveRetry, Removed};
use crate::{Error, Result};

/// File name of the playlist inside a VOD download directory.
pub const PLAYLIST_FILE: &str = "playlist.m3u8";

/// Everything needed to start a download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub source_url: String,
    pub vod: bool,
    pub video_id: Option<String>,
    pub name: Option<String>,
    pub channel_id: Option<String>,
    pub channel_login: Option<String>,
    pub channel_name: Option<String>,
    pub channel_logo: Option<String>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub thumbnail: Option<String>,
    pub duration_ms: Option<i64>,
    pub upload_date: Option<i64>,
}

impl DownloadRequest {
    pub fn from_video(video: &Video, source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            vod: true,
            video_id: Some(video.id.clone()),
            name: Some(video.title.clone()),
            channel_id: Some(video.channel_id.clone()),
            channel_login: Some(video.channel_login.clone()),
            channel_name: Some(video.channel_name.clone()),
            channel_logo: None,
            game_id: video.game_id.clone(),
            game_name: video.game_name.clone(),
            thumbnail: video.thumbnail_url.clone(),
            duration_ms: video.duration_secs.map(|s| s as i64 * 1000),
            upload_date: video.created_at.map(to_ms),
        }
    }

    fn into_video(self, url: String) -> OfflineVideo {
        OfflineVideo {
            id: None,
            video_id: self.video_id,
            url,
            source_url: Some(self.source_url),
            name: self.name,
            channel_id: self.channel_id,
            channel_login: self.channel_login,
            channel_name: self.channel_name,
            channel_logo: self.channel_logo,
            game_id: self.game_id,
            game_name: self.game_name,
            thumbnail: self.thumbnail,
            vod: self.vod,
            downloaded: false,
            progress: 0,
            max_progress: 0,
            duration_ms: self.duration_ms,
            last_watch_position_ms: None,
            upload_date: self.upload_date,
            download_date: Some(now_ms()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub error: String,
}

/// What a delete did on disk. Failures are reported here, never as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    /// Paths that were already gone.
    pub missing: Vec<PathBuf>,
    pub failures: Vec<CleanupFailure>,
    pub directory_removed: bool,
    /// Whether a pending fetch job was cancelled.
    pub dequeued: bool,
    pub queue_error: Option<String>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.queue_error.is_none()
    }

    fn fail(&mut self, path: &Path, error: impl ToString) {
        let error = error.to_string();
        warn!(path = %path.display(), %error, "cleanup failed");
        self.failures.push(CleanupFailure {
            path: path.to_path_buf(),
            error,
        });
    }

    async fn remove_file(&mut self, path: &Path, retry: RemoveRetry) {
        match fs::remove_file_with_retry(path, retry).await {
            Ok(Removed::Deleted) => self.removed.push(path.to_path_buf()),
            Ok(Removed::Missing) => self.missing.push(path.to_path_buf()),
            Err(e) => self.fail(path, e),
        }
    }
}

pub struct DownloadManager {
    store: Arc<OfflineVideoStore>,
    queue: Arc<dyn FetchQueue>,
    download_dir: PathBuf,
    retry: RemoveRetry,
}

impl DownloadManager {
    pub fn new(
        store: Arc<OfflineVideoStore>,
        queue: Arc<dyn FetchQueue>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            queue,
            download_dir: download_dir.into(),
            retry: RemoveRetry::default(),
        }
    }

    pub fn with_remove_retry(mut self, retry: RemoveRetry) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &Arc<OfflineVideoStore> {
        &self.store
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Local path a new download of `request` is written to.
    fn target_path(&self, request: &DownloadRequest) -> PathBuf {
        let stem = format!(
            "{}_{}",
            sanitize(request.video_id.as_deref().unwrap_or("capture")),
            now_ms()
        );
        if request.vod {
            self.download_dir.join(stem).join(PLAYLIST_FILE)
        } else {
            self.download_dir.join(format!("{stem}.mp4"))
        }
    }

    /// Record a new download and hand it to the fetch queue.
    pub async fn enqueue(&self, request: DownloadRequest) -> Result<OfflineVideo> {
        if request.source_url.trim().is_empty() {
            return Err(Error::validation("download source URL is empty"));
        }
        let target = self.target_path(&request);
        if let Some(parent) = target.parent() {
            fs::ensure_dir_all(parent).await?;
        }

        let source_url = request.source_url.clone();
        let mut video = request.into_video(target.to_string_lossy().into_owned());
        let id = self.store.insert(&video).await?;
        video.id = Some(id);

        let job = FetchJob {
            id,
            source_url,
            target,
            vod: video.vod,
        };
        if let Err(e) = self.queue.submit(job).await {
            warn!(id, error = %e, "failed to queue download, discarding row");
            self.store.delete(&video).await?;
            return Err(e);
        }
        info!(id, video_id = ?video.video_id, vod = video.vod, "download queued");
        Ok(video)
    }

    /// Hand every unfinished download back to the queue, e.g. after a restart.
    /// Rows without a source URL cannot be resumed and are skipped.
    pub async fn resume_pending(&self) -> Result<usize> {
        let mut resumed = 0;
        for video in self.store.list_pending().await? {
            let (Some(id), Some(source_url)) = (video.id, video.source_url.clone()) else {
                continue;
            };
            self.queue
                .submit(FetchJob {
                    id,
                    source_url,
                    target: PathBuf::from(&video.url),
                    vod: video.vod,
                })
                .await?;
            resumed += 1;
        }
        if resumed > 0 {
            info!(count = resumed, "resumed pending downloads");
        }
        Ok(resumed)
    }

    pub async fn report_progress(&self, id: i64, progress: i64, max_progress: i64) -> Result<()> {
        self.store.update_progress(id, progress, max_progress).await
    }

    /// Mark the download finished, with the final local path.
    pub async fn complete(&self, id: i64, url: &str) -> Result<()> {
        self.store.mark_downloaded(id, url).await?;
        info!(id, url, "download completed");
        Ok(())
    }

    /// Delete a download: the catalog row first, then its files.
    ///
    /// The whole sequence runs on its own task, so it finishes even if the
    /// caller stops waiting. File errors end up in the report and never undo
    /// the row deletion.
    pub async fn delete(&self, video: &OfflineVideo) -> Result<CleanupReport> {
        let id = video
            .id
            .ok_or_else(|| Error::validation("offline video has no id"))?;
        let store = Arc::clone(&self.store);
        let queue = Arc::clone(&self.queue);
        let video = video.clone();
        let retry = self.retry;

        let task = tokio::spawn(async move {
            delete_download(&store, queue.as_ref(), &video, id, retry).await
        });
        task.await
            .map_err(|e| Error::Other(format!("delete task failed: {e}")))?
    }
}

async fn delete_download(
    store: &OfflineVideoStore,
    queue: &dyn FetchQueue,
    video: &OfflineVideo,
    id: i64,
    retry: RemoveRetry,
) -> Result<CleanupReport> {
    if !store.delete(video).await? {
        debug!(id, "catalog row already gone");
    }

    if !video.downloaded {
        let mut report = CleanupReport::default();
        match queue.remove(id).await {
            Ok(dequeued) => report.dequeued = dequeued,
            Err(e) => {
                warn!(id, error = %e, "failed to cancel queued download");
                report.queue_error = Some(e.to_string());
            }
        }
        return Ok(report);
    }

    let report = cleanup_files(video, retry).await;
    if report.is_clean() {
        debug!(id, removed = report.removed.len(), "download files removed");
    } else {
        warn!(
            id,
            failures = report.failures.len(),
            "download deleted with leftover files"
        );
    }
    Ok(report)
}

async fn cleanup_files(video: &OfflineVideo, retry: RemoveRetry) -> CleanupReport {
    let mut report = CleanupReport::default();
    let path = video.path();

    if !video.vod {
        report.remove_file(path, retry).await;
        return report;
    }

    match playlist::read_segment_files(path).await {
        Ok(segments) => {
            for segment in &segments {
                report.remove_file(segment, retry).await;
            }
        }
        Err(e) if e.io_kind() == Some(ErrorKind::NotFound) => {
            debug!(path = %path.display(), "playlist already gone");
            report.missing.push(path.to_path_buf());
            return report;
        }
        Err(e) => report.fail(path, e),
    }

    let Some(dir) = video.directory() else {
        report.remove_file(path, retry).await;
        return report;
    };

    match fs::count_entries(&dir, 1).await {
        // Only the playlist is left.
        Ok(1) => {
            report.remove_file(path, retry).await;
            match fs::remove_dir(&dir).await {
                Ok(Removed::Deleted) => report.directory_removed = true,
                Ok(Removed::Missing) => {}
                Err(e) => report.fail(&dir, e),
            }
        }
        Ok(_) => report.remove_file(path, retry).await,
        Err(e) => {
            report.fail(&dir, e);
            report.remove_file(path, retry).await;
        }
    }
    report
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("12345"), "12345");
        assert_eq!(sanitize("../a b"), "___a_b");
    }

    #[tokio::test]
    async fn test_cleanup_clip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.mp4");
        tokio::fs::write(&file, b"x").await.unwrap();
        let video = OfflineVideo {
            id: Some(1),
            url: file.to_string_lossy().into_owned(),
            vod: false,
            downloaded: true,
            ..Default::default()
        };

        let report = cleanup_files(&video, RemoveRetry::default()).await;
        assert_eq!(report.removed, vec![file.clone()]);
        assert!(!file.exists());
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_cleanup_missing_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let video = OfflineVideo {
            url: dir
                .path()
                .join("gone")
                .join(PLAYLIST_FILE)
                .to_string_lossy()
                .into_owned(),
            vod: true,
            downloaded: true,
            ..Default::default()
        };
        let report = cleanup_files(&video, RemoveRetry::default()).await;
        assert!(report.is_clean());
        assert_eq!(report.missing.len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_unparseable_playlist_still_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let vod_dir = dir.path().join("vod");
        tokio::fs::create_dir(&vod_dir).await.unwrap();
        let playlist = vod_dir.join(PLAYLIST_FILE);
        tokio::fs::write(&playlist, b"not a playlist").await.unwrap();
        let video = OfflineVideo {
            url: playlist.to_string_lossy().into_owned(),
            vod: true,
            downloaded: true,
            ..Default::default()
        };

        let report = cleanup_files(&video, RemoveRetry::default()).await;
        assert_eq!(report.failures.len(), 1);
        assert!(!playlist.exists());
        assert!(report.directory_removed);
    }
}
