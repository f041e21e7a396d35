//! Integration tests for the offline core.
//!
//! Database tests run against in-memory SQLite with the real migrations;
//! file cleanup runs against temporary directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use xtra_core::Result;
use xtra_core::database::models::{Bookmark, OfflineVideo};
use xtra_core::database::repositories::{
    OfflineVideoRepository, SqlxBookmarkRepository, SqlxOfflineVideoRepository,
};
use xtra_core::database::{DbPool, init_pool_with_size, run_migrations};
use xtra_core::downloads::{DownloadManager, DownloadRequest, FetchJob, FetchQueue, PLAYLIST_FILE};
use xtra_core::store::{BookmarkStore, OfflineVideoStore};

/// Helper to create a test database pool with migrations applied.
async fn setup_test_db() -> DbPool {
    let pool = init_pool_with_size("sqlite::memory:", 1)
        .await
        .expect("Failed to create test pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Queue that records every call.
#[derive(Default)]
struct RecordingQueue {
    submitted: Mutex<Vec<FetchJob>>,
    removed: Mutex<Vec<i64>>,
}

#[async_trait]
impl FetchQueue for RecordingQueue {
    async fn submit(&self, job: FetchJob) -> Result<()> {
        self.submitted.lock().push(job);
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<bool> {
        self.removed.lock().push(id);
        Ok(true)
    }
}

struct Fixture {
    store: Arc<OfflineVideoStore>,
    queue: Arc<RecordingQueue>,
    manager: DownloadManager,
    dir: tempfile::TempDir,
}

async fn fixture() -> Fixture {
    let pool = setup_test_db().await;
    let store = Arc::new(
        OfflineVideoStore::open(Arc::new(SqlxOfflineVideoRepository::new(pool)))
            .await
            .unwrap(),
    );
    let queue = Arc::new(RecordingQueue::default());
    let dir = tempfile::tempdir().unwrap();
    let manager = DownloadManager::new(store.clone(), queue.clone(), dir.path());
    Fixture {
        store,
        queue,
        manager,
        dir,
    }
}

async fn write(path: &Path) {
    tokio::fs::write(path, b"data").await.unwrap();
}

/// Write a VOD directory holding a playlist over `segments`, returning the playlist path.
async fn write_vod(dir: &Path, segments: &[&str]) -> PathBuf {
    tokio::fs::create_dir_all(dir).await.unwrap();
    let mut playlist =
        String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n#EXT-X-MEDIA-SEQUENCE:0\n");
    for segment in segments {
        playlist.push_str(&format!("#EXTINF:10.0,\n{segment}\n"));
        let path = Path::new(segment);
        if path.is_absolute() {
            write(path).await;
        } else {
            write(&dir.join(segment)).await;
        }
    }
    playlist.push_str("#EXT-X-ENDLIST\n");
    let path = dir.join(PLAYLIST_FILE);
    tokio::fs::write(&path, playlist).await.unwrap();
    path
}

async fn insert_downloaded(store: &OfflineVideoStore, url: &Path, vod: bool) -> OfflineVideo {
    let mut video = OfflineVideo {
        video_id: Some("v1".into()),
        url: url.to_string_lossy().into_owned(),
        vod,
        downloaded: true,
        download_date: Some(1),
        ..Default::default()
    };
    video.id = Some(store.insert(&video).await.unwrap());
    video
}

mod download_delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_vod_removes_segments_playlist_and_directory() {
        let f = fixture().await;
        let vod_dir = f.dir.path().join("v1");
        let playlist = write_vod(&vod_dir, &["0.ts", "1.ts", "2.ts"]).await;
        let video = insert_downloaded(&f.store, &playlist, true).await;

        let report = f.manager.delete(&video).await.unwrap();

        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.removed.len(), 4);
        assert!(report.directory_removed);
        assert!(!vod_dir.exists());
        assert!(f.store.snapshot().is_empty());
        assert!(f.queue.removed.lock().is_empty());
    }

    #[tokio::test]
    async fn test_delete_vod_keeps_directory_with_unrelated_files() {
        let f = fixture().await;
        let vod_dir = f.dir.path().join("v1");
        let playlist = write_vod(&vod_dir, &["0.ts", "1.ts"]).await;
        let keep_a = vod_dir.join("chat.json");
        let keep_b = vod_dir.join("thumbnail.jpg");
        write(&keep_a).await;
        write(&keep_b).await;
        let video = insert_downloaded(&f.store, &playlist, true).await;

        let report = f.manager.delete(&video).await.unwrap();

        assert!(report.is_clean());
        assert!(!report.directory_removed);
        assert!(vod_dir.exists());
        assert!(keep_a.exists());
        assert!(keep_b.exists());
        assert!(!playlist.exists());
        assert!(!vod_dir.join("0.ts").exists());
    }

    #[tokio::test]
    async fn test_delete_vod_with_absolute_segment_paths() {
        let f = fixture().await;
        let vod_dir = f.dir.path().join("v1");
        let absolute = f.dir.path().join("elsewhere.ts");
        let absolute_str = absolute.to_string_lossy().into_owned();
        let playlist = write_vod(&vod_dir, &["0.ts", absolute_str.as_str()]).await;
        let video = insert_downloaded(&f.store, &playlist, true).await;

        let report = f.manager.delete(&video).await.unwrap();

        assert!(report.is_clean());
        assert!(!absolute.exists());
        assert!(!vod_dir.exists());
    }

    #[tokio::test]
    async fn test_missing_segments_are_benign() {
        let f = fixture().await;
        let vod_dir = f.dir.path().join("v1");
        let playlist = write_vod(&vod_dir, &["0.ts", "1.ts"]).await;
        tokio::fs::remove_file(vod_dir.join("1.ts")).await.unwrap();
        let video = insert_downloaded(&f.store, &playlist, true).await;

        let report = f.manager.delete(&video).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(report.missing, vec![vod_dir.join("1.ts")]);
        assert!(!vod_dir.exists());
    }

    #[tokio::test]
    async fn test_delete_clip_removes_only_the_file() {
        let f = fixture().await;
        let clip = f.dir.path().join("clip.mp4");
        let neighbour = f.dir.path().join("other.mp4");
        write(&clip).await;
        write(&neighbour).await;
        let video = insert_downloaded(&f.store, &clip, false).await;

        let report = f.manager.delete(&video).await.unwrap();

        assert_eq!(report.removed, vec![clip.clone()]);
        assert!(!clip.exists());
        assert!(neighbour.exists());
        assert!(f.dir.path().exists());
    }

    #[tokio::test]
    async fn test_delete_not_downloaded_only_dequeues() {
        let f = fixture().await;
        let vod_dir = f.dir.path().join("v1");
        let playlist = write_vod(&vod_dir, &["0.ts"]).await;
        let mut video = insert_downloaded(&f.store, &playlist, true).await;
        video.downloaded = false;

        let report = f.manager.delete(&video).await.unwrap();

        assert_eq!(*f.queue.removed.lock(), vec![video.id.unwrap()]);
        assert!(report.dequeued);
        assert!(report.removed.is_empty());
        assert!(playlist.exists());
        assert!(vod_dir.join("0.ts").exists());
        assert!(f.store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_row_is_gone_even_when_files_fail() {
        let f = fixture().await;
        let vod_dir = f.dir.path().join("v1");
        tokio::fs::create_dir_all(&vod_dir).await.unwrap();
        let playlist = vod_dir.join(PLAYLIST_FILE);
        tokio::fs::write(&playlist, b"garbage").await.unwrap();
        let video = insert_downloaded(&f.store, &playlist, true).await;

        let report = f.manager.delete(&video).await.unwrap();

        assert!(!report.is_clean());
        assert!(f.store.snapshot().is_empty());
        assert!(f.store.get(video.id.unwrap()).await.is_err());
    }

    /// Repository whose catalog reads stall once armed.
    struct SlowListRepo {
        inner: SqlxOfflineVideoRepository,
        armed: AtomicBool,
    }

    #[async_trait]
    impl OfflineVideoRepository for SlowListRepo {
        async fn get(&self, id: i64) -> Result<OfflineVideo> {
            self.inner.get(id).await
        }
        async fn list_all(&self) -> Result<Vec<OfflineVideo>> {
            if self.armed.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            self.inner.list_all().await
        }
        async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<OfflineVideo>> {
            self.inner.list_by_channel(channel_id).await
        }
        async fn list_pending(&self) -> Result<Vec<OfflineVideo>> {
            self.inner.list_pending().await
        }
        async fn find_by_video_id(&self, video_id: &str) -> Result<Option<OfflineVideo>> {
            self.inner.find_by_video_id(video_id).await
        }
        async fn insert(&self, video: &OfflineVideo) -> Result<i64> {
            self.inner.insert(video).await
        }
        async fn delete(&self, id: i64) -> Result<bool> {
            self.inner.delete(id).await
        }
        async fn update_progress(&self, id: i64, progress: i64, max_progress: i64) -> Result<()> {
            self.inner.update_progress(id, progress, max_progress).await
        }
        async fn mark_downloaded(&self, id: i64, url: &str) -> Result<()> {
            self.inner.mark_downloaded(id, url).await
        }
        async fn update_position(&self, id: i64, position_ms: i64) -> Result<()> {
            self.inner.update_position(id, position_ms).await
        }
    }

    #[tokio::test]
    async fn test_delete_finishes_after_caller_gives_up() {
        let repo = Arc::new(SlowListRepo {
            inner: SqlxOfflineVideoRepository::new(setup_test_db().await),
            armed: AtomicBool::new(false),
        });
        let store = Arc::new(OfflineVideoStore::open(repo.clone()).await.unwrap());
        let queue = Arc::new(RecordingQueue::default());
        let dir = tempfile::tempdir().unwrap();
        let manager = DownloadManager::new(store.clone(), queue, dir.path());

        let vod_dir = dir.path().join("v1");
        let playlist = write_vod(&vod_dir, &["0.ts", "1.ts"]).await;
        let video = insert_downloaded(&store, &playlist, true).await;
        repo.armed.store(true, Ordering::SeqCst);

        let outcome = tokio::time::timeout(Duration::from_millis(50), manager.delete(&video)).await;
        assert!(outcome.is_err(), "delete should still be running");

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while vod_dir.exists() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(!playlist.exists());
        assert!(!vod_dir.join("0.ts").exists());
        assert!(!vod_dir.exists());
        assert!(repo.inner.get(video.id.unwrap()).await.is_err());
    }
}

mod download_lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_progress_complete() {
        let f = fixture().await;
        let request = DownloadRequest {
            source_url: "https://vod.example/index.m3u8".into(),
            vod: true,
            video_id: Some("12345".into()),
            name: Some("Title".into()),
            channel_id: Some("c1".into()),
            ..Default::default()
        };

        let video = f.manager.enqueue(request).await.unwrap();
        let id = video.id.unwrap();
        assert!(!video.downloaded);
        assert!(video.url.ends_with(PLAYLIST_FILE));
        assert!(Path::new(&video.url).parent().unwrap().is_dir());

        {
            let jobs = f.queue.submitted.lock();
            assert_eq!(jobs.len(), 1);
            assert_eq!(jobs[0].id, id);
            assert_eq!(jobs[0].source_url, "https://vod.example/index.m3u8");
        }

        f.manager.report_progress(id, 4, 8).await.unwrap();
        assert_eq!(f.store.get(id).await.unwrap().progress, 4);

        f.manager.complete(id, &video.url).await.unwrap();
        let stored = f.store.get(id).await.unwrap();
        assert!(stored.downloaded);
        assert_eq!(stored.progress, 8);
    }

    #[tokio::test]
    async fn test_enqueue_rejects_empty_source() {
        let f = fixture().await;
        let err = f
            .manager
            .enqueue(DownloadRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, xtra_core::Error::Validation(_)));
        assert!(f.store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_resume_pending() {
        let f = fixture().await;
        let request = DownloadRequest {
            source_url: "https://clips.example/clip.mp4".into(),
            vod: false,
            ..Default::default()
        };
        let video = f.manager.enqueue(request).await.unwrap();
        f.queue.submitted.lock().clear();

        assert_eq!(f.manager.resume_pending().await.unwrap(), 1);
        assert_eq!(f.queue.submitted.lock()[0].id, video.id.unwrap());
    }
}

mod bookmark_tests {
    use super::*;

    #[tokio::test]
    async fn test_exists_by_video_id_after_insert_and_delete() {
        let pool = setup_test_db().await;
        let store = BookmarkStore::open(Arc::new(SqlxBookmarkRepository::new(pool)))
            .await
            .unwrap();
        let bookmark = Bookmark {
            video_id: "v42".into(),
            created_at: 1,
            ..Default::default()
        };

        store.insert(&bookmark).await.unwrap();
        assert!(store.exists_by_video_id("v42").await.unwrap());
        assert!(store.exists_by_video_id("v42").await.unwrap());

        store.delete_by_video_id("v42").await.unwrap();
        assert!(!store.exists_by_video_id("v42").await.unwrap());
    }
}

mod paging_tests {
    use xtra_core::paging::{
        ApiPref, ApiProvider, PageCursor, PageError, PageFetcher, PagedDataSource, Pager,
    };
    use xtra_sources::{Page, SourceError};

    use super::*;

    /// A rate-limits every call, B serves two pages.
    struct RateLimitedA;

    #[async_trait]
    impl PageFetcher for RateLimitedA {
        type Item = &'static str;

        async fn fetch(
            &self,
            provider: ApiProvider,
            cursor: Option<&str>,
            _limit: u32,
        ) -> std::result::Result<Page<&'static str>, SourceError> {
            match (provider, cursor) {
                (ApiProvider::Gql, _) => Err(SourceError::RateLimited { retry_after: None }),
                (ApiProvider::Helix, None) => Ok(Page::new(vec!["x", "y"], Some("next1".into()))),
                (ApiProvider::Helix, Some("next1")) => Ok(Page::new(vec!["z"], None)),
                (ApiProvider::Helix, Some(other)) => {
                    Err(SourceError::InvalidResponse(format!("unknown cursor {other}")))
                }
            }
        }
    }

    fn source() -> Arc<PagedDataSource<RateLimitedA>> {
        Arc::new(PagedDataSource::new(
            RateLimitedA,
            ApiPref::new([ApiProvider::Gql, ApiProvider::Helix]),
        ))
    }

    #[tokio::test]
    async fn test_rate_limited_first_provider_falls_back() {
        let page = source().load_page(None).await.unwrap();
        assert_eq!(page.items, vec!["x", "y"]);
        assert_eq!(page.provider, ApiProvider::Helix);
        assert_eq!(page.next, Some(PageCursor::new(ApiProvider::Helix, "next1")));
    }

    #[tokio::test]
    async fn test_pager_yields_pages_in_order() {
        let mut pager = Pager::new(source());
        let mut items = Vec::new();
        while let Some(page) = pager.next_page().await.unwrap() {
            items.extend(page.items);
        }
        assert_eq!(items, vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_all_providers_failing_is_retryable() {
        let source = PagedDataSource::new(RateLimitedA, ApiPref::new([ApiProvider::Gql]));
        let err = source.load_page(None).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            err.causes(),
            [(ApiProvider::Gql, SourceError::RateLimited { .. })]
        ));
        assert!(matches!(err, PageError::AllProvidersFailed(_)));
    }
}
