//! Offline video repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::OfflineVideo;
use crate::{Error, Result};

/// Offline video repository trait.
#[async_trait]
pub trait OfflineVideoRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<OfflineVideo>;
    /// Most recent download first.
    async fn list_all(&self) -> Result<Vec<OfflineVideo>>;
    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<OfflineVideo>>;
    async fn list_pending(&self) -> Result<Vec<OfflineVideo>>;
    async fn find_by_video_id(&self, video_id: &str) -> Result<Option<OfflineVideo>>;
    /// Returns the row id, assigned by SQLite when `video.id` is `None`.
    async fn insert(&self, video: &OfflineVideo) -> Result<i64>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn update_progress(&self, id: i64, progress: i64, max_progress: i64) -> Result<()>;
    async fn mark_downloaded(&self, id: i64, url: &str) -> Result<()>;
    async fn update_position(&self, id: i64, position_ms: i64) -> Result<()>;
}

/// SQLx implementation of OfflineVideoRepository.
pub struct SqlxOfflineVideoRepository {
    pool: SqlitePool,
}

impl SqlxOfflineVideoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn check_updated(rows: u64, id: i64) -> Result<()> {
        if rows == 0 {
            return Err(Error::not_found("OfflineVideo", id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OfflineVideoRepository for SqlxOfflineVideoRepository {
    async fn get(&self, id: i64) -> Result<OfflineVideo> {
        sqlx::query_as::<_, OfflineVideo>("SELECT * FROM offline_videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("OfflineVideo", id.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<OfflineVideo>> {
        let videos = sqlx::query_as::<_, OfflineVideo>(
            "SELECT * FROM offline_videos ORDER BY download_date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<OfflineVideo>> {
        let videos = sqlx::query_as::<_, OfflineVideo>(
            "SELECT * FROM offline_videos WHERE channel_id = ? ORDER BY download_date DESC, id DESC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    async fn list_pending(&self) -> Result<Vec<OfflineVideo>> {
        let videos = sqlx::query_as::<_, OfflineVideo>(
            "SELECT * FROM offline_videos WHERE downloaded = 0 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    async fn find_by_video_id(&self, video_id: &str) -> Result<Option<OfflineVideo>> {
        let video = sqlx::query_as::<_, OfflineVideo>(
            "SELECT * FROM offline_videos WHERE video_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    async fn insert(&self, video: &OfflineVideo) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO offline_videos (
                id, video_id, url, source_url, name,
                channel_id, channel_login, channel_name, channel_logo,
                game_id, game_name, thumbnail, vod, downloaded,
                progress, max_progress, duration_ms, last_watch_position_ms,
                upload_date, download_date
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(video.id)
        .bind(&video.video_id)
        .bind(&video.url)
        .bind(&video.source_url)
        .bind(&video.name)
        .bind(&video.channel_id)
        .bind(&video.channel_login)
        .bind(&video.channel_name)
        .bind(&video.channel_logo)
        .bind(&video.game_id)
        .bind(&video.game_name)
        .bind(&video.thumbnail)
        .bind(video.vod)
        .bind(video.downloaded)
        .bind(video.progress)
        .bind(video.max_progress)
        .bind(video.duration_ms)
        .bind(video.last_watch_position_ms)
        .bind(video.upload_date)
        .bind(video.download_date)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM offline_videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_progress(&self, id: i64, progress: i64, max_progress: i64) -> Result<()> {
        let result =
            sqlx::query("UPDATE offline_videos SET progress = ?, max_progress = ? WHERE id = ?")
                .bind(progress)
                .bind(max_progress)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Self::check_updated(result.rows_affected(), id)
    }

    async fn mark_downloaded(&self, id: i64, url: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE offline_videos SET
                downloaded = 1,
                url = ?,
                progress = max_progress
            WHERE id = ?
            "#,
        )
        .bind(url)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Self::check_updated(result.rows_affected(), id)
    }

    async fn update_position(&self, id: i64, position_ms: i64) -> Result<()> {
        let result = sqlx::query("UPDATE offline_videos SET last_watch_position_ms = ? WHERE id = ?")
            .bind(position_ms)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Self::check_updated(result.rows_affected(), id)
    }
}
