//! Bookmark repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::Result;
use crate::database::models::{Bookmark, BookmarkUpdate};

#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Newest first.
    async fn list_all(&self) -> Result<Vec<Bookmark>>;
    async fn get_by_video_id(&self, video_id: &str) -> Result<Option<Bookmark>>;
    async fn exists_by_video_id(&self, video_id: &str) -> Result<bool>;
    async fn insert(&self, bookmark: &Bookmark) -> Result<i64>;
    /// Returns the number of rows removed.
    async fn delete_by_video_id(&self, video_id: &str) -> Result<u64>;
    async fn update_metadata(&self, video_id: &str, update: &BookmarkUpdate) -> Result<u64>;
}

/// SQLx implementation of BookmarkRepository.
pub struct SqlxBookmarkRepository {
    pool: SqlitePool,
}

impl SqlxBookmarkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookmarkRepository for SqlxBookmarkRepository {
    async fn list_all(&self) -> Result<Vec<Bookmark>> {
        let bookmarks = sqlx::query_as::<_, Bookmark>(
            "SELECT * FROM bookmarks ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(bookmarks)
    }

    async fn get_by_video_id(&self, video_id: &str) -> Result<Option<Bookmark>> {
        let bookmark = sqlx::query_as::<_, Bookmark>(
            "SELECT * FROM bookmarks WHERE video_id = ? ORDER BY id LIMIT 1",
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bookmark)
    }

    async fn exists_by_video_id(&self, video_id: &str) -> Result<bool> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM bookmarks WHERE video_id = ?")
                .bind(video_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    async fn insert(&self, bookmark: &Bookmark) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO bookmarks (
                id, video_id, channel_id, channel_login, channel_name, channel_logo,
                game_id, game_name, title, thumbnail, video_type, duration_ms,
                upload_date, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(bookmark.id)
        .bind(&bookmark.video_id)
        .bind(&bookmark.channel_id)
        .bind(&bookmark.channel_login)
        .bind(&bookmark.channel_name)
        .bind(&bookmark.channel_logo)
        .bind(&bookmark.game_id)
        .bind(&bookmark.game_name)
        .bind(&bookmark.title)
        .bind(&bookmark.thumbnail)
        .bind(&bookmark.video_type)
        .bind(bookmark.duration_ms)
        .bind(bookmark.upload_date)
        .bind(bookmark.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn delete_by_video_id(&self, video_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE video_id = ?")
            .bind(video_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn update_metadata(&self, video_id: &str, update: &BookmarkUpdate) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookmarks SET
                title = COALESCE(?, title),
                thumbnail = COALESCE(?, thumbnail),
                channel_name = COALESCE(?, channel_name),
                channel_logo = COALESCE(?, channel_logo),
                game_id = COALESCE(?, game_id),
                game_name = COALESCE(?, game_name)
            WHERE video_id = ?
            "#,
        )
        .bind(&update.title)
        .bind(&update.thumbnail)
        .bind(&update.channel_name)
        .bind(&update.channel_logo)
        .bind(&update.game_id)
        .bind(&update.game_name)
        .bind(video_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
