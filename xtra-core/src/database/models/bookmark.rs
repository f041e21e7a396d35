//! Bookmark database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use xtra_sources::{BroadcastType, Video};

use crate::database::time::{now_ms, to_ms};

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Option<i64>,
    pub video_id: String,
    pub channel_id: Option<String>,
    pub channel_login: Option<String>,
    pub channel_name: Option<String>,
    pub channel_logo: Option<String>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    /// archive, highlight or upload
    pub video_type: Option<String>,
    pub duration_ms: Option<i64>,
    pub upload_date: Option<i64>,
    pub created_at: i64,
}

impl Bookmark {
    /// Snapshot of a listed video, stamped with the current time.
    pub fn from_video(video: &Video, channel_logo: Option<String>) -> Self {
        Self {
            id: None,
            video_id: video.id.clone(),
            channel_id: Some(video.channel_id.clone()),
            channel_login: Some(video.channel_login.clone()),
            channel_name: Some(video.channel_name.clone()),
            channel_logo,
            game_id: video.game_id.clone(),
            game_name: video.game_name.clone(),
            title: Some(video.title.clone()),
            thumbnail: video.thumbnail_url.clone(),
            video_type: video.broadcast_type.and_then(|t| match t {
                BroadcastType::All => None,
                other => Some(other.helix().to_string()),
            }),
            duration_ms: video.duration_secs.map(|s| s as i64 * 1000),
            upload_date: video.created_at.map(to_ms),
            created_at: now_ms(),
        }
    }
}

/// Metadata refreshed from the provider after the bookmark was created.
/// `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkUpdate {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub channel_name: Option<String>,
    pub channel_logo: Option<String>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
}
