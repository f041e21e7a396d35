//! Offline video database model.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One catalog entry: a downloaded or queued video.
///
/// Channel and game fields are copied in when the download is created and
/// never refreshed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OfflineVideo {
    /// Assigned on insert when `None`.
    pub id: Option<i64>,
    pub video_id: Option<String>,
    /// Local path: the playlist for VODs, the media file for clips.
    pub url: String,
    pub source_url: Option<String>,
    pub name: Option<String>,
    pub channel_id: Option<String>,
    pub channel_login: Option<String>,
    pub channel_name: Option<String>,
    pub channel_logo: Option<String>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub thumbnail: Option<String>,
    /// Multi-segment playlist when true, single file when false.
    pub vod: bool,
    pub downloaded: bool,
    pub progress: i64,
    pub max_progress: i64,
    pub duration_ms: Option<i64>,
    pub last_watch_position_ms: Option<i64>,
    pub upload_date: Option<i64>,
    pub download_date: Option<i64>,
}

impl OfflineVideo {
    pub fn path(&self) -> &Path {
        Path::new(&self.url)
    }

    /// Directory holding the playlist and its segments.
    pub fn directory(&self) -> Option<PathBuf> {
        self.path().parent().map(Path::to_path_buf)
    }

    /// Completed fraction in `0.0..=1.0`.
    pub fn progress_ratio(&self) -> f64 {
        if self.downloaded {
            return 1.0;
        }
        if self.max_progress <= 0 {
            return 0.0;
        }
        (self.progress as f64 / self.max_progress as f64).clamp(0.0, 1.0)
    }
}
