//! Helix response shapes.

use serde::Deserialize;

use crate::models::{
    BroadcastType, Channel, Game, Page, Stream, Video, parse_helix_duration, parse_timestamp,
};

#[derive(Debug, Deserialize)]
pub struct HelixResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub cursor: Option<String>,
}

impl<T> HelixResponse<T> {
    pub fn into_page<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        let cursor = self.pagination.and_then(|p| p.cursor);
        Page::new(self.data.into_iter().map(f).collect(), cursor)
    }
}

#[derive(Debug, Deserialize)]
pub struct HelixStream {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub title: String,
    pub viewer_count: Option<u64>,
    pub started_at: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl From<HelixStream> for Stream {
    fn from(s: HelixStream) -> Self {
        Stream {
            id: s.id,
            channel_id: s.user_id,
            channel_login: s.user_login,
            channel_name: s.user_name,
            title: s.title,
            game_id: non_empty(s.game_id),
            game_name: non_empty(s.game_name),
            viewer_count: s.viewer_count,
            started_at: parse_timestamp(s.started_at.as_deref()),
            thumbnail_url: s.thumbnail_url,
            profile_image_url: None,
            tags: s.tags.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HelixVideo {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub title: String,
    pub created_at: Option<String>,
    pub thumbnail_url: Option<String>,
    pub view_count: Option<u64>,
    pub duration: Option<String>,
    #[serde(rename = "type")]
    pub video_type: Option<String>,
}

impl HelixVideo {
    /// Helix videos carry no game; the caller supplies the one it filtered by.
    pub fn into_video(self, game_id: Option<&str>) -> Video {
        Video {
            id: self.id,
            channel_id: self.user_id,
            channel_login: self.user_login,
            channel_name: self.user_name,
            title: self.title,
            game_id: game_id.map(str::to_string),
            game_name: None,
            duration_secs: self.duration.as_deref().and_then(parse_helix_duration),
            view_count: self.view_count,
            created_at: parse_timestamp(self.created_at.as_deref()),
            thumbnail_url: self.thumbnail_url.and_then(non_empty),
            broadcast_type: self.video_type.as_deref().and_then(BroadcastType::parse),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HelixSearchChannel {
    pub id: String,
    pub broadcaster_login: String,
    pub display_name: String,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_live: bool,
}

impl From<HelixSearchChannel> for Channel {
    fn from(c: HelixSearchChannel) -> Self {
        Channel {
            id: c.id,
            login: c.broadcaster_login,
            display_name: c.display_name,
            profile_image_url: c.thumbnail_url.and_then(non_empty),
            is_live: c.is_live,
            followed_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HelixGame {
    pub id: String,
    pub name: String,
    pub box_art_url: Option<String>,
}

impl From<HelixGame> for Game {
    fn from(g: HelixGame) -> Self {
        Game {
            id: g.id,
            name: g.name,
            box_art_url: g.box_art_url,
            viewer_count: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HelixFollowedChannel {
    pub broadcaster_id: String,
    pub broadcaster_login: String,
    pub broadcaster_name: String,
    pub followed_at: Option<String>,
}

impl From<HelixFollowedChannel> for Channel {
    fn from(c: HelixFollowedChannel) -> Self {
        Channel {
            id: c.broadcaster_id,
            login: c.broadcaster_login,
            display_name: c.broadcaster_name,
            profile_image_url: None,
            is_live: false,
            followed_at: parse_timestamp(c.followed_at.as_deref()),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
