//! GraphQL response shapes.

use serde::Deserialize;

use crate::models::{BroadcastType, Channel, Game, Page, Stream, Video, parse_timestamp};

#[derive(Debug, Deserialize)]
pub struct GqlResponse<D> {
    pub data: Option<D>,
    #[serde(default)]
    pub errors: Vec<GqlErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub struct GqlErrorMessage {
    pub message: String,
}

/// Relay-style connection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<N>>,
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge<N> {
    pub cursor: Option<String>,
    pub node: Option<N>,
    pub followed_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
}

impl<N> Connection<N> {
    /// The continuation cursor is the last edge's cursor, and only when the
    /// server says another page exists.
    pub fn into_page<T>(self, mut f: impl FnMut(Edge<N>) -> Option<T>) -> Page<T> {
        let has_next = self.page_info.is_some_and(|p| p.has_next_page);
        let cursor = if has_next {
            self.edges.last().and_then(|e| e.cursor.clone())
        } else {
            None
        };
        let items = self.edges.into_iter().filter_map(&mut f).collect();
        Page::new(items, cursor)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlUser {
    pub id: String,
    pub login: String,
    pub display_name: Option<String>,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
    pub stream: Option<GqlUserStream>,
}

impl GqlUser {
    fn display_name(&self) -> String {
        self.display_name.clone().unwrap_or_else(|| self.login.clone())
    }

    pub fn into_channel(self, followed_at: Option<&str>) -> Channel {
        Channel {
            display_name: self.display_name(),
            is_live: self.stream.is_some(),
            followed_at: parse_timestamp(followed_at),
            id: self.id,
            login: self.login,
            profile_image_url: self.profile_image_url,
        }
    }

    /// A followed user is only a stream while it has one.
    pub fn into_live_stream(self) -> Option<Stream> {
        let channel_name = self.display_name();
        let stream = self.stream?;
        let (game_id, game_name) = split_game(stream.game);
        Some(Stream {
            id: stream.id,
            channel_id: self.id,
            channel_login: self.login,
            channel_name,
            title: stream.title.unwrap_or_default(),
            game_id,
            game_name,
            viewer_count: stream.viewers_count,
            started_at: parse_timestamp(stream.created_at.as_deref()),
            thumbnail_url: stream.preview_image_url,
            profile_image_url: self.profile_image_url,
            tags: Vec::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlUserStream {
    pub id: String,
    pub title: Option<String>,
    pub viewers_count: Option<u64>,
    pub created_at: Option<String>,
    #[serde(rename = "previewImageURL")]
    pub preview_image_url: Option<String>,
    pub game: Option<GqlGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlGame {
    pub id: String,
    pub display_name: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "boxArtURL")]
    pub box_art_url: Option<String>,
    pub viewers_count: Option<u64>,
}

impl From<GqlGame> for Game {
    fn from(g: GqlGame) -> Self {
        Game {
            name: g.display_name.or(g.name).unwrap_or_default(),
            id: g.id,
            box_art_url: g.box_art_url,
            viewer_count: g.viewers_count,
        }
    }
}

fn split_game(game: Option<GqlGame>) -> (Option<String>, Option<String>) {
    match game {
        Some(g) => (Some(g.id), g.display_name.or(g.name)),
        None => (None, None),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlStream {
    pub id: String,
    pub title: Option<String>,
    pub viewers_count: Option<u64>,
    pub created_at: Option<String>,
    #[serde(rename = "previewImageURL")]
    pub preview_image_url: Option<String>,
    pub broadcaster: Option<GqlUser>,
    pub game: Option<GqlGame>,
}

impl GqlStream {
    pub fn into_stream(self) -> Option<Stream> {
        let broadcaster = self.broadcaster?;
        let (game_id, game_name) = split_game(self.game);
        Some(Stream {
            channel_name: broadcaster.display_name(),
            id: self.id,
            channel_id: broadcaster.id,
            channel_login: broadcaster.login,
            title: self.title.unwrap_or_default(),
            game_id,
            game_name,
            viewer_count: self.viewers_count,
            started_at: parse_timestamp(self.created_at.as_deref()),
            thumbnail_url: self.preview_image_url,
            profile_image_url: broadcaster.profile_image_url,
            tags: Vec::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlVideo {
    pub id: String,
    pub title: Option<String>,
    #[serde(rename = "previewThumbnailURL")]
    pub preview_thumbnail_url: Option<String>,
    pub length_seconds: Option<u64>,
    pub view_count: Option<u64>,
    pub created_at: Option<String>,
    pub broadcast_type: Option<String>,
    pub owner: Option<GqlUser>,
    pub game: Option<GqlGame>,
}

impl GqlVideo {
    pub fn into_video(self) -> Option<Video> {
        let owner = self.owner?;
        let (game_id, game_name) = split_game(self.game);
        Some(Video {
            channel_name: owner.display_name(),
            id: self.id,
            channel_id: owner.id,
            channel_login: owner.login,
            title: self.title.unwrap_or_default(),
            game_id,
            game_name,
            duration_secs: self.length_seconds,
            view_count: self.view_count,
            created_at: parse_timestamp(self.created_at.as_deref()),
            thumbnail_url: self.preview_thumbnail_url,
            broadcast_type: self.broadcast_type.as_deref().and_then(BroadcastType::parse),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowedStreamsData {
    pub user: Option<FollowedLiveUsers>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowedLiveUsers {
    pub followed_live_users: Connection<GqlUser>,
}

#[derive(Debug, Deserialize)]
pub struct GameStreamsData {
    pub game: Option<StreamsField>,
}

#[derive(Debug, Deserialize)]
pub struct StreamsField {
    pub streams: Connection<GqlStream>,
}

#[derive(Debug, Deserialize)]
pub struct GameVideosData {
    pub game: Option<VideosField>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelVideosData {
    pub user: Option<VideosField>,
}

#[derive(Debug, Deserialize)]
pub struct VideosField {
    pub videos: Connection<GqlVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchChannelsData {
    pub search_users: Option<Connection<GqlUser>>,
}

#[derive(Debug, Deserialize)]
pub struct TopGamesData {
    pub games: Option<Connection<GqlGame>>,
}

#[derive(Debug, Deserialize)]
pub struct FollowedChannelsData {
    pub user: Option<FollowsField>,
}

#[derive(Debug, Deserialize)]
pub struct FollowsField {
    pub follows: Connection<GqlUser>,
}
