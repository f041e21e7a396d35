//! Twitch Helix REST client.

pub mod models;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::SourceError;
use crate::models::{BroadcastType, Channel, Game, Page, Stream, Video, VideoPeriod, VideoSort};
use crate::session::Session;

use models::{
    HelixFollowedChannel, HelixGame, HelixResponse, HelixSearchChannel, HelixStream, HelixVideo,
};

/// Helix caps `first` at 100.
const MAX_PAGE_SIZE: u32 = 100;

/// Filters shared by the two video listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoFilter {
    pub sort: VideoSort,
    pub period: VideoPeriod,
    pub broadcast_type: BroadcastType,
}

pub struct HelixApi {
    api: ApiClient,
    has_token: bool,
}

impl HelixApi {
    pub const BASE_URL: &str = "https://api.twitch.tv/helix";

    pub fn new(client: Client, session: &Session) -> Self {
        Self::with_base_url(Self::BASE_URL, client, session)
    }

    pub fn with_base_url(base_url: impl Into<String>, client: Client, session: &Session) -> Self {
        let mut api = ApiClient::new("helix", base_url, client);
        api.add_header_str("Client-Id", &session.helix_client_id);
        if let Some(token) = session.helix_token.as_deref() {
            api.add_header_typed(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        Self {
            api,
            has_token: session.helix_token.is_some(),
        }
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        mut query: Vec<(&'static str, String)>,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<HelixResponse<T>, SourceError> {
        // Every Helix endpoint needs an app or user token.
        if !self.has_token {
            return Err(SourceError::MissingToken("helix"));
        }

        query.push(("first", limit.clamp(1, MAX_PAGE_SIZE).to_string()));
        if let Some(cursor) = cursor {
            query.push(("after", cursor.to_string()));
        }
        debug!(path, ?cursor, "helix request");

        self.api.send_json(self.api.get(path).query(&query)).await
    }

    pub async fn followed_streams(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Stream>, SourceError> {
        let response: HelixResponse<HelixStream> = self
            .get_page(
                "streams/followed",
                vec![("user_id", user_id.to_string())],
                cursor,
                limit,
            )
            .await?;
        Ok(response.into_page(Stream::from))
    }

    pub async fn game_streams(
        &self,
        game_id: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Stream>, SourceError> {
        let response: HelixResponse<HelixStream> = self
            .get_page("streams", vec![("game_id", game_id.to_string())], cursor, limit)
            .await?;
        Ok(response.into_page(Stream::from))
    }

    pub async fn game_videos(
        &self,
        game_id: &str,
        filter: VideoFilter,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Video>, SourceError> {
        let mut query = video_query(filter);
        query.push(("game_id", game_id.to_string()));
        let response: HelixResponse<HelixVideo> =
            self.get_page("videos", query, cursor, limit).await?;
        Ok(response.into_page(|v| v.into_video(Some(game_id))))
    }

    pub async fn channel_videos(
        &self,
        channel_id: &str,
        filter: VideoFilter,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Video>, SourceError> {
        let mut query = video_query(filter);
        query.push(("user_id", channel_id.to_string()));
        let response: HelixResponse<HelixVideo> =
            self.get_page("videos", query, cursor, limit).await?;
        Ok(response.into_page(|v| v.into_video(None)))
    }

    pub async fn search_channels(
        &self,
        search: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Channel>, SourceError> {
        let response: HelixResponse<HelixSearchChannel> = self
            .get_page(
                "search/channels",
                vec![("query", search.to_string())],
                cursor,
                limit,
            )
            .await?;
        Ok(response.into_page(Channel::from))
    }

    pub async fn top_games(
        &self,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Game>, SourceError> {
        let response: HelixResponse<HelixGame> =
            self.get_page("games/top", Vec::new(), cursor, limit).await?;
        Ok(response.into_page(Game::from))
    }

    pub async fn followed_channels(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Channel>, SourceError> {
        let response: HelixResponse<HelixFollowedChannel> = self
            .get_page(
                "channels/followed",
                vec![("user_id", user_id.to_string())],
                cursor,
                limit,
            )
            .await?;
        Ok(response.into_page(Channel::from))
    }
}

fn video_query(filter: VideoFilter) -> Vec<(&'static str, String)> {
    vec![
        ("sort", filter.sort.helix().to_string()),
        ("period", filter.period.helix().to_string()),
        ("type", filter.broadcast_type.helix().to_string()),
    ]
}
