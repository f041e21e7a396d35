//! The paged listings the client offers, and how each maps onto the providers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use xtra_sources::gql::GqlApi;
use xtra_sources::helix::{HelixApi, VideoFilter};
use xtra_sources::{Channel, Game, Page, SourceError, Stream, Video};

use super::provider::{ApiPref, ApiProvider};
use super::source::{PageFetcher, PagedDataSource};

/// A paged listing with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feature {
    FollowedStreams { user_id: String },
    GameStreams { game_id: String },
    GameVideos { game_id: String, filter: VideoFilter },
    ChannelVideos { channel_id: String, filter: VideoFilter },
    ChannelSearch { query: String },
    TopGames,
    FollowedChannels { user_id: String },
}

/// Parameter-free identity of a [`Feature`]; its string form is stable.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    FollowedStreams,
    GameStreams,
    GameVideos,
    ChannelVideos,
    ChannelSearch,
    TopGames,
    FollowedChannels,
}

impl FeatureKey {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn from_key(key: &str) -> Option<Self> {
        key.parse().ok()
    }
}

impl Feature {
    pub fn key(&self) -> FeatureKey {
        match self {
            Self::FollowedStreams { .. } => FeatureKey::FollowedStreams,
            Self::GameStreams { .. } => FeatureKey::GameStreams,
            Self::GameVideos { .. } => FeatureKey::GameVideos,
            Self::ChannelVideos { .. } => FeatureKey::ChannelVideos,
            Self::ChannelSearch { .. } => FeatureKey::ChannelSearch,
            Self::TopGames => FeatureKey::TopGames,
            Self::FollowedChannels { .. } => FeatureKey::FollowedChannels,
        }
    }
}

/// Default preference plus per-feature overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPrefs {
    #[serde(default)]
    pub default: ApiPref,
    #[serde(default)]
    pub overrides: HashMap<FeatureKey, ApiPref>,
}

impl ApiPrefs {
    pub fn for_feature(&self, key: FeatureKey) -> &ApiPref {
        self.overrides.get(&key).unwrap_or(&self.default)
    }
}

/// The two Twitch clients every feature is served from.
#[derive(Clone)]
pub struct Providers {
    pub helix: Arc<HelixApi>,
    pub gql: Arc<GqlApi>,
}

impl Providers {
    pub fn new(helix: HelixApi, gql: GqlApi) -> Self {
        Self {
            helix: Arc::new(helix),
            gql: Arc::new(gql),
        }
    }

    /// Build the data source for `feature`.
    pub fn source_for(&self, feature: Feature, prefs: &ApiPrefs) -> FeatureSource {
        let pref = prefs.for_feature(feature.key()).clone();
        let providers = self.clone();
        match feature {
            Feature::FollowedStreams { user_id } => FeatureSource::Streams(PagedDataSource::new(
                StreamsFetcher {
                    providers,
                    query: StreamsQuery::Followed { user_id },
                },
                pref,
            )),
            Feature::GameStreams { game_id } => FeatureSource::Streams(PagedDataSource::new(
                StreamsFetcher {
                    providers,
                    query: StreamsQuery::Game { game_id },
                },
                pref,
            )),
            Feature::GameVideos { game_id, filter } => {
                FeatureSource::Videos(PagedDataSource::new(
                    VideosFetcher {
                        providers,
                        query: VideosQuery::Game { game_id, filter },
                    },
                    pref,
                ))
            }
            Feature::ChannelVideos { channel_id, filter } => {
                FeatureSource::Videos(PagedDataSource::new(
                    VideosFetcher {
                        providers,
                        query: VideosQuery::Channel { channel_id, filter },
                    },
                    pref,
                ))
            }
            Feature::ChannelSearch { query } => FeatureSource::Channels(PagedDataSource::new(
                ChannelsFetcher {
                    providers,
                    query: ChannelsQuery::Search { query },
                },
                pref,
            )),
            Feature::TopGames => {
                FeatureSource::Games(PagedDataSource::new(GamesFetcher { providers }, pref))
            }
            Feature::FollowedChannels { user_id } => {
                FeatureSource::Channels(PagedDataSource::new(
                    ChannelsFetcher {
                        providers,
                        query: ChannelsQuery::Followed { user_id },
                    },
                    pref,
                ))
            }
        }
    }
}

/// A feature's data source, typed by the item it yields.
pub enum FeatureSource {
    Streams(PagedDataSource<StreamsFetcher>),
    Videos(PagedDataSource<VideosFetcher>),
    Channels(PagedDataSource<ChannelsFetcher>),
    Games(PagedDataSource<GamesFetcher>),
}

impl FeatureSource {
    pub fn with_page_size(self, page_size: u32) -> Self {
        match self {
            Self::Streams(s) => Self::Streams(s.with_page_size(page_size)),
            Self::Videos(s) => Self::Videos(s.with_page_size(page_size)),
            Self::Channels(s) => Self::Channels(s.with_page_size(page_size)),
            Self::Games(s) => Self::Games(s.with_page_size(page_size)),
        }
    }

    pub fn pref(&self) -> &ApiPref {
        match self {
            Self::Streams(s) => s.pref(),
            Self::Videos(s) => s.pref(),
            Self::Channels(s) => s.pref(),
            Self::Games(s) => s.pref(),
        }
    }
}

#[derive(Debug, Clone)]
enum StreamsQuery {
    Followed { user_id: String },
    Game { game_id: String },
}

pub struct StreamsFetcher {
    providers: Providers,
    query: StreamsQuery,
}

#[async_trait]
impl PageFetcher for StreamsFetcher {
    type Item = Stream;

    async fn fetch(
        &self,
        provider: ApiProvider,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Stream>, SourceError> {
        let Providers { helix, gql } = &self.providers;
        match (provider, &self.query) {
            (ApiProvider::Helix, StreamsQuery::Followed { user_id }) => {
                helix.followed_streams(user_id, cursor, limit).await
            }
            (ApiProvider::Gql, StreamsQuery::Followed { .. }) => {
                gql.followed_streams(cursor, limit).await
            }
            (ApiProvider::Helix, StreamsQuery::Game { game_id }) => {
                helix.game_streams(game_id, cursor, limit).await
            }
            (ApiProvider::Gql, StreamsQuery::Game { game_id }) => {
                gql.game_streams(game_id, cursor, limit).await
            }
        }
    }
}

#[derive(Debug, Clone)]
enum VideosQuery {
    Game { game_id: String, filter: VideoFilter },
    Channel { channel_id: String, filter: VideoFilter },
}

pub struct VideosFetcher {
    providers: Providers,
    query: VideosQuery,
}

#[async_trait]
impl PageFetcher for VideosFetcher {
    type Item = Video;

    async fn fetch(
        &self,
        provider: ApiProvider,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Video>, SourceError> {
        let Providers { helix, gql } = &self.providers;
        match (provider, &self.query) {
            (ApiProvider::Helix, VideosQuery::Game { game_id, filter }) => {
                helix.game_videos(game_id, *filter, cursor, limit).await
            }
            (ApiProvider::Gql, VideosQuery::Game { game_id, filter }) => {
                gql.game_videos(game_id, *filter, cursor, limit).await
            }
            (ApiProvider::Helix, VideosQuery::Channel { channel_id, filter }) => {
                helix.channel_videos(channel_id, *filter, cursor, limit).await
            }
            (ApiProvider::Gql, VideosQuery::Channel { channel_id, filter }) => {
                gql.channel_videos(channel_id, *filter, cursor, limit).await
            }
        }
    }
}

#[derive(Debug, Clone)]
enum ChannelsQuery {
    Search { query: String },
    Followed { user_id: String },
}

pub struct ChannelsFetcher {
    providers: Providers,
    query: ChannelsQuery,
}

#[async_trait]
impl PageFetcher for ChannelsFetcher {
    type Item = Channel;

    async fn fetch(
        &self,
        provider: ApiProvider,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Channel>, SourceError> {
        let Providers { helix, gql } = &self.providers;
        match (provider, &self.query) {
            (ApiProvider::Helix, ChannelsQuery::Search { query }) => {
                helix.search_channels(query, cursor, limit).await
            }
            (ApiProvider::Gql, ChannelsQuery::Search { query }) => {
                gql.search_channels(query, cursor, limit).await
            }
            (ApiProvider::Helix, ChannelsQuery::Followed { user_id }) => {
                helix.followed_channels(user_id, cursor, limit).await
            }
            (ApiProvider::Gql, ChannelsQuery::Followed { user_id }) => {
                gql.followed_channels(user_id, cursor, limit).await
            }
        }
    }
}

pub struct GamesFetcher {
    providers: Providers,
}

#[async_trait]
impl PageFetcher for GamesFetcher {
    type Item = Game;

    async fn fetch(
        &self,
        provider: ApiProvider,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Game>, SourceError> {
        match provider {
            ApiProvider::Helix => self.providers.helix.top_games(cursor, limit).await,
            ApiProvider::Gql => self.providers.gql.top_games(cursor, limit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use xtra_sources::Session;

    #[test]
    fn test_feature_keys_round_trip() {
        for key in FeatureKey::iter() {
            assert_eq!(FeatureKey::from_key(key.as_str()), Some(key));
        }
        assert_eq!(FeatureKey::TopGames.to_string(), "top_games");
        assert_eq!(FeatureKey::from_key("followed_streams"), Some(FeatureKey::FollowedStreams));
        assert_eq!(FeatureKey::from_key("clips"), None);
    }

    #[test]
    fn test_feature_key() {
        let feature = Feature::ChannelVideos {
            channel_id: "1".into(),
            filter: VideoFilter::default(),
        };
        assert_eq!(feature.key(), FeatureKey::ChannelVideos);
        assert_eq!(Feature::TopGames.key().as_str(), "top_games");
    }

    #[test]
    fn test_prefs_override() {
        let mut prefs = ApiPrefs::default();
        prefs
            .overrides
            .insert(FeatureKey::TopGames, ApiPref::new([ApiProvider::Helix]));
        assert_eq!(
            prefs.for_feature(FeatureKey::TopGames).providers(),
            &[ApiProvider::Helix]
        );
        assert_eq!(
            prefs.for_feature(FeatureKey::GameStreams),
            &ApiPref::default()
        );
    }

    #[test]
    fn test_prefs_from_json() {
        let prefs: ApiPrefs = serde_json::from_str(
            r#"{"default": "helix,gql", "overrides": {"followed_streams": "gql"}}"#,
        )
        .unwrap();
        assert_eq!(prefs.default.providers()[0], ApiProvider::Helix);
        assert_eq!(
            prefs.for_feature(FeatureKey::FollowedStreams).providers(),
            &[ApiProvider::Gql]
        );
        assert!(serde_json::from_str::<ApiPrefs>(r#"{"default": "kraken"}"#).is_err());
    }

    #[test]
    fn test_source_for_uses_feature_pref() {
        let session = Session::anonymous("client");
        let client = xtra_sources::default_client().unwrap();
        let providers = Providers::new(
            HelixApi::new(client.clone(), &session),
            GqlApi::new(client, &session),
        );
        let mut prefs = ApiPrefs::default();
        prefs
            .overrides
            .insert(FeatureKey::ChannelSearch, ApiPref::new([ApiProvider::Helix]));

        let source = providers
            .source_for(
                Feature::ChannelSearch {
                    query: "xqc".into(),
                },
                &prefs,
            )
            .with_page_size(10);
        assert!(matches!(source, FeatureSource::Channels(_)));
        assert_eq!(source.pref().providers(), &[ApiProvider::Helix]);

        let source = providers.source_for(Feature::TopGames, &prefs);
        assert!(matches!(source, FeatureSource::Games(_)));
        assert_eq!(source.pref(), &ApiPref::default());
    }
}
