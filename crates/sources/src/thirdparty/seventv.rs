//! 7TV emote sets.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{EmoteProvider, absolute_url, not_found_as_empty};
use crate::client::ApiClient;
use crate::error::SourceError;
use crate::models::{ChannelRef, Emote, EmoteSource};

#[derive(Debug, Deserialize)]
pub struct EmoteSet {
    #[serde(default)]
    pub emotes: Vec<SevenTvEmote>,
}

#[derive(Debug, Deserialize)]
pub struct SevenTvUser {
    pub emote_set: Option<EmoteSet>,
}

#[derive(Debug, Deserialize)]
pub struct SevenTvEmote {
    pub name: String,
    pub data: SevenTvEmoteData,
}

#[derive(Debug, Deserialize)]
pub struct SevenTvEmoteData {
    #[serde(default)]
    pub animated: bool,
    pub host: SevenTvHost,
}

#[derive(Debug, Deserialize)]
pub struct SevenTvHost {
    pub url: String,
    #[serde(default)]
    pub files: Vec<SevenTvFile>,
}

#[derive(Debug, Deserialize)]
pub struct SevenTvFile {
    pub name: String,
    #[serde(default)]
    pub format: String,
}

impl From<SevenTvEmote> for Emote {
    fn from(e: SevenTvEmote) -> Self {
        // Files are listed smallest first; prefer the largest WEBP.
        let file = e
            .data
            .host
            .files
            .iter()
            .rev()
            .find(|f| f.format.eq_ignore_ascii_case("webp"))
            .map(|f| f.name.as_str())
            .unwrap_or("4x.webp");
        Emote {
            url: format!("{}/{}", absolute_url(&e.data.host.url), file),
            name: e.name,
            source: EmoteSource::SevenTv,
            animated: e.data.animated,
        }
    }
}

pub struct SevenTvApi {
    api: ApiClient,
}

impl SevenTvApi {
    pub const BASE_URL: &str = "https://7tv.io/v3";

    pub fn new(client: Client) -> Self {
        Self {
            api: ApiClient::new("7tv", Self::BASE_URL, client),
        }
    }
}

#[async_trait]
impl EmoteProvider for SevenTvApi {
    fn source(&self) -> EmoteSource {
        EmoteSource::SevenTv
    }

    async fn global_emotes(&self) -> Result<Vec<Emote>, SourceError> {
        let set: EmoteSet = self.api.send_json(self.api.get("emote-sets/global")).await?;
        Ok(set.emotes.into_iter().map(Emote::from).collect())
    }

    async fn channel_emotes(&self, channel: &ChannelRef) -> Result<Vec<Emote>, SourceError> {
        let result: Result<Vec<Emote>, SourceError> = async {
            let user: SevenTvUser = self
                .api
                .send_json(self.api.get(&format!("users/twitch/{}", channel.id)))
                .await?;
            Ok(user
                .emote_set
                .map(|set| set.emotes.into_iter().map(Emote::from).collect())
                .unwrap_or_default())
        }
        .await;
        not_found_as_empty(result)
    }
}
