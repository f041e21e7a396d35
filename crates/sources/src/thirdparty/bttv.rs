//! BetterTTV cached emotes.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{EmoteProvider, not_found_as_empty};
use crate::client::ApiClient;
use crate::error::SourceError;
use crate::models::{ChannelRef, Emote, EmoteSource};

const CDN_URL: &str = "https://cdn.betterttv.net/emote";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BttvEmote {
    pub id: String,
    pub code: String,
    pub image_type: Option<String>,
    pub animated: Option<bool>,
}

impl From<BttvEmote> for Emote {
    fn from(e: BttvEmote) -> Self {
        let animated = e
            .animated
            .unwrap_or_else(|| e.image_type.as_deref() == Some("gif"));
        Emote {
            url: format!("{CDN_URL}/{}/3x", e.id),
            name: e.code,
            source: EmoteSource::Bttv,
            animated,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BttvChannel {
    #[serde(default)]
    pub channel_emotes: Vec<BttvEmote>,
    #[serde(default)]
    pub shared_emotes: Vec<BttvEmote>,
}

impl BttvChannel {
    pub fn into_emotes(self) -> Vec<Emote> {
        self.channel_emotes
            .into_iter()
            .chain(self.shared_emotes)
            .map(Emote::from)
            .collect()
    }
}

pub struct BttvApi {
    api: ApiClient,
}

impl BttvApi {
    pub const BASE_URL: &str = "https://api.betterttv.net/3/cached";

    pub fn new(client: Client) -> Self {
        Self {
            api: ApiClient::new("bttv", Self::BASE_URL, client),
        }
    }
}

#[async_trait]
impl EmoteProvider for BttvApi {
    fn source(&self) -> EmoteSource {
        EmoteSource::Bttv
    }

    async fn global_emotes(&self) -> Result<Vec<Emote>, SourceError> {
        let emotes: Vec<BttvEmote> = self.api.send_json(self.api.get("emotes/global")).await?;
        Ok(emotes.into_iter().map(Emote::from).collect())
    }

    async fn channel_emotes(&self, channel: &ChannelRef) -> Result<Vec<Emote>, SourceError> {
        let result = self
            .api
            .send_json::<BttvChannel>(self.api.get(&format!("users/twitch/{}", channel.id)))
            .await
            .map(BttvChannel::into_emotes);
        not_found_as_empty(result)
    }
}
