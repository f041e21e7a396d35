//! FrankerFaceZ emote sets.

use async_trait::async_trait;
use reqwest::Client;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::{EmoteProvider, absolute_url, not_found_as_empty};
use crate::client::ApiClient;
use crate::error::SourceError;
use crate::models::{ChannelRef, Emote, EmoteSource};

#[derive(Debug, Deserialize)]
pub struct FfzEmoticon {
    pub name: String,
    #[serde(default)]
    pub urls: FxHashMap<String, String>,
    #[serde(default)]
    pub animated: Option<FxHashMap<String, String>>,
}

impl FfzEmoticon {
    fn into_emote(self) -> Option<Emote> {
        let (urls, animated) = match self.animated {
            Some(animated) if !animated.is_empty() => (animated, true),
            _ => (self.urls, false),
        };
        let url = largest(&urls)?;
        Some(Emote {
            name: self.name,
            url: absolute_url(url),
            source: EmoteSource::Ffz,
            animated,
        })
    }
}

/// URLs are keyed by scale ("1", "2", "4").
fn largest(urls: &FxHashMap<String, String>) -> Option<&str> {
    urls.iter()
        .filter_map(|(scale, url)| scale.parse::<u32>().ok().map(|s| (s, url)))
        .max_by_key(|(scale, _)| *scale)
        .map(|(_, url)| url.as_str())
}

#[derive(Debug, Deserialize)]
pub struct FfzSet {
    #[serde(default)]
    pub emoticons: Vec<FfzEmoticon>,
}

#[derive(Debug, Deserialize)]
pub struct FfzGlobal {
    #[serde(default)]
    pub default_sets: Vec<u64>,
    #[serde(default)]
    pub sets: FxHashMap<String, FfzSet>,
}

impl FfzGlobal {
    /// Only the default sets are shown to everyone.
    pub fn into_emotes(mut self) -> Vec<Emote> {
        self.default_sets
            .iter()
            .filter_map(|id| self.sets.remove(&id.to_string()))
            .flat_map(|set| set.emoticons)
            .filter_map(FfzEmoticon::into_emote)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct FfzRoom {
    #[serde(default)]
    pub sets: FxHashMap<String, FfzSet>,
}

impl FfzRoom {
    pub fn into_emotes(self) -> Vec<Emote> {
        self.sets
            .into_values()
            .flat_map(|set| set.emoticons)
            .filter_map(FfzEmoticon::into_emote)
            .collect()
    }
}

pub struct FfzApi {
    api: ApiClient,
}

impl FfzApi {
    pub const BASE_URL: &str = "https://api.frankerfacez.com/v1";

    pub fn new(client: Client) -> Self {
        Self {
            api: ApiClient::new("ffz", Self::BASE_URL, client),
        }
    }
}

#[async_trait]
impl EmoteProvider for FfzApi {
    fn source(&self) -> EmoteSource {
        EmoteSource::Ffz
    }

    async fn global_emotes(&self) -> Result<Vec<Emote>, SourceError> {
        let global: FfzGlobal = self.api.send_json(self.api.get("set/global")).await?;
        Ok(global.into_emotes())
    }

    async fn channel_emotes(&self, channel: &ChannelRef) -> Result<Vec<Emote>, SourceError> {
        let result = self
            .api
            .send_json::<FfzRoom>(self.api.get(&format!("room/id/{}", channel.id)))
            .await
            .map(FfzRoom::into_emotes);
        not_found_as_empty(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_uses_default_sets_only() {
        let body = r#"{
            "default_sets": [3],
            "sets": {
                "3": {"id": 3, "emoticons": [
                    {"id": 25927, "name": "CatBag", "urls": {"1": "//cdn.frankerfacez.com/emote/25927/1", "4": "//cdn.frankerfacez.com/emote/25927/4"}}
                ]},
                "4330": {"id": 4330, "emoticons": [
                    {"id": 1, "name": "Hidden", "urls": {"1": "https://x/1"}}
                ]}
            }
        }"#;
        let global: FfzGlobal = serde_json::from_str(body).unwrap();
        let emotes = global.into_emotes();
        assert_eq!(emotes.len(), 1);
        assert_eq!(emotes[0].name, "CatBag");
        assert_eq!(emotes[0].url, "https://cdn.frankerfacez.com/emote/25927/4");
    }

    #[test]
    fn test_room_prefers_animated() {
        let body = r#"{
            "room": {"set": 12},
            "sets": {"12": {"emoticons": [
                {"name": "Spin", "urls": {"1": "https://x/1"}, "animated": {"1": "https://x/a1", "2": "https://x/a2"}},
                {"name": "Still", "urls": {"1": "https://x/s1"}, "animated": null}
            ]}}
        }"#;
        let room: FfzRoom = serde_json::from_str(body).unwrap();
        let mut emotes = room.into_emotes();
        emotes.sort_by(|a, b| a.name.cmp(&b.name));
        assert!(emotes[0].animated);
        assert_eq!(emotes[0].url, "https://x/a2");
        assert!(!emotes[1].animated);
    }
}
