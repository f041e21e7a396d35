//! Chat history from the recent-messages service.
//!
//! The service returns raw IRC lines. Besides the history itself, the
//! `emotes` tag of each line names the Twitch emotes the message used, which
//! makes the service a cheap source of a channel's recently used emotes.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::EmoteProvider;
use crate::client::ApiClient;
use crate::error::SourceError;
use crate::models::{ChannelRef, Emote, EmoteSource};

const TWITCH_EMOTE_CDN: &str = "https://static-cdn.jtvnw.net/emoticons/v2";

/// Default history size requested from the service.
pub const DEFAULT_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct RecentMessages {
    #[serde(default)]
    pub messages: Vec<String>,
    pub error: Option<String>,
}

pub struct RecentMessagesApi {
    api: ApiClient,
    limit: u32,
}

impl RecentMessagesApi {
    pub const BASE_URL: &str = "https://recent-messages.robotty.de/api/v2";

    pub fn new(client: Client) -> Self {
        Self {
            api: ApiClient::new("recent-messages", Self::BASE_URL, client),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Raw IRC lines, oldest first.
    pub async fn recent_messages(&self, login: &str) -> Result<Vec<String>, SourceError> {
        let response: RecentMessages = self
            .api
            .send_json(
                self.api
                    .get(&format!("recent-messages/{login}"))
                    .query(&[("limit", self.limit)]),
            )
            .await?;
        if let Some(error) = response.error {
            return Err(SourceError::InvalidResponse(error));
        }
        Ok(response.messages)
    }
}

#[async_trait]
impl EmoteProvider for RecentMessagesApi {
    fn source(&self) -> EmoteSource {
        EmoteSource::Twitch
    }

    async fn global_emotes(&self) -> Result<Vec<Emote>, SourceError> {
        Ok(Vec::new())
    }

    async fn channel_emotes(&self, channel: &ChannelRef) -> Result<Vec<Emote>, SourceError> {
        let messages = self.recent_messages(&channel.login).await?;
        let mut emotes: Vec<Emote> = Vec::new();
        for line in &messages {
            for emote in emotes_in_line(line) {
                if !emotes.iter().any(|e| e.name == emote.name) {
                    emotes.push(emote);
                }
            }
        }
        Ok(emotes)
    }
}

/// Extract the emotes referenced by one IRC `PRIVMSG` line.
///
/// The tag looks like `emotes=25:0-4,12-16/1902:6-10`; ranges index the
/// message text by character.
pub fn emotes_in_line(line: &str) -> Vec<Emote> {
    let Some(tags) = line.strip_prefix('@').and_then(|l| l.split(' ').next()) else {
        return Vec::new();
    };
    let Some(spec) = tags
        .split(';')
        .find_map(|tag| tag.strip_prefix("emotes="))
        .filter(|spec| !spec.is_empty())
    else {
        return Vec::new();
    };
    let Some(text) = message_text(line) else {
        return Vec::new();
    };
    let chars: Vec<char> = text.chars().collect();

    spec.split('/')
        .filter_map(|entry| {
            let (id, ranges) = entry.split_once(':')?;
            let (start, end) = ranges.split(',').next()?.split_once('-')?;
            let (start, end): (usize, usize) = (start.parse().ok()?, end.parse().ok()?);
            if start > end || end >= chars.len() {
                return None;
            }
            Some(Emote {
                name: chars[start..=end].iter().collect(),
                url: format!("{TWITCH_EMOTE_CDN}/{id}/default/dark/3.0"),
                source: EmoteSource::Twitch,
                animated: false,
            })
        })
        .collect()
}

fn message_text(line: &str) -> Option<&str> {
    let idx = line.find(" PRIVMSG ")?;
    let rest = &line[idx + " PRIVMSG ".len()..];
    let (_, text) = rest.split_once(" :")?;
    Some(text)
}
