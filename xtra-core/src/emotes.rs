//! Third-party emote loading across every provider at once.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, warn};
use xtra_sources::thirdparty::{BttvApi, EmoteProvider, FfzApi, RecentMessagesApi, SevenTvApi};
use xtra_sources::{ChannelRef, Emote, EmoteSource, SourceError};

/// Merged result of one load.
#[derive(Debug, Default)]
pub struct LoadedEmotes {
    /// Unique by name; the earlier provider wins a clash.
    pub emotes: Vec<Emote>,
    pub failures: Vec<(EmoteSource, SourceError)>,
}

impl LoadedEmotes {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct EmoteLoader {
    providers: Vec<Arc<dyn EmoteProvider>>,
}

impl EmoteLoader {
    /// Providers in preference order.
    pub fn new(providers: Vec<Arc<dyn EmoteProvider>>) -> Self {
        Self { providers }
    }

    /// 7TV, BetterTTV, FrankerFaceZ, then emotes seen in recent chat.
    pub fn with_default_providers(client: Client) -> Self {
        Self::new(vec![
            Arc::new(SevenTvApi::new(client.clone())),
            Arc::new(BttvApi::new(client.clone())),
            Arc::new(FfzApi::new(client.clone())),
            Arc::new(RecentMessagesApi::new(client)),
        ])
    }

    pub async fn global(&self) -> LoadedEmotes {
        let results = join_all(self.providers.iter().map(|p| p.global_emotes())).await;
        self.merge(results)
    }

    pub async fn channel(&self, channel: &ChannelRef) -> LoadedEmotes {
        let results = join_all(self.providers.iter().map(|p| p.channel_emotes(channel))).await;
        let loaded = self.merge(results);
        debug!(
            channel = %channel.login,
            count = loaded.emotes.len(),
            failed = loaded.failures.len(),
            "channel emotes loaded"
        );
        loaded
    }

    fn merge(&self, results: Vec<Result<Vec<Emote>, SourceError>>) -> LoadedEmotes {
        let mut loaded = LoadedEmotes::default();
        let mut seen = HashSet::new();
        for (provider, result) in self.providers.iter().zip(results) {
            match result {
                Ok(emotes) => {
                    for emote in emotes {
                        if seen.insert(emote.name.clone()) {
                            loaded.emotes.push(emote);
                        }
                    }
                }
                Err(e) => {
                    warn!(provider = %provider.source(), error = %e, "emote provider failed");
                    loaded.failures.push((provider.source(), e));
                }
            }
        }
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed {
        source: EmoteSource,
        names: Option<Vec<&'static str>>,
    }

    #[async_trait]
    impl EmoteProvider for Fixed {
        fn source(&self) -> EmoteSource {
            self.source
        }

        async fn global_emotes(&self) -> Result<Vec<Emote>, SourceError> {
            match &self.names {
                Some(names) => Ok(names
                    .iter()
                    .map(|n| Emote {
                        name: n.to_string(),
                        url: format!("https://cdn/{}/{n}", self.source),
                        source: self.source,
                        animated: false,
                    })
                    .collect()),
                None => Err(SourceError::Status {
                    status: 500,
                    body: String::new(),
                }),
            }
        }

        async fn channel_emotes(&self, _channel: &ChannelRef) -> Result<Vec<Emote>, SourceError> {
            self.global_emotes().await
        }
    }

    fn loader(providers: Vec<Fixed>) -> EmoteLoader {
        EmoteLoader::new(
            providers
                .into_iter()
                .map(|p| Arc::new(p) as Arc<dyn EmoteProvider>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_merge_prefers_earlier_provider() {
        let loader = loader(vec![
            Fixed {
                source: EmoteSource::SevenTv,
                names: Some(vec!["catJAM", "OMEGALUL"]),
            },
            Fixed {
                source: EmoteSource::Bttv,
                names: Some(vec!["OMEGALUL", "monkaS"]),
            },
        ]);
        let loaded = loader.global().await;
        assert!(loaded.is_complete());
        let names: Vec<_> = loaded.emotes.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["catJAM", "OMEGALUL", "monkaS"]);
        assert_eq!(loaded.emotes[1].source, EmoteSource::SevenTv);
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_fatal() {
        let loader = loader(vec![
            Fixed {
                source: EmoteSource::Ffz,
                names: None,
            },
            Fixed {
                source: EmoteSource::Bttv,
                names: Some(vec!["monkaS"]),
            },
        ]);
        let loaded = loader.channel(&ChannelRef::new("1", "chan")).await;
        assert_eq!(loaded.emotes.len(), 1);
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].0, EmoteSource::Ffz);
    }
}
