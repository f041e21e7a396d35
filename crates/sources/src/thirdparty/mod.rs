//! Third-party emote services.
//!
//! Each provider is optional from the client's point of view: a failure in
//! one must not hide the emotes of the others, so the trait returns per-call
//! results and merging is left to the caller.

pub mod bttv;
pub mod ffz;
pub mod recent_messages;
pub mod seventv;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::models::{ChannelRef, Emote, EmoteSource};

pub use bttv::BttvApi;
pub use ffz::FfzApi;
pub use recent_messages::RecentMessagesApi;
pub use seventv::SevenTvApi;

#[async_trait]
pub trait EmoteProvider: Send + Sync {
    fn source(&self) -> EmoteSource;

    async fn global_emotes(&self) -> Result<Vec<Emote>, SourceError>;

    async fn channel_emotes(&self, channel: &ChannelRef) -> Result<Vec<Emote>, SourceError>;
}

/// Emote services answer 404 for channels they have never seen.
pub(crate) fn not_found_as_empty(
    result: Result<Vec<Emote>, SourceError>,
) -> Result<Vec<Emote>, SourceError> {
    match result {
        Err(SourceError::Status { status: 404, .. }) => Ok(Vec::new()),
        other => other,
    }
}

/// Protocol-relative CDN links come back as `//cdn...`.
pub(crate) fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        assert_eq!(absolute_url("//cdn.7tv.app/emote/1"), "https://cdn.7tv.app/emote/1");
        assert_eq!(absolute_url("https://x/y"), "https://x/y");
    }

    #[test]
    fn test_not_found_as_empty() {
        let not_found = Err(SourceError::Status {
            status: 404,
            body: String::new(),
        });
        assert!(not_found_as_empty(not_found).unwrap().is_empty());

        let server_error = Err(SourceError::Status {
            status: 500,
            body: String::new(),
        });
        assert!(not_found_as_empty(server_error).is_err());
    }
}
