//! Cursor-based paging over the Twitch providers.
//!
//! A [`PagedDataSource`] serves one [`Feature`] from the providers in the
//! user's preference order, falling back to the next provider when one
//! fails. A [`Pager`] walks the resulting pages in cursor order.

pub mod fallback;
pub mod features;
pub mod provider;
pub mod source;

pub use fallback::{Attempt, attempt_in_order};
pub use features::{
    ApiPrefs, ChannelsFetcher, Feature, FeatureKey, FeatureSource, GamesFetcher, Providers,
    StreamsFetcher, VideosFetcher,
};
pub use provider::{ApiPref, ApiProvider, PageCursor};
pub use source::{DEFAULT_PAGE_SIZE, LoadedPage, PageError, PageFetcher, PagedDataSource, Pager};
