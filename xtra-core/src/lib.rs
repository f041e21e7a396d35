//! Offline core of the Xtra Twitch client.
//!
//! * [`paging`]: provider-ordered, cursor-based listings with fallback.
//! * [`store`]: the offline video catalog and bookmarks, observable.
//! * [`downloads`]: download hand-off and on-disk cleanup.
//! * [`emotes`]: merged third-party emote sets.

pub mod app;
pub mod config;
pub mod database;
pub mod downloads;
pub mod emotes;
pub mod error;
pub mod logging;
pub mod paging;
pub mod store;
pub mod utils;

pub use error::{Error, Result};
