//! Observable stores over the repositories.
//!
//! Every mutation re-publishes the full ordered list on a
//! `tokio::sync::watch` channel, so observers always see a consistent
//! snapshot.

pub mod bookmark;
pub mod offline_video;

pub use bookmark::BookmarkStore;
pub use offline_video::OfflineVideoStore;
