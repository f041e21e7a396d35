//! Offline downloads.
//!
//! The byte-level fetcher lives outside this crate; [`DownloadManager`]
//! records downloads, passes them to it through a [`FetchQueue`] and removes
//! their files again on delete.

pub mod manager;
pub mod playlist;
pub mod queue;

pub use manager::{CleanupFailure, CleanupReport, DownloadManager, DownloadRequest, PLAYLIST_FILE};
pub use queue::{FetchJob, FetchQueue, InMemoryFetchQueue};
