//! Typed bindings for the upstream providers the Xtra client pages from.
//!
//! * [`helix::HelixApi`]: the Twitch Helix REST API.
//! * [`gql::GqlApi`]: the Twitch GraphQL endpoint.
//! * [`thirdparty`]: 7TV, BetterTTV, FrankerFaceZ and the recent-messages service.
//!
//! Every client normalizes its provider-specific JSON into the shared item
//! types in [`models`], so callers never see raw response shapes.

pub mod client;
pub mod error;
pub mod gql;
pub mod helix;
pub mod models;
pub mod session;
pub mod thirdparty;

pub use client::{ApiClient, create_client_builder, default_client, install_rustls_provider};
pub use error::SourceError;
pub use models::{
    BroadcastType, Channel, ChannelRef, Emote, EmoteSource, Game, Page, Stream, Video, VideoPeriod,
    VideoSort,
};
pub use session::Session;
