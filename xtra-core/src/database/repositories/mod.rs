//! Repository layer for database access.

pub mod bookmark;
pub mod offline_video;

pub use bookmark::*;
pub use offline_video::*;
