//! Database models. Each maps one-to-one onto a table row.

pub mod bookmark;
pub mod offline_video;

pub use bookmark::*;
pub use offline_video::*;
