//! Fetch every video of a YouTube channel or playlist and rank them by recency-weighted
//! popularity, spending as little API quota as possible.
//!
//! The heavy lifting happens in [`fetcher::VideoFetcher`]; [`ranking`] scores its output and
//! [`saved`] persists raw results so they can be re-ranked later for free.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod format;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;
pub mod ranking;
pub mod saved;
pub mod youtube_api;

pub use error::FetchError;
pub use fetcher::VideoFetcher;
pub use model::{ChannelInfo, SourceKind, VideoRecord};
