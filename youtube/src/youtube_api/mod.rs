//! YouTube Data API v3 client library.
//!
//! This module provides a typed, read-only client for the handful of Data API v3 endpoints
//! needed to enumerate a channel's or playlist's videos:
//!
//! | Endpoint             | Used for                                              | Quota |
//! |----------------------|-------------------------------------------------------|-------|
//! | `channels.list`      | canonical id / legacy username to uploads playlist    | 1     |
//! | `playlists.list`     | playlist existence and item count                     | 1     |
//! | `playlistItems.list` | paging through the video ids of a playlist            | 1     |
//! | `videos.list`        | full metadata for up to 50 videos at once             | 1     |
//! | `search.list`        | handle and keyword lookups, channel-scoped enumeration | 100   |
//!
//! # The `DataApi` seam
//!
//! The retrieval pipeline in [`crate::fetcher`] never talks to [`YouTubeClient`] directly.
//! It is generic over [`DataApi`], which is implemented by the real HTTP client and, under the
//! `mock` feature, by an in-memory fake. Each trait method maps to exactly one remote call.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use youtube_smart_sorter::youtube_api::{ChannelFilter, DataApi, YouTubeClient};
//!
//! # async fn example() -> eyre::Result<()> {
//! let client = YouTubeClient::new("my-api-key", reqwest::Client::new());
//! let channels = client.list_channels(ChannelFilter::Username("GoogleDevelopers")).await?;
//! for channel in &channels.items {
//!     println!("{} uploads to {:?}", channel.id, channel.uploads_playlist_id());
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;

pub mod channels;
pub mod client;
pub mod error;
pub mod playlists;
pub mod search;
pub mod types;
pub mod videos;

// Re-export main types for convenience
pub use client::YouTubeClient;
pub use error::RemoteError;
pub use types::{MAX_PAGE_SIZE, PageInfo, Thumbnails};

// Re-export commonly used types from each module
pub use channels::{Channel, ChannelListResponse, ChannelSnippet};
pub use playlists::{Playlist, PlaylistItem, PlaylistItemListResponse, PlaylistListResponse};
pub use search::{SearchKind, SearchListResponse, SearchOrder, SearchRequest, SearchResult};
pub use videos::{Video, VideoListResponse, VideoStatistics};

/// How `channels.list` selects the channel to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFilter<'a> {
    /// A canonical `UC…` channel id.
    Id(&'a str),
    /// A legacy (pre-handle) YouTube username.
    Username(&'a str),
}

/// The remote operations the retrieval pipeline depends on.
///
/// Every method issues exactly one metered request, so callers can account for quota by
/// counting invocations.
pub trait DataApi {
    /// Look up a channel by id or legacy username.
    ///
    /// A filter that matches nothing yields an empty `items` list, not an error.
    fn list_channels(
        &self,
        filter: ChannelFilter<'_>,
    ) -> impl Future<Output = Result<ChannelListResponse, RemoteError>> + Send;

    /// Look up a single playlist by id.
    fn list_playlists(
        &self,
        playlist_id: &str,
    ) -> impl Future<Output = Result<PlaylistListResponse, RemoteError>> + Send;

    /// Fetch one page of a playlist's items.
    fn list_playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> impl Future<Output = Result<PlaylistItemListResponse, RemoteError>> + Send;

    /// Fetch full metadata for at most [`MAX_PAGE_SIZE`] videos.
    fn list_videos(
        &self,
        video_ids: &[&str],
    ) -> impl Future<Output = Result<VideoListResponse, RemoteError>> + Send;

    fn search(
        &self,
        request: SearchRequest<'_>,
    ) -> impl Future<Output = Result<SearchListResponse, RemoteError>> + Send;
}
