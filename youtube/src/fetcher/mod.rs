//! The video retrieval pipeline.
//!
//! [`VideoFetcher`] owns everything a session needs to turn a channel or playlist reference into
//! a list of [`VideoRecord`]s while spending as little API quota as possible:
//!
//! - [`resolve`](VideoFetcher::resolve) turns handles, URLs, usernames and keywords into a
//!   canonical [`ChannelInfo`];
//! - [`collect`](VideoFetcher::collect) pages through a playlist and deduplicates its ids;
//! - [`fetch_details`](VideoFetcher::fetch_details) looks up metadata in batches of 50;
//! - [`get_all_videos`](VideoFetcher::get_all_videos) drives the above and falls back to other
//!   strategies when a channel's uploads playlist under-delivers;
//! - [`estimate`](VideoFetcher::estimate) predicts what a full fetch will cost.
//!
//! All results are memoized in a [`ResponseCache`] and every remote call is counted. Remote
//! calls are awaited one at a time, so the count is exact and the cache needs no locking.

use crate::error::FetchError;
use crate::model::VideoRecord;
use crate::youtube_api::{
    ChannelFilter, ChannelListResponse, DataApi, PlaylistItemListResponse, PlaylistListResponse,
    SearchListResponse, SearchRequest, VideoListResponse,
};
use tokio::sync::mpsc::UnboundedSender;

mod cache;
mod collect;
mod details;
mod estimate;
mod fallback;
mod playlist;
mod progress;
mod resolve;

pub use cache::{CallCounter, ResponseCache};
pub use collect::{Collection, Completion, MAX_CONSECUTIVE_PAGE_FAILURES, PAGE_SIZE};
pub use details::DETAIL_BATCH_SIZE;
pub use estimate::{Estimate, EstimateResult};
pub use fallback::{
    COVERAGE_THRESHOLD, ChannelVideos, Outcome, Shortfall, Strategy, alternate_playlist_ids,
    meets_coverage, modified_channel_id,
};
pub use progress::ProgressEvent;
pub use resolve::{is_channel_id, normalize_channel_url};

/// Default ceiling on the number of listing pages requested for a single playlist.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Session-scoped entry point to the retrieval pipeline.
///
/// Construct one per session and reuse it: its cache and call counter live exactly as long as
/// the fetcher and are never shared with another instance.
#[derive(Debug)]
pub struct VideoFetcher<A> {
    api: A,
    cache: ResponseCache,
    calls: CallCounter,
    page_limit: u32,
    progress: Option<UnboundedSender<ProgressEvent>>,
}

impl<A: DataApi> VideoFetcher<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            cache: ResponseCache::default(),
            calls: CallCounter::default(),
            page_limit: DEFAULT_PAGE_LIMIT,
            progress: None,
        }
    }

    /// Caps every playlist walk at `page_limit` listing pages. Values below one are raised to one.
    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    /// Sends [`ProgressEvent`]s to `progress` as the fetch proceeds.
    pub fn with_progress(mut self, progress: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The number of remote calls issued so far.
    pub fn api_call_count(&self) -> u64 {
        self.calls.get()
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn report(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            // the receiver going away must not abort the fetch
            let _ = progress.send(event);
        }
    }

    // Every remote call goes through one of the wrappers below, which is what keeps the call
    // counter exact.

    async fn call_channels(
        &mut self,
        filter: ChannelFilter<'_>,
    ) -> Result<ChannelListResponse, FetchError> {
        self.calls.record();
        self.api
            .list_channels(filter)
            .await
            .map_err(|source| FetchError::Remote {
                operation: "look up channel",
                source,
            })
    }

    async fn call_playlists(
        &mut self,
        playlist_id: &str,
    ) -> Result<PlaylistListResponse, FetchError> {
        self.calls.record();
        self.api
            .list_playlists(playlist_id)
            .await
            .map_err(|source| FetchError::Remote {
                operation: "look up playlist",
                source,
            })
    }

    async fn call_playlist_items(
        &mut self,
        playlist_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse, FetchError> {
        self.calls.record();
        self.api
            .list_playlist_items(playlist_id, max_results, page_token)
            .await
            .map_err(|source| FetchError::Remote {
                operation: "list playlist items",
                source,
            })
    }

    async fn call_videos(&mut self, video_ids: &[&str]) -> Result<VideoListResponse, FetchError> {
        self.calls.record();
        self.api
            .list_videos(video_ids)
            .await
            .map_err(|source| FetchError::Remote {
                operation: "fetch video details",
                source,
            })
    }

    async fn call_search(
        &mut self,
        request: SearchRequest<'_>,
    ) -> Result<SearchListResponse, FetchError> {
        self.calls.record();
        self.api
            .search(request)
            .await
            .map_err(|source| FetchError::Remote {
                operation: "search",
                source,
            })
    }
}

/// Assembles records for `ids` from the cache, in the order given, omitting ids that never
/// resolved.
fn records_from_cache(cache: &ResponseCache, ids: &[String]) -> Vec<VideoRecord> {
    ids.iter()
        .filter_map(|id| cache.video(id).cloned())
        .collect()
}

