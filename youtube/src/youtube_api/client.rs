//! Core YouTube API client functionality.

use crate::youtube_api::{
    ChannelFilter, DataApi, RemoteError,
    channels::ChannelListResponse,
    playlists::{PlaylistItemListResponse, PlaylistListResponse},
    search::{SearchListResponse, SearchRequest},
    videos::VideoListResponse,
};
use http::Method;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Root of every Data API v3 endpoint.
pub const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Client for interacting with the YouTube Data API v3.
///
/// This client authenticates every request with a static API key, which is sufficient for the
/// public, read-only endpoints the sorter uses. It is cheap to clone; clones share the underlying
/// HTTP connection pool.
///
/// Each method issues exactly one HTTP request. Quota accounting and caching live one layer up,
/// in [`crate::fetcher::VideoFetcher`].
#[derive(Clone)]
pub struct YouTubeClient {
    /// The API key sent as the `key` query parameter.
    api_key: Arc<str>,
    /// HTTP client for API requests
    client: reqwest::Client,
    base_url: String,
}

impl fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl YouTubeClient {
    /// Creates a new YouTube API client with the provided API key and HTTP client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - A YouTube Data API v3 key
    /// * `client` - Shared HTTP client for making API requests
    pub fn new(api_key: impl Into<Arc<str>>, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            client,
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different API root, e.g. a local recording proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Makes a keyed GET request to the YouTube API with common error handling.
    ///
    /// This method consolidates the shared logic across all YouTube API requests:
    /// - API key query parameter
    /// - Status code validation and error handling
    /// - JSON decoding into the endpoint's response type
    ///
    /// # Arguments
    ///
    /// * `endpoint` - The API resource path below [`API_BASE_URL`], e.g. `playlistItems`
    /// * `query_params` - Query parameters for the request
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn make_request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<T, RemoteError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .request(Method::GET, &url)
            .query(query_params)
            .query(&[("key", &*self.api_key)])
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RemoteError::Status { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|source| RemoteError::Transport { url, source })?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl DataApi for YouTubeClient {
    /// Calls `channels.list` for a single channel id or legacy username.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    async fn list_channels(
        &self,
        filter: ChannelFilter<'_>,
    ) -> Result<ChannelListResponse, RemoteError> {
        let (key, value) = match filter {
            ChannelFilter::Id(id) => ("id", id),
            ChannelFilter::Username(username) => ("forUsername", username),
        };
        let query_params = [("part", "id,snippet,contentDetails,statistics"), (key, value)];

        let channels: ChannelListResponse = self.make_request("channels", &query_params).await?;

        tracing::debug!(
            ?filter,
            returned_items = channels.items.len(),
            "fetched channels"
        );

        Ok(channels)
    }

    /// Calls `playlists.list` for a single playlist id.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlists/list>
    async fn list_playlists(&self, playlist_id: &str) -> Result<PlaylistListResponse, RemoteError> {
        let query_params = [("part", "snippet,contentDetails"), ("id", playlist_id)];

        let playlists: PlaylistListResponse =
            self.make_request("playlists", &query_params).await?;

        tracing::debug!(
            playlist_id,
            returned_items = playlists.items.len(),
            "fetched playlist"
        );

        Ok(playlists)
    }

    /// Calls `playlistItems.list` for one page of a playlist.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/playlistItems/list>
    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse, RemoteError> {
        let max_results_string = max_results.to_string();
        let mut query_params = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results_string.as_str()),
        ];

        // Add pageToken if provided
        if let Some(token) = page_token {
            query_params.push(("pageToken", token));
        }

        let page: PlaylistItemListResponse =
            self.make_request("playlistItems", &query_params).await?;

        tracing::debug!(
            playlist_id,
            total_results = page.page_info.total_results,
            returned_items = page.items.len(),
            has_next_page = page.next_page_token.is_some(),
            "fetched playlist items"
        );

        Ok(page)
    }

    /// Calls `videos.list` for a batch of at most 50 video ids.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/list>
    async fn list_videos(&self, video_ids: &[&str]) -> Result<VideoListResponse, RemoteError> {
        let ids = video_ids.join(",");
        let query_params = [
            ("part", "snippet,statistics,contentDetails"),
            ("id", ids.as_str()),
        ];

        let videos: VideoListResponse = self.make_request("videos", &query_params).await?;

        tracing::debug!(
            requested = video_ids.len(),
            returned_items = videos.items.len(),
            "fetched video details"
        );

        Ok(videos)
    }

    /// Calls `search.list`.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/search/list>
    async fn search(&self, request: SearchRequest<'_>) -> Result<SearchListResponse, RemoteError> {
        let max_results_string = request.max_results.to_string();
        let mut query_params = vec![
            ("part", "snippet"),
            ("type", request.kind.as_str()),
            ("maxResults", max_results_string.as_str()),
        ];
        if let Some(query) = request.query {
            query_params.push(("q", query));
        }
        if let Some(channel_id) = request.channel_id {
            query_params.push(("channelId", channel_id));
        }
        if let Some(order) = request.order {
            query_params.push(("order", order.as_str()));
        }
        if let Some(token) = request.page_token {
            query_params.push(("pageToken", token));
        }

        let results: SearchListResponse = self.make_request("search", &query_params).await?;

        tracing::debug!(
            query = request.query,
            channel_id = request.channel_id,
            returned_items = results.items.len(),
            "fetched search results"
        );

        Ok(results)
    }
}
