//! YouTube Search API types.
//!
//! Search is the most expensive read in the Data API (100 quota units per call against 1 for
//! the list endpoints), so the pipeline only reaches for it when cheaper lookups fail.

use crate::youtube_api::types::PageInfo;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Response structure for the `search.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: VecDeque<SearchResult>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// A search result points at a video, channel, or playlist matching the request.
///
/// See: <https://developers.google.com/youtube/v3/docs/search#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<SearchResultSnippet>,
}

impl SearchResult {
    /// The channel this result refers to (for channel results) or belongs to (otherwise).
    pub fn channel_id(&self) -> Option<&str> {
        self.id
            .channel_id
            .as_deref()
            .or_else(|| self.snippet.as_ref()?.channel_id.as_deref())
    }

    /// The video this result refers to, if it is a video result.
    pub fn video_id(&self) -> Option<&str> {
        self.id.video_id.as_deref()
    }

    /// The result's title, or the empty string if the snippet was not returned.
    pub fn title(&self) -> &str {
        self.snippet.as_ref().map_or("", |s| s.title.as_str())
    }
}

/// Identifies the resource that matched the search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResultId {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "videoId", skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(rename = "channelId", skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(rename = "playlistId", skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
}

/// See: <https://developers.google.com/youtube/v3/docs/search#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultSnippet {
    #[serde(rename = "channelId", skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// The title of the search result.
    pub title: String,
    #[serde(rename = "channelTitle", skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    #[serde(rename = "publishedAt", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
}

/// The kind of resource a search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Channel,
    Video,
}

impl SearchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchKind::Channel => "channel",
            SearchKind::Video => "video",
        }
    }
}

/// The ordering applied to search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    /// Reverse chronological order of creation.
    Date,
}

impl SearchOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchOrder::Date => "date",
        }
    }
}

/// Parameters for one `search.list` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRequest<'a> {
    /// Free-text query (`q`).
    pub query: Option<&'a str>,
    /// Restricts results to resources created by this channel.
    pub channel_id: Option<&'a str>,
    pub kind: SearchKind,
    pub order: Option<SearchOrder>,
    /// Between 1 and 50.
    pub max_results: u32,
    pub page_token: Option<&'a str>,
}

impl<'a> SearchRequest<'a> {
    /// A keyword search for channels.
    pub fn channels(query: &'a str, max_results: u32) -> Self {
        Self {
            query: Some(query),
            channel_id: None,
            kind: SearchKind::Channel,
            order: None,
            max_results,
            page_token: None,
        }
    }

    /// A page of one channel's videos, newest first.
    pub fn channel_videos(
        channel_id: &'a str,
        max_results: u32,
        page_token: Option<&'a str>,
    ) -> Self {
        Self {
            query: None,
            channel_id: Some(channel_id),
            kind: SearchKind::Video,
            order: Some(SearchOrder::Date),
            max_results,
            page_token,
        }
    }
}
