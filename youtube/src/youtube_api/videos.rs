//! YouTube Videos API types and functionality.

use crate::youtube_api::types::{PageInfo, Thumbnails};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Response structure for the `videos.list` API call.
///
/// Contains a list of [`Video`] resources that match the request criteria,
/// along with pagination information in [`PageInfo`].
///
/// Videos that are private, deleted, or otherwise inaccessible are silently left out of
/// `items`, so the response can hold fewer entries than ids were requested.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/list>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoListResponse {
    /// A list of videos that match the request criteria.
    #[serde(default)]
    pub items: VecDeque<Video>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    /// Token to pass as `pageToken` to retrieve the next page of results.
    #[serde(rename = "nextPageToken", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// A `video` resource represents a YouTube video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// The ID that YouTube uses to uniquely identify the video.
    pub id: String,
    /// Contains basic details about the video.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<VideoSnippet>,
    /// Contains statistics about the video.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<VideoStatistics>,
    /// Contains information about the video content, including its length.
    #[serde(rename = "contentDetails", skip_serializing_if = "Option::is_none")]
    pub content_details: Option<VideoContentDetails>,
}

/// Basic details about a video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSnippet {
    /// The date and time that the video was published.
    #[serde(rename = "publishedAt")]
    pub published_at: Timestamp,
    /// The ID of the channel that the video was uploaded to.
    #[serde(rename = "channelId", skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// The video's title.
    pub title: String,
    /// The video's description.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

/// Statistics about the video.
///
/// Counters are serialized as strings by the API, and any of them can be absent when the
/// owner has hidden it.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#statistics>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoStatistics {
    /// The number of times the video has been viewed.
    #[serde(rename = "viewCount", skip_serializing_if = "Option::is_none")]
    pub view_count: Option<String>,
    /// The number of users who have indicated that they liked the video.
    #[serde(rename = "likeCount", skip_serializing_if = "Option::is_none")]
    pub like_count: Option<String>,
    /// The number of users who have indicated that they disliked the video.
    /// Note: This is only visible to the video owner.
    #[serde(rename = "dislikeCount", skip_serializing_if = "Option::is_none")]
    pub dislike_count: Option<String>,
    /// The number of users who currently have the video marked as a favorite video.
    /// Note: This property is deprecated and always returns 0.
    #[serde(rename = "favoriteCount", skip_serializing_if = "Option::is_none")]
    pub favorite_count: Option<String>,
    /// The number of comments for the video.
    #[serde(rename = "commentCount", skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<String>,
}

/// Information about the video content.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#contentDetails>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoContentDetails {
    /// The length of the video as an ISO 8601 duration, e.g. `PT15M33S`.
    pub duration: String,
}

fn parse_counter(counter: Option<&String>) -> u64 {
    counter.and_then(|c| c.parse().ok()).unwrap_or(0)
}

impl VideoStatistics {
    pub fn views(&self) -> u64 {
        parse_counter(self.view_count.as_ref())
    }

    pub fn likes(&self) -> u64 {
        parse_counter(self.like_count.as_ref())
    }

    pub fn comments(&self) -> u64 {
        parse_counter(self.comment_count.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_video_with_hidden_likes() {
        let response: VideoListResponse = serde_json::from_value(serde_json::json!({
            "kind": "youtube#videoListResponse",
            "items": [{
                "id": "dQw4w9WgXcQ",
                "snippet": {
                    "publishedAt": "2009-10-25T06:57:33Z",
                    "channelId": "UCuAXFkgsw1L7xaCfnd5JJOw",
                    "title": "Rick Astley - Never Gonna Give You Up",
                    "description": "The official video",
                    "thumbnails": { "high": { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg" } }
                },
                "statistics": { "viewCount": "1500000000", "commentCount": "2300000" },
                "contentDetails": { "duration": "PT3M33S" }
            }],
            "pageInfo": { "totalResults": 1, "resultsPerPage": 1 }
        }))
        .unwrap();

        let video = &response.items[0];
        let stats = video.statistics.as_ref().unwrap();
        assert_eq!(stats.views(), 1_500_000_000);
        assert_eq!(stats.likes(), 0);
        assert_eq!(stats.comments(), 2_300_000);
        assert_eq!(video.content_details.as_ref().unwrap().duration, "PT3M33S");
    }
}
