//! YouTube Playlists and PlaylistItems API types.

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Response structure for the `playlists.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists/list>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistListResponse {
    /// A list of playlists that match the request criteria.
    #[serde(default)]
    pub items: VecDeque<Playlist>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// A `playlist` resource represents a YouTube playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlists#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    /// The ID that YouTube uses to uniquely identify the playlist.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PlaylistSnippet>,
    #[serde(rename = "contentDetails", skip_serializing_if = "Option::is_none")]
    pub content_details: Option<PlaylistContentDetails>,
}

impl Playlist {
    /// The number of items the playlist reports, or zero if `contentDetails` was not requested.
    pub fn item_count(&self) -> u64 {
        self.content_details.as_ref().map_or(0, |d| d.item_count)
    }
}

/// See: <https://developers.google.com/youtube/v3/docs/playlists#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSnippet {
    /// The playlist's title.
    pub title: String,
    /// The ID of the channel that published the playlist.
    #[serde(rename = "channelId", skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// See: <https://developers.google.com/youtube/v3/docs/playlists#contentDetails>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistContentDetails {
    /// The number of videos in the playlist.
    #[serde(rename = "itemCount", default)]
    pub item_count: u64,
}

/// Response structure for the `playlistItems.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems/list>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistItemListResponse {
    /// The items on this page of the playlist.
    #[serde(default)]
    pub items: VecDeque<PlaylistItem>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    /// Token for the next page. Absent on the last page.
    #[serde(rename = "nextPageToken", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// A `playlistItem` resource identifies a resource, such as a video, that is included in a
/// playlist.
///
/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// The ID that YouTube uses to uniquely identify the playlist item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PlaylistItemSnippet>,
}

impl PlaylistItem {
    /// The ID of the video this item refers to.
    ///
    /// Items whose source video was deleted can lack the nested id entirely.
    pub fn video_id(&self) -> Option<&str> {
        self.snippet
            .as_ref()?
            .resource_id
            .as_ref()?
            .video_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

/// See: <https://developers.google.com/youtube/v3/docs/playlistItems#snippet>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistItemSnippet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Identifies the resource that is included in the playlist.
    #[serde(rename = "resourceId", skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ResourceId>,
}

/// A reference to a resource, as used by playlist items and search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceId {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "videoId", skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_item_without_resource_id_has_no_video_id() {
        let page: PlaylistItemListResponse = serde_json::from_value(serde_json::json!({
            "nextPageToken": "EAAaBlBUOkNESQ",
            "items": [
                {
                    "id": "VVVIbnlmTXFpUlJHMXUtMk1zU1FMYlhBLjVBQjA",
                    "snippet": {
                        "title": "A video",
                        "resourceId": { "kind": "youtube#video", "videoId": "abc123def45" }
                    }
                },
                { "id": "deleted", "snippet": { "title": "Deleted video" } },
                { "id": "empty", "snippet": { "resourceId": { "kind": "youtube#video", "videoId": "" } } }
            ]
        }))
        .unwrap();

        let ids: Vec<_> = page.items.iter().map(PlaylistItem::video_id).collect();
        assert_eq!(ids, vec![Some("abc123def45"), None, None]);
        assert_eq!(page.next_page_token.as_deref(), Some("EAAaBlBUOkNESQ"));
    }
}
