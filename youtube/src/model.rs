//! The records the pipeline produces and caches.

use crate::youtube_api::Video;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a reference names a channel or a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Channel,
    Playlist,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            SourceKind::Channel => "channel",
            SourceKind::Playlist => "playlist",
        })
    }
}

/// A resolved channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// The canonical `UC…` id.
    pub channel_id: String,
    pub uploads_playlist_id: String,
    /// Public video count as reported by the API. Approximate: private, unlisted and removed
    /// uploads make it drift from what the uploads playlist actually yields.
    pub video_count: u64,
}

/// Normalized metadata for one video.
///
/// The serialized field names are what ranking and saved searches consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: Timestamp,
    #[serde(rename = "thumbnail")]
    pub thumbnail_url: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// ISO 8601 duration, e.g. `PT4M13S`.
    pub duration: String,
    pub url: String,
}

impl VideoRecord {
    /// Normalizes a `videos.list` item.
    ///
    /// Returns `None` when the item lacks a snippet, since without a title and publish time the
    /// video cannot be ranked. Missing statistics count as zero.
    pub fn from_video(video: Video) -> Option<Self> {
        let snippet = video.snippet?;
        let statistics = video.statistics.unwrap_or_default();
        let url = format!("https://www.youtube.com/watch?v={}", video.id);
        Some(Self {
            thumbnail_url: snippet
                .thumbnails
                .preferred_url()
                .unwrap_or_default()
                .to_string(),
            title: snippet.title,
            description: snippet.description,
            published_at: snippet.published_at,
            view_count: statistics.views(),
            like_count: statistics.likes(),
            comment_count: statistics.comments(),
            duration: video
                .content_details
                .map(|d| d.duration)
                .unwrap_or_default(),
            url,
            id: video.id,
        })
    }
}

/// A fully walked playlist: ids in discovery order plus the records that could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistListing {
    pub video_ids: Vec<String>,
    pub videos: Vec<VideoRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_serializes_with_external_field_names() {
        let video: Video = serde_json::from_value(serde_json::json!({
            "id": "abc123def45",
            "snippet": {
                "publishedAt": "2024-03-01T12:00:00Z",
                "title": "Intro",
                "thumbnails": {
                    "default": { "url": "https://i.ytimg.com/vi/abc123def45/default.jpg" },
                    "high": { "url": "https://i.ytimg.com/vi/abc123def45/hqdefault.jpg" }
                }
            },
            "statistics": { "viewCount": "1200", "likeCount": "34" },
            "contentDetails": { "duration": "PT4M13S" }
        }))
        .unwrap();

        let record = VideoRecord::from_video(video).unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({
                "id": "abc123def45",
                "title": "Intro",
                "description": "",
                "published_at": "2024-03-01T12:00:00Z",
                "thumbnail": "https://i.ytimg.com/vi/abc123def45/hqdefault.jpg",
                "view_count": 1200,
                "like_count": 34,
                "comment_count": 0,
                "duration": "PT4M13S",
                "url": "https://www.youtube.com/watch?v=abc123def45"
            })
        );
    }

    #[test]
    fn video_without_snippet_is_dropped() {
        let video: Video = serde_json::from_value(serde_json::json!({ "id": "gone" })).unwrap();
        assert!(VideoRecord::from_video(video).is_none());
    }
}
