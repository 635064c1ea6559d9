//! Instance-scoped memoization of remote results.

use crate::model::{ChannelInfo, PlaylistListing, VideoRecord};
use std::collections::HashMap;

/// Append-only memo of everything the pipeline has fetched.
///
/// Entries are never replaced or evicted: the first value stored under a key is the one every
/// later lookup sees, for as long as the owning [`super::VideoFetcher`] lives.
#[derive(Debug, Default)]
pub struct ResponseCache {
    channels: HashMap<String, ChannelInfo>,
    videos: HashMap<String, VideoRecord>,
    listings: HashMap<String, PlaylistListing>,
}

impl ResponseCache {
    pub fn channel(&self, reference: &str) -> Option<&ChannelInfo> {
        self.channels.get(reference)
    }

    pub(crate) fn insert_channel(&mut self, reference: impl Into<String>, info: ChannelInfo) {
        self.channels.entry(reference.into()).or_insert(info);
    }

    pub fn video(&self, id: &str) -> Option<&VideoRecord> {
        self.videos.get(id)
    }

    pub fn contains_video(&self, id: &str) -> bool {
        self.videos.contains_key(id)
    }

    pub(crate) fn insert_video(&mut self, record: VideoRecord) {
        self.videos.entry(record.id.clone()).or_insert(record);
    }

    pub fn listing(&self, playlist_id: &str) -> Option<&PlaylistListing> {
        self.listings.get(playlist_id)
    }

    /// Stores a completed listing. Empty listings are not stored, so a failed or empty walk can
    /// never mask a later successful one.
    pub(crate) fn insert_listing(
        &mut self,
        playlist_id: impl Into<String>,
        listing: PlaylistListing,
    ) {
        if listing.videos.is_empty() {
            return;
        }
        self.listings.entry(playlist_id.into()).or_insert(listing);
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }
}

/// Number of remote calls issued, across every operation of one fetcher.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounter(u64);

impl CallCounter {
    pub(crate) fn record(&mut self) {
        self.0 += 1;
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    fn record(id: &str, title: &str) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            published_at: Timestamp::UNIX_EPOCH,
            thumbnail_url: String::new(),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            duration: "PT1S".to_string(),
            url: String::new(),
        }
    }

    #[test]
    fn first_entry_wins() {
        let mut cache = ResponseCache::default();
        cache.insert_video(record("a", "first"));
        cache.insert_video(record("a", "second"));
        assert_eq!(cache.video("a").unwrap().title, "first");
        assert_eq!(cache.video_count(), 1);
    }

    #[test]
    fn empty_listing_is_not_cached() {
        let mut cache = ResponseCache::default();
        cache.insert_listing(
            "PL1",
            PlaylistListing {
                video_ids: vec!["a".to_string()],
                videos: Vec::new(),
            },
        );
        assert!(cache.listing("PL1").is_none());

        cache.insert_listing(
            "PL1",
            PlaylistListing {
                video_ids: vec!["a".to_string()],
                videos: vec![record("a", "first")],
            },
        );
        assert_eq!(cache.listing("PL1").unwrap().videos.len(), 1);
    }
}
