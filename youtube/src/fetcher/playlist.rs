use super::{Completion, VideoFetcher};
use crate::error::FetchError;
use crate::model::{PlaylistListing, SourceKind, VideoRecord};
use crate::youtube_api::DataApi;
use tracing::instrument;

impl<A: DataApi> VideoFetcher<A> {
    /// Retrieves every video in a playlist.
    ///
    /// A playlist that was fully walked before is served from the cache without any API calls.
    /// Otherwise the playlist is looked up first, so that a mistyped id is reported as
    /// [`FetchError::NotFound`] instead of as an empty result.
    #[instrument(skip(self))]
    pub async fn get_videos_from_playlist(
        &mut self,
        playlist_id: &str,
    ) -> Result<Vec<VideoRecord>, FetchError> {
        let playlist_id = playlist_id.trim();
        if let Some(listing) = self.cache.listing(playlist_id) {
            tracing::debug!(videos = listing.videos.len(), "playlist served from cache");
            return Ok(listing.videos.clone());
        }

        let lookup = self.call_playlists(playlist_id).await?;
        let Some(playlist) = lookup.items.front() else {
            return Err(FetchError::NotFound {
                kind: SourceKind::Playlist,
                reference: playlist_id.to_string(),
            });
        };
        tracing::debug!(item_count = playlist.item_count(), "found playlist");

        let collection = self.collect(playlist_id, self.page_limit).await?;
        let ids: Vec<String> = collection.ids.into_iter().collect();
        let videos = self.fetch_details(&ids).await?;

        match collection.completion {
            Completion::Exhausted => {
                self.cache.insert_listing(
                    playlist_id,
                    PlaylistListing {
                        video_ids: ids,
                        videos: videos.clone(),
                    },
                );
            }
            Completion::PageLimit => {}
            Completion::Interrupted(e) => {
                tracing::warn!(
                    error = %e,
                    videos = videos.len(),
                    "playlist walk was interrupted, returning what was found"
                );
            }
        }

        tracing::info!(videos = videos.len(), "retrieved playlist videos");
        Ok(videos)
    }
}
