//! Predicting the quota cost of a fetch.

use super::{DETAIL_BATCH_SIZE, PAGE_SIZE, VideoFetcher, meets_coverage};
use crate::error::FetchError;
use crate::model::SourceKind;
use crate::youtube_api::DataApi;
use serde::Serialize;
use tracing::instrument;

/// Items requested by the playlist sample call.
const SAMPLE_SIZE: u32 = 5;

/// The predicted cost of fetching a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EstimateResult {
    /// Remote calls a full fetch will cost, including those already spent estimating.
    pub estimated_calls: u64,
    /// Number of videos the source reports.
    pub item_count: u64,
    /// The source can be served (almost) entirely from the cache.
    pub already_cached: bool,
}

/// The outcome of [`VideoFetcher::estimate`].
#[derive(Debug)]
pub enum Estimate {
    Projected(EstimateResult),
    /// The source could not be looked up.
    Unavailable {
        error: FetchError,
        /// Calls spent before the lookup failed.
        calls_made: u64,
    },
}

fn listing_and_detail_calls(item_count: u64) -> u64 {
    item_count.div_ceil(u64::from(PAGE_SIZE)) + item_count.div_ceil(DETAIL_BATCH_SIZE as u64)
}

impl<A: DataApi> VideoFetcher<A> {
    /// Predicts how many remote calls fetching `reference` will cost, without fetching it.
    ///
    /// Looking up the source's size does cost a call or two; those are included in the
    /// estimate. Failures to find the source are reported as [`Estimate::Unavailable`].
    #[instrument(skip(self))]
    pub async fn estimate(&mut self, reference: &str, kind: SourceKind) -> Estimate {
        let start = self.api_call_count();
        let projected = match kind {
            SourceKind::Channel => self.estimate_channel(reference, start).await,
            SourceKind::Playlist => self.estimate_playlist(reference, start).await,
        };
        match projected {
            Ok(estimate) => {
                tracing::debug!(
                    estimated_calls = estimate.estimated_calls,
                    item_count = estimate.item_count,
                    already_cached = estimate.already_cached,
                    "estimated fetch cost"
                );
                Estimate::Projected(estimate)
            }
            Err(error) => Estimate::Unavailable {
                error,
                calls_made: self.api_call_count() - start,
            },
        }
    }

    async fn estimate_channel(
        &mut self,
        reference: &str,
        start: u64,
    ) -> Result<EstimateResult, FetchError> {
        if let Some(info) = self.cache.channel(reference.trim()) {
            if let Some(listing) = self.cache.listing(&info.uploads_playlist_id) {
                let present = listing
                    .video_ids
                    .iter()
                    .filter(|id| self.cache.contains_video(id))
                    .count();
                if meets_coverage(present, info.video_count) {
                    return Ok(EstimateResult {
                        estimated_calls: 1,
                        item_count: info.video_count,
                        already_cached: true,
                    });
                }
            }
        }

        let info = self.resolve(reference, false).await?;
        let spent = self.api_call_count() - start;
        Ok(EstimateResult {
            estimated_calls: spent + listing_and_detail_calls(info.video_count),
            item_count: info.video_count,
            already_cached: false,
        })
    }

    async fn estimate_playlist(
        &mut self,
        playlist_id: &str,
        start: u64,
    ) -> Result<EstimateResult, FetchError> {
        let playlist_id = playlist_id.trim();
        if let Some(listing) = self.cache.listing(playlist_id) {
            return Ok(EstimateResult {
                estimated_calls: 1,
                item_count: listing.video_ids.len() as u64,
                already_cached: true,
            });
        }

        let lookup = self.call_playlists(playlist_id).await?;
        let item_count = lookup
            .items
            .front()
            .map(|playlist| playlist.item_count())
            .ok_or_else(|| FetchError::NotFound {
                kind: SourceKind::Playlist,
                reference: playlist_id.to_string(),
            })?;

        // confirms the items are actually listable with this key
        self.call_playlist_items(playlist_id, SAMPLE_SIZE, None)
            .await?;

        // the sample page is not repeated by the real fetch
        let spent = self.api_call_count() - start - 1;
        Ok(EstimateResult {
            estimated_calls: spent + listing_and_detail_calls(item_count),
            item_count,
            already_cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDataApi, channel_id};
    use pretty_assertions::assert_eq;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("v{i:03}")).collect()
    }

    fn projected(estimate: Estimate) -> EstimateResult {
        match estimate {
            Estimate::Projected(result) => result,
            Estimate::Unavailable { error, .. } => panic!("estimate failed: {error}"),
        }
    }

    #[test]
    fn pages_and_batches_round_up() {
        assert_eq!(listing_and_detail_calls(0), 0);
        assert_eq!(listing_and_detail_calls(1), 2);
        assert_eq!(listing_and_detail_calls(50), 2);
        assert_eq!(listing_and_detail_calls(120), 6);
    }

    #[tokio::test]
    async fn uncached_channel_includes_resolution_cost() {
        let id = channel_id("est");
        let api = MockDataApi::default()
            .with_channel(&id, "Estimates", "UUest", 120)
            .with_username("estimates", &id);
        let mut fetcher = VideoFetcher::new(api);

        let result = projected(fetcher.estimate("estimates", SourceKind::Channel).await);
        assert_eq!(
            result,
            EstimateResult {
                estimated_calls: 1 + 6,
                item_count: 120,
                already_cached: false,
            }
        );
        assert_eq!(fetcher.api_call_count(), 1);
    }

    #[tokio::test]
    async fn fetched_channel_is_already_cached() {
        let id = channel_id("done");
        let api = MockDataApi::default()
            .with_channel(&id, "Done", "UUdone", 60)
            .with_playlist("UUdone", &ids(60));
        let mut fetcher = VideoFetcher::new(api);
        fetcher.get_all_videos(&id).await.unwrap();

        let calls = fetcher.api_call_count();
        let result = projected(fetcher.estimate(&id, SourceKind::Channel).await);
        assert_eq!(
            result,
            EstimateResult {
                estimated_calls: 1,
                item_count: 60,
                already_cached: true,
            }
        );
        assert_eq!(fetcher.api_call_count(), calls);
    }

    #[tokio::test]
    async fn under_target_channel_is_not_already_cached() {
        let id = channel_id("partial");
        let uploads = crate::fetcher::modified_channel_id(&id).unwrap();
        let api = MockDataApi::default()
            .with_channel(&id, "Partial", &uploads, 100)
            .with_playlist(&uploads, &ids(40));
        let mut fetcher = VideoFetcher::new(api);
        let fetched = fetcher.get_all_videos(&id).await.unwrap();
        assert!(fetched.under_target);
        assert_eq!(fetched.videos.len(), 40);

        let calls = fetcher.api_call_count();
        let result = projected(fetcher.estimate(&id, SourceKind::Channel).await);
        assert_eq!(
            result,
            EstimateResult {
                // resolution is served from the cache
                estimated_calls: 4,
                item_count: 100,
                already_cached: false,
            }
        );
        assert_eq!(fetcher.api_call_count(), calls);
    }

    #[tokio::test]
    async fn playlist_estimate_discounts_the_sample() {
        let api = MockDataApi::default().with_playlist("PLest", &ids(120));
        let mut fetcher = VideoFetcher::new(api);

        let result = projected(fetcher.estimate("PLest", SourceKind::Playlist).await);
        assert_eq!(
            result,
            EstimateResult {
                estimated_calls: 1 + 6,
                item_count: 120,
                already_cached: false,
            }
        );
        assert_eq!(fetcher.api_call_count(), 2);

        // the prediction matches what the fetch actually costs
        fetcher.get_videos_from_playlist("PLest").await.unwrap();
        assert_eq!(fetcher.api_call_count(), 2 + 7);

        let cached = projected(fetcher.estimate("PLest", SourceKind::Playlist).await);
        assert!(cached.already_cached);
        assert_eq!(cached.estimated_calls, 1);
        assert_eq!(cached.item_count, 120);
    }

    #[tokio::test]
    async fn missing_sources_are_unavailable() {
        let mut fetcher = VideoFetcher::new(MockDataApi::default());

        match fetcher.estimate("PLnope", SourceKind::Playlist).await {
            Estimate::Unavailable {
                error: FetchError::NotFound { .. },
                calls_made: 1,
            } => {}
            other => panic!("unexpected estimate {other:?}"),
        }

        match fetcher.estimate("nobody", SourceKind::Channel).await {
            Estimate::Unavailable {
                error: FetchError::NotFound { .. },
                calls_made: 2,
            } => {}
            other => panic!("unexpected estimate {other:?}"),
        }
    }
}
