use super::{ProgressEvent, VideoFetcher, records_from_cache};
use crate::error::FetchError;
use crate::model::VideoRecord;
use crate::youtube_api::DataApi;
use indexmap::IndexSet;
use tracing::instrument;

/// Most ids `videos.list` accepts per call.
pub const DETAIL_BATCH_SIZE: usize = 50;

impl<A: DataApi> VideoFetcher<A> {
    /// Returns metadata for every id in `ids` that the API can resolve.
    ///
    /// Ids already in the cache cost nothing; the rest are looked up in batches of
    /// [`DETAIL_BATCH_SIZE`]. Ids the API leaves out of its response (private or removed videos)
    /// are omitted from the result rather than treated as an error. Records come back in the
    /// order of `ids`.
    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn fetch_details(&mut self, ids: &[String]) -> Result<Vec<VideoRecord>, FetchError> {
        let missing: IndexSet<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| !self.cache.contains_video(id))
            .collect();
        let missing: Vec<&str> = missing.into_iter().collect();

        let mut fetched = 0;
        for batch in missing.chunks(DETAIL_BATCH_SIZE) {
            let response = self.call_videos(batch).await?;
            let returned = response.items.len();
            for video in response.items {
                if let Some(record) = VideoRecord::from_video(video) {
                    self.cache.insert_video(record);
                }
            }
            fetched += batch.len();
            if returned < batch.len() {
                tracing::debug!(
                    requested = batch.len(),
                    returned,
                    "some videos were not returned"
                );
            }
            self.report(ProgressEvent::Details {
                fetched,
                requested: missing.len(),
            });
        }

        let records = records_from_cache(&self.cache, ids);
        tracing::debug!(
            cached = ids.len() - missing.len(),
            looked_up = missing.len(),
            resolved = records.len(),
            "fetched video details"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDataApi;
    use pretty_assertions::assert_eq;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("vid{i:03}")).collect()
    }

    #[tokio::test]
    async fn details_are_fetched_in_batches_of_fifty() {
        let mut fetcher = VideoFetcher::new(MockDataApi::default());

        let records = fetcher.fetch_details(&ids(130)).await.unwrap();
        assert_eq!(records.len(), 130);
        assert_eq!(fetcher.api().video_batch_sizes(), vec![50, 50, 30]);
        assert_eq!(fetcher.api_call_count(), 3);

        let again = fetcher.fetch_details(&ids(130)).await.unwrap();
        assert_eq!(again, records);
        assert_eq!(fetcher.api_call_count(), 3);
    }

    #[tokio::test]
    async fn only_uncached_ids_are_looked_up() {
        let mut fetcher = VideoFetcher::new(MockDataApi::default());
        fetcher.fetch_details(&ids(20)).await.unwrap();

        let records = fetcher.fetch_details(&ids(60)).await.unwrap();
        assert_eq!(records.len(), 60);
        assert_eq!(fetcher.api().video_batch_sizes(), vec![20, 40]);
    }

    #[tokio::test]
    async fn unresolvable_ids_are_omitted() {
        let api = MockDataApi::default().with_hidden_videos(["vid001", "vid003"]);
        let mut fetcher = VideoFetcher::new(api);

        let records = fetcher.fetch_details(&ids(5)).await.unwrap();
        let got: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(got, vec!["vid000", "vid002", "vid004"]);
    }

    #[tokio::test]
    async fn repeated_ids_are_looked_up_once() {
        let mut fetcher = VideoFetcher::new(MockDataApi::default());
        let request = vec!["x".to_string(), "y".to_string(), "x".to_string()];

        let records = fetcher.fetch_details(&request).await.unwrap();
        assert_eq!(fetcher.api().video_batch_sizes(), vec![2]);
        assert_eq!(records.len(), 3);
    }
}
