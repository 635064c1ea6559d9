//! Walking a playlist's item listing.

use super::{ProgressEvent, VideoFetcher};
use crate::error::FetchError;
use crate::youtube_api::DataApi;
use indexmap::IndexSet;
use tracing::instrument;

/// Items requested per listing page; the API's maximum.
pub const PAGE_SIZE: u32 = 50;

/// After this many failed requests in a row for the same page, a walk is abandoned.
pub const MAX_CONSECUTIVE_PAGE_FAILURES: u32 = 3;

/// Why a playlist walk stopped.
#[derive(Debug)]
pub enum Completion {
    /// The last page was reached.
    Exhausted,
    /// The page limit was hit while more pages were still available.
    PageLimit,
    /// A later page kept failing; the ids collected before it are still valid.
    Interrupted(FetchError),
}

/// The ids found by one playlist walk.
#[derive(Debug)]
pub struct Collection {
    /// Unique video ids in first-seen order.
    pub ids: IndexSet<String>,
    /// Number of listing requests made, including failed ones.
    pub pages: u32,
    pub completion: Completion,
}

impl Collection {
    /// Whether every page of the playlist was seen.
    pub fn is_complete(&self) -> bool {
        matches!(self.completion, Completion::Exhausted)
    }
}

impl<A: DataApi> VideoFetcher<A> {
    /// Pages through `playlist_id`, collecting each video id once, in first-seen order.
    ///
    /// At most `page_limit` listing requests are made. Items whose video id is missing (e.g.
    /// deleted videos) are skipped. A failure on the first page is returned as an error, since
    /// nothing is known about the playlist at that point; later failures retry the same page
    /// and, if it keeps failing, end the walk with [`Completion::Interrupted`]. Quota exhaustion
    /// ends the walk without retrying.
    #[instrument(skip(self))]
    pub async fn collect(
        &mut self,
        playlist_id: &str,
        page_limit: u32,
    ) -> Result<Collection, FetchError> {
        let mut ids = IndexSet::new();
        let mut pages = 0;
        let mut failures = 0;
        let mut page_token: Option<String> = None;

        let completion = loop {
            if pages >= page_limit {
                tracing::warn!(
                    playlist_id,
                    page_limit,
                    collected = ids.len(),
                    "page limit reached before the end of the playlist"
                );
                break Completion::PageLimit;
            }
            pages += 1;

            let page = match self
                .call_playlist_items(playlist_id, PAGE_SIZE, page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) if page_token.is_none() => return Err(e),
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        playlist_id,
                        page = pages,
                        attempt = failures,
                        error = %e,
                        "failed to fetch playlist page"
                    );
                    let quota = e.remote().is_some_and(|e| e.is_quota_exceeded());
                    if quota || failures >= MAX_CONSECUTIVE_PAGE_FAILURES {
                        break Completion::Interrupted(e);
                    }
                    continue;
                }
            };
            failures = 0;

            let before = ids.len();
            let mut skipped = 0;
            for item in &page.items {
                match item.video_id() {
                    Some(id) => {
                        ids.insert(id.to_string());
                    }
                    None => skipped += 1,
                }
            }
            tracing::debug!(
                playlist_id,
                page = pages,
                new = ids.len() - before,
                skipped,
                total = ids.len(),
                "collected playlist page"
            );
            self.report(ProgressEvent::Page {
                playlist_id: playlist_id.to_string(),
                page: pages,
                total_ids: ids.len(),
            });

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break Completion::Exhausted,
            }
        };

        Ok(Collection {
            ids,
            pages,
            completion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCall, MockDataApi};
    use pretty_assertions::assert_eq;

    fn ids(prefix: &str, range: std::ops::Range<usize>) -> Vec<Option<String>> {
        range.map(|i| Some(format!("{prefix}{i}"))).collect()
    }

    #[tokio::test]
    async fn duplicates_keep_first_seen_order() {
        let api = MockDataApi::default().with_playlist_pages(
            "PLdup",
            vec![
                vec![Some("a".into()), Some("b".into()), Some("a".into())],
                vec![Some("c".into()), Some("b".into()), None, Some("d".into())],
                vec![Some("a".into()), Some("e".into())],
            ],
        );
        let mut fetcher = VideoFetcher::new(api);

        let collection = fetcher.collect("PLdup", 10).await.unwrap();
        assert_eq!(
            collection.ids.into_iter().collect::<Vec<_>>(),
            vec!["a", "b", "c", "d", "e"]
        );
        assert_eq!(collection.pages, 3);
        assert!(matches!(collection.completion, Completion::Exhausted));
    }

    #[tokio::test]
    async fn endless_source_stops_at_page_limit() {
        let api = MockDataApi::default().with_endless_playlist("PLloop");
        let mut fetcher = VideoFetcher::new(api);

        let collection = fetcher.collect("PLloop", 4).await.unwrap();
        assert_eq!(collection.pages, 4);
        assert_eq!(collection.ids.len(), 4 * PAGE_SIZE as usize);
        assert!(matches!(collection.completion, Completion::PageLimit));
        assert_eq!(fetcher.api().playlist_item_calls("PLloop"), 4);
        assert_eq!(fetcher.api_call_count(), 4);
    }

    #[tokio::test]
    async fn failed_page_is_retried_with_the_same_token() {
        let api = MockDataApi::default()
            .with_playlist_pages("PLflaky", vec![ids("a", 0..50), ids("b", 0..10)])
            .with_page_failures("PLflaky", 1, 2);
        let mut fetcher = VideoFetcher::new(api);

        let collection = fetcher.collect("PLflaky", 10).await.unwrap();
        assert!(collection.is_complete());
        assert_eq!(collection.ids.len(), 60);
        assert_eq!(collection.pages, 4);
        let page_two = MockCall::PlaylistItems {
            playlist_id: "PLflaky".to_string(),
            page_token: Some("page-1".to_string()),
        };
        let calls = fetcher.api().calls();
        assert_eq!(calls.iter().filter(|c| **c == page_two).count(), 3);
    }

    #[tokio::test]
    async fn persistent_page_failure_keeps_earlier_ids() {
        let api = MockDataApi::default()
            .with_playlist_pages("PLbroken", vec![ids("a", 0..50), ids("b", 0..10)])
            .with_page_failures("PLbroken", 1, 10);
        let mut fetcher = VideoFetcher::new(api);

        let collection = fetcher.collect("PLbroken", 10).await.unwrap();
        assert_eq!(collection.ids.len(), 50);
        assert_eq!(collection.pages, 1 + MAX_CONSECUTIVE_PAGE_FAILURES);
        assert!(matches!(
            collection.completion,
            Completion::Interrupted(FetchError::Remote { .. })
        ));
    }

    #[tokio::test]
    async fn exhausted_quota_is_not_retried() {
        let api = MockDataApi::default()
            .with_playlist_pages("PLquota", vec![ids("a", 0..50), ids("b", 0..10)])
            .with_quota(1);
        let mut fetcher = VideoFetcher::new(api);

        let collection = fetcher.collect("PLquota", 10).await.unwrap();
        assert_eq!(collection.ids.len(), 50);
        assert_eq!(collection.pages, 2);
        match &collection.completion {
            Completion::Interrupted(e) => {
                assert!(e.remote().is_some_and(|e| e.is_quota_exceeded()), "{e:?}")
            }
            other => panic!("expected an interrupted walk, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_page_failure_is_an_error() {
        let mut fetcher = VideoFetcher::new(MockDataApi::default());
        let err = fetcher.collect("PLmissing", 10).await.unwrap_err();
        assert!(
            err.remote().is_some_and(|e| e.is_not_found()),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn progress_is_reported_per_page() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let api = MockDataApi::default()
            .with_playlist_pages("PLprog", vec![ids("a", 0..50), ids("b", 0..20)]);
        let mut fetcher = VideoFetcher::new(api).with_progress(tx);

        fetcher.collect("PLprog", 10).await.unwrap();
        drop(fetcher);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                ProgressEvent::Page {
                    playlist_id: "PLprog".to_string(),
                    page: 1,
                    total_ids: 50,
                },
                ProgressEvent::Page {
                    playlist_id: "PLprog".to_string(),
                    page: 2,
                    total_ids: 70,
                },
            ]
        );
    }

    #[tokio::test]
    async fn closed_progress_receiver_is_ignored() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let api = MockDataApi::default().with_playlist_pages("PLquiet", vec![ids("a", 0..3)]);
        let mut fetcher = VideoFetcher::new(api).with_progress(tx);

        let collection = fetcher.collect("PLquiet", 10).await.unwrap();
        assert_eq!(collection.ids.len(), 3);
    }
}
