//! Channel reference resolution.
//!
//! Users refer to channels in many ways: `UC…` ids, `@handles`, legacy usernames, custom URL
//! names, full channel URLs, or just the channel's title. Resolution tries the cheap,
//! unambiguous lookups first and only falls back to (expensive) search when it has to.

use super::VideoFetcher;
use crate::error::FetchError;
use crate::model::{ChannelInfo, SourceKind};
use crate::youtube_api::{Channel, ChannelFilter, DataApi, SearchRequest};
use indexmap::{IndexMap, IndexSet};
use tracing::instrument;
use url::Url;

/// How many results a single channel search asks for.
const CHANNEL_SEARCH_RESULTS: u32 = 5;

/// Path segments on youtube.com that never name a channel.
const NON_CHANNEL_PATHS: &[&str] = &[
    "watch", "playlist", "shorts", "results", "feed", "embed", "live",
];

/// Whether `reference` has the shape of a canonical channel id: `UC` followed by at least 22
/// URL-safe base64 characters.
pub fn is_channel_id(reference: &str) -> bool {
    reference.len() >= 24
        && reference.starts_with("UC")
        && reference
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Extracts the channel-identifying part of a YouTube channel URL.
///
/// Understands `/channel/<id>`, `/c/<name>`, `/user/<name>`, `/@handle` and bare `/<name>`
/// paths, with or without a scheme. Query strings and trailing path segments (e.g. `/videos`)
/// are ignored. Returns `None` for anything that is not a youtube.com channel URL.
pub fn normalize_channel_url(reference: &str) -> Option<String> {
    let reference = reference.trim();
    let url = if reference.contains("://") {
        Url::parse(reference).ok()?
    } else if ["youtube.com/", "www.youtube.com/", "m.youtube.com/"]
        .iter()
        .any(|prefix| reference.starts_with(prefix))
    {
        Url::parse(&format!("https://{reference}")).ok()?
    } else {
        return None;
    };

    let host = url.host_str()?;
    if host != "youtube.com" && !host.ends_with(".youtube.com") {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let first = segments.next()?;
    let normalized = match first {
        "channel" | "c" | "user" => segments.next()?,
        handle if handle.starts_with('@') => handle,
        name if !NON_CHANNEL_PATHS.contains(&name) => name,
        _ => return None,
    };
    Some(normalized.to_string())
}

/// Lowercases and drops whitespace and underscores, so `Rust_Lang`, `rust lang` and `RustLang`
/// all compare equal.
fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn channel_info(channel: Channel) -> Option<ChannelInfo> {
    let uploads_playlist_id = channel.uploads_playlist_id()?.to_string();
    let video_count = channel.video_count();
    Some(ChannelInfo {
        channel_id: channel.id,
        uploads_playlist_id,
        video_count,
    })
}

impl<A: DataApi> VideoFetcher<A> {
    /// Resolves a free-form channel reference to its canonical id, uploads playlist, and
    /// reported video count.
    ///
    /// Lookups are attempted in this order, stopping at the first hit:
    ///
    /// 1. canonical `UC…` ids are looked up directly;
    /// 2. channel URLs are reduced to their identifying segment, which is resolved as below;
    /// 3. `@handles` are searched for under several spellings and matched by title;
    /// 4. the reference is tried as a legacy username;
    /// 5. a keyword search is run and matched by title (see [`FetchError::Ambiguous`]).
    ///
    /// The result is memoized under `reference` and under the canonical id, so resolving the
    /// same reference again costs no API calls.
    #[instrument(skip(self))]
    pub async fn resolve(
        &mut self,
        reference: &str,
        allow_partial_matches: bool,
    ) -> Result<ChannelInfo, FetchError> {
        let reference = reference.trim();
        if let Some(info) = self.cache.channel(reference) {
            tracing::debug!(channel_id = %info.channel_id, "channel resolved from cache");
            return Ok(info.clone());
        }
        if reference.is_empty() {
            return Err(FetchError::NotFound {
                kind: SourceKind::Channel,
                reference: reference.to_string(),
            });
        }

        // URLs resolve through their identifying segment, and share its cache entry
        let normalized = normalize_channel_url(reference);
        let target = normalized.as_deref().unwrap_or(reference);
        if let Some(info) = self.cache.channel(target) {
            let info = info.clone();
            self.cache.insert_channel(reference, info.clone());
            return Ok(info);
        }
        if normalized.is_some() {
            tracing::debug!(normalized = target, "resolving channel URL");
        }

        let info = self.resolve_uncached(target, allow_partial_matches).await?;
        tracing::info!(
            channel_id = %info.channel_id,
            uploads = %info.uploads_playlist_id,
            video_count = info.video_count,
            "resolved channel"
        );
        self.cache.insert_channel(reference, info.clone());
        self.cache.insert_channel(target, info.clone());
        self.cache.insert_channel(info.channel_id.clone(), info.clone());
        Ok(info)
    }

    async fn resolve_uncached(
        &mut self,
        reference: &str,
        allow_partial_matches: bool,
    ) -> Result<ChannelInfo, FetchError> {
        if is_channel_id(reference) {
            return self.channel_info_by_id(reference).await;
        }

        if reference.starts_with('@') {
            if let Some(channel_id) = self.search_handle(reference).await? {
                return self.channel_info_by_id(&channel_id).await;
            }
            tracing::debug!(handle = reference, "no channel matched handle");
        }

        let bare = reference.trim_start_matches('@');
        let by_username = self.call_channels(ChannelFilter::Username(bare)).await?;
        if let Some(info) = by_username.items.into_iter().find_map(channel_info) {
            tracing::debug!(username = bare, "resolved legacy username");
            return Ok(info);
        }

        let channel_id = self.search_keyword(bare, allow_partial_matches).await?;
        self.channel_info_by_id(&channel_id).await
    }

    /// Fetches content details and statistics for a canonical channel id.
    async fn channel_info_by_id(&mut self, channel_id: &str) -> Result<ChannelInfo, FetchError> {
        let response = self.call_channels(ChannelFilter::Id(channel_id)).await?;
        response
            .items
            .into_iter()
            .find_map(channel_info)
            .ok_or_else(|| FetchError::NotFound {
                kind: SourceKind::Channel,
                reference: channel_id.to_string(),
            })
    }

    /// Searches for a channel by handle.
    ///
    /// Search does not index handles directly, so the handle is tried with and without its
    /// `@`, with underscores as spaces, and as a quoted phrase. Results are merged by channel
    /// id before matching titles.
    async fn search_handle(&mut self, handle: &str) -> Result<Option<String>, FetchError> {
        let bare = handle.trim_start_matches('@');
        let queries: IndexSet<String> = [
            format!("@{bare}"),
            bare.to_string(),
            bare.replace('_', " "),
            format!("\"{bare}\""),
        ]
        .into_iter()
        .collect();

        let mut candidates: IndexMap<String, String> = IndexMap::new();
        for query in &queries {
            let results = self
                .call_search(SearchRequest::channels(query, CHANNEL_SEARCH_RESULTS))
                .await?;
            for result in &results.items {
                if let Some(channel_id) = result.channel_id() {
                    candidates
                        .entry(channel_id.to_string())
                        .or_insert_with(|| result.title().to_string());
                }
            }
        }
        tracing::debug!(
            handle,
            queries = queries.len(),
            candidates = candidates.len(),
            "searched for handle"
        );

        let wanted = bare.to_lowercase();
        if let Some((channel_id, _)) = candidates
            .iter()
            .find(|(_, title)| title.to_lowercase() == wanted)
        {
            return Ok(Some(channel_id.clone()));
        }

        let wanted = normalize_title(bare);
        if wanted.is_empty() {
            return Ok(None);
        }
        let fuzzy = candidates.iter().find(|(_, title)| {
            let title = normalize_title(title);
            !title.is_empty() && (title.contains(&wanted) || wanted.contains(&title))
        });
        Ok(fuzzy.map(|(channel_id, _)| channel_id.clone()))
    }

    /// Searches for a channel by keyword and picks the best-matching title.
    async fn search_keyword(
        &mut self,
        query: &str,
        allow_partial_matches: bool,
    ) -> Result<String, FetchError> {
        let results = self
            .call_search(SearchRequest::channels(query, CHANNEL_SEARCH_RESULTS))
            .await?;
        let candidates: Vec<(&str, &str)> = results
            .items
            .iter()
            .filter_map(|r| Some((r.channel_id()?, r.title())))
            .collect();
        let Some(&(first_id, _)) = candidates.first() else {
            return Err(FetchError::NotFound {
                kind: SourceKind::Channel,
                reference: query.to_string(),
            });
        };

        let wanted = query.to_lowercase();
        if let Some(&(channel_id, _)) = candidates
            .iter()
            .find(|(_, title)| title.to_lowercase() == wanted)
        {
            return Ok(channel_id.to_string());
        }

        let partial: Vec<(&str, &str)> = candidates
            .iter()
            .copied()
            .filter(|(_, title)| title.to_lowercase().contains(&wanted))
            .collect();
        let ambiguous = |matches: &[(&str, &str)]| FetchError::Ambiguous {
            query: query.to_string(),
            candidates: matches.iter().map(|(_, title)| title.to_string()).collect(),
        };
        match partial.as_slice() {
            [] if allow_partial_matches => {
                tracing::warn!(query, "no title matched, using the top search result");
                Ok(first_id.to_string())
            }
            [] => Err(ambiguous(candidates.as_slice())),
            [(channel_id, title), ..] if allow_partial_matches => {
                tracing::warn!(query, title, "using partial title match");
                Ok(channel_id.to_string())
            }
            [(channel_id, title)] if normalize_title(title) == normalize_title(query) => {
                Ok(channel_id.to_string())
            }
            _ => Err(ambiguous(partial.as_slice())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCall, MockDataApi, channel_id};
    use pretty_assertions::assert_eq;

    #[test]
    fn channel_id_shape() {
        assert!(is_channel_id("UCHnyfMqiRRG1u-2MsSQLbXA"));
        assert!(is_channel_id(&channel_id("rust")));
        assert!(!is_channel_id("UCshort"));
        assert!(!is_channel_id("UUHnyfMqiRRG1u-2MsSQLbXA"));
        assert!(!is_channel_id("UCHnyfMqiRRG1u/2MsSQLbXA"));
    }

    #[test]
    fn channel_urls_are_normalized() {
        let cases = [
            (
                "https://www.youtube.com/channel/UCHnyfMqiRRG1u-2MsSQLbXA",
                Some("UCHnyfMqiRRG1u-2MsSQLbXA"),
            ),
            ("https://www.youtube.com/@jonhoo/videos", Some("@jonhoo")),
            ("youtube.com/c/LinusTechTips?sub_confirmation=1", Some("LinusTechTips")),
            ("http://m.youtube.com/user/GoogleDevelopers", Some("GoogleDevelopers")),
            ("https://youtube.com/veritasium", Some("veritasium")),
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", None),
            ("https://example.com/@jonhoo", None),
            ("@jonhoo", None),
            ("Linus Tech Tips", None),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_channel_url(input).as_deref(), expected, "{input}");
        }
    }

    #[tokio::test]
    async fn resolving_twice_is_free() {
        let id = channel_id("rust");
        let api = MockDataApi::default()
            .with_channel(&id, "Rust", "UUrust", 42)
            .with_username("rustlang", &id);
        let mut fetcher = VideoFetcher::new(api);

        let first = fetcher.resolve("rustlang", false).await.unwrap();
        let calls = fetcher.api_call_count();
        let second = fetcher.resolve("rustlang", false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.api_call_count(), calls);
        assert_eq!(
            first,
            ChannelInfo {
                channel_id: id.clone(),
                uploads_playlist_id: "UUrust".to_string(),
                video_count: 42,
            }
        );
        // the canonical id is memoized too
        fetcher.resolve(&id, false).await.unwrap();
        assert_eq!(fetcher.api_call_count(), calls);
    }

    #[tokio::test]
    async fn canonical_id_costs_one_call() {
        let id = channel_id("direct");
        let api = MockDataApi::default().with_channel(&id, "Direct", "UUdirect", 3);
        let mut fetcher = VideoFetcher::new(api);

        let info = fetcher.resolve(&id, false).await.unwrap();
        assert_eq!(info.uploads_playlist_id, "UUdirect");
        assert_eq!(fetcher.api().calls(), vec![MockCall::ChannelById(id)]);
    }

    #[tokio::test]
    async fn channel_url_is_resolved_through_its_id() {
        let id = channel_id("url");
        let api = MockDataApi::default().with_channel(&id, "Url", "UUurl", 3);
        let mut fetcher = VideoFetcher::new(api);

        let url = format!("https://www.youtube.com/channel/{id}/videos?view=0");
        let info = fetcher.resolve(&url, false).await.unwrap();
        assert_eq!(info.channel_id, id);
        assert_eq!(fetcher.api_call_count(), 1);
    }

    #[tokio::test]
    async fn handle_is_matched_across_query_variants() {
        let id = channel_id("hoo");
        let other = channel_id("other");
        let api = MockDataApi::default()
            .with_channel(&id, "Jon Gjengset", "UUhoo", 200)
            .with_channel_search("@jon_gjengset", &[(&other, "Rust Talks")])
            .with_channel_search("jon gjengset", &[(&other, "Rust Talks"), (&id, "Jon Gjengset")]);
        let mut fetcher = VideoFetcher::new(api);

        let info = fetcher.resolve("@jon_gjengset", false).await.unwrap();
        assert_eq!(info.channel_id, id);
        assert_eq!(
            fetcher.api().calls(),
            vec![
                MockCall::ChannelSearch("@jon_gjengset".to_string()),
                MockCall::ChannelSearch("jon_gjengset".to_string()),
                MockCall::ChannelSearch("jon gjengset".to_string()),
                MockCall::ChannelSearch("\"jon_gjengset\"".to_string()),
                MockCall::ChannelById(id),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let mut fetcher = VideoFetcher::new(MockDataApi::default());
        let err = fetcher.resolve("nobody-at-all", false).await.unwrap_err();
        assert!(
            matches!(
                &err,
                FetchError::NotFound { kind: SourceKind::Channel, reference }
                    if reference == "nobody-at-all"
            ),
            "{err:?}"
        );
        // username lookup, then keyword search
        assert_eq!(fetcher.api_call_count(), 2);
    }

    #[tokio::test]
    async fn exact_title_match_wins_over_partial() {
        let exact = channel_id("exact");
        let api = MockDataApi::default()
            .with_channel(&exact, "Computerphile", "UUexact", 800)
            .with_channel_search(
                "computerphile",
                &[
                    (&channel_id("fan"), "Computerphile Fans"),
                    (&exact, "Computerphile"),
                ],
            );
        let mut fetcher = VideoFetcher::new(api);

        let info = fetcher.resolve("computerphile", false).await.unwrap();
        assert_eq!(info.channel_id, exact);
    }

    #[tokio::test]
    async fn partial_matches_need_opt_in() {
        let first = channel_id("first");
        let second = channel_id("second");
        let api = MockDataApi::default()
            .with_channel(&first, "Rust Programming Tips", "UUfirst", 10)
            .with_channel(&second, "Learn Rust Programming", "UUsecond", 20)
            .with_channel_search(
                "rust programming",
                &[
                    (&first, "Rust Programming Tips"),
                    (&second, "Learn Rust Programming"),
                ],
            );
        let mut fetcher = VideoFetcher::new(api);

        let err = fetcher.resolve("rust programming", false).await.unwrap_err();
        match err {
            FetchError::Ambiguous { query, candidates } => {
                assert_eq!(query, "rust programming");
                assert_eq!(
                    candidates,
                    vec!["Rust Programming Tips", "Learn Rust Programming"]
                );
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }

        let info = fetcher.resolve("rust programming", true).await.unwrap();
        assert_eq!(info.channel_id, first);
    }

    #[tokio::test]
    async fn single_normalized_partial_match_is_accepted() {
        let wanted = channel_id("lang");
        let api = MockDataApi::default()
            .with_channel(&wanted, "_Rust Lang_", "UUlang", 30)
            .with_channel_search(
                "rust lang",
                &[(&channel_id("go"), "Go Lang Tips"), (&wanted, "_Rust Lang_")],
            );
        let mut fetcher = VideoFetcher::new(api);

        let info = fetcher.resolve("rust lang", false).await.unwrap();
        assert_eq!(info.channel_id, wanted);
    }

    #[tokio::test]
    async fn unrelated_titles_fall_back_to_the_top_result_only_on_opt_in() {
        let top = channel_id("top");
        let api = MockDataApi::default()
            .with_channel(&top, "Andrew Kelley", "UUtop", 15)
            .with_channel_search(
                "zig",
                &[(&top, "Andrew Kelley"), (&channel_id("talks"), "Systems Talks")],
            );
        let mut fetcher = VideoFetcher::new(api);

        match fetcher.resolve("zig", false).await.unwrap_err() {
            FetchError::Ambiguous { query, candidates } => {
                assert_eq!(query, "zig");
                assert_eq!(candidates, vec!["Andrew Kelley", "Systems Talks"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }

        let info = fetcher.resolve("zig", true).await.unwrap();
        assert_eq!(info.channel_id, top);
    }
}
