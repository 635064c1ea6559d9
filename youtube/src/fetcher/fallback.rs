//! Retrieving every video of a channel, with fallbacks.
//!
//! A channel's uploads playlist is the cheap way to enumerate its videos, but it does not
//! always deliver what the channel's reported video count promises. The orchestrator here
//! walks through a fixed sequence of strategies:
//!
//! ```text
//! Primary ──(< 90%)──▶ AlternatePlaylist ──(< 90%)──▶ Search ──▶ done
//!    │                        │
//!    └──────(≥ 90%)───────────┴──────────────────────────────▶ done
//! ```
//!
//! Each strategy only ever adds ids to what earlier strategies found. Ending below the target
//! is reported through [`ChannelVideos::under_target`], never as an error.

use super::resolve::is_channel_id;
use super::{Completion, ProgressEvent, VideoFetcher, records_from_cache};
use crate::error::FetchError;
use crate::model::{ChannelInfo, PlaylistListing, VideoRecord};
use crate::youtube_api::{DataApi, MAX_PAGE_SIZE, SearchRequest};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::instrument;

/// Share of a channel's reported video count, in percent, that counts as a complete result.
///
/// Private, unlisted and removed videos are included in the reported count but can never be
/// listed, so full parity is not a reasonable target.
pub const COVERAGE_THRESHOLD: u64 = 90;

/// An alternate playlist must add more than this many ids to end the search for variants.
const SUBSTANTIAL_YIELD: usize = 10;

/// Upper bound on channel-scoped search pages. Search costs 100 quota units per page.
const SEARCH_PAGE_LIMIT: u32 = 10;

/// Whether `yielded` videos are close enough to the `reported` count.
pub fn meets_coverage(yielded: usize, reported: u64) -> bool {
    yielded as u64 * 100 >= reported * COVERAGE_THRESHOLD
}

/// Derives a playlist id from a channel id by replacing its second character with `U`.
///
/// For most channels this turns `UCxxxx` into the id of the channel's uploads playlist,
/// `UUxxxx`. This is a heuristic: the API does not document the relationship and it does not
/// hold for every channel, so callers must treat the result as a guess.
pub fn modified_channel_id(channel_id: &str) -> Result<String, FetchError> {
    if !is_channel_id(channel_id) {
        return Err(FetchError::InvalidIdentifier {
            id: channel_id.to_string(),
            expected: "channel id",
        });
    }
    // is_channel_id guarantees ASCII, so byte slicing is on character boundaries
    let modified = format!("{}U{}", &channel_id[..1], &channel_id[2..]);
    if !modified.starts_with("UU") || modified.len() != channel_id.len() {
        return Err(FetchError::InvalidIdentifier {
            id: modified,
            expected: "uploads playlist id",
        });
    }
    Ok(modified)
}

/// Alternate playlist ids to try for a channel, in priority order.
pub fn alternate_playlist_ids(channel_id: &str) -> Result<Vec<String>, FetchError> {
    Ok(vec![modified_channel_id(channel_id)?])
}

/// One of the retrieval strategies used by [`VideoFetcher::get_all_videos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Walk the channel's uploads playlist.
    Primary,
    /// Walk playlists whose ids are derived from the channel id.
    AlternatePlaylist,
    /// Enumerate the channel's videos through search, newest first.
    Search,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Primary => "uploads playlist",
            Strategy::AlternatePlaylist => "alternate playlist ids",
            Strategy::Search => "channel search",
        })
    }
}

/// How far a result falls short of the reported count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub yielded: usize,
    pub reported: u64,
}

/// The result of running one strategy.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The target was met.
    Success(T),
    /// The strategy ran, but the combined result is still below target.
    Insufficient(T, Shortfall),
    /// The strategy could not run to completion.
    Failed(FetchError),
}

/// All videos retrieved for a channel.
#[derive(Debug, Clone)]
pub struct ChannelVideos {
    pub channel: ChannelInfo,
    pub videos: Vec<VideoRecord>,
    /// Fewer than 90% of the channel's reported videos were found, even after all fallbacks.
    pub under_target: bool,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Primary,
    AlternateIds,
    SearchBased,
    Done,
}

/// What the strategies have gathered so far.
#[derive(Debug, Default)]
struct Harvest {
    ids: IndexSet<String>,
    /// Playlists already walked to the end (or to the page limit); walking them again would
    /// return the same ids.
    settled: HashSet<String>,
    /// Ids whose details were requested in a successful lookup, whether or not the API
    /// returned them.
    looked_up: HashSet<String>,
    /// Some walk stopped before the end of its playlist.
    partial: bool,
    last_error: Option<FetchError>,
}

impl Harvest {
    fn fail(&mut self, strategy: Strategy, error: FetchError) {
        tracing::warn!(%strategy, error = %error, "retrieval strategy failed");
        self.last_error = Some(error);
    }

    fn quota_exhausted(&self) -> bool {
        self.last_error
            .as_ref()
            .and_then(FetchError::remote)
            .is_some_and(|e| e.is_quota_exceeded())
    }

    fn unless_quota_exhausted(&self, next: Stage) -> Stage {
        if self.quota_exhausted() {
            tracing::warn!("API quota exhausted, skipping remaining strategies");
            Stage::Done
        } else {
            next
        }
    }
}

impl<A: DataApi> VideoFetcher<A> {
    /// Retrieves every video of a channel.
    ///
    /// `channel_id` may be any reference [`resolve`](Self::resolve) understands; partial title
    /// matches are not accepted. Resolution failures are returned as errors. Remote failures
    /// during retrieval move on to the next strategy, and are only returned if no strategy
    /// produced any videos.
    #[instrument(skip(self))]
    pub async fn get_all_videos(&mut self, channel_id: &str) -> Result<ChannelVideos, FetchError> {
        let channel = self.resolve(channel_id, false).await?;
        let reported = channel.video_count;

        if let Some(listing) = self.cache.listing(&channel.uploads_playlist_id) {
            tracing::debug!(videos = listing.videos.len(), "channel listing served from cache");
            return Ok(ChannelVideos {
                under_target: !meets_coverage(listing.videos.len(), reported),
                videos: listing.videos.clone(),
                channel,
            });
        }

        let mut harvest = Harvest::default();
        let mut stage = Stage::Primary;
        loop {
            stage = match stage {
                Stage::Primary => {
                    self.report(ProgressEvent::Strategy {
                        strategy: Strategy::Primary,
                    });
                    let outcome = self
                        .walk_playlist(&channel.uploads_playlist_id, reported, &mut harvest)
                        .await;
                    self.next_stage(Strategy::Primary, outcome, &mut harvest, Stage::AlternateIds)
                }
                Stage::AlternateIds => {
                    self.report(ProgressEvent::Strategy {
                        strategy: Strategy::AlternatePlaylist,
                    });
                    let outcome = self.try_alternate_ids(&channel, &mut harvest).await;
                    self.next_stage(
                        Strategy::AlternatePlaylist,
                        outcome,
                        &mut harvest,
                        Stage::SearchBased,
                    )
                }
                Stage::SearchBased => {
                    self.report(ProgressEvent::Strategy {
                        strategy: Strategy::Search,
                    });
                    let outcome = self.search_channel_videos(&channel, &mut harvest).await;
                    self.next_stage(Strategy::Search, outcome, &mut harvest, Stage::Done)
                }
                Stage::Done => break,
            };
        }

        let ids: Vec<String> = harvest.ids.into_iter().collect();
        let videos = records_from_cache(&self.cache, &ids);
        if videos.is_empty() {
            if let Some(error) = harvest.last_error {
                return Err(error);
            }
        }

        let under_target = !meets_coverage(videos.len(), reported);
        if under_target {
            tracing::warn!(
                channel_id = %channel.channel_id,
                retrieved = videos.len(),
                reported,
                "retrieved fewer videos than the channel reports"
            );
        } else {
            tracing::info!(
                channel_id = %channel.channel_id,
                retrieved = videos.len(),
                reported,
                "retrieved channel videos"
            );
        }

        if !harvest.partial && harvest.last_error.is_none() {
            self.cache.insert_listing(
                channel.uploads_playlist_id.clone(),
                PlaylistListing {
                    video_ids: ids,
                    videos: videos.clone(),
                },
            );
        }

        Ok(ChannelVideos {
            channel,
            videos,
            under_target,
        })
    }

    fn next_stage(
        &self,
        strategy: Strategy,
        outcome: Outcome<usize>,
        harvest: &mut Harvest,
        otherwise: Stage,
    ) -> Stage {
        match outcome {
            Outcome::Success(yielded) => {
                tracing::debug!(%strategy, yielded, "retrieval target met");
                Stage::Done
            }
            Outcome::Insufficient(_, Shortfall { yielded, reported }) => {
                tracing::info!(%strategy, yielded, reported, "retrieval below target");
                harvest.unless_quota_exhausted(otherwise)
            }
            Outcome::Failed(error) => {
                harvest.fail(strategy, error);
                harvest.unless_quota_exhausted(otherwise)
            }
        }
    }

    /// Fetches details for every harvested id not yet looked up, including ids left over from
    /// a batch that failed during an earlier strategy.
    async fn fill_details(&mut self, harvest: &mut Harvest) -> Result<(), FetchError> {
        let missing: Vec<String> = harvest
            .ids
            .iter()
            .filter(|id| !harvest.looked_up.contains(*id))
            .cloned()
            .collect();
        self.fetch_details(&missing).await?;
        harvest.looked_up.extend(missing);
        Ok(())
    }

    /// Number of harvested ids with a cached record.
    fn harvest_yield(&self, harvest: &Harvest) -> usize {
        harvest
            .ids
            .iter()
            .filter(|id| self.cache.contains_video(id))
            .count()
    }

    fn assess(&self, harvest: &Harvest, reported: u64) -> Outcome<usize> {
        let yielded = self.harvest_yield(harvest);
        if meets_coverage(yielded, reported) {
            Outcome::Success(yielded)
        } else {
            Outcome::Insufficient(yielded, Shortfall { yielded, reported })
        }
    }

    /// Walks one playlist, adding its ids to `harvest` and fetching details for them.
    async fn walk_playlist(
        &mut self,
        playlist_id: &str,
        reported: u64,
        harvest: &mut Harvest,
    ) -> Outcome<usize> {
        let collection = match self.collect(playlist_id, self.page_limit).await {
            Ok(collection) => collection,
            Err(e) => return Outcome::Failed(e),
        };

        harvest.ids.extend(collection.ids);

        match collection.completion {
            Completion::Exhausted => {
                harvest.settled.insert(playlist_id.to_string());
            }
            Completion::PageLimit => {
                harvest.settled.insert(playlist_id.to_string());
                harvest.partial = true;
            }
            Completion::Interrupted(e) => {
                harvest.partial = true;
                harvest.last_error = Some(e);
            }
        }

        if let Err(e) = self.fill_details(harvest).await {
            return Outcome::Failed(e);
        }
        self.assess(harvest, reported)
    }

    async fn try_alternate_ids(
        &mut self,
        channel: &ChannelInfo,
        harvest: &mut Harvest,
    ) -> Outcome<usize> {
        let variants = match alternate_playlist_ids(&channel.channel_id) {
            Ok(variants) => variants,
            Err(e) => return Outcome::Failed(e),
        };

        let mut outcome = self.assess(harvest, channel.video_count);
        for variant in variants {
            if harvest.settled.contains(&variant) {
                tracing::debug!(%variant, "alternate id was already walked");
                continue;
            }

            let before = harvest.ids.len();
            tracing::debug!(%variant, "trying alternate playlist id");
            outcome = self
                .walk_playlist(&variant, channel.video_count, harvest)
                .await;
            let added = harvest.ids.len() - before;
            match outcome {
                Outcome::Success(_) => break,
                Outcome::Insufficient(..) if added > SUBSTANTIAL_YIELD => break,
                Outcome::Insufficient(..) => {}
                Outcome::Failed(e) => {
                    // one bad variant does not rule out the next
                    harvest.fail(Strategy::AlternatePlaylist, e);
                    outcome = self.assess(harvest, channel.video_count);
                }
            }
            if harvest.quota_exhausted() {
                break;
            }
        }
        outcome
    }

    /// Tops up `harvest` with the channel's videos as found by search, newest first.
    async fn search_channel_videos(
        &mut self,
        channel: &ChannelInfo,
        harvest: &mut Harvest,
    ) -> Outcome<usize> {
        let mut page_token: Option<String> = None;
        for page in 1..=SEARCH_PAGE_LIMIT {
            let request = SearchRequest::channel_videos(
                &channel.channel_id,
                MAX_PAGE_SIZE,
                page_token.as_deref(),
            );
            let response = match self.call_search(request).await {
                Ok(response) => response,
                Err(e) => return Outcome::Failed(e),
            };

            let before = harvest.ids.len();
            harvest.ids.extend(
                response
                    .items
                    .iter()
                    .filter_map(|result| result.video_id())
                    .map(str::to_string),
            );
            tracing::debug!(page, new = harvest.ids.len() - before, "searched channel videos");

            if let Err(e) = self.fill_details(harvest).await {
                return Outcome::Failed(e);
            }

            let outcome = self.assess(harvest, channel.video_count);
            if matches!(outcome, Outcome::Success(_)) {
                return outcome;
            }
            match response.next_page_token {
                Some(token) => page_token = Some(token),
                None => return outcome,
            }
        }
        self.assess(harvest, channel.video_count)
    }
}
