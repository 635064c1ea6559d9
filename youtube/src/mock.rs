//! An in-memory [`DataApi`] for exercising the pipeline without network access.
//!
//! Fixtures are registered with the `with_*` builders. Every call is recorded, so tests can
//! assert on exactly which requests the pipeline issued. Page tokens are `page-N`, where `N`
//! is the zero-based index of the page being requested.

use crate::youtube_api::{
    Channel, ChannelFilter, ChannelListResponse, DataApi, PageInfo, Playlist, PlaylistItem,
    PlaylistItemListResponse, PlaylistListResponse, RemoteError, SearchKind, SearchListResponse,
    SearchRequest, SearchResult, Video, VideoListResponse,
    channels::{ChannelContentDetails, ChannelSnippet, ChannelStatistics, RelatedPlaylists},
    playlists::{PlaylistContentDetails, PlaylistItemSnippet, PlaylistSnippet, ResourceId},
    search::{SearchResultId, SearchResultSnippet},
    types::{Thumbnail, Thumbnails},
    videos::{VideoContentDetails, VideoSnippet, VideoStatistics},
};
use http::StatusCode;
use jiff::Timestamp;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Builds a syntactically valid channel id (`UC` + 22 characters) from a short seed.
pub fn channel_id(seed: &str) -> String {
    format!("UC{seed:_<22}")
}

/// One request the pipeline made against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ChannelById(String),
    ChannelByUsername(String),
    Playlist(String),
    PlaylistItems {
        playlist_id: String,
        page_token: Option<String>,
    },
    Videos(Vec<String>),
    ChannelSearch(String),
    VideoSearch {
        channel_id: String,
        page_token: Option<String>,
    },
}

#[derive(Debug)]
struct MockChannel {
    title: String,
    uploads: String,
    video_count: u64,
}

#[derive(Debug, Default)]
struct MockPlaylist {
    pages: Vec<Vec<Option<String>>>,
    /// Serve generated pages forever, always with a continuation token.
    endless: bool,
    /// Remaining failures per zero-based page index.
    failures: HashMap<usize, u32>,
}

impl MockPlaylist {
    fn item_count(&self) -> u64 {
        if self.endless {
            return 1_000_000;
        }
        self.pages.iter().map(|p| p.len() as u64).sum()
    }
}

#[derive(Debug, Default)]
struct State {
    channels: HashMap<String, MockChannel>,
    usernames: HashMap<String, String>,
    playlists: HashMap<String, MockPlaylist>,
    hidden_videos: HashSet<String>,
    channel_searches: HashMap<String, Vec<(String, String)>>,
    video_searches: HashMap<String, Vec<Vec<String>>>,
    /// Zero-based indices of `videos.list` calls that fail.
    failing_video_calls: HashSet<usize>,
    /// Calls beyond this many are rejected with `quotaExceeded`.
    quota: Option<usize>,
    calls: Vec<MockCall>,
}

impl State {
    /// Records `call`, then rejects it if the quota is already spent.
    fn record(&mut self, call: MockCall) -> Result<(), RemoteError> {
        self.calls.push(call);
        match self.quota {
            Some(quota) if self.calls.len() > quota => Err(status(
                StatusCode::FORBIDDEN,
                r#"{"error":{"code":403,"errors":[{"reason":"quotaExceeded"}]}}"#,
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MockDataApi {
    state: Mutex<State>,
}

fn status(status: StatusCode, body: &str) -> RemoteError {
    RemoteError::Status {
        status,
        body: body.to_string(),
    }
}

fn page_index(page_token: Option<&str>) -> Result<usize, RemoteError> {
    match page_token {
        None => Ok(0),
        Some(token) => token
            .strip_prefix("page-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| status(StatusCode::BAD_REQUEST, "invalidPageToken")),
    }
}

fn next_token(index: usize, page_count: usize) -> Option<String> {
    (index + 1 < page_count).then(|| format!("page-{}", index + 1))
}

impl MockDataApi {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a channel whose uploads live in `uploads_playlist_id`.
    pub fn with_channel(
        self,
        channel_id: &str,
        title: &str,
        uploads_playlist_id: &str,
        video_count: u64,
    ) -> Self {
        self.state().channels.insert(
            channel_id.to_string(),
            MockChannel {
                title: title.to_string(),
                uploads: uploads_playlist_id.to_string(),
                video_count,
            },
        );
        self
    }

    /// Makes `channels.list?forUsername=username` return `channel_id`.
    pub fn with_username(self, username: &str, channel_id: &str) -> Self {
        self.state()
            .usernames
            .insert(username.to_string(), channel_id.to_string());
        self
    }

    /// Registers a playlist served as the given pages. `None` entries are items whose video id
    /// is missing.
    pub fn with_playlist_pages(self, playlist_id: &str, pages: Vec<Vec<Option<String>>>) -> Self {
        self.state().playlists.insert(
            playlist_id.to_string(),
            MockPlaylist {
                pages,
                ..MockPlaylist::default()
            },
        );
        self
    }

    /// Registers a playlist holding `ids`, paged 50 at a time.
    pub fn with_playlist(self, playlist_id: &str, ids: &[String]) -> Self {
        let pages = ids
            .chunks(50)
            .map(|chunk| chunk.iter().cloned().map(Some).collect())
            .collect();
        self.with_playlist_pages(playlist_id, pages)
    }

    /// Registers a playlist that always reports another page.
    pub fn with_endless_playlist(self, playlist_id: &str) -> Self {
        self.state().playlists.insert(
            playlist_id.to_string(),
            MockPlaylist {
                endless: true,
                ..MockPlaylist::default()
            },
        );
        self
    }

    /// Makes the request for page `page_index` of `playlist_id` fail `times` times.
    pub fn with_page_failures(self, playlist_id: &str, page_index: usize, times: u32) -> Self {
        if let Some(playlist) = self.state().playlists.get_mut(playlist_id) {
            playlist.failures.insert(page_index, times);
        }
        self
    }

    /// Makes `times` consecutive `videos.list` calls fail, starting with the zero-based call
    /// `batch_index`.
    pub fn with_video_failures(self, batch_index: usize, times: usize) -> Self {
        self.state()
            .failing_video_calls
            .extend(batch_index..batch_index + times);
        self
    }

    /// Rejects every call after the first `calls` with a `quotaExceeded` error.
    pub fn with_quota(self, calls: usize) -> Self {
        self.state().quota = Some(calls);
        self
    }

    /// Makes `videos.list` silently leave out these ids, as it does for private videos.
    pub fn with_hidden_videos<'a>(self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        self.state()
            .hidden_videos
            .extend(ids.into_iter().map(str::to_string));
        self
    }

    /// Makes a channel keyword search for `query` return `(channel id, title)` results.
    pub fn with_channel_search(self, query: &str, results: &[(&str, &str)]) -> Self {
        self.state().channel_searches.insert(
            query.to_string(),
            results
                .iter()
                .map(|(id, title)| (id.to_string(), title.to_string()))
                .collect(),
        );
        self
    }

    /// Makes the channel-scoped video search for `channel_id` return these pages.
    pub fn with_video_search(self, channel_id: &str, pages: Vec<Vec<String>>) -> Self {
        self.state()
            .video_searches
            .insert(channel_id.to_string(), pages);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    /// Number of listing pages requested from `playlist_id`.
    pub fn playlist_item_calls(&self, playlist_id: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| {
                matches!(c, MockCall::PlaylistItems { playlist_id: p, .. } if p == playlist_id)
            })
            .count()
    }

    /// Size of every `videos.list` batch, in request order.
    pub fn video_batch_sizes(&self) -> Vec<usize> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::Videos(ids) => Some(ids.len()),
                _ => None,
            })
            .collect()
    }

    pub fn search_calls(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, MockCall::ChannelSearch(_) | MockCall::VideoSearch { .. }))
            .count()
    }

    fn record(&self, call: MockCall) -> Result<(), RemoteError> {
        self.state().record(call)
    }
}

fn channel_resource(id: &str, channel: &MockChannel) -> Channel {
    Channel {
        id: id.to_string(),
        snippet: Some(ChannelSnippet {
            title: channel.title.clone(),
            description: None,
            custom_url: None,
            published_at: None,
            thumbnails: Thumbnails::default(),
        }),
        content_details: Some(ChannelContentDetails {
            related_playlists: RelatedPlaylists {
                uploads: Some(channel.uploads.clone()),
            },
        }),
        statistics: Some(ChannelStatistics {
            video_count: Some(channel.video_count.to_string()),
            view_count: None,
            subscriber_count: None,
        }),
    }
}

fn playlist_item(video_id: Option<String>) -> PlaylistItem {
    PlaylistItem {
        id: video_id.as_ref().map(|id| format!("item-{id}")),
        snippet: Some(PlaylistItemSnippet {
            title: video_id.as_ref().map(|id| format!("Video {id}")),
            resource_id: Some(ResourceId {
                kind: Some("youtube#video".to_string()),
                video_id,
            }),
        }),
    }
}

/// Deterministic metadata for any video id: older ids in the listing get smaller view counts.
fn video_resource(id: &str, ordinal: usize) -> Video {
    Video {
        id: id.to_string(),
        snippet: Some(VideoSnippet {
            published_at: Timestamp::constant(1_704_067_200 - ordinal as i64 * 86_400, 0),
            channel_id: None,
            title: format!("Video {id}"),
            description: String::new(),
            thumbnails: Thumbnails {
                high: Some(Thumbnail {
                    url: format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
                    width: Some(480),
                    height: Some(360),
                }),
                ..Thumbnails::default()
            },
        }),
        statistics: Some(VideoStatistics {
            view_count: Some((1_000 + ordinal).to_string()),
            like_count: Some((10 + ordinal).to_string()),
            dislike_count: None,
            favorite_count: Some("0".to_string()),
            comment_count: Some("1".to_string()),
        }),
        content_details: Some(VideoContentDetails {
            duration: "PT4M13S".to_string(),
        }),
    }
}

impl DataApi for MockDataApi {
    async fn list_channels(
        &self,
        filter: ChannelFilter<'_>,
    ) -> Result<ChannelListResponse, RemoteError> {
        let mut state = self.state();
        let id = match filter {
            ChannelFilter::Id(id) => {
                state.record(MockCall::ChannelById(id.to_string()))?;
                Some(id.to_string())
            }
            ChannelFilter::Username(name) => {
                state.record(MockCall::ChannelByUsername(name.to_string()))?;
                state.usernames.get(name).cloned()
            }
        };
        let items: VecDeque<_> = id
            .and_then(|id| {
                let channel = state.channels.get(&id)?;
                Some(channel_resource(&id, channel))
            })
            .into_iter()
            .collect();
        Ok(ChannelListResponse {
            page_info: PageInfo {
                total_results: items.len() as u32,
                results_per_page: 5,
            },
            items,
            next_page_token: None,
        })
    }

    async fn list_playlists(&self, playlist_id: &str) -> Result<PlaylistListResponse, RemoteError> {
        self.record(MockCall::Playlist(playlist_id.to_string()))?;
        let state = self.state();
        let items: VecDeque<_> = state
            .playlists
            .get(playlist_id)
            .map(|playlist| Playlist {
                id: playlist_id.to_string(),
                snippet: Some(PlaylistSnippet {
                    title: format!("Playlist {playlist_id}"),
                    channel_id: None,
                }),
                content_details: Some(PlaylistContentDetails {
                    item_count: playlist.item_count(),
                }),
            })
            .into_iter()
            .collect();
        Ok(PlaylistListResponse {
            page_info: PageInfo {
                total_results: items.len() as u32,
                results_per_page: 5,
            },
            items,
            next_page_token: None,
        })
    }

    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse, RemoteError> {
        self.record(MockCall::PlaylistItems {
            playlist_id: playlist_id.to_string(),
            page_token: page_token.map(str::to_string),
        })?;
        let index = page_index(page_token)?;
        let mut state = self.state();
        let playlist = state
            .playlists
            .get_mut(playlist_id)
            .ok_or_else(|| status(StatusCode::NOT_FOUND, "playlistNotFound"))?;

        if let Some(remaining) = playlist.failures.get_mut(&index) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(status(StatusCode::SERVICE_UNAVAILABLE, "backendError"));
            }
        }

        let total_results = playlist.item_count() as u32;
        let (items, next_page_token): (VecDeque<_>, _) = if playlist.endless {
            let items = (0..max_results)
                .map(|i| playlist_item(Some(format!("{playlist_id}-{index}-{i}"))))
                .collect();
            (items, Some(format!("page-{}", index + 1)))
        } else {
            let items = playlist
                .pages
                .get(index)
                .map(|page| page.iter().cloned().map(playlist_item).collect())
                .unwrap_or_default();
            (items, next_token(index, playlist.pages.len()))
        };

        Ok(PlaylistItemListResponse {
            page_info: PageInfo {
                total_results,
                results_per_page: max_results,
            },
            items,
            next_page_token,
        })
    }

    async fn list_videos(&self, video_ids: &[&str]) -> Result<VideoListResponse, RemoteError> {
        let mut state = self.state();
        let batch_index = state
            .calls
            .iter()
            .filter(|c| matches!(c, MockCall::Videos(_)))
            .count();
        state.record(MockCall::Videos(
            video_ids.iter().map(|id| id.to_string()).collect(),
        ))?;
        if state.failing_video_calls.contains(&batch_index) {
            return Err(status(StatusCode::SERVICE_UNAVAILABLE, "backendError"));
        }
        let items: VecDeque<_> = video_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| !state.hidden_videos.contains(**id))
            .map(|(ordinal, id)| video_resource(id, ordinal))
            .collect();
        Ok(VideoListResponse {
            page_info: PageInfo {
                total_results: items.len() as u32,
                results_per_page: items.len() as u32,
            },
            items,
            next_page_token: None,
        })
    }

    async fn search(&self, request: SearchRequest<'_>) -> Result<SearchListResponse, RemoteError> {
        match request.kind {
            SearchKind::Channel => {
                let query = request.query.unwrap_or_default();
                self.record(MockCall::ChannelSearch(query.to_string()))?;
                let state = self.state();
                let items: VecDeque<_> = state
                    .channel_searches
                    .get(query)
                    .into_iter()
                    .flatten()
                    .take(request.max_results as usize)
                    .map(|(id, title)| SearchResult {
                        id: SearchResultId {
                            kind: Some("youtube#channel".to_string()),
                            channel_id: Some(id.clone()),
                            ..SearchResultId::default()
                        },
                        snippet: Some(SearchResultSnippet {
                            channel_id: Some(id.clone()),
                            title: title.clone(),
                            channel_title: Some(title.clone()),
                            published_at: None,
                        }),
                    })
                    .collect();
                Ok(SearchListResponse {
                    page_info: PageInfo {
                        total_results: items.len() as u32,
                        results_per_page: request.max_results,
                    },
                    items,
                    next_page_token: None,
                })
            }
            SearchKind::Video => {
                let channel_id = request.channel_id.unwrap_or_default();
                self.record(MockCall::VideoSearch {
                    channel_id: channel_id.to_string(),
                    page_token: request.page_token.map(str::to_string),
                })?;
                let index = page_index(request.page_token)?;
                let state = self.state();
                let pages = state
                    .video_searches
                    .get(channel_id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let items: VecDeque<_> = pages
                    .get(index)
                    .into_iter()
                    .flatten()
                    .map(|id| SearchResult {
                        id: SearchResultId {
                            kind: Some("youtube#video".to_string()),
                            video_id: Some(id.clone()),
                            ..SearchResultId::default()
                        },
                        snippet: Some(SearchResultSnippet {
                            channel_id: Some(channel_id.to_string()),
                            title: format!("Video {id}"),
                            channel_title: None,
                            published_at: None,
                        }),
                    })
                    .collect();
                Ok(SearchListResponse {
                    page_info: PageInfo {
                        total_results: pages.iter().map(|p| p.len() as u32).sum(),
                        results_per_page: request.max_results,
                    },
                    items,
                    next_page_token: next_token(index, pages.len()),
                })
            }
        }
    }
}
