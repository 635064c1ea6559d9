//! Recency-weighted popularity scoring.
//!
//! A video's popularity (a weighted sum of likes and views) is discounted by its age with an
//! exponential decay: after `half_life_days` days a video is worth half as much as a brand-new
//! video with the same counts.

use crate::model::VideoRecord;
use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingParams {
    pub like_weight: f64,
    pub view_weight: f64,
    pub half_life_days: u32,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            like_weight: 1.0,
            view_weight: 0.1,
            half_life_days: 90,
        }
    }
}

/// A video together with the components of its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredVideo {
    #[serde(flatten)]
    pub video: VideoRecord,
    pub age_days: f64,
    pub time_decay_factor: f64,
    pub popularity_score: f64,
    pub score: f64,
}

/// Scores every video as of `now` and sorts them best first.
pub fn score_videos(
    videos: impl IntoIterator<Item = VideoRecord>,
    params: &RankingParams,
    now: Timestamp,
) -> Vec<ScoredVideo> {
    let half_life = f64::from(params.half_life_days.max(1));
    let mut scored: Vec<ScoredVideo> = videos
        .into_iter()
        .map(|video| {
            let age_days = now.duration_since(video.published_at).as_secs_f64() / SECONDS_PER_DAY;
            let time_decay_factor = 0.5_f64.powf(age_days / half_life);
            let popularity_score = video.like_count as f64 * params.like_weight
                + video.view_count as f64 * params.view_weight;
            ScoredVideo {
                score: popularity_score * time_decay_factor,
                video,
                age_days,
                time_decay_factor,
                popularity_score,
            }
        })
        .collect();
    // stable, so equal scores keep their retrieval order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// [`score_videos`] as of the current time.
pub fn calculate_video_scores(
    videos: Vec<VideoRecord>,
    params: &RankingParams,
) -> Vec<ScoredVideo> {
    score_videos(videos, params, Timestamp::now())
}

/// Narrows a ranking down by publish date and title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoFilter {
    /// Earliest publish date (UTC), inclusive.
    pub since: Option<Date>,
    /// Latest publish date (UTC), inclusive.
    pub until: Option<Date>,
    /// Case-insensitive substring the title must contain.
    pub title_contains: Option<String>,
}

impl VideoFilter {
    pub fn matches(&self, video: &VideoRecord) -> bool {
        let published = video.published_at.to_zoned(TimeZone::UTC).date();
        if self.since.is_some_and(|since| published < since) {
            return false;
        }
        if self.until.is_some_and(|until| published > until) {
            return false;
        }
        match &self.title_contains {
            Some(needle) if !needle.is_empty() => video
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply(&self, ranking: Vec<ScoredVideo>) -> Vec<ScoredVideo> {
        ranking
            .into_iter()
            .filter(|scored| self.matches(&scored.video))
            .collect()
    }
}

/// Aggregate numbers for a ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_videos: usize,
    pub total_views: u64,
    pub total_likes: u64,
}

impl Summary {
    pub fn of(ranking: &[ScoredVideo]) -> Self {
        ranking.iter().fold(Self::default(), |summary, scored| Self {
            total_videos: summary.total_videos + 1,
            total_views: summary.total_views + scored.video.view_count,
            total_likes: summary.total_likes + scored.video.like_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use jiff::ToSpan;
    use pretty_assertions::assert_eq;

    fn video(id: &str, published_at: Timestamp, views: u64, likes: u64) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            title: format!("Video {id}"),
            description: String::new(),
            published_at,
            thumbnail_url: String::new(),
            view_count: views,
            like_count: likes,
            comment_count: 0,
            duration: "PT1M".to_string(),
            url: format!("https://www.youtube.com/watch?v={id}"),
        }
    }

    #[test]
    fn score_halves_every_half_life() {
        let now: Timestamp = "2025-06-01T00:00:00Z".parse().unwrap();
        let params = RankingParams::default();
        let fresh = video("fresh", now, 1_000, 50);
        let old = video("old", now - (90 * 24).hours(), 1_000, 50);

        let ranking = score_videos([old, fresh], &params, now);
        assert_eq!(ranking[0].video.id, "fresh");
        assert_approx_eq!(f64, ranking[0].popularity_score, 150.0);
        assert_approx_eq!(f64, ranking[0].time_decay_factor, 1.0);
        assert_approx_eq!(f64, ranking[1].age_days, 90.0);
        assert_approx_eq!(f64, ranking[1].time_decay_factor, 0.5);
        assert_approx_eq!(f64, ranking[1].score, 75.0);
    }

    #[test]
    fn weights_change_the_order() {
        let now: Timestamp = "2025-06-01T00:00:00Z".parse().unwrap();
        let viewed = video("viewed", now, 100_000, 10);
        let liked = video("liked", now, 1_000, 5_000);

        let by_default = score_videos(
            [viewed.clone(), liked.clone()],
            &RankingParams::default(),
            now,
        );
        assert_eq!(by_default[0].video.id, "viewed");

        let likes_only = RankingParams {
            view_weight: 0.0,
            ..RankingParams::default()
        };
        let by_likes = score_videos([viewed, liked], &likes_only, now);
        assert_eq!(by_likes[0].video.id, "liked");
    }

    #[test]
    fn empty_input_ranks_nothing() {
        assert!(calculate_video_scores(Vec::new(), &RankingParams::default()).is_empty());
    }

    #[test]
    fn filter_by_date_and_title() {
        let now: Timestamp = "2025-06-01T00:00:00Z".parse().unwrap();
        let ranking = score_videos(
            [
                video("a", "2025-01-10T23:30:00Z".parse().unwrap(), 10, 1),
                video("b", "2025-03-05T08:00:00Z".parse().unwrap(), 10, 1),
                video("c", "2025-05-20T12:00:00Z".parse().unwrap(), 10, 1),
            ],
            &RankingParams::default(),
            now,
        );

        let filter = VideoFilter {
            since: Some(jiff::civil::date(2025, 1, 10)),
            until: Some(jiff::civil::date(2025, 3, 5)),
            title_contains: None,
        };
        let mut kept: Vec<_> = filter
            .apply(ranking.clone())
            .into_iter()
            .map(|s| s.video.id)
            .collect();
        kept.sort();
        assert_eq!(kept, vec!["a", "b"]);

        let filter = VideoFilter {
            title_contains: Some("VIDEO C".to_string()),
            ..VideoFilter::default()
        };
        let kept = filter.apply(ranking);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].video.id, "c");
    }

    #[test]
    fn summary_totals() {
        let now = Timestamp::UNIX_EPOCH;
        let ranking = score_videos(
            [video("a", now, 100, 7), video("b", now, 250, 3)],
            &RankingParams::default(),
            now,
        );
        assert_eq!(
            Summary::of(&ranking),
            Summary {
                total_videos: 2,
                total_views: 350,
                total_likes: 10,
            }
        );
    }
}
