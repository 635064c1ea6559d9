use clap::Parser;
use eyre::{Context, OptionExt};
use jiff::Timestamp;
use std::io::IsTerminal;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_smart_sorter::config::{
    Cli, Command, FilterArgs, OutputArgs, RankingArgs, SavedAction, Source,
};
use youtube_smart_sorter::fetcher::{Estimate, ProgressEvent};
use youtube_smart_sorter::format::{format_number, parse_duration};
use youtube_smart_sorter::ranking::{
    RankingParams, ScoredVideo, Summary, VideoFilter, calculate_video_scores,
};
use youtube_smart_sorter::saved::{SavedSearch, SavedSearchStore};
use youtube_smart_sorter::youtube_api::YouTubeClient;
use youtube_smart_sorter::{FetchError, VideoFetcher, VideoRecord};

const TITLE_WIDTH: usize = 60;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // a missing .env file is not an error
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let store = SavedSearchStore::new(&cli.saved_dir);
    match cli.command {
        Command::Fetch {
            source,
            ranking,
            filter,
            output,
            save,
            label,
        } => {
            let mut fetcher = new_fetcher(cli.api_key, cli.page_limit)?;
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            let progress = tokio::spawn(report_progress(rx));
            fetcher = fetcher.with_progress(tx);

            let videos = fetch(&mut fetcher, &source).await;
            let calls = fetcher.api_call_count();
            // closes the progress channel
            drop(fetcher);
            progress.await.context("join progress reporter")?;
            let videos = videos?;

            print_ranking(videos.clone(), &ranking, &filter, &output);
            println!("API calls used: {calls}");

            if save {
                let search = SavedSearch::new(
                    source.kind(),
                    source.reference(),
                    label,
                    RankingParams::from(&ranking),
                    videos,
                    Timestamp::now(),
                );
                store.save(&search).await.context("save search")?;
                println!("Saved as {}", search.id);
            }
        }
        Command::Estimate { kind, reference } => {
            let mut fetcher = new_fetcher(cli.api_key, cli.page_limit)?;
            match fetcher.estimate(&reference, kind.into()).await {
                Estimate::Projected(estimate) => {
                    println!("Videos:          {}", format_number(estimate.item_count));
                    println!("Estimated calls: {}", estimate.estimated_calls);
                    if estimate.already_cached {
                        println!("Already cached:  yes");
                    }
                }
                Estimate::Unavailable { error, calls_made } => {
                    return Err(explain(error)).wrap_err_with(|| {
                        format!("estimate cost of {reference} ({calls_made} API calls used)")
                    });
                }
            }
        }
        Command::Saved { action } => match action {
            SavedAction::List => {
                let searches = store.list().await.context("list saved searches")?;
                if searches.is_empty() {
                    println!("No saved searches in {}", store.dir().display());
                }
                for search in searches {
                    println!(
                        "{}  {}  {:<8}  {:>6} videos  {}{}",
                        search.id,
                        search.date,
                        search.source_type,
                        search.video_count,
                        search.source_id,
                        search.label.map(|l| format!(" ({l})")).unwrap_or_default(),
                    );
                }
            }
            SavedAction::Show {
                id,
                ranking,
                filter,
                output,
            } => {
                let search = store
                    .load(&id)
                    .await
                    .with_context(|| format!("load saved search {id}"))?;
                println!(
                    "{} {} saved {}",
                    search.source_type, search.source_id, search.date
                );
                print_ranking(search.raw_videos, &ranking, &filter, &output);
            }
            SavedAction::Delete { id } => {
                store
                    .delete(&id)
                    .await
                    .with_context(|| format!("delete saved search {id}"))?;
                println!("Deleted {id}");
            }
        },
    }

    Ok(())
}

fn new_fetcher(
    api_key: Option<String>,
    page_limit: u32,
) -> eyre::Result<VideoFetcher<YouTubeClient>> {
    let api_key = api_key.ok_or_eyre("no API key: pass --api-key or set YOUTUBE_API_KEY")?;
    let client = YouTubeClient::new(api_key, reqwest::Client::new());
    Ok(VideoFetcher::new(client).with_page_limit(page_limit))
}

async fn fetch(
    fetcher: &mut VideoFetcher<YouTubeClient>,
    source: &Source,
) -> eyre::Result<Vec<VideoRecord>> {
    match source {
        Source::Channel {
            reference,
            allow_partial,
        } => {
            let channel = fetcher
                .resolve(reference, *allow_partial)
                .await
                .map_err(explain)
                .wrap_err_with(|| format!("resolve channel {reference}"))?;
            let result = fetcher
                .get_all_videos(&channel.channel_id)
                .await
                .map_err(explain)
                .wrap_err_with(|| format!("fetch videos of channel {reference}"))?;
            if result.under_target {
                eprintln!(
                    "warning: found {} of the {} videos the channel reports; \
                     the rest may be private, unlisted or removed",
                    result.videos.len(),
                    result.channel.video_count
                );
            }
            Ok(result.videos)
        }
        Source::Playlist { id } => fetcher
            .get_videos_from_playlist(id)
            .await
            .map_err(explain)
            .wrap_err_with(|| format!("fetch videos of playlist {id}")),
    }
}

/// Turns quota exhaustion into an actionable message.
fn explain(error: FetchError) -> eyre::Report {
    let quota = error.remote().is_some_and(|e| e.is_quota_exceeded());
    let report = eyre::Report::new(error);
    if quota {
        report.wrap_err("the API key's daily quota is used up; try again tomorrow")
    } else {
        report
    }
}

async fn report_progress(mut rx: UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Strategy { strategy } => {
                tracing::info!(%strategy, "retrieving videos");
            }
            ProgressEvent::Page {
                playlist_id,
                page,
                total_ids,
            } => {
                tracing::info!(%playlist_id, page, videos = total_ids, "listed playlist page");
            }
            ProgressEvent::Details { fetched, requested } => {
                tracing::debug!(fetched, requested, "fetched video details");
            }
        }
    }
}

fn truncate(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        return title.to_string();
    }
    let mut short: String = title.chars().take(width - 1).collect();
    short.push('…');
    short
}

fn print_ranking(
    videos: Vec<VideoRecord>,
    ranking: &RankingArgs,
    filter: &FilterArgs,
    output: &OutputArgs,
) {
    let ranked = calculate_video_scores(videos, &RankingParams::from(ranking));
    let ranked: Vec<ScoredVideo> = VideoFilter::from(filter).apply(ranked);
    let summary = Summary::of(&ranked);

    println!(
        "{:>4}  {:>9}  {:>7}  {:>7}  {:>8}  {:<10}  {:<width$}  url",
        "#",
        "score",
        "views",
        "likes",
        "length",
        "published",
        "title",
        width = TITLE_WIDTH
    );
    for (rank, scored) in ranked.iter().take(output.top).enumerate() {
        let video = &scored.video;
        println!(
            "{:>4}  {:>9}  {:>7}  {:>7}  {:>8}  {:<10}  {:<width$}  {}",
            rank + 1,
            format_number(scored.score.round() as u64),
            format_number(video.view_count),
            format_number(video.like_count),
            parse_duration(&video.duration),
            video.published_at.strftime("%Y-%m-%d"),
            truncate(&video.title, TITLE_WIDTH),
            video.url,
            width = TITLE_WIDTH
        );
    }
    println!();
    println!(
        "{} videos, {} views, {} likes",
        summary.total_videos,
        format_number(summary.total_views),
        format_number(summary.total_likes)
    );
}
