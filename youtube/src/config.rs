//! Command-line configuration.

use crate::fetcher::DEFAULT_PAGE_LIMIT;
use crate::model::SourceKind;
use crate::ranking::{RankingParams, VideoFilter};
use clap::{Args, Parser, Subcommand, ValueEnum};
use jiff::civil::Date;
use std::path::PathBuf;

/// Rank a YouTube channel's or playlist's videos by recency-weighted popularity.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YouTube Data API v3 key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Maximum number of listing pages (of 50 videos) fetched per playlist
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT, global = true)]
    pub page_limit: u32,

    /// Directory holding saved searches
    #[arg(long, default_value = "saved_searches", global = true)]
    pub saved_dir: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch, rank and print a channel's or playlist's videos
    Fetch {
        #[command(subcommand)]
        source: Source,

        #[command(flatten)]
        ranking: RankingArgs,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Save the fetched videos for later re-ranking
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Label to store with a saved search
        #[arg(long, requires = "save")]
        label: Option<String>,
    },

    /// Predict how many API calls fetching a source will cost
    Estimate {
        #[arg(value_enum)]
        kind: Kind,

        /// Channel reference or playlist id
        reference: String,
    },

    /// Manage saved searches
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum Source {
    /// A channel, given as a handle, URL, username, channel id or name
    Channel {
        reference: String,

        /// Accept a channel whose title only partially matches the reference
        #[arg(long, default_value_t = false)]
        allow_partial: bool,
    },
    /// A playlist, given by id
    Playlist { id: String },
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Channel { .. } => SourceKind::Channel,
            Source::Playlist { .. } => SourceKind::Playlist,
        }
    }

    pub fn reference(&self) -> &str {
        match self {
            Source::Channel { reference, .. } => reference,
            Source::Playlist { id } => id,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Channel,
    Playlist,
}

impl From<Kind> for SourceKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Channel => SourceKind::Channel,
            Kind::Playlist => SourceKind::Playlist,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SavedAction {
    /// List saved searches, newest first
    List,
    /// Re-rank and print a saved search
    Show {
        id: String,

        #[command(flatten)]
        ranking: RankingArgs,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete a saved search
    Delete { id: String },
}

#[derive(Args, Debug, Clone)]
pub struct RankingArgs {
    /// Weight of a like in the popularity score
    #[arg(long, default_value_t = 1.0)]
    pub like_weight: f64,

    /// Weight of a view in the popularity score
    #[arg(long, default_value_t = 0.1)]
    pub view_weight: f64,

    /// Days after which a video's score is halved
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u32).range(1..))]
    pub half_life_days: u32,
}

impl From<&RankingArgs> for RankingParams {
    fn from(args: &RankingArgs) -> Self {
        Self {
            like_weight: args.like_weight,
            view_weight: args.view_weight,
            half_life_days: args.half_life_days,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only videos published on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<Date>,

    /// Only videos published on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<Date>,

    /// Only videos whose title contains this text
    #[arg(long)]
    pub search: Option<String>,
}

impl From<&FilterArgs> for VideoFilter {
    fn from(args: &FilterArgs) -> Self {
        Self {
            since: args.since,
            until: args.until,
            title_contains: args.search.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Number of top-ranked videos to print
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}
