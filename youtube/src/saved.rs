//! Saved searches: raw fetch results persisted as one JSON document each.
//!
//! Saving the raw videos (rather than a ranking) lets a saved search be re-ranked later with
//! different parameters without spending any API quota.

use crate::model::{SourceKind, VideoRecord};
use crate::ranking::RankingParams;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SavedSearchError {
    #[error("no saved search with id {0:?}")]
    NotFound(String),
    #[error("{0:?} is not a valid saved search id")]
    InvalidId(String),
    #[error("access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse saved search {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize saved search")]
    Encode(#[source] serde_json::Error),
}

/// A fetch result as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    /// Short random identifier, also the file stem.
    pub id: String,
    /// Unix seconds at which the search was saved.
    pub timestamp: i64,
    /// `timestamp`, human-readable (UTC).
    pub date: String,
    pub source_type: SourceKind,
    pub source_id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub video_count: usize,
    pub ranking_params: RankingParams,
    pub raw_videos: Vec<VideoRecord>,
}

impl SavedSearch {
    pub fn new(
        source_type: SourceKind,
        source_id: impl Into<String>,
        label: Option<String>,
        ranking_params: RankingParams,
        raw_videos: Vec<VideoRecord>,
        now: Timestamp,
    ) -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(8);
        Self {
            id,
            timestamp: now.as_second(),
            date: now.strftime("%Y-%m-%d %H:%M:%S UTC").to_string(),
            source_type,
            source_id: source_id.into(),
            label: label.filter(|l| !l.trim().is_empty()),
            video_count: raw_videos.len(),
            ranking_params,
            raw_videos,
        }
    }
}

/// The listing view of a saved search; everything but the videos.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SavedSearchSummary {
    pub id: String,
    pub timestamp: i64,
    pub date: String,
    pub source_type: SourceKind,
    pub source_id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub video_count: usize,
}

/// A directory of saved searches, one `<id>.json` file each.
#[derive(Debug, Clone)]
pub struct SavedSearchStore {
    dir: PathBuf,
}

impl SavedSearchStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, SavedSearchError> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SavedSearchError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    pub async fn save(&self, search: &SavedSearch) -> Result<PathBuf, SavedSearchError> {
        let path = self.path_for(&search.id)?;
        let json = serde_json::to_vec_pretty(search).map_err(SavedSearchError::Encode)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SavedSearchError::Io {
                path: self.dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| SavedSearchError::Io {
                path: path.clone(),
                source,
            })?;
        tracing::info!(id = %search.id, path = %path.display(), "saved search");
        Ok(path)
    }

    /// All saved searches, newest first. Files that cannot be read are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<SavedSearchSummary>, SavedSearchError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SavedSearchError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut summaries = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    return Err(SavedSearchError::Io {
                        path: self.dir.clone(),
                        source,
                    });
                }
            };
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match read_json::<SavedSearchSummary>(&path).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "skipping unreadable saved search"
                ),
            }
        }
        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    pub async fn load(&self, id: &str) -> Result<SavedSearch, SavedSearchError> {
        let path = self.path_for(id)?;
        match read_json(&path).await {
            Err(SavedSearchError::Io { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                Err(SavedSearchError::NotFound(id.to_string()))
            }
            result => result,
        }
    }

    pub async fn delete(&self, id: &str) -> Result<(), SavedSearchError> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SavedSearchError::NotFound(id.to_string()))
            }
            Err(source) => Err(SavedSearchError::Io { path, source }),
        }
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SavedSearchError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| SavedSearchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| SavedSearchError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
