use crate::model::SourceKind;
use crate::youtube_api::RemoteError;
use thiserror::Error;

/// Why the retrieval pipeline could not produce a result.
///
/// Under-delivery relative to a channel's reported video count is *not* an error; it is
/// reported through [`crate::fetcher::ChannelVideos::under_target`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every lookup strategy was exhausted without finding the channel or playlist.
    #[error("no {kind} found for {reference:?}")]
    NotFound { kind: SourceKind, reference: String },

    /// A keyword search found several plausible channels and partial matches were not allowed.
    #[error(
        "{query:?} matches several channels ({}); use a more specific reference or allow partial matches",
        candidates.join(", ")
    )]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },

    /// An identifier does not have the shape a derivation requires.
    #[error("{id:?} is not a valid {expected}")]
    InvalidIdentifier { id: String, expected: &'static str },

    #[error("{operation}")]
    Remote {
        operation: &'static str,
        #[source]
        source: RemoteError,
    },
}

impl FetchError {
    /// The remote failure underneath this error, if there is one.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            FetchError::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_error_names_candidates() {
        let err = FetchError::Ambiguous {
            query: "rust".to_string(),
            candidates: vec!["Rust Lang".to_string(), "Rustacean Station".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "\"rust\" matches several channels (Rust Lang, Rustacean Station); \
             use a more specific reference or allow partial matches"
        );

        let err = FetchError::NotFound {
            kind: SourceKind::Playlist,
            reference: "PLmissing".to_string(),
        };
        assert_eq!(err.to_string(), "no playlist found for \"PLmissing\"");
        assert!(err.remote().is_none());
    }
}
