use super::fallback::Strategy;
use serde::Serialize;

/// Progress notifications emitted while a fetch runs.
///
/// Events are sent on an unbounded channel between remote calls; a dropped receiver is
/// ignored, so reporting can never abort a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The orchestrator moved on to a new retrieval strategy.
    Strategy { strategy: Strategy },
    /// A page of a playlist listing was processed.
    Page {
        playlist_id: String,
        page: u32,
        total_ids: usize,
    },
    /// Video details were fetched for a batch.
    Details { fetched: usize, requested: usize },
}
