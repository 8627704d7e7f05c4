use drill_core::{SegmentError, SentenceId};

/// Problems that stop a run from being set up. Keystroke mistakes are never
/// errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("sentence batch is empty")]
    EmptyBatch,
    #[error("sentence {id} has no kana")]
    EmptySentence { id: SentenceId },
    #[error("sentence {id} cannot be segmented: {source}")]
    Segment {
        id: SentenceId,
        #[source]
        source: SegmentError,
    },
    #[error("no sentences prepared")]
    NotPrepared,
}
