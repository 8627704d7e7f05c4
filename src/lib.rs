//! Romaji typing-drill engine.
//!
//! Re-exports the core (pattern table, segmentation, judging, statistics)
//! and the session layer, plus the optional tracing setup.

mod trace_init;

pub use drill_core;
pub use drill_session;

pub use drill_core::{
    segment, Judge, JudgeVerdict, KanaUnit, PatternLibrary, PatternSet, ResultAggregator,
    SegmentError, SentenceId, SentenceRecord, SentenceRun, StatChange, StatSample,
    StatisticsTracker,
};
pub use drill_session::{
    plan_batch, DrillSession, KeyEvent, KeyResponse, Phase, Sentence, SessionError,
};
pub use trace_init::init_tracing;

pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
