//! Romaji typing-drill engine: pattern table, kana segmentation, keystroke
//! judging, and per-sentence statistics.

pub mod judge;
pub mod patterns;
pub mod result;
pub mod segmenter;
pub mod settings;
pub mod stats;
pub mod unicode;

pub use judge::{Judge, JudgeVerdict};
pub use patterns::{PatternLibrary, PatternSet};
pub use result::{ResultAggregator, RingBuffer, SentenceId, SentenceRecord, StatChange};
pub use segmenter::{segment, KanaUnit, SegmentError, SentenceRun};
pub use stats::{calc_accuracy, calc_wpm, StatSample, StatisticsTracker, Tally};
