//! Stateful typing-drill session: run phases, sentence queue, statistics and
//! result bookkeeping around the keystroke judge.
//!
//! `DrillSession` owns one learner's run and processes each keystroke,
//! returning responses the frontend turns into feedback.

mod batch;
mod error;
mod key_handlers;
mod ticker;
mod types;

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use drill_core::settings::{settings, SessionSettings, Settings, StatsSettings};
use drill_core::{
    segment, Judge, PatternLibrary, ResultAggregator, SentenceRun, StatChange, StatisticsTracker,
};

pub use batch::{plan_batch, Sentence, FLUSH_INTERVAL, REFILL_THRESHOLD, UNLIMITED_BATCH_SIZE};
pub use error::SessionError;
pub use ticker::StatsTicker;
pub use types::{CompletedSentence, KeyEvent, KeyResponse, Phase, PhaseInput};

/// A sentence with its segmentation done ahead of the run.
#[derive(Debug, Clone)]
struct Prepared {
    sentence: Sentence,
    run: SentenceRun,
}

/// The sentence on screen and its judge.
struct Active {
    sentence: Sentence,
    judge: Judge,
}

pub struct DrillSession {
    patterns: Arc<PatternLibrary>,
    session_settings: SessionSettings,
    stats_settings: StatsSettings,

    phase: Phase,
    /// The prepared batch; every start replays it from the top.
    batch: Vec<Prepared>,
    queue: VecDeque<Prepared>,
    current: Option<Active>,
    countdown_deadline: Option<Instant>,
    completed: usize,

    stats: StatisticsTracker,
    results: ResultAggregator,
    ticker: Option<StatsTicker>,
}

impl DrillSession {
    pub fn new(patterns: Arc<PatternLibrary>, settings: &Settings) -> Self {
        Self {
            patterns,
            session_settings: settings.session.clone(),
            stats_settings: settings.stats.clone(),
            phase: Phase::NotStarted,
            batch: Vec::new(),
            queue: VecDeque::new(),
            current: None,
            countdown_deadline: None,
            completed: 0,
            stats: StatisticsTracker::from_settings(&settings.stats),
            results: ResultAggregator::new(settings.session.record_stats),
            ticker: None,
        }
    }

    /// Session on the process-wide settings and pattern table.
    pub fn with_global_settings() -> Self {
        Self::new(PatternLibrary::shared(), settings())
    }

    /// Segment every sentence of `batch` and make it the run's batch.
    /// Any running run is discarded first.
    pub fn prepare(&mut self, batch: Vec<Sentence>) -> Result<(), SessionError> {
        if batch.is_empty() {
            return Err(SessionError::EmptyBatch);
        }
        let prepared = self.segment_all(batch)?;
        self.reset();
        debug!(sentences = prepared.len(), "batch prepared");
        self.batch = prepared;
        Ok(())
    }

    /// Append sentences to the live queue (unlimited refill). Returns how
    /// many were added.
    pub fn push_sentences(&mut self, batch: Vec<Sentence>) -> Result<usize, SessionError> {
        let prepared = self.segment_all(batch)?;
        let added = prepared.len();
        self.queue.extend(prepared);
        debug!(added, queued = self.queue.len(), "sentences pushed");
        Ok(added)
    }

    fn segment_all(&self, batch: Vec<Sentence>) -> Result<Vec<Prepared>, SessionError> {
        batch
            .into_iter()
            .map(|sentence| {
                let id = sentence.id;
                let run = segment(&sentence.kana, &self.patterns)
                    .map_err(|source| SessionError::Segment { id, source })?;
                if run.is_empty() {
                    return Err(SessionError::EmptySentence { id });
                }
                Ok(Prepared { sentence, run })
            })
            .collect()
    }

    /// Drop the run and return to `NotStarted`. Results stay for flushing.
    pub fn reset(&mut self) {
        self.ticker = None;
        self.phase = Phase::NotStarted;
        self.queue.clear();
        self.current = None;
        self.countdown_deadline = None;
        self.completed = 0;
        self.stats = StatisticsTracker::from_settings(&self.stats_settings);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_prepared(&self) -> bool {
        !self.batch.is_empty()
    }

    pub fn current_sentence(&self) -> Option<&Sentence> {
        self.current.as_ref().map(|a| &a.sentence)
    }

    pub fn current_run(&self) -> Option<&SentenceRun> {
        self.current.as_ref().map(|a| a.judge.run())
    }

    /// ん was just finished with one "n"; another "n" or "'" is accepted.
    pub fn allows_extra_nasal(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|a| a.judge.allows_extra_nasal())
    }

    /// Sentences waiting behind the current one.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Sentences completed in this run.
    pub fn completed_count(&self) -> usize {
        self.completed
    }

    pub fn stats(&self) -> &StatisticsTracker {
        &self.stats
    }

    pub fn results(&self) -> &ResultAggregator {
        &self.results
    }

    /// For seeding stored records before a run.
    pub fn results_mut(&mut self) -> &mut ResultAggregator {
        &mut self.results
    }

    /// Display timer value, if the ticker is running.
    pub fn ticker_elapsed(&self) -> Option<Duration> {
        self.ticker
            .as_ref()
            .map(|t| Duration::from_millis(t.elapsed_ms()))
    }

    pub fn pause_ticker(&self) {
        if let Some(t) = &self.ticker {
            t.pause();
        }
    }

    pub fn resume_ticker(&self) {
        if let Some(t) = &self.ticker {
            t.resume();
        }
    }

    /// Unlimited mode wants another batch pushed.
    pub fn needs_more_sentences(&self) -> bool {
        self.session_settings.unlimited_mode
            && self.phase.is_active()
            && self.queue.len() <= REFILL_THRESHOLD
    }

    /// Take the dirty results, clearing them.
    pub fn take_changeset(&mut self) -> Vec<StatChange> {
        self.results.drain_changeset()
    }
}
