//! Live typing statistics for the active run.
//!
//! Counters are driven by keystroke timestamps supplied by the caller; the
//! display tick never feeds back into them.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::settings::StatsSettings;

/// Snapshot taken when a sentence is completed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSample {
    pub wpm: f64,
    pub accuracy_pct: f64,
    /// Longest run of consecutive misses within the sentence.
    pub miss_streak: u32,
}

/// Correct/mistake counts for one finished sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub correct: u32,
    pub mistake: u32,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `(correct - mistake) * 100 / correct`, or 0 when nothing was typed
/// correctly or mistakes caught up with correct keys.
pub fn calc_accuracy(correct: u32, mistake: u32) -> f64 {
    if correct == 0 || mistake >= correct {
        return 0.0;
    }
    round2(f64::from(correct - mistake) * 100.0 / f64::from(correct))
}

/// Correct keystrokes per minute, capped at `max_wpm`. Zero elapsed time
/// yields the cap instead of infinity.
pub fn calc_wpm(correct: u32, elapsed: Duration, max_wpm: f64) -> f64 {
    if correct == 0 {
        return 0.0;
    }
    let wpm = f64::from(correct) / (elapsed.as_secs_f64() / 60.0);
    if !wpm.is_finite() {
        return max_wpm;
    }
    round2(wpm.min(max_wpm))
}

#[derive(Debug, Clone)]
pub struct StatisticsTracker {
    max_wpm: f64,
    run_started: Option<Instant>,
    sentence_started: Option<Instant>,
    sentence: Tally,
    total: Tally,
    previous: Option<Tally>,
    miss_streak: u32,
    max_miss_streak: u32,
    wpm: f64,
}

impl StatisticsTracker {
    pub fn new(max_wpm: f64) -> Self {
        Self {
            max_wpm,
            run_started: None,
            sentence_started: None,
            sentence: Tally::default(),
            total: Tally::default(),
            previous: None,
            miss_streak: 0,
            max_miss_streak: 0,
            wpm: 0.0,
        }
    }

    pub fn from_settings(settings: &StatsSettings) -> Self {
        Self::new(settings.max_wpm)
    }

    /// Begin a run: both timers start at `now`, all counters clear.
    pub fn start(&mut self, now: Instant) {
        *self = Self::new(self.max_wpm);
        self.run_started = Some(now);
        self.sentence_started = Some(now);
    }

    pub fn is_running(&self) -> bool {
        self.run_started.is_some()
    }

    pub fn record(&mut self, is_correct: bool, now: Instant) {
        if is_correct {
            self.sentence.correct += 1;
            self.total.correct += 1;
            self.miss_streak = 0;
            self.wpm = calc_wpm(
                self.sentence.correct,
                self.sentence_elapsed(now),
                self.max_wpm,
            );
        } else {
            self.sentence.mistake += 1;
            self.total.mistake += 1;
            self.miss_streak += 1;
            self.max_miss_streak = self.max_miss_streak.max(self.miss_streak);
        }
    }

    /// Close the current sentence and restart the sentence timer at `now`.
    pub fn next_sentence(&mut self, now: Instant) {
        debug!(
            correct = self.sentence.correct,
            mistake = self.sentence.mistake,
            "sentence tally"
        );
        self.previous = Some(self.sentence);
        self.sentence = Tally::default();
        self.miss_streak = 0;
        self.max_miss_streak = 0;
        self.wpm = 0.0;
        self.sentence_started = Some(now);
    }

    pub fn sample(&self) -> StatSample {
        StatSample {
            wpm: self.wpm,
            accuracy_pct: self.accuracy(),
            miss_streak: self.max_miss_streak,
        }
    }

    pub fn accuracy(&self) -> f64 {
        calc_accuracy(self.sentence.correct, self.sentence.mistake)
    }

    /// WPM of the current sentence as of its last correct keystroke.
    pub fn current_wpm(&self) -> f64 {
        self.wpm
    }

    pub fn total_wpm(&self, now: Instant) -> f64 {
        calc_wpm(self.total.correct, self.elapsed(now), self.max_wpm)
    }

    pub fn total_accuracy(&self) -> f64 {
        calc_accuracy(self.total.correct, self.total.mistake)
    }

    pub fn miss_streak(&self) -> u32 {
        self.miss_streak
    }

    pub fn tally(&self) -> Tally {
        self.sentence
    }

    pub fn total_tally(&self) -> Tally {
        self.total
    }

    pub fn previous_tally(&self) -> Option<Tally> {
        self.previous
    }

    /// Time since the run started; zero before `start`.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.run_started
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default()
    }

    fn sentence_elapsed(&self, now: Instant) -> Duration {
        self.sentence_started
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default()
    }
}
