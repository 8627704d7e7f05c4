
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use drill_core::patterns::{default_toml, parse_patterns_toml};
use drill_core::settings::{FillPolicy, SessionSettings, Settings, StatsSettings};
use drill_core::PatternLibrary;

use super::{DrillSession, KeyEvent, KeyResponse, Sentence};

pub(super) fn make_test_patterns() -> Arc<PatternLibrary> {
    let seed = parse_patterns_toml(default_toml()).unwrap();
    let prefs: HashMap<String, String> = [("し", "shi"), ("ん", "nn"), ("か", "ka"), ("つ", "tsu")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Arc::new(PatternLibrary::build(&seed, &prefs))
}

pub(super) fn make_settings(unlimited_mode: bool, countdown_ms: u64) -> Settings {
    Settings {
        session: SessionSettings {
            unlimited_mode,
            record_stats: true,
            target_sentence_count: 10,
            fill_policy: FillPolicy::WhenShort,
            random_count: false,
            random_count_max: 20,
            countdown_ms,
        },
        stats: StatsSettings {
            tick_interval_ms: 0,
            max_wpm: 6000.0,
        },
        preferred_romanization: HashMap::new(),
    }
}

pub(super) fn make_session(settings: &Settings) -> DrillSession {
    DrillSession::new(make_test_patterns(), settings)
}

pub(super) fn sentence(id: i64, kana: &str) -> Sentence {
    Sentence {
        id,
        kana: kana.to_string(),
        text: kana.to_string(),
    }
}

/// Synthetic clock: every keystroke happens `step` after the previous one.
pub(super) struct Clock {
    now: Instant,
    step: Duration,
}

impl Clock {
    pub fn new(step_ms: u64) -> Self {
        Self {
            now: Instant::now(),
            step: Duration::from_millis(step_ms),
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn tick(&mut self) -> Instant {
        self.now += self.step;
        self.now
    }

    pub fn advance(&mut self, by: Duration) -> Instant {
        self.now += by;
        self.now
    }
}

pub(super) fn press(session: &mut DrillSession, clock: &mut Clock, event: KeyEvent) -> KeyResponse {
    session.handle_key(event, clock.tick())
}

// Helper: type a string one character at a time
pub(super) fn type_string(
    session: &mut DrillSession,
    clock: &mut Clock,
    s: &str,
) -> Vec<KeyResponse> {
    s.chars()
        .map(|c| press(session, clock, KeyEvent::Char(c)))
        .collect()
}
