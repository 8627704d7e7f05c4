use std::fs;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use drill_engine::drill_core::patterns::{default_toml, parse_patterns_toml};
use drill_engine::drill_core::settings::{parse_settings_toml, settings, Settings};
use drill_engine::drill_session::CompletedSentence;
use drill_engine::{plan_batch, DrillSession, KeyEvent, PatternLibrary, Phase, Sentence};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub struct ReplayOptions<'a> {
    pub keys: Option<&'a str>,
    pub ms_per_key: u64,
    pub settings: Option<&'a str>,
    pub pool: Option<&'a str>,
    pub seed: u64,
}

#[derive(Serialize)]
struct Summary {
    completed: usize,
    phase: Phase,
    total_wpm: f64,
    total_accuracy: f64,
    changeset: Vec<drill_engine::StatChange>,
}

/// Clock that moves forward a fixed step per key.
struct SyntheticClock {
    now: Instant,
    step: Duration,
}

impl SyntheticClock {
    fn tick(&mut self) -> Instant {
        self.now += self.step;
        self.now
    }
}

fn read_sentences(path: &str) -> Vec<Sentence> {
    let content = die!(fs::read_to_string(path), "Error reading {path}: {}");
    die!(serde_json::from_str(&content), "Error parsing {path}: {}")
}

fn load_settings(path: Option<&str>) -> Settings {
    match path {
        Some(path) => {
            let content = die!(fs::read_to_string(path), "Error reading {path}: {}");
            die!(parse_settings_toml(&content), "Error: {}")
        }
        None => settings().clone(),
    }
}

fn print_completion(done: &CompletedSentence) {
    let line = die!(serde_json::to_string(done), "Error serializing: {}");
    println!("{line}");
}

/// Run a whole session over `batch_file` and print each completion plus the
/// final changeset as JSON.
pub fn replay(batch_file: &str, opts: &ReplayOptions) {
    let settings = load_settings(opts.settings);
    let seed = die!(parse_patterns_toml(default_toml()), "Error: {}");
    let patterns = Arc::new(PatternLibrary::build(
        &seed,
        &settings.preferred_romanization,
    ));

    let mut batch = read_sentences(batch_file);
    if let Some(pool_file) = opts.pool {
        let pool = read_sentences(pool_file);
        let mut rng = StdRng::seed_from_u64(opts.seed);
        batch = die!(
            plan_batch(batch, &pool, &settings.session, &mut rng),
            "Error planning batch: {}"
        );
    }

    let mut session = DrillSession::new(patterns, &settings);
    die!(session.prepare(batch), "Error: {}");

    let mut clock = SyntheticClock {
        now: Instant::now(),
        step: Duration::from_millis(opts.ms_per_key),
    };

    let completed = match opts.keys {
        Some(keys_file) => replay_keys(&mut session, &mut clock, keys_file),
        None => replay_auto(&mut session, &mut clock, settings.session.countdown_ms),
    };

    let now = clock.now;
    let summary = Summary {
        completed,
        phase: session.phase(),
        total_wpm: session.stats().total_wpm(now),
        total_accuracy: session.stats().total_accuracy(),
        changeset: session.take_changeset(),
    };
    let out = die!(serde_json::to_string_pretty(&summary), "Error serializing: {}");
    println!("{out}");
}

/// One key name per line ("Space", "Escape", or a single character).
fn replay_keys(session: &mut DrillSession, clock: &mut SyntheticClock, keys_file: &str) -> usize {
    let content = die!(fs::read_to_string(keys_file), "Error reading {keys_file}: {}");
    let mut completed = 0;
    for name in content.lines().filter(|l| !l.is_empty()) {
        let now = clock.tick();
        session.poll(now);
        let resp = session.handle_key(KeyEvent::from_key_name(name), now);
        if let Some(done) = resp.completed {
            completed += 1;
            print_completion(&done);
        }
    }
    completed
}

/// Type every sentence's displayed romaji without mistakes.
fn replay_auto(session: &mut DrillSession, clock: &mut SyntheticClock, countdown_ms: u64) -> usize {
    session.handle_key(KeyEvent::Space, clock.tick());
    if session.phase() == Phase::Countdown {
        clock.now += Duration::from_millis(countdown_ms);
        session.poll(clock.now);
    }

    let mut completed = 0;
    while session.phase() == Phase::InProgress {
        let Some(keys) = session.current_run().map(|r| r.remaining_romaji()) else {
            break;
        };
        let before = completed;
        for c in keys.chars() {
            let resp = session.handle_key(KeyEvent::Char(c), clock.tick());
            if let Some(done) = resp.completed {
                completed += 1;
                print_completion(&done);
            }
        }
        if completed == before {
            eprintln!("Warning: displayed romaji {keys:?} did not finish the sentence");
            break;
        }
    }
    completed
}
