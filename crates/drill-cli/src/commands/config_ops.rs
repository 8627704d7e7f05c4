use std::fs;
use std::process;

use drill_engine::drill_core::{patterns, settings};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub fn patterns_export() {
    print!("{}", patterns::default_toml());
}

pub fn patterns_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let map = die!(patterns::parse_patterns_toml(&content), "Error: {}");
    let spellings: usize = map.values().map(Vec::len).sum();
    println!("OK: {} kana, {} spellings", map.len(), spellings);
}

pub fn settings_export() {
    print!("{}", settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(settings::parse_settings_toml(&content), "Error: {}");
    println!(
        "OK: session.target_sentence_count={}, session.fill_policy={:?}, stats.max_wpm={}, preferred_romanization={} entries",
        s.session.target_sentence_count,
        s.session.fill_policy,
        s.stats.max_wpm,
        s.preferred_romanization.len()
    );
}
