use std::process;

use unicode_width::UnicodeWidthStr;

use drill_engine::drill_core::unicode::normalize_kana;
use drill_engine::{segment, PatternLibrary};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

/// Left-align `s` in a column `width` terminal cells wide.
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{s}{}", " ".repeat(width.saturating_sub(w)))
}

pub fn segment_cmd(kana: &str, json: bool) {
    let lib = PatternLibrary::shared();
    let run = die!(segment(kana, &lib), "Error: {}");

    if json {
        let out = die!(serde_json::to_string_pretty(&run), "Error serializing: {}");
        println!("{out}");
        return;
    }

    let width = run
        .units()
        .iter()
        .map(|u| UnicodeWidthStr::width(u.kana()))
        .max()
        .unwrap_or(0)
        + 2;
    for (i, unit) in run.units().iter().enumerate() {
        let spellings: Vec<&str> = unit.patterns().iter().collect();
        println!("{:>3}  {}{}", i, pad(unit.kana(), width), spellings.join(" | "));
    }
    println!("display: {}", run.display_romaji());
}

pub fn patterns_cmd(kana: &str) {
    let lib = PatternLibrary::shared();
    let key = normalize_kana(kana);
    match lib.patterns_of(&key) {
        Some(set) => {
            for (i, spelling) in set.iter().enumerate() {
                let mark = if i == 0 { "*" } else { " " };
                println!("{mark} {spelling}");
            }
        }
        None => {
            eprintln!("No unit {key:?} in the pattern table ({} units)", lib.len());
            process::exit(1);
        }
    }
}
