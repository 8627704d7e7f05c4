use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Deserialize)]
struct PatternConfig {
    patterns: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum PatternConfigError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("[patterns] table is empty")]
    Empty,
    #[error("no spellings for kana: {0}")]
    EmptyPatterns(String),
    #[error("invalid spelling {pattern:?} for kana {kana}")]
    InvalidPattern { kana: String, pattern: String },
    #[error("seed kana must be one or two characters: {0}")]
    KanaTooLong(String),
    #[error("pattern library already initialized")]
    AlreadyInitialized,
}

/// Parse TOML text into a sorted `BTreeMap<kana, spellings>`.
///
/// Spellings must be non-empty printable ASCII; seed keys are at most two
/// kana so that derived units stay within three.
pub fn parse_patterns_toml(
    toml_str: &str,
) -> Result<BTreeMap<String, Vec<String>>, PatternConfigError> {
    let config: PatternConfig =
        toml::from_str(toml_str).map_err(|e| PatternConfigError::Parse(e.to_string()))?;

    if config.patterns.is_empty() {
        return Err(PatternConfigError::Empty);
    }

    for (kana, spellings) in &config.patterns {
        let len = kana.chars().count();
        if len == 0 || len > 2 {
            return Err(PatternConfigError::KanaTooLong(kana.clone()));
        }
        if spellings.is_empty() {
            return Err(PatternConfigError::EmptyPatterns(kana.clone()));
        }
        for pattern in spellings {
            if pattern.is_empty() || !pattern.chars().all(|c| c.is_ascii_graphic()) {
                return Err(PatternConfigError::InvalidPattern {
                    kana: kana.clone(),
                    pattern: pattern.clone(),
                });
            }
        }
    }

    Ok(config.patterns)
}
