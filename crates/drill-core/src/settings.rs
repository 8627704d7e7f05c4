//! Global settings loaded from TOML, following the same OnceLock pattern as the pattern table.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub session: SessionSettings,
    pub stats: StatsSettings,
    /// kana unit → spelling shown first and displayed by default.
    #[serde(default)]
    pub preferred_romanization: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub unlimited_mode: bool,
    pub record_stats: bool,
    pub target_sentence_count: usize,
    pub fill_policy: FillPolicy,
    #[serde(default)]
    pub random_count: bool,
    #[serde(default = "default_random_count_max")]
    pub random_count_max: usize,
    #[serde(default)]
    pub countdown_ms: u64,
}

fn default_random_count_max() -> usize {
    20
}

/// How a batch shorter than the target size is topped up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Repeat random picks from the sentences already fetched.
    WhenShort,
    /// Leave the batch short.
    Never,
    /// Draw further sentences at random from the whole pool.
    RandomFill,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsSettings {
    pub tick_interval_ms: u64,
    pub max_wpm: f64,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive_usize {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive_usize!(session.target_sentence_count);
    if s.session.random_count_max < 2 {
        return Err(SettingsError::InvalidValue {
            field: "session.random_count_max".to_string(),
            reason: "must be at least 2".to_string(),
        });
    }

    if !(s.stats.max_wpm.is_finite() && s.stats.max_wpm > 0.0) {
        return Err(SettingsError::InvalidValue {
            field: "stats.max_wpm".to_string(),
            reason: "must be a positive finite number".to_string(),
        });
    }

    for (kana, spelling) in &s.preferred_romanization {
        if spelling.is_empty() || !spelling.is_ascii() {
            return Err(SettingsError::InvalidValue {
                field: format!("preferred_romanization.{kana}"),
                reason: "spelling must be non-empty ASCII".to_string(),
            });
        }
    }

    Ok(())
}
