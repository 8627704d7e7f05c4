//! Kana-to-romaji spelling table.
//!
//! A primitive seed table (embedded TOML) is expanded once per process into
//! every unit the drill can ask for: っ + kana with a doubled consonant,
//! two- and three-kana clusters built from their parts, and literal ASCII
//! symbols. The learner's preferred spellings are then moved to the front.

mod config;
mod table;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{debug, debug_span};

pub use config::{parse_patterns_toml, PatternConfigError};

use crate::settings::settings;
use table::{blocks_sokuon, DEFAULT_TOML, LITERAL_SYMBOLS, NO_SOKUON_SPELLINGS};

/// The single-keystroke spelling of ん, only legal before a consonant that
/// cannot itself start with "n".
pub const BARE_NASAL: &str = "n";

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();
static INSTANCE: OnceLock<Arc<PatternLibrary>> = OnceLock::new();

/// Returns the embedded seed table.
pub fn default_toml() -> &'static str {
    DEFAULT_TOML
}

/// Ordered spellings for one kana unit. Index 0 is the displayed spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PatternSet(Vec<String>);

impl PatternSet {
    pub(crate) fn new(spellings: Vec<String>) -> Self {
        debug_assert!(!spellings.is_empty(), "pattern set must not be empty");
        Self(spellings)
    }

    pub fn preferred(&self) -> &str {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, spelling: &str) -> bool {
        self.0.iter().any(|s| s == spelling)
    }

    pub fn contains_bare_nasal(&self) -> bool {
        self.contains(BARE_NASAL)
    }

    /// Length of the shortest spelling.
    pub fn min_len(&self) -> usize {
        self.0.iter().map(String::len).min().unwrap_or(0)
    }

    pub(crate) fn push(&mut self, spelling: &str) {
        if !self.contains(spelling) {
            self.0.push(spelling.to_string());
        }
    }

    /// Move `spelling` to the front, keeping the relative order of the rest.
    pub(crate) fn promote(&mut self, spelling: &str) -> bool {
        match self.0.iter().position(|s| s == spelling) {
            Some(0) => true,
            Some(pos) => {
                let s = self.0.remove(pos);
                self.0.insert(0, s);
                true
            }
            None => false,
        }
    }

    /// Swap `spelling` with whatever occupies index 0.
    pub(crate) fn swap_to_front(&mut self, spelling: &str) -> bool {
        match self.0.iter().position(|s| s == spelling) {
            Some(pos) => {
                self.0.swap(0, pos);
                true
            }
            None => false,
        }
    }

    /// Spellings whose character at `index` is `ch`, or `None` if none match.
    pub(crate) fn narrowed(&self, index: usize, ch: char) -> Option<PatternSet> {
        if !ch.is_ascii() {
            return None;
        }
        let byte = ch as u8;
        let kept: Vec<String> = self
            .0
            .iter()
            .filter(|s| s.as_bytes().get(index) == Some(&byte))
            .cloned()
            .collect();
        if kept.is_empty() {
            None
        } else {
            Some(PatternSet(kept))
        }
    }

    pub(crate) fn replace_with(&mut self, spelling: String) {
        self.0 = vec![spelling];
    }
}

/// Immutable lookup table: kana unit → spellings.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    table: HashMap<String, PatternSet>,
}

impl PatternLibrary {
    /// Set a custom seed TOML before the first `initialize()`/`shared()` call.
    pub fn init_custom(toml_content: String) -> Result<(), PatternConfigError> {
        // Validate eagerly
        parse_patterns_toml(&toml_content)?;
        if INSTANCE.get().is_some() {
            return Err(PatternConfigError::AlreadyInitialized);
        }
        CUSTOM_TOML
            .set(toml_content)
            .map_err(|_| PatternConfigError::AlreadyInitialized)
    }

    /// Build the process-wide table on first call. Later calls return the
    /// same table and ignore `preferences`.
    pub fn initialize(preferences: &HashMap<String, String>) -> Arc<PatternLibrary> {
        INSTANCE
            .get_or_init(|| {
                let toml_str = CUSTOM_TOML
                    .get()
                    .map(|s| s.as_str())
                    .unwrap_or(DEFAULT_TOML);
                let seed = parse_patterns_toml(toml_str).expect("pattern TOML must be valid");
                Arc::new(PatternLibrary::build(&seed, preferences))
            })
            .clone()
    }

    /// The process-wide table with the configured preferred spellings.
    pub fn shared() -> Arc<PatternLibrary> {
        Self::initialize(&settings().preferred_romanization)
    }

    /// Run the full derivation pipeline over a seed table.
    pub fn build(
        seed: &BTreeMap<String, Vec<String>>,
        preferences: &HashMap<String, String>,
    ) -> PatternLibrary {
        let _span = debug_span!("build_pattern_library", seed = seed.len()).entered();

        let mut raw = seed.clone();
        add_sokuon(&mut raw, seed);
        concat_composites(&mut raw);
        add_literal_symbols(&mut raw);

        let mut table: HashMap<String, PatternSet> = raw
            .into_iter()
            .filter(|(_, spellings)| !spellings.is_empty())
            .map(|(kana, spellings)| (kana, PatternSet::new(dedup_stable(spellings))))
            .collect();

        for (kana, preferred) in preferences {
            match table.get_mut(kana) {
                Some(set) => {
                    if !set.swap_to_front(preferred) {
                        debug!(kana, preferred, "preferred spelling not in table");
                    }
                }
                None => debug!(kana, "preference for unknown kana"),
            }
        }

        debug!(units = table.len());
        PatternLibrary { table }
    }

    pub fn has(&self, kana: &str) -> bool {
        self.table.contains_key(kana)
    }

    pub fn patterns_of(&self, kana: &str) -> Option<&PatternSet> {
        self.table.get(kana)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}

/// っ + kana, spelled by doubling the first letter of each spelling.
fn add_sokuon(table: &mut BTreeMap<String, Vec<String>>, seed: &BTreeMap<String, Vec<String>>) {
    for (kana, spellings) in seed {
        let Some(first) = kana.chars().next() else {
            continue;
        };
        if blocks_sokuon(first) {
            continue;
        }
        let doubled: Vec<String> = spellings
            .iter()
            .filter(|s| !NO_SOKUON_SPELLINGS.contains(&s.as_str()))
            .filter_map(|s| s.chars().next().map(|c| format!("{c}{s}")))
            .collect();
        if !doubled.is_empty() {
            table.entry(format!("っ{kana}")).or_default().extend(doubled);
        }
    }
}

/// Append the spellings of each multi-kana unit's parts. Two-kana units are
/// finished first so three-kana units can build on them.
fn concat_composites(table: &mut BTreeMap<String, Vec<String>>) {
    for len in [2, 3] {
        let keys: Vec<String> = table
            .keys()
            .filter(|k| k.chars().count() == len)
            .cloned()
            .collect();
        for key in keys {
            let chars: Vec<char> = key.chars().collect();
            let derived = match chars.as_slice() {
                [a, b] => product_of(table, &[a.to_string(), b.to_string()]),
                [a, b, c] => {
                    let mut out = product_of(table, &[a.to_string(), format!("{b}{c}")]);
                    out.extend(product_of(
                        table,
                        &[a.to_string(), b.to_string(), c.to_string()],
                    ));
                    out
                }
                _ => Vec::new(),
            };
            if let Some(spellings) = table.get_mut(&key) {
                spellings.extend(derived);
            }
        }
    }
}

/// Cartesian concatenation of the parts' spellings; empty if a part is unknown.
fn product_of(table: &BTreeMap<String, Vec<String>>, parts: &[String]) -> Vec<String> {
    let Some(lists) = parts
        .iter()
        .map(|p| table.get(p))
        .collect::<Option<Vec<&Vec<String>>>>()
    else {
        return Vec::new();
    };
    lists.iter().fold(vec![String::new()], |acc, list| {
        acc.iter()
            .flat_map(|prefix| list.iter().map(move |s| format!("{prefix}{s}")))
            .collect()
    })
}

fn add_literal_symbols(table: &mut BTreeMap<String, Vec<String>>) {
    for c in ('0'..='9').chain(LITERAL_SYMBOLS) {
        table.insert(c.to_string(), vec![c.to_string()]);
    }
}

fn dedup_stable(spellings: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    spellings
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_library(preferences: &[(&str, &str)]) -> PatternLibrary {
        let seed = parse_patterns_toml(DEFAULT_TOML).unwrap();
        let prefs = preferences
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PatternLibrary::build(&seed, &prefs)
    }

    fn spellings(lib: &PatternLibrary, kana: &str) -> Vec<String> {
        lib.patterns_of(kana).unwrap().as_slice().to_vec()
    }

    #[test]
    fn test_primitive_kept_in_seed_order() {
        let lib = default_library(&[]);
        assert_eq!(spellings(&lib, "し"), vec!["ci", "shi", "si"]);
        assert_eq!(spellings(&lib, "ん"), vec!["n'", "nn", "xn"]);
    }

    #[test]
    fn test_sokuon_doubles_first_letter() {
        let lib = default_library(&[]);
        let tsu_ka = spellings(&lib, "っか");
        assert_eq!(&tsu_ka[..2], &["cca".to_string(), "kka".to_string()]);
        assert!(tsu_ka.contains(&"xtuka".to_string()));
        assert!(tsu_ka.contains(&"ltsuca".to_string()));
    }

    #[test]
    fn test_sokuon_blocked_rows() {
        let lib = default_library(&[]);
        for kana in ["っあ", "っえ", "っお", "っな", "っの", "っっ"] {
            assert!(!lib.has(kana), "{kana} should not be derived");
        }
    }

    #[test]
    fn test_sokuon_skips_bare_vowel_and_nasal_spellings() {
        let lib = default_library(&[]);
        let tsu_i = spellings(&lib, "っい");
        assert_eq!(tsu_i[0], "yyi");
        assert!(!tsu_i.contains(&"ii".to_string()));
        let tsu_n = spellings(&lib, "っん");
        assert_eq!(tsu_n[0], "xxn");
        assert!(!tsu_n.contains(&"nnn".to_string()));
    }

    #[test]
    fn test_youon_concatenation() {
        let lib = default_library(&[]);
        let kya = spellings(&lib, "きゃ");
        assert_eq!(kya[0], "kya");
        assert!(kya.contains(&"kixya".to_string()));
        assert!(kya.contains(&"kilya".to_string()));
    }

    #[test]
    fn test_three_kana_cluster() {
        let lib = default_library(&[]);
        let kkya = spellings(&lib, "っきゃ");
        assert_eq!(kkya[0], "kkya");
        assert!(kkya.contains(&"xtukya".to_string()));
        assert!(kkya.contains(&"ltsukixya".to_string()));
        let unique: HashSet<&String> = kkya.iter().collect();
        assert_eq!(unique.len(), kkya.len(), "duplicates in っきゃ");
    }

    #[test]
    fn test_literal_symbols() {
        let lib = default_library(&[]);
        for key in ["0", "9", ",", ".", "?", "~", "-"] {
            assert_eq!(spellings(&lib, key), vec![key.to_string()]);
        }
        assert!(!lib.has("a"));
    }

    #[test]
    fn test_preference_swaps_to_front() {
        let lib = default_library(&[("し", "shi"), ("ん", "nn")]);
        assert_eq!(spellings(&lib, "し"), vec!["shi", "ci", "si"]);
        assert_eq!(spellings(&lib, "ん"), vec!["nn", "n'", "xn"]);
    }

    #[test]
    fn test_preference_already_first_or_unknown() {
        let lib = default_library(&[("あ", "a"), ("か", "qa"), ("ぬぬ", "nunu")]);
        assert_eq!(spellings(&lib, "あ"), vec!["a"]);
        assert_eq!(spellings(&lib, "か")[0], "ca");
        assert!(!lib.has("ぬぬ"));
    }

    #[test]
    fn test_every_set_non_empty() {
        let lib = default_library(&[]);
        assert!(lib.len() > 400);
        for kana in lib.keys() {
            let set = lib.patterns_of(kana).unwrap();
            assert!(!set.is_empty(), "{kana} has no spellings");
            assert!(set.iter().all(|s| !s.is_empty()), "{kana} has an empty spelling");
            assert!(kana.chars().count() <= 3, "{kana} is longer than three kana");
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let first = PatternLibrary::shared();
        let mut other = HashMap::new();
        other.insert("し".to_string(), "ci".to_string());
        let second = PatternLibrary::initialize(&other);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_init_custom_after_initialize() {
        let _ = PatternLibrary::shared();
        let err = PatternLibrary::init_custom(DEFAULT_TOML.to_string()).unwrap_err();
        assert!(matches!(err, PatternConfigError::AlreadyInitialized));
    }

    #[test]
    fn test_pattern_set_narrowing() {
        let set = PatternSet::new(vec!["shi".into(), "si".into(), "ci".into()]);
        let s = set.narrowed(0, 's').unwrap();
        assert_eq!(s.as_slice(), &["shi".to_string(), "si".to_string()]);
        assert_eq!(s.min_len(), 2);
        assert!(set.narrowed(0, 'x').is_none());
        assert!(set.narrowed(5, 's').is_none());
        assert!(set.narrowed(0, 'し').is_none());
    }

    #[test]
    fn test_pattern_set_promote_is_stable() {
        let mut set = PatternSet::new(vec!["nn".into(), "n'".into(), "n".into()]);
        assert!(set.promote("n"));
        assert_eq!(set.as_slice(), &["n".to_string(), "nn".into(), "n'".into()]);
        assert!(!set.promote("xn"));
    }
}
