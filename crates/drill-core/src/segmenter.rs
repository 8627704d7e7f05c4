//! Greedy longest-match segmentation of a kana sentence into drill units.
//!
//! "ちょうちょ" becomes [ちょ, う, ちょ], each unit carrying every spelling
//! the learner may type for it.

use serde::Serialize;
use tracing::{debug, debug_span};

use crate::patterns::{PatternLibrary, PatternSet, BARE_NASAL};
use crate::unicode::{is_nasal_exempt, normalize_kana};

/// Longest kana unit the pattern table can hold.
pub const MAX_UNIT_LEN: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error("no spelling for {fragment:?} at position {position} in {kana:?}")]
    Unresolvable {
        kana: String,
        position: usize,
        fragment: String,
    },
}

/// One to three kana judged as a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanaUnit {
    pub(crate) kana: String,
    pub(crate) patterns: PatternSet,
}

impl KanaUnit {
    pub fn kana(&self) -> &str {
        &self.kana
    }

    /// Spellings still consistent with what has been typed for this unit.
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }
}

/// Working state for one sentence: its units plus the judging cursor.
#[derive(Debug, Clone, Serialize)]
pub struct SentenceRun {
    units: Vec<KanaUnit>,
    pub(crate) unit_index: usize,
    pub(crate) char_index: usize,
}

impl SentenceRun {
    pub(crate) fn new(units: Vec<KanaUnit>) -> Self {
        Self {
            units,
            unit_index: 0,
            char_index: 0,
        }
    }

    pub fn units(&self) -> &[KanaUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Index of the unit being judged; equals `len()` once complete.
    pub fn unit_index(&self) -> usize {
        self.unit_index
    }

    /// Characters of the current unit matched so far.
    pub fn char_index(&self) -> usize {
        self.char_index
    }

    pub fn current_unit(&self) -> Option<&KanaUnit> {
        self.units.get(self.unit_index)
    }

    pub fn is_complete(&self) -> bool {
        self.unit_index >= self.units.len()
    }

    pub(crate) fn unit_mut(&mut self, index: usize) -> Option<&mut KanaUnit> {
        self.units.get_mut(index)
    }

    pub fn kana_display(&self) -> String {
        self.units.iter().map(|u| u.kana.as_str()).collect()
    }

    /// Each unit's first spelling, joined. Narrows as the learner types.
    pub fn display_romaji(&self) -> String {
        self.units.iter().map(|u| u.patterns.preferred()).collect()
    }

    /// The part of `display_romaji()` already typed.
    pub fn typed_romaji(&self) -> String {
        let mut out: String = self.units[..self.unit_index.min(self.units.len())]
            .iter()
            .map(|u| u.patterns.preferred())
            .collect();
        if let Some(unit) = self.current_unit() {
            out.push_str(&unit.patterns.preferred()[..self.char_index]);
        }
        out
    }

    /// The part of `display_romaji()` still to type.
    pub fn remaining_romaji(&self) -> String {
        let mut out = String::new();
        if let Some(unit) = self.current_unit() {
            out.push_str(&unit.patterns.preferred()[self.char_index..]);
        }
        for unit in self.units.iter().skip(self.unit_index + 1) {
            out.push_str(unit.patterns.preferred());
        }
        out
    }
}

/// Split `kana` into the longest units the table knows, trying three, two,
/// then one character at each position.
pub fn segment(kana: &str, patterns: &PatternLibrary) -> Result<SentenceRun, SegmentError> {
    let _span = debug_span!("segment", kana).entered();

    let chars: Vec<char> = normalize_kana(kana).chars().collect();
    let mut units = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let max = MAX_UNIT_LEN.min(chars.len() - pos);
        let found = (1..=max).rev().find_map(|len| {
            let piece: String = chars[pos..pos + len].iter().collect();
            patterns
                .patterns_of(&piece)
                .map(|set| (len, piece, set.clone()))
        });
        let Some((len, piece, set)) = found else {
            return Err(SegmentError::Unresolvable {
                kana: kana.to_string(),
                position: pos,
                fragment: chars[pos].to_string(),
            });
        };
        units.push(KanaUnit {
            kana: piece,
            patterns: set,
        });
        pos += len;
    }

    allow_bare_nasals(&mut units);
    debug!(units = units.len());
    Ok(SentenceRun::new(units))
}

/// ん followed by anything outside the exempt rows may also be typed as "n".
/// A trailing ん never qualifies.
fn allow_bare_nasals(units: &mut [KanaUnit]) {
    for i in 0..units.len().saturating_sub(1) {
        if units[i].kana != "ん" {
            continue;
        }
        let next = units[i + 1].kana.chars().next();
        if next.is_some_and(|c| !is_nasal_exempt(c)) {
            units[i].patterns.push(BARE_NASAL);
        }
    }
}
