//! Keystroke judging for one sentence.
//!
//! Each unit starts with every legal spelling. A keystroke keeps the
//! spellings whose next character matches; the unit is finished as soon as
//! the shortest surviving spelling has been typed in full, so "si" completes
//! し even though "shi" was also possible.

use serde::Serialize;
use tracing::{debug, debug_span};

use crate::patterns::BARE_NASAL;
use crate::segmenter::SentenceRun;

/// Outcome of a single keystroke.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JudgeVerdict {
    pub is_correct: bool,
    /// The cursor moved on to the next unit of the same sentence.
    pub advance_unit: bool,
    /// The last unit was completed.
    pub advance_sentence: bool,
}

impl JudgeVerdict {
    fn rejected() -> Self {
        Self::default()
    }

    fn accepted() -> Self {
        Self {
            is_correct: true,
            ..Self::default()
        }
    }
}

/// Drives a [`SentenceRun`] one keystroke at a time.
#[derive(Debug, Clone)]
pub struct Judge {
    run: SentenceRun,
    /// Set after ん was completed with a single "n": one more "n" or "'" is
    /// accepted as the rest of that ん.
    allow_extra_nasal: bool,
}

impl Judge {
    pub fn new(run: SentenceRun) -> Self {
        Self {
            run,
            allow_extra_nasal: false,
        }
    }

    pub fn run(&self) -> &SentenceRun {
        &self.run
    }

    pub fn into_run(self) -> SentenceRun {
        self.run
    }

    pub fn allows_extra_nasal(&self) -> bool {
        self.allow_extra_nasal
    }

    pub fn is_complete(&self) -> bool {
        self.run.is_complete()
    }

    /// Judge one keystroke. Letters are compared case-insensitively.
    pub fn judge(&mut self, input: char) -> JudgeVerdict {
        let _span = debug_span!(
            "judge",
            %input,
            unit = self.run.unit_index,
            pos = self.run.char_index
        )
        .entered();

        let input = input.to_ascii_lowercase();
        if self.allow_extra_nasal && (input == 'n' || input == '\'') {
            return self.extend_nasal(input);
        }

        let unit_index = self.run.unit_index;
        let char_index = self.run.char_index;
        let Some(unit) = self.run.unit_mut(unit_index) else {
            debug!("keystroke after sentence end");
            return JudgeVerdict::rejected();
        };
        let Some(survivors) = unit.patterns.narrowed(char_index, input) else {
            return JudgeVerdict::rejected();
        };

        self.allow_extra_nasal = false;
        let unit_done = char_index + 1 == survivors.min_len();
        unit.patterns = survivors;
        if !unit_done {
            self.run.char_index += 1;
            return JudgeVerdict::accepted();
        }

        if unit.patterns.contains_bare_nasal() {
            unit.patterns.promote(BARE_NASAL);
            self.allow_extra_nasal = unit_index + 1 < self.run.len();
        }
        self.advance()
    }

    fn advance(&mut self) -> JudgeVerdict {
        self.run.char_index = 0;
        self.run.unit_index += 1;
        let done = self.run.is_complete();
        debug!(unit = self.run.unit_index, done, "unit complete");
        JudgeVerdict {
            is_correct: true,
            advance_unit: !done,
            advance_sentence: done,
        }
    }

    /// Rewrite the ん just completed as "nn"/"n'". The cursor already sits on
    /// the following unit, so nothing advances.
    fn extend_nasal(&mut self, input: char) -> JudgeVerdict {
        self.allow_extra_nasal = false;
        let Some(prev) = self.run.unit_index.checked_sub(1) else {
            return JudgeVerdict::rejected();
        };
        if let Some(unit) = self.run.unit_mut(prev) {
            unit.patterns.replace_with(format!("{BARE_NASAL}{input}"));
        }
        debug!(unit = prev, "nasal continuation");
        JudgeVerdict::accepted()
    }
}
