use serde::Serialize;

use drill_core::{JudgeVerdict, SentenceId, StatSample};

/// A keystroke as delivered by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Char(char),
    Space,
    Escape,
    /// Anything the drill does not react to (arrows, modifiers, ...).
    Other,
}

impl KeyEvent {
    /// Map a frontend key name ("Escape", "Space") or a single character.
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Self::Escape,
            "Space" | " " => Self::Space,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() => Self::Char(c),
                    _ => Self::Other,
                }
            }
        }
    }
}

/// Run-level state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    NotStarted,
    Countdown,
    InProgress,
    /// Every sentence of the batch has been typed.
    SentenceComplete,
    Aborted,
}

/// Events that move the run between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseInput {
    Space,
    Escape,
    CountdownElapsed,
    BatchFinished,
}

impl Phase {
    /// Pure transition function. Inputs with no edge leave the phase as is.
    pub fn next(self, input: PhaseInput) -> Phase {
        use Phase::*;
        match (self, input) {
            (NotStarted, PhaseInput::Space) => Countdown,
            (Countdown, PhaseInput::CountdownElapsed) => InProgress,
            (Countdown | InProgress, PhaseInput::Escape) => Aborted,
            (InProgress, PhaseInput::BatchFinished) => SentenceComplete,
            (Aborted | SentenceComplete, PhaseInput::Space | PhaseInput::Escape) => NotStarted,
            (phase, _) => phase,
        }
    }

    /// A run is live: timers running, keystrokes matter.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Countdown | Phase::InProgress)
    }
}

/// A sentence finished during this keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletedSentence {
    pub id: SentenceId,
    pub sample: StatSample,
}

/// Response from `handle_key`, returned to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyResponse {
    pub consumed: bool,
    pub phase: Phase,
    /// Set for keystrokes judged against the current sentence.
    pub verdict: Option<JudgeVerdict>,
    pub completed: Option<CompletedSentence>,
    /// Dirty results should be handed to storage now.
    pub flush_requested: bool,
    /// Unlimited mode is running low on queued sentences.
    pub needs_more_sentences: bool,
}

impl KeyResponse {
    pub(crate) fn not_consumed(phase: Phase) -> Self {
        Self {
            consumed: false,
            phase,
            verdict: None,
            completed: None,
            flush_requested: false,
            needs_more_sentences: false,
        }
    }

    pub(crate) fn consumed(phase: Phase) -> Self {
        Self {
            consumed: true,
            ..Self::not_consumed(phase)
        }
    }
}
