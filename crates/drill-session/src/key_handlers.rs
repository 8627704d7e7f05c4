use std::time::{Duration, Instant};

use tracing::{debug, debug_span};

use drill_core::Judge;

use super::batch::FLUSH_INTERVAL;
use super::types::{CompletedSentence, KeyEvent, KeyResponse, Phase, PhaseInput};
use super::{Active, DrillSession, SessionError, StatsTicker};

impl DrillSession {
    /// Process a key event at time `now`.
    pub fn handle_key(&mut self, event: KeyEvent, now: Instant) -> KeyResponse {
        let _span = debug_span!("handle_key", ?event, phase = ?self.phase).entered();

        match (self.phase, event) {
            (Phase::NotStarted, KeyEvent::Space) => match self.start(now) {
                Ok(()) => KeyResponse::consumed(self.phase),
                Err(e) => {
                    debug!(%e, "start rejected");
                    KeyResponse::not_consumed(self.phase)
                }
            },

            (Phase::Countdown | Phase::InProgress, KeyEvent::Escape) => self.abort(),

            // Keys before the countdown ends only wake the clock.
            (Phase::Countdown, _) => {
                self.poll(now);
                KeyResponse::consumed(self.phase)
            }

            (Phase::InProgress, KeyEvent::Char(c)) => self.type_char(c, now),

            (Phase::Aborted | Phase::SentenceComplete, KeyEvent::Space | KeyEvent::Escape) => {
                self.reset();
                KeyResponse::consumed(self.phase)
            }

            _ => KeyResponse::not_consumed(self.phase),
        }
    }

    /// Begin a run from `NotStarted`. With no countdown configured the run
    /// is live immediately.
    pub fn start(&mut self, now: Instant) -> Result<(), SessionError> {
        if self.phase != Phase::NotStarted {
            debug!(phase = ?self.phase, "start ignored");
            return Ok(());
        }
        if self.batch.is_empty() {
            return Err(SessionError::NotPrepared);
        }
        self.queue = self.batch.iter().cloned().collect();
        self.completed = 0;
        self.phase = self.phase.next(PhaseInput::Space);

        let countdown = Duration::from_millis(self.session_settings.countdown_ms);
        if countdown.is_zero() {
            self.enter_in_progress(now);
        } else {
            self.countdown_deadline = Some(now + countdown);
            debug!(ms = self.session_settings.countdown_ms, "countdown");
        }
        Ok(())
    }

    /// Advance time-driven transitions. Returns true if the phase changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match (self.phase, self.countdown_deadline) {
            (Phase::Countdown, Some(deadline)) if now >= deadline => {
                self.enter_in_progress(now);
                true
            }
            _ => false,
        }
    }

    fn enter_in_progress(&mut self, now: Instant) {
        self.phase = self.phase.next(PhaseInput::CountdownElapsed);
        self.countdown_deadline = None;
        self.stats.start(now);

        let interval = self.stats_settings.tick_interval_ms;
        if interval > 0 {
            match StatsTicker::start(Duration::from_millis(interval), now) {
                Ok(t) => self.ticker = Some(t),
                Err(e) => debug!(%e, "ticker unavailable"),
            }
        }

        if !self.load_next() {
            // start() guarantees a non-empty queue
            self.finish_run();
        }
    }

    /// Move the next queued sentence on screen. False when the queue is empty.
    fn load_next(&mut self) -> bool {
        let Some(next) = self.queue.pop_front() else {
            self.current = None;
            return false;
        };
        let id = next.sentence.id;
        self.results.encounter(id);
        debug!(id, queued = self.queue.len(), "sentence loaded");
        self.current = Some(Active {
            sentence: next.sentence,
            judge: Judge::new(next.run),
        });
        true
    }

    fn type_char(&mut self, c: char, now: Instant) -> KeyResponse {
        let Some(active) = self.current.as_mut() else {
            return KeyResponse::not_consumed(self.phase);
        };
        let verdict = active.judge.judge(c);
        self.stats.record(verdict.is_correct, now);

        let mut resp = KeyResponse::consumed(self.phase);
        resp.verdict = Some(verdict);
        if verdict.advance_sentence {
            self.finish_sentence(now, &mut resp);
        }
        resp.phase = self.phase;
        resp.needs_more_sentences = self.needs_more_sentences();
        resp
    }

    fn finish_sentence(&mut self, now: Instant, resp: &mut KeyResponse) {
        let Some(active) = self.current.take() else {
            return;
        };
        let id = active.sentence.id;
        let sample = self.stats.sample();
        self.results.update(id, &sample);
        self.completed += 1;
        debug!(id, wpm = sample.wpm, acc = sample.accuracy_pct, "sentence complete");
        resp.completed = Some(CompletedSentence { id, sample });

        if self.session_settings.unlimited_mode && self.completed % FLUSH_INTERVAL == 0 {
            resp.flush_requested = true;
        }

        self.stats.next_sentence(now);
        if !self.load_next() {
            self.finish_run();
            resp.flush_requested = true;
        }
    }

    fn finish_run(&mut self) {
        self.phase = self.phase.next(PhaseInput::BatchFinished);
        self.ticker = None;
        debug!(completed = self.completed, "run finished");
    }

    fn abort(&mut self) -> KeyResponse {
        if let Some(active) = self.current.take() {
            self.results
                .abandon(active.sentence.id, self.session_settings.unlimited_mode);
        }
        self.phase = self.phase.next(PhaseInput::Escape);
        self.ticker = None;
        self.countdown_deadline = None;
        self.queue.clear();

        let mut resp = KeyResponse::consumed(self.phase);
        resp.flush_requested = self.results.is_dirty();
        resp
    }
}
