//! Choosing the sentences for a run.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use drill_core::settings::{FillPolicy, SessionSettings};
use drill_core::SentenceId;

use crate::SessionError;

/// Batch size in unlimited mode.
pub const UNLIMITED_BATCH_SIZE: usize = 100;
/// Unlimited mode asks for more once this many sentences remain queued.
pub const REFILL_THRESHOLD: usize = 15;
/// Unlimited mode asks for a flush after this many completions.
pub const FLUSH_INTERVAL: usize = 10;

/// One sentence as supplied by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: SentenceId,
    /// Reading in kana; this is what gets typed.
    pub kana: String,
    /// Display text, usually with kanji.
    pub text: String,
}

fn target_size(settings: &SessionSettings, rng: &mut impl Rng) -> usize {
    if settings.unlimited_mode {
        UNLIMITED_BATCH_SIZE
    } else if settings.random_count {
        rng.random_range(2..=settings.random_count_max.max(2))
    } else {
        settings.target_sentence_count
    }
}

/// Build a run's batch from the sentences storage returned for the learner's
/// query. `pool` is every sentence available.
///
/// An empty fetch is replaced by a random draw from the pool. A short batch
/// is topped up according to the fill policy; unlimited mode always tops up.
pub fn plan_batch(
    fetched: Vec<Sentence>,
    pool: &[Sentence],
    settings: &SessionSettings,
    rng: &mut impl Rng,
) -> Result<Vec<Sentence>, SessionError> {
    let target = target_size(settings, rng);
    let _span = debug_span!("plan_batch", fetched = fetched.len(), pool = pool.len(), target)
        .entered();

    let mut batch = fetched;
    batch.truncate(target);
    if batch.is_empty() {
        batch = pool.choose_multiple(rng, target).cloned().collect();
        debug!(drawn = batch.len(), "empty fetch replaced from pool");
    } else if batch.len() < target {
        let need = target - batch.len();
        match effective_policy(settings) {
            FillPolicy::RandomFill => {
                let extra: Vec<Sentence> = pool.choose_multiple(rng, need).cloned().collect();
                batch.extend(extra);
            }
            FillPolicy::WhenShort => {
                let extra: Vec<Sentence> = (0..need)
                    .filter_map(|_| batch.choose(rng).cloned())
                    .collect();
                batch.extend(extra);
            }
            FillPolicy::Never => {}
        }
        debug!(len = batch.len(), "fill applied");
    }

    if batch.is_empty() {
        return Err(SessionError::EmptyBatch);
    }
    Ok(batch)
}

fn effective_policy(settings: &SessionSettings) -> FillPolicy {
    match settings.fill_policy {
        FillPolicy::Never if settings.unlimited_mode => FillPolicy::WhenShort,
        policy => policy,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn sentences(ids: std::ops::Range<SentenceId>) -> Vec<Sentence> {
        ids.map(|id| Sentence {
            id,
            kana: "かな".to_string(),
            text: format!("s{id}"),
        })
        .collect()
    }

    fn session_settings(policy: FillPolicy) -> SessionSettings {
        SessionSettings {
            unlimited_mode: false,
            record_stats: true,
            target_sentence_count: 5,
            fill_policy: policy,
            random_count: false,
            random_count_max: 20,
            countdown_ms: 0,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_full_fetch_truncated_to_target() {
        let s = session_settings(FillPolicy::Never);
        let batch = plan_batch(sentences(0..8), &sentences(0..50), &s, &mut rng()).unwrap();
        assert_eq!(batch.iter().map(|s| s.id).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_never_leaves_short() {
        let s = session_settings(FillPolicy::Never);
        let batch = plan_batch(sentences(0..2), &sentences(0..50), &s, &mut rng()).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_when_short_repeats_fetched() {
        let s = session_settings(FillPolicy::WhenShort);
        let batch = plan_batch(sentences(0..2), &sentences(0..50), &s, &mut rng()).unwrap();
        assert_eq!(batch.len(), 5);
        assert!(batch.iter().all(|s| s.id < 2));
    }

    #[test]
    fn test_random_fill_draws_from_pool() {
        let s = session_settings(FillPolicy::RandomFill);
        let pool = sentences(100..103);
        let batch = plan_batch(sentences(0..2), &pool, &s, &mut rng()).unwrap();
        assert_eq!(batch.len(), 5);
        let mut extra: Vec<_> = batch[2..].iter().map(|s| s.id).collect();
        extra.sort();
        assert_eq!(extra, vec![100, 101, 102]);
    }

    #[test]
    fn test_empty_fetch_uses_pool() {
        let s = session_settings(FillPolicy::Never);
        let batch = plan_batch(Vec::new(), &sentences(0..50), &s, &mut rng()).unwrap();
        assert_eq!(batch.len(), 5);
    }

    #[test]
    fn test_empty_everything() {
        let s = session_settings(FillPolicy::RandomFill);
        let err = plan_batch(Vec::new(), &[], &s, &mut rng()).unwrap_err();
        assert!(matches!(err, SessionError::EmptyBatch));
    }

    #[test]
    fn test_unlimited_always_fills() {
        let mut s = session_settings(FillPolicy::Never);
        s.unlimited_mode = true;
        let batch = plan_batch(sentences(0..3), &sentences(0..10), &s, &mut rng()).unwrap();
        assert_eq!(batch.len(), UNLIMITED_BATCH_SIZE);
        assert!(batch.iter().all(|s| s.id < 3));
    }

    #[test]
    fn test_random_count_range() {
        let mut s = session_settings(FillPolicy::Never);
        s.random_count = true;
        s.random_count_max = 4;
        let mut rng = rng();
        for _ in 0..50 {
            let batch = plan_batch(sentences(0..10), &[], &s, &mut rng).unwrap();
            assert!((2..=4).contains(&batch.len()), "{}", batch.len());
        }
    }
}
