//! Per-sentence aggregate results and the changeset handed to storage.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::stats::StatSample;

pub type SentenceId = i64;

/// Number of recent samples kept per sentence.
pub const HISTORY_LEN: usize = 5;

/// Fixed-capacity window of recent samples. Zero means "unset" and is left
/// out of averages. Serializes newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct RingBuffer<const N: usize> {
    slots: [f64; N],
    /// Slot the next push overwrites.
    next: usize,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self {
            slots: [0.0; N],
            next: 0,
        }
    }
}

impl<const N: usize> RingBuffer<N> {
    /// Overwrite the oldest slot.
    pub fn push(&mut self, value: f64) {
        if N == 0 {
            return;
        }
        self.slots[self.next] = value;
        self.next = (self.next + 1) % N;
    }

    /// Values from newest to oldest, unset slots included.
    pub fn iter_newest(&self) -> impl Iterator<Item = f64> + '_ {
        (0..N).map(move |i| self.slots[(self.next + N - 1 - i) % N])
    }

    pub fn average_excluding_unset(&self) -> f64 {
        let (sum, count) = self
            .slots
            .iter()
            .filter(|v| **v != 0.0)
            .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            0.0
        } else {
            sum / f64::from(count)
        }
    }
}

impl<const N: usize> From<Vec<f64>> for RingBuffer<N> {
    fn from(newest_first: Vec<f64>) -> Self {
        let mut buf = Self::default();
        let kept = newest_first.len().min(N);
        for value in newest_first[..kept].iter().rev() {
            buf.push(*value);
        }
        buf
    }
}

impl<const N: usize> From<RingBuffer<N>> for Vec<f64> {
    fn from(buf: RingBuffer<N>) -> Self {
        buf.iter_newest().collect()
    }
}

/// Aggregates for one sentence across every run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentenceRecord {
    /// Mean of the non-zero entries of `last5_wpm`.
    pub avg_wpm: f64,
    pub max_wpm: f64,
    /// Unset until the first completion.
    pub min_wpm: Option<f64>,
    pub times_encountered: u32,
    pub times_finished: u32,
    /// Mean of the non-zero entries of `last5_acc`.
    pub avg_accuracy: f64,
    pub perfect_count: u32,
    pub max_miss_streak: u32,
    pub last5_wpm: RingBuffer<HISTORY_LEN>,
    pub last5_acc: RingBuffer<HISTORY_LEN>,
    pub avg_wpm_on_mistake: f64,
    pub avg_wpm_on_perfect: f64,
}

impl SentenceRecord {
    fn apply(&mut self, sample: &StatSample) {
        let wpm = sample.wpm;
        self.last5_wpm.push(wpm);
        self.last5_acc.push(sample.accuracy_pct.ceil());
        self.avg_wpm = self.last5_wpm.average_excluding_unset();
        self.avg_accuracy = self.last5_acc.average_excluding_unset();

        self.times_finished += 1;
        if wpm > self.max_wpm {
            self.max_wpm = wpm;
        }
        self.min_wpm = Some(self.min_wpm.map_or(wpm, |min| min.min(wpm)));
        self.max_miss_streak = self.max_miss_streak.max(sample.miss_streak);

        if sample.accuracy_pct.floor() == 100.0 {
            self.perfect_count += 1;
            self.avg_wpm_on_perfect +=
                (wpm - self.avg_wpm_on_perfect) / f64::from(self.perfect_count);
        } else {
            let mistaken = self.times_finished.saturating_sub(self.perfect_count).max(1);
            self.avg_wpm_on_mistake += (wpm - self.avg_wpm_on_mistake) / f64::from(mistaken);
        }
    }
}

/// One dirty sentence's new aggregate state, ready for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatChange {
    pub id: SentenceId,
    pub record: SentenceRecord,
    #[serde(with = "time::serde::rfc3339")]
    pub last_played: OffsetDateTime,
}

/// Owns the records of one learner session and tracks which ids changed
/// since the last flush.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    records: HashMap<SentenceId, SentenceRecord>,
    dirty: BTreeSet<SentenceId>,
    record_stats: bool,
}

impl ResultAggregator {
    /// With `record_stats` off, completions leave aggregates untouched.
    pub fn new(record_stats: bool) -> Self {
        Self {
            records: HashMap::new(),
            dirty: BTreeSet::new(),
            record_stats,
        }
    }

    /// Seed a record loaded from storage. Not marked dirty.
    pub fn load(&mut self, id: SentenceId, record: SentenceRecord) {
        self.records.insert(id, record);
    }

    /// The sentence was shown to the learner.
    pub fn encounter(&mut self, id: SentenceId) {
        let rec = self.records.entry(id).or_default();
        rec.times_encountered += 1;
        self.dirty.insert(id);
        debug!(id, times = rec.times_encountered, "encounter");
    }

    /// Fold a completed sentence's sample into its record.
    pub fn update(&mut self, id: SentenceId, sample: &StatSample) -> Option<&SentenceRecord> {
        if !self.record_stats {
            debug!(id, "stats recording disabled");
            return None;
        }
        let rec = self.records.entry(id).or_default();
        rec.apply(sample);
        self.dirty.insert(id);
        debug!(id, wpm = sample.wpm, acc = sample.accuracy_pct, "result updated");
        Some(rec)
    }

    /// The learner left mid-sentence. Only the encounter count may change:
    /// unlimited mode takes the encounter back out.
    pub fn abandon(&mut self, id: SentenceId, unlimited: bool) {
        if unlimited {
            if let Some(rec) = self.records.get_mut(&id) {
                rec.times_encountered = rec.times_encountered.saturating_sub(1);
            }
        }
        self.dirty.insert(id);
        debug!(id, unlimited, "abandoned");
    }

    pub fn record(&self, id: SentenceId) -> Option<&SentenceRecord> {
        self.records.get(&id)
    }

    pub fn records(&self) -> &HashMap<SentenceId, SentenceRecord> {
        &self.records
    }

    pub fn record_stats(&self) -> bool {
        self.record_stats
    }

    pub fn dirty_ids(&self) -> impl Iterator<Item = SentenceId> + '_ {
        self.dirty.iter().copied()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Take every dirty record, stamped with the local time.
    pub fn drain_changeset(&mut self) -> Vec<StatChange> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.drain_changeset_at(now)
    }

    pub fn drain_changeset_at(&mut self, last_played: OffsetDateTime) -> Vec<StatChange> {
        let ids = std::mem::take(&mut self.dirty);
        debug!(count = ids.len(), "drain changeset");
        ids.into_iter()
            .filter_map(|id| {
                self.records.get(&id).map(|record| StatChange {
                    id,
                    record: record.clone(),
                    last_played,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn sample(wpm: f64, accuracy_pct: f64, miss_streak: u32) -> StatSample {
        StatSample {
            wpm,
            accuracy_pct,
            miss_streak,
        }
    }

    #[test]
    fn test_ring_average_skips_unset() {
        let mut buf = RingBuffer::<5>::default();
        assert_eq!(buf.average_excluding_unset(), 0.0);
        buf.push(42.0);
        assert_eq!(buf.average_excluding_unset(), 42.0);
        buf.push(0.0);
        buf.push(58.0);
        assert_eq!(buf.average_excluding_unset(), 50.0);
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let mut buf = RingBuffer::<5>::default();
        for v in 1..=6 {
            buf.push(f64::from(v));
        }
        let values: Vec<f64> = buf.clone().into();
        assert_eq!(values, vec![6.0, 5.0, 4.0, 3.0, 2.0]);
        assert_eq!(buf.average_excluding_unset(), 4.0);
    }

    #[test]
    fn test_ring_serializes_newest_first() {
        let mut buf = RingBuffer::<5>::default();
        buf.push(10.0);
        buf.push(20.0);
        let json = serde_json::to_string(&buf).unwrap();
        assert_eq!(json, "[20.0,10.0,0.0,0.0,0.0]");
        let back: RingBuffer<5> = serde_json::from_str("[20.0,10.0]").unwrap();
        assert_eq!(back.iter_newest().collect::<Vec<_>>(), vec![20.0, 10.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_first_update() {
        let mut agg = ResultAggregator::new(true);
        agg.encounter(7);
        let rec = agg.update(7, &sample(42.0, 96.5, 3)).unwrap().clone();
        assert_eq!(rec.avg_wpm, 42.0);
        assert_eq!(rec.avg_accuracy, 97.0);
        assert_eq!(rec.max_wpm, 42.0);
        assert_eq!(rec.min_wpm, Some(42.0));
        assert_eq!(rec.times_encountered, 1);
        assert_eq!(rec.times_finished, 1);
        assert_eq!(rec.max_miss_streak, 3);
        assert_eq!(rec.perfect_count, 0);
        assert_eq!(rec.avg_wpm_on_mistake, 42.0);
        assert_eq!(rec.avg_wpm_on_perfect, 0.0);
    }

    #[test]
    fn test_extremes_and_running_means() {
        let mut agg = ResultAggregator::new(true);
        agg.update(1, &sample(100.0, 100.0, 0));
        agg.update(1, &sample(50.0, 90.0, 2));
        agg.update(1, &sample(200.0, 100.0, 1));
        agg.update(1, &sample(70.0, 80.0, 1));
        let rec = agg.record(1).unwrap();
        assert_eq!(rec.max_wpm, 200.0);
        assert_eq!(rec.min_wpm, Some(50.0));
        assert_eq!(rec.perfect_count, 2);
        assert_eq!(rec.avg_wpm_on_perfect, 150.0);
        assert_eq!(rec.avg_wpm_on_mistake, 60.0);
        assert_eq!(rec.max_miss_streak, 2);
        assert_eq!(rec.avg_wpm, 105.0);
        assert_eq!(rec.avg_accuracy, 92.5);
    }

    #[test]
    fn test_perfect_uses_floor() {
        let mut agg = ResultAggregator::new(true);
        agg.update(1, &sample(80.0, 99.99, 0));
        assert_eq!(agg.record(1).unwrap().perfect_count, 0);
    }

    #[test]
    fn test_abandon_unlimited_restores_encounter() {
        let mut agg = ResultAggregator::new(true);
        agg.encounter(3);
        agg.update(3, &sample(60.0, 100.0, 0));
        let before = agg.record(3).unwrap().clone();

        agg.encounter(3);
        agg.abandon(3, true);
        assert_eq!(agg.record(3).unwrap(), &before);
    }

    #[test]
    fn test_abandon_limited_keeps_encounter() {
        let mut agg = ResultAggregator::new(true);
        agg.encounter(3);
        agg.abandon(3, false);
        let rec = agg.record(3).unwrap();
        assert_eq!(rec.times_encountered, 1);
        assert_eq!(rec.times_finished, 0);
        assert_eq!(agg.dirty_ids().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_record_stats_off() {
        let mut agg = ResultAggregator::new(false);
        agg.encounter(5);
        assert!(agg.update(5, &sample(60.0, 100.0, 0)).is_none());
        let rec = agg.record(5).unwrap();
        assert_eq!(rec.times_encountered, 1);
        assert_eq!(rec.times_finished, 0);
        assert!(agg.is_dirty());
    }

    #[test]
    fn test_load_continues_history() {
        let mut agg = ResultAggregator::new(true);
        let stored = SentenceRecord {
            times_finished: 4,
            perfect_count: 4,
            avg_wpm_on_perfect: 100.0,
            last5_wpm: RingBuffer::from(vec![100.0, 100.0]),
            ..Default::default()
        };
        agg.load(9, stored);
        assert!(!agg.is_dirty());

        agg.update(9, &sample(200.0, 100.0, 0));
        let rec = agg.record(9).unwrap();
        assert_eq!(rec.times_finished, 5);
        assert_eq!(rec.avg_wpm_on_perfect, 120.0);
        assert!((rec.avg_wpm - 400.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_drain_changeset() {
        let mut agg = ResultAggregator::new(true);
        agg.encounter(2);
        agg.encounter(1);
        agg.update(1, &sample(60.0, 100.0, 0));
        let at = datetime!(2024-05-01 12:00:00 UTC);

        let changes = agg.drain_changeset_at(at);
        assert_eq!(changes.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(changes[0].record.times_finished, 1);
        assert!(!agg.is_dirty());
        assert!(agg.drain_changeset_at(at).is_empty());

        let json = serde_json::to_value(&changes[1]).unwrap();
        assert_eq!(json["last_played"], "2024-05-01T12:00:00Z");
        assert_eq!(json["record"]["times_encountered"], 1);
        assert!(json["record"]["min_wpm"].is_null());
    }
}
