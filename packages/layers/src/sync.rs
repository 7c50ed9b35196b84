//! Layer dataset holder with the stale-response guard.
//!
//! Settle events can fire faster than fetch round-trips, so a response
//! for an older viewport may arrive after a newer one was applied. Every
//! fetch is tagged with a per-layer sequence number; a response is
//! applied only when its tag is newer than the last applied one,
//! otherwise it is discarded silently. Datasets are replaced wholesale,
//! never merged.

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use crate::Layer;

/// Sequence tag carried by one issued fetch.
pub type Seq = u64;

/// Fetch lifecycle phase of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPhase {
    /// No fetch issued yet.
    Idle,
    /// The newest issued fetch has not completed yet.
    Fetching,
    /// The dataset reflects the newest completed fetch.
    Loaded,
    /// The newest fetch failed; the last applied dataset is kept.
    Errored,
}

/// One layer's dataset plus the counters implementing the guard.
#[derive(Debug)]
pub struct LayerState<D> {
    layer: Layer,
    phase: LayerPhase,
    dataset: D,
    last_issued: Seq,
    last_applied: Seq,
    last_completed: Seq,
}

impl<D> LayerState<D> {
    /// Creates the state with an empty dataset.
    #[must_use]
    pub const fn new(layer: Layer, empty: D) -> Self {
        Self {
            layer,
            phase: LayerPhase::Idle,
            dataset: empty,
            last_issued: 0,
            last_applied: 0,
            last_completed: 0,
        }
    }

    /// Tags a new fetch and returns the sequence number to carry with it.
    pub fn begin_fetch(&mut self) -> Seq {
        self.last_issued += 1;
        self.phase = LayerPhase::Fetching;
        self.last_issued
    }

    /// Applies a successful response, replacing the dataset wholesale.
    ///
    /// Returns `false` when the response is stale and was discarded.
    pub fn apply(&mut self, seq: Seq, dataset: D) -> bool {
        self.last_completed = self.last_completed.max(seq);
        if seq <= self.last_applied {
            log::debug!(
                "{}: discarding stale response {seq} (applied {})",
                self.layer,
                self.last_applied
            );
            return false;
        }
        self.dataset = dataset;
        self.last_applied = seq;
        self.phase = if self.last_issued > self.last_completed {
            LayerPhase::Fetching
        } else if self.last_applied < self.last_issued {
            // the newest fetch completed without being applied: it failed
            LayerPhase::Errored
        } else {
            LayerPhase::Loaded
        };
        true
    }

    /// Records a failed fetch, keeping the previous dataset.
    ///
    /// Returns `false` when the failure belongs to an already superseded
    /// fetch and was discarded.
    pub fn fail(&mut self, seq: Seq) -> bool {
        self.last_completed = self.last_completed.max(seq);
        if seq <= self.last_applied {
            log::debug!(
                "{}: discarding stale failure {seq} (applied {})",
                self.layer,
                self.last_applied
            );
            return false;
        }
        if self.last_issued == seq {
            self.phase = LayerPhase::Errored;
        }
        true
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> LayerPhase {
        self.phase
    }

    /// The applied dataset.
    #[must_use]
    pub const fn dataset(&self) -> &D {
        &self.dataset
    }

    /// Which layer this state belongs to.
    #[must_use]
    pub const fn layer(&self) -> Layer {
        self.layer
    }
}

/// Drops items whose rendering key repeats, keeping the first occurrence.
///
/// Duplicate keys are a data-integrity defect in the backend payload;
/// they are logged and removed so the rendering surface never sees two
/// features with the same key.
#[must_use]
pub fn dedupe_by_key<T, K, F>(layer: Layer, items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash + Display,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            if seen.insert(key(item)) {
                true
            } else {
                log::warn!("{}: dropping feature with duplicate key {}", layer, key(item));
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> LayerState<Vec<u32>> {
        LayerState::new(Layer::Sales, Vec::new())
    }

    #[test]
    fn apply_replaces_dataset_wholesale() {
        let mut s = state();
        assert_eq!(s.phase(), LayerPhase::Idle);

        let seq = s.begin_fetch();
        assert_eq!(s.phase(), LayerPhase::Fetching);
        assert!(s.apply(seq, vec![1, 2]));
        assert_eq!(s.phase(), LayerPhase::Loaded);
        assert_eq!(s.dataset(), &vec![1, 2]);

        let seq = s.begin_fetch();
        assert!(s.apply(seq, vec![3]));
        assert_eq!(s.dataset(), &vec![3]);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut s = state();
        let older = s.begin_fetch();
        let newer = s.begin_fetch();

        assert!(s.apply(newer, vec![2]));
        assert!(!s.apply(older, vec![1]));

        assert_eq!(s.dataset(), &vec![2]);
        assert_eq!(s.phase(), LayerPhase::Loaded);
    }

    #[test]
    fn reapplying_the_same_response_is_a_no_op() {
        let mut s = state();
        let seq = s.begin_fetch();
        assert!(s.apply(seq, vec![1]));
        assert!(!s.apply(seq, vec![1]));
        assert_eq!(s.dataset(), &vec![1]);
    }

    #[test]
    fn applied_response_keeps_fetching_while_newer_in_flight() {
        let mut s = state();
        let older = s.begin_fetch();
        let newer = s.begin_fetch();

        assert!(s.apply(older, vec![1]));
        assert_eq!(s.phase(), LayerPhase::Fetching);

        assert!(s.apply(newer, vec![2]));
        assert_eq!(s.phase(), LayerPhase::Loaded);
    }

    #[test]
    fn failure_keeps_previous_dataset() {
        let mut s = state();
        let seq = s.begin_fetch();
        assert!(s.apply(seq, vec![1]));

        let seq = s.begin_fetch();
        assert!(s.fail(seq));
        assert_eq!(s.phase(), LayerPhase::Errored);
        assert_eq!(s.dataset(), &vec![1]);

        // the next trigger is the only retry path
        let seq = s.begin_fetch();
        assert_eq!(s.phase(), LayerPhase::Fetching);
        assert!(s.apply(seq, vec![2]));
        assert_eq!(s.dataset(), &vec![2]);
    }

    #[test]
    fn stale_failure_is_ignored() {
        let mut s = state();
        let older = s.begin_fetch();
        let newer = s.begin_fetch();

        assert!(s.apply(newer, vec![2]));
        assert!(!s.fail(older));
        assert_eq!(s.phase(), LayerPhase::Loaded);
    }

    #[test]
    fn superseded_failure_does_not_mask_inflight_fetch() {
        let mut s = state();
        let older = s.begin_fetch();
        let _newer = s.begin_fetch();

        assert!(s.fail(older));
        assert_eq!(s.phase(), LayerPhase::Fetching);
    }

    #[test]
    fn late_success_after_newest_failure_keeps_the_error_phase() {
        let mut s = state();
        let older = s.begin_fetch();
        let newer = s.begin_fetch();

        assert!(s.fail(newer));
        assert_eq!(s.phase(), LayerPhase::Errored);

        // the older response still lands and supplies data
        assert!(s.apply(older, vec![1]));
        assert_eq!(s.dataset(), &vec![1]);
        // nothing is in flight anymore, so the phase must not claim it is
        assert_eq!(s.phase(), LayerPhase::Errored);
    }

    #[test]
    fn duplicate_keys_are_dropped_keeping_first() {
        let items = vec![(1, "a"), (2, "b"), (3, "a")];
        let out = dedupe_by_key(Layer::City, items, |(_, k)| (*k).to_string());
        assert_eq!(out, vec![(1, "a"), (2, "b")]);
    }
}
