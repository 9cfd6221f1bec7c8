//! Positions touched by edits since they were last checked.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use revue_core::{Bias, Mapping};

/// Sole owner of the touched-position set.
///
/// Every edit's mapping must be fed through [`record_change`] in edit
/// order: existing positions are translated first, then the edit's own
/// positions are recorded in the new coordinates.
///
/// [`record_change`]: ModificationTracker::record_change
#[derive(Debug, Clone, Default)]
pub struct ModificationTracker {
    touched: BTreeMap<usize, Instant>,
}

impl ModificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.touched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// Record `positions` as touched at `at`. A position keeps its most
    /// recent touch time.
    pub fn record(&mut self, positions: impl IntoIterator<Item = usize>, at: Instant) {
        for pos in positions {
            touch(&mut self.touched, pos, at);
        }
    }

    /// Carry every tracked position through `mapping`.
    pub fn translate(&mut self, mapping: &Mapping) {
        if mapping.is_empty() {
            return;
        }
        let old = std::mem::take(&mut self.touched);
        for (pos, at) in old {
            touch(&mut self.touched, mapping.map_pos(pos, Bias::Left), at);
        }
    }

    /// Translate existing positions through an edit, then record the
    /// positions the edit touched.
    pub fn record_change(&mut self, mapping: &Mapping, at: Instant) {
        self.translate(mapping);
        self.record(mapping.touched_positions(), at);
    }

    /// Most recent touch time of any position in `[from, to]`.
    pub fn last_touched(&self, from: usize, to: usize) -> Option<Instant> {
        if from > to {
            return None;
        }
        self.touched.range(from..=to).map(|(_, at)| *at).max()
    }

    /// True when `[from, to]` was touched less than `threshold` before `now`.
    pub fn is_recently_modified(&self, from: usize, to: usize, now: Instant, threshold: Duration) -> bool {
        self.last_touched(from, to)
            .is_some_and(|at| now.saturating_duration_since(at) < threshold)
    }

    /// Forget every position in `[from, to]`.
    pub fn clear(&mut self, from: usize, to: usize) {
        if from > to {
            return;
        }
        self.touched.retain(|pos, _| *pos < from || *pos > to);
    }

    /// Forget positions in `[from, to]` touched at or before `cutoff`.
    /// Later touches survive so they are picked up by the next check.
    pub fn clear_touched_before(&mut self, from: usize, to: usize, cutoff: Instant) {
        if from > to {
            return;
        }
        self.touched
            .retain(|pos, at| *pos < from || *pos > to || *at > cutoff);
    }
}

fn touch(touched: &mut BTreeMap<usize, Instant>, pos: usize, at: Instant) {
    touched
        .entry(pos)
        .and_modify(|prev| *prev = (*prev).max(at))
        .or_insert(at);
}
