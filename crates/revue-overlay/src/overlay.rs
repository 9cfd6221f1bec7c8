//! Per-view overlay state machine.
//!
//! [`Overlay`] is synchronous and takes the current time as an argument, so
//! every transition is deterministic. The async driver in
//! [`crate::driver`] owns one and feeds it edits, timer firings, and
//! remote results in arrival order.

use std::time::Instant;

use revue_core::{
    Bias, Decoration, DecorationPayload, DecorationSet, DocRange, Document, Mapping, Match,
    ParagraphSpan, extract_paragraphs,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{EnabledFlag, OverlayConfig};
use crate::debounce::Debounce;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::scheduler::{CheckMode, CheckPlan, Scheduler, Skip};
use crate::tracker::ModificationTracker;

/// Where the overlay is in its check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// An incremental check is waiting for the edit burst to settle.
    Scheduled,
    /// A remote call is in flight.
    Checking,
}

/// Screen coordinates of the spot the suggestion popup should anchor to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// Request to show the suggestion popup for a clicked decoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub position: ScreenPoint,
    pub payload: DecorationPayload,
    pub range: DocRange,
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    mode: CheckMode,
    spans: Vec<ParagraphSpan>,
    planned_at: Instant,
    /// Edits applied since the check was planned.
    since: Mapping,
}

pub struct Overlay {
    config: OverlayConfig,
    enabled: EnabledFlag,
    doc: Document,
    tracker: ModificationTracker,
    scheduler: Scheduler,
    reconciler: Reconciler,
    debounce: Debounce<CheckMode>,
    in_flight: Option<InFlight>,
    full_check_queued: bool,
    destroyed: bool,
}

impl Overlay {
    pub fn new(config: OverlayConfig, enabled: EnabledFlag, doc: Document) -> Self {
        Self {
            scheduler: Scheduler::new(config.min_interval(), config.modification_threshold()),
            debounce: Debounce::new(config.debounce()),
            config,
            enabled,
            doc,
            tracker: ModificationTracker::new(),
            reconciler: Reconciler::new(),
            in_flight: None,
            full_check_queued: false,
            destroyed: false,
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn decorations(&self) -> &DecorationSet {
        self.reconciler.decorations()
    }

    pub fn tracker(&self) -> &ModificationTracker {
        &self.tracker
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight.is_some() {
            Phase::Checking
        } else if self.debounce.pending() {
            Phase::Scheduled
        } else {
            Phase::Idle
        }
    }

    pub fn is_checking(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Adopt the document produced by an edit.
    ///
    /// The edit's mapping is applied to the tracked positions, the
    /// decoration overlay, and any in-flight check before anything else
    /// happens, then the debounced incremental check is (re)armed.
    pub fn apply_edit(&mut self, doc: Document, mapping: &Mapping, now: Instant) {
        if self.destroyed {
            return;
        }
        self.tracker.record_change(mapping, now);
        self.reconciler.map(mapping);
        if let Some(in_flight) = &mut self.in_flight {
            in_flight.since.append(mapping);
        }
        self.doc = doc;
        if !mapping.is_empty() {
            self.debounce.call(CheckMode::Incremental, now);
        }
    }

    /// When the pending debounced check is due.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Fire the debounced check if its deadline has passed.
    pub fn poll_debounce(&mut self, now: Instant) -> Option<CheckPlan> {
        let mode = self.debounce.take_due(now)?;
        self.plan_check(mode, now).ok()
    }

    /// Try to start a check cycle.
    ///
    /// A full check supersedes any pending debounced check. A full check
    /// requested while another check is in flight runs once that one
    /// completes; an incremental one is dropped and left to the next edit.
    pub fn plan_check(&mut self, mode: CheckMode, now: Instant) -> Result<CheckPlan, Skip> {
        let result = self.try_plan(mode, now);
        match &result {
            Ok(plan) => info!(
                id = plan.id,
                mode = mode.as_str(),
                paragraphs = plan.batch.spans().len(),
                chars = plan.batch.text().chars().count(),
                "grammar check issued"
            ),
            Err(skip) => debug!(mode = mode.as_str(), ?skip, "grammar check skipped"),
        }
        result
    }

    fn try_plan(&mut self, mode: CheckMode, now: Instant) -> Result<CheckPlan, Skip> {
        if self.destroyed {
            return Err(Skip::Destroyed);
        }
        if !self.enabled.is_enabled() {
            return Err(Skip::Disabled);
        }
        if self.in_flight.is_some() {
            if mode == CheckMode::Full {
                self.full_check_queued = true;
            }
            return Err(Skip::InFlight);
        }
        if mode == CheckMode::Full {
            self.debounce.cancel();
        }

        let paragraphs = extract_paragraphs(&self.doc)
            .into_iter()
            .map(|mut span| {
                span.last_modified_at = self.tracker.last_touched(span.doc_start, span.doc_end);
                span
            })
            .collect();
        let plan = self.scheduler.plan(mode, paragraphs, now)?;

        self.in_flight = Some(InFlight {
            id: plan.id,
            mode,
            spans: plan.batch.spans().to_vec(),
            planned_at: now,
            since: Mapping::new(),
        });
        Ok(plan)
    }

    /// Apply the result of check `id`.
    ///
    /// Returns `None` when the result is stale or the overlay was destroyed
    /// while the call was in flight; the matches are then discarded.
    pub fn complete_check(&mut self, id: u64, matches: Vec<Match>) -> Option<ReconcileOutcome> {
        if self.in_flight.as_ref().is_none_or(|f| f.id != id) {
            debug!(id, "discarding result of unknown check");
            return None;
        }
        let in_flight = self.in_flight.take()?;
        if self.destroyed {
            debug!(id, "overlay destroyed, discarding check result");
            return None;
        }

        let outcome = self.reconciler.apply(
            in_flight.mode,
            &in_flight.spans,
            &matches,
            &in_flight.since,
        );

        for span in &in_flight.spans {
            self.tracker.clear_touched_before(
                in_flight.since.map_pos(span.doc_start, Bias::Left),
                in_flight.since.map_pos(span.doc_end, Bias::Right),
                in_flight.planned_at,
            );
        }

        info!(
            id,
            mode = in_flight.mode.as_str(),
            added = outcome.added,
            removed = outcome.removed,
            discarded = outcome.discarded,
            "grammar check applied"
        );
        Some(outcome)
    }

    /// Whether a full check was requested while another was in flight.
    /// Clears the request.
    pub fn take_queued_full_check(&mut self) -> bool {
        std::mem::take(&mut self.full_check_queued)
    }

    pub fn decoration_at(&self, pos: usize) -> Option<&Decoration> {
        self.decorations().at(pos)
    }

    /// Suggestion popup request for a click at document position `pos`.
    pub fn suggestion_at(&self, pos: usize, position: ScreenPoint) -> Option<Suggestion> {
        if self.destroyed {
            return None;
        }
        self.decoration_at(pos).map(|deco| Suggestion {
            position,
            payload: deco.payload.clone(),
            range: deco.range,
        })
    }

    /// Tear down: pending and in-flight checks become no-ops.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.debounce.cancel();
        self.full_check_queued = false;
    }
}
