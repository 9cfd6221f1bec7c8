//! Decide which paragraphs to send and whether a remote call may go out now.

use std::time::{Duration, Instant};

use revue_core::{Batch, ParagraphSpan};

/// What a check cycle covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Recently modified paragraphs, subject to the minimum interval.
    Incremental,
    /// Every paragraph, bypassing modification filtering and the interval.
    Full,
}

impl CheckMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Full => "full",
        }
    }
}

/// Why a cycle did not issue a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Destroyed,
    Disabled,
    /// Another check is still waiting on the service.
    InFlight,
    /// No paragraph qualifies for this cycle.
    NothingToCheck,
    /// The minimum interval since the last remote call has not elapsed.
    RateLimited,
}

/// A remote call that has been approved.
#[derive(Debug, Clone)]
pub struct CheckPlan {
    pub id: u64,
    pub mode: CheckMode,
    pub batch: Batch,
    pub planned_at: Instant,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    min_interval: Duration,
    modification_threshold: Duration,
    last_check: Option<Instant>,
    next_id: u64,
}

impl Scheduler {
    pub fn new(min_interval: Duration, modification_threshold: Duration) -> Self {
        Self {
            min_interval,
            modification_threshold,
            last_check: None,
            next_id: 1,
        }
    }

    /// When the last remote call was issued.
    pub fn last_check(&self) -> Option<Instant> {
        self.last_check
    }

    /// Paragraphs that qualify for a cycle in `mode`.
    pub fn eligible(
        &self,
        mode: CheckMode,
        paragraphs: Vec<ParagraphSpan>,
        now: Instant,
    ) -> Vec<ParagraphSpan> {
        match mode {
            CheckMode::Full => paragraphs,
            CheckMode::Incremental => paragraphs
                .into_iter()
                .filter(|p| {
                    p.last_modified_at.is_some_and(|at| {
                        now.saturating_duration_since(at) < self.modification_threshold
                    })
                })
                .collect(),
        }
    }

    pub fn rate_limited(&self, now: Instant) -> bool {
        self.last_check
            .is_some_and(|at| now.saturating_duration_since(at) < self.min_interval)
    }

    /// Approve a remote call for `paragraphs`, or say why not.
    ///
    /// The last-check time only moves when a plan is returned.
    pub fn plan(
        &mut self,
        mode: CheckMode,
        paragraphs: Vec<ParagraphSpan>,
        now: Instant,
    ) -> Result<CheckPlan, Skip> {
        let eligible = self.eligible(mode, paragraphs, now);
        if eligible.is_empty() {
            return Err(Skip::NothingToCheck);
        }
        if mode == CheckMode::Incremental && self.rate_limited(now) {
            return Err(Skip::RateLimited);
        }
        let batch = Batch::assemble(eligible);
        if batch.is_blank() {
            return Err(Skip::NothingToCheck);
        }

        self.last_check = Some(now);
        let id = self.next_id;
        self.next_id += 1;
        Ok(CheckPlan {
            id,
            mode,
            batch,
            planned_at: now,
        })
    }
}
