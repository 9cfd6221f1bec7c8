//! Async driver: one task per overlay, fed by a command channel.
//!
//! The task owns the [`Overlay`] state machine, runs the debounce timer,
//! and dispatches remote checks to the [`Annotator`] on separate tasks so
//! edits keep flowing while a call is in flight. Every state transition
//! happens on the driver task, in arrival order.

use std::sync::Arc;
use std::time::Instant;

use revue_client::Annotator;
use revue_core::{DecorationSet, Document, Mapping, Match};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::{EnabledFlag, OverlayConfig};
use crate::overlay::{Overlay, ScreenPoint, Suggestion};
use crate::scheduler::{CheckMode, CheckPlan};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("overlay has been destroyed")]
pub struct OverlayClosed;

/// Notifications for the host view.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// The decoration overlay changed and should be re-rendered.
    DecorationsChanged(DecorationSet),
    /// A decoration was clicked.
    ShowSuggestion(Suggestion),
}

enum Command {
    Edit { doc: Document, mapping: Mapping },
    ForceFullCheck,
    Click { pos: usize, at: ScreenPoint },
    Decorations(oneshot::Sender<DecorationSet>),
    Destroy,
}

/// Cloneable handle to a running overlay. Dropping every handle destroys it.
#[derive(Clone)]
pub struct OverlayHandle {
    commands: mpsc::UnboundedSender<Command>,
    enabled: EnabledFlag,
}

impl OverlayHandle {
    /// Report an edit: the document after it and the mapping it produced.
    pub fn edit(&self, doc: Document, mapping: Mapping) -> Result<(), OverlayClosed> {
        self.send(Command::Edit { doc, mapping })
    }

    /// Check every paragraph now, bypassing the debounce and rate floor.
    pub fn force_full_check(&self) -> Result<(), OverlayClosed> {
        self.send(Command::ForceFullCheck)
    }

    /// Report a click at document position `pos`, shown at screen point `at`.
    pub fn click(&self, pos: usize, at: ScreenPoint) -> Result<(), OverlayClosed> {
        self.send(Command::Click { pos, at })
    }

    /// Snapshot of the current decoration overlay.
    pub async fn decorations(&self) -> Result<DecorationSet, OverlayClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Decorations(tx))?;
        rx.await.map_err(|_| OverlayClosed)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.is_enabled()
    }

    /// Suspend or resume checking. Takes effect at the next planned check.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Tear the overlay down. A check in flight completes but its result
    /// is discarded.
    pub fn destroy(&self) -> Result<(), OverlayClosed> {
        self.send(Command::Destroy)
    }

    fn send(&self, command: Command) -> Result<(), OverlayClosed> {
        self.commands.send(command).map_err(|_| OverlayClosed)
    }
}

/// Start an overlay for `doc` on the current tokio runtime.
///
/// Returns the control handle and the stream of events for the host. The
/// event stream ends once the overlay is destroyed and any in-flight check
/// has settled.
pub fn spawn_overlay(
    config: OverlayConfig,
    enabled: EnabledFlag,
    doc: Document,
    annotator: Arc<dyn Annotator>,
) -> (OverlayHandle, mpsc::UnboundedReceiver<OverlayEvent>) {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let driver = Driver {
        overlay: Overlay::new(config, enabled.clone(), doc),
        annotator,
        events: events_tx,
    };
    tokio::spawn(driver.run(commands_rx));
    let handle = OverlayHandle {
        commands: commands_tx,
        enabled,
    };
    (handle, events_rx)
}

/// Current time on tokio's clock, so paused-time tests drive the timers.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

struct Driver {
    overlay: Overlay,
    annotator: Arc<dyn Annotator>,
    events: mpsc::UnboundedSender<OverlayEvent>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(u64, Vec<Match>)>();
        info!(language = %self.overlay.config().language, "grammar overlay started");

        loop {
            if self.overlay.is_destroyed() && !self.overlay.is_checking() {
                break;
            }
            let deadline = self.overlay.debounce_deadline();
            let sleep = tokio::time::sleep_until(tokio::time::Instant::from_std(
                deadline.unwrap_or_else(now),
            ));

            tokio::select! {
                command = commands.recv(), if !self.overlay.is_destroyed() => match command {
                    Some(command) => self.handle(command, &done_tx),
                    None => self.overlay.destroy(),
                },
                _ = sleep, if deadline.is_some() => {
                    if let Some(plan) = self.overlay.poll_debounce(now()) {
                        self.dispatch(plan, &done_tx);
                    }
                }
                Some((id, matches)) = done_rx.recv() => {
                    if self.overlay.complete_check(id, matches).is_some() {
                        self.emit(OverlayEvent::DecorationsChanged(
                            self.overlay.decorations().clone(),
                        ));
                    }
                    if self.overlay.take_queued_full_check() {
                        self.check(CheckMode::Full, &done_tx);
                    }
                }
            }
        }
        info!("grammar overlay destroyed");
    }

    fn handle(&mut self, command: Command, done: &mpsc::UnboundedSender<(u64, Vec<Match>)>) {
        match command {
            Command::Edit { doc, mapping } => {
                let before = self.overlay.decorations().clone();
                self.overlay.apply_edit(doc, &mapping, now());
                if self.overlay.decorations() != &before {
                    self.emit(OverlayEvent::DecorationsChanged(
                        self.overlay.decorations().clone(),
                    ));
                }
            }
            Command::ForceFullCheck => self.check(CheckMode::Full, done),
            Command::Click { pos, at } => {
                if let Some(suggestion) = self.overlay.suggestion_at(pos, at) {
                    self.emit(OverlayEvent::ShowSuggestion(suggestion));
                }
            }
            Command::Decorations(reply) => {
                let _ = reply.send(self.overlay.decorations().clone());
            }
            Command::Destroy => self.overlay.destroy(),
        }
    }

    fn check(&mut self, mode: CheckMode, done: &mpsc::UnboundedSender<(u64, Vec<Match>)>) {
        if let Ok(plan) = self.overlay.plan_check(mode, now()) {
            self.dispatch(plan, done);
        }
    }

    fn dispatch(&self, plan: CheckPlan, done: &mpsc::UnboundedSender<(u64, Vec<Match>)>) {
        let annotator = Arc::clone(&self.annotator);
        let language = self.overlay.config().language.clone();
        let level = self.overlay.config().level;
        let limit = self.overlay.config().request_timeout();
        let done = done.clone();
        tokio::spawn(async move {
            let call = annotator.check(plan.batch.text(), &language, level);
            let matches = match tokio::time::timeout(limit, call).await {
                Ok(matches) => matches,
                Err(_) => {
                    warn!(
                        id = plan.id,
                        timeout_ms = limit.as_millis() as u64,
                        "grammar check timed out"
                    );
                    Vec::new()
                }
            };
            debug!(id = plan.id, count = matches.len(), "check returned");
            // The driver may be gone already; nothing left to update then.
            let _ = done.send((plan.id, matches));
        });
    }

    fn emit(&self, event: OverlayEvent) {
        let _ = self.events.send(event);
    }
}
