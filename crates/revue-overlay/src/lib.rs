//! Grammar-check overlay for a block-structured editor.
//!
//! Tracks which paragraphs were edited, sends them to a grammar service on
//! a debounced, rate-limited schedule, and keeps the returned findings as
//! decorations that follow the text through later edits.

pub mod config;
pub mod debounce;
pub mod driver;
pub mod overlay;
pub mod reconcile;
pub mod scheduler;
pub mod tracker;

pub use config::{ConfigError, EnabledFlag, OverlayConfig};
pub use debounce::Debounce;
pub use driver::{OverlayClosed, OverlayEvent, OverlayHandle, spawn_overlay};
pub use overlay::{Overlay, Phase, ScreenPoint, Suggestion};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use scheduler::{CheckMode, CheckPlan, Scheduler, Skip};
pub use tracker::ModificationTracker;
