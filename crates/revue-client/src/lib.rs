//! Remote checking layer: the [`Annotator`] seam and its LanguageTool client.

use std::time::Duration;

use async_trait::async_trait;
use revue_core::{CheckLevel, Match};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{CheckError, LanguageToolClient};

/// Public LanguageTool endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.languagetool.org/v2/check";

/// Input cap enforced by the service. Longer text is cut, not retried.
pub const MAX_TEXT_CHARS: usize = 20_000;

/// How long a single check request may take before it is abandoned.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A remote service that flags problems in a batch of text.
///
/// Implementations fail soft: transport or service errors are logged and
/// reported as an empty result, never raised to the caller.
#[async_trait]
pub trait Annotator: Send + Sync {
    /// Check `text` and return matches with character offsets relative to it.
    async fn check(&self, text: &str, language: &str, level: CheckLevel) -> Vec<Match>;
}
