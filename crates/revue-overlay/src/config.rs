//! Overlay configuration and the host's enable switch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use revue_client::{DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT, MAX_TEXT_CHARS};
use revue_core::CheckLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for one overlay instance. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayConfig {
    pub endpoint: String,
    pub language: String,
    pub level: CheckLevel,
    /// Quiet period after the last edit before an incremental check fires.
    pub debounce_ms: u64,
    /// Paragraphs touched longer ago than this are not rechecked.
    pub modification_threshold_ms: u64,
    /// Minimum spacing between incremental remote calls.
    pub min_interval_ms: u64,
    /// A check still unanswered after this long counts as empty.
    pub request_timeout_ms: u64,
    pub max_chars: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            language: "fr".to_string(),
            level: CheckLevel::Picky,
            debounce_ms: 1_000,
            modification_threshold_ms: 60_000,
            min_interval_ms: 3_000,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            max_chars: MAX_TEXT_CHARS,
        }
    }
}

impl OverlayConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn modification_threshold(&self) -> Duration {
        Duration::from_millis(self.modification_threshold_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Shared switch the host flips to suspend checking globally.
#[derive(Debug, Clone)]
pub struct EnabledFlag(Arc<AtomicBool>);

impl EnabledFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }
}

impl Default for EnabledFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = OverlayConfig::default();
        assert_eq!(config.endpoint, "https://api.languagetool.org/v2/check");
        assert_eq!(config.level, CheckLevel::Picky);
        assert_eq!(config.debounce(), Duration::from_secs(1));
        assert_eq!(config.modification_threshold(), Duration::from_secs(60));
        assert_eq!(config.min_interval(), Duration::from_secs(3));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_chars, 20_000);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = OverlayConfig::from_json_str(
            r#"{"language": "en-GB", "level": "default", "debounceMs": 250, "requestTimeoutMs": 2500}"#,
        )
        .unwrap();
        assert_eq!(config.language, "en-GB");
        assert_eq!(config.level, CheckLevel::Default);
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.request_timeout(), Duration::from_millis(2_500));
        assert_eq!(config.min_interval_ms, 3_000);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"endpoint": "http://localhost:8010/v2/check"}}"#).unwrap();
        let config = OverlayConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.endpoint, "http://localhost:8010/v2/check");
        assert_eq!(config.language, "fr");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = OverlayConfig::from_json_file(Path::new("/nonexistent/revue.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn enabled_flag_is_shared() {
        let flag = EnabledFlag::default();
        let other = flag.clone();
        assert!(other.is_enabled());
        flag.set(false);
        assert!(!other.is_enabled());
    }
}
