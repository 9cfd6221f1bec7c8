//! HTTP client for a LanguageTool `/v2/check` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use revue_core::{CheckLevel, Match, Severity};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Annotator, DEFAULT_REQUEST_TIMEOUT, MAX_TEXT_CHARS};

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client for LanguageTool's form-encoded check endpoint.
pub struct LanguageToolClient {
    client: reqwest::Client,
    endpoint: String,
    max_chars: usize,
}

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMatch {
    #[serde(default)]
    message: String,
    #[serde(default)]
    short_message: Option<String>,
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<WireReplacement>,
    #[serde(default)]
    rule: WireRule,
}

#[derive(Deserialize)]
struct WireReplacement {
    value: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WireRule {
    #[serde(default)]
    id: String,
    #[serde(default)]
    issue_type: Option<String>,
}

impl WireMatch {
    /// LanguageTool counts offsets in UTF-16 code units; convert them to
    /// character offsets within `text`. Matches reaching past the end of
    /// `text` (`text_units` code units long) are dropped.
    fn into_match(self, text: &str, text_units: usize) -> Option<Match> {
        let end_units = self.offset.checked_add(self.length)?;
        if end_units > text_units {
            return None;
        }
        let start = utf16_to_char_offset(text, self.offset);
        let end = utf16_to_char_offset(text, end_units);
        Some(Match {
            offset: start,
            length: end.saturating_sub(start),
            severity: Severity::from_issue_type(self.rule.issue_type.as_deref()),
            message: self.message,
            short_message: self.short_message,
            replacements: self.replacements.into_iter().map(|r| r.value).collect(),
            rule_id: self.rule.id,
        })
    }
}

impl LanguageToolClient {
    /// Create a client posting to `endpoint`, e.g.
    /// `https://api.languagetool.org/v2/check`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_REQUEST_TIMEOUT),
            endpoint: endpoint.into(),
            max_chars: MAX_TEXT_CHARS,
        }
    }

    /// Give up on a request after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Override the submitted-text cap.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check `text`, surfacing every failure.
    ///
    /// Text beyond the character cap is dropped from the request. The
    /// `level` field is only sent when it differs from the service default.
    pub async fn try_check(
        &self,
        text: &str,
        language: &str,
        level: CheckLevel,
    ) -> Result<Vec<Match>, CheckError> {
        let text = truncate_chars(text, self.max_chars);
        let mut form = vec![("text", text), ("language", language)];
        if level != CheckLevel::Default {
            form.push(("level", level.as_str()));
        }

        debug!(endpoint = %self.endpoint, chars = text.chars().count(), "posting grammar check");
        let resp = self.client.post(&self.endpoint).form(&form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CheckError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let parsed: CheckResponse = serde_json::from_str(&body)?;
        debug!(count = parsed.matches.len(), "grammar check returned");
        let text_units = text.encode_utf16().count();
        let returned = parsed.matches.len();
        let matches: Vec<Match> = parsed
            .matches
            .into_iter()
            .filter_map(|m| m.into_match(text, text_units))
            .collect();
        if matches.len() < returned {
            warn!(
                dropped = returned - matches.len(),
                "grammar check returned matches outside the submitted text"
            );
        }
        Ok(matches)
    }
}

#[async_trait]
impl Annotator for LanguageToolClient {
    async fn check(&self, text: &str, language: &str, level: CheckLevel) -> Vec<Match> {
        match self.try_check(text, language, level).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, endpoint = %self.endpoint, "LanguageTool check failed");
                Vec::new()
            }
        }
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to configure HTTP client, using defaults");
            reqwest::Client::new()
        })
}

/// The first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

fn utf16_to_char_offset(text: &str, units: usize) -> usize {
    let mut seen = 0;
    for (index, c) in text.chars().enumerate() {
        if seen >= units {
            return index;
        }
        seen += c.len_utf16();
    }
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Form, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/v2/check")
    }

    async fn recording_server(reply: serde_json::Value) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let router = Router::new()
            .route(
                "/v2/check",
                post(
                    move |State(seen): State<Seen>, Form(form): Form<HashMap<String, String>>| {
                        let reply = reply.clone();
                        async move {
                            seen.lock().unwrap().push(form);
                            Json(reply)
                        }
                    },
                ),
            )
            .with_state(seen.clone());
        (serve(router).await, seen)
    }

    async fn failing_server(status: StatusCode, body: &'static str) -> String {
        let router = Router::new().route(
            "/v2/check",
            post(move || async move { (status, body).into_response() }),
        );
        serve(router).await
    }

    #[tokio::test]
    async fn parses_matches() {
        let (url, seen) = recording_server(json!({
            "matches": [{
                "message": "Possible spelling mistake found.",
                "shortMessage": "Spelling mistake",
                "offset": 6,
                "length": 5,
                "replacements": [{"value": "world"}, {"value": "wold"}],
                "rule": {"id": "MORFOLOGIK_RULE_EN_US", "issueType": "misspelling"}
            }, {
                "message": "Use a comma.",
                "offset": 13,
                "length": 6,
                "replacements": [],
                "rule": {"id": "COMMA_RULE", "issueType": "grammar"}
            }]
        }))
        .await;

        let client = LanguageToolClient::new(url);
        let matches = client
            .try_check("Hello wrold\n\nSecond line", "en-US", CheckLevel::Picky)
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].offset, 6);
        assert_eq!(matches[0].length, 5);
        assert_eq!(matches[0].severity, Severity::Misspelling);
        assert_eq!(matches[0].replacements, vec!["world", "wold"]);
        assert_eq!(matches[0].tooltip(), "Spelling mistake");
        assert_eq!(matches[1].severity, Severity::Grammar);
        assert_eq!(matches[1].rule_id, "COMMA_RULE");

        let forms = seen.lock().unwrap();
        assert_eq!(forms[0]["language"], "en-US");
        assert_eq!(forms[0]["level"], "picky");
        assert_eq!(forms[0]["text"], "Hello wrold\n\nSecond line");
    }

    #[tokio::test]
    async fn default_level_is_not_sent() {
        let (url, seen) = recording_server(json!({"matches": []})).await;
        let client = LanguageToolClient::new(url);
        client
            .try_check("Bonjour", "fr", CheckLevel::Default)
            .await
            .unwrap();
        assert!(!seen.lock().unwrap()[0].contains_key("level"));
    }

    #[tokio::test]
    async fn text_is_capped_at_limit() {
        let (url, seen) = recording_server(json!({"matches": []})).await;
        let client = LanguageToolClient::new(url);
        let long = "é".repeat(MAX_TEXT_CHARS + 500);
        client.check(&long, "fr", CheckLevel::Picky).await;
        let forms = seen.lock().unwrap();
        assert_eq!(forms[0]["text"].chars().count(), MAX_TEXT_CHARS);
    }

    #[tokio::test]
    async fn utf16_offsets_become_char_offsets() {
        // The emoji is two UTF-16 units but one character.
        let (url, _) = recording_server(json!({
            "matches": [{
                "message": "Typo",
                "offset": 3,
                "length": 4,
                "rule": {"id": "TYPO"}
            }]
        }))
        .await;
        let client = LanguageToolClient::new(url);
        let matches = client
            .try_check("😀 Helo there", "en-US", CheckLevel::Picky)
            .await
            .unwrap();
        assert_eq!(matches[0].offset, 2);
        assert_eq!(matches[0].length, 4);
        assert_eq!(matches[0].severity, Severity::Misspelling);
    }

    #[tokio::test]
    async fn out_of_range_offsets_are_dropped() {
        let (url, _) = recording_server(json!({
            "matches": [{
                "message": "Bogus",
                "offset": u64::MAX,
                "length": 5,
                "rule": {"id": "BOGUS"}
            }, {
                "message": "Too long",
                "offset": 2,
                "length": 40,
                "rule": {"id": "LONG"}
            }, {
                "message": "Typo",
                "offset": 0,
                "length": 4,
                "rule": {"id": "TYPO"}
            }]
        }))
        .await;
        let client = LanguageToolClient::new(url);
        let matches = client.check("Helo there", "en-US", CheckLevel::Picky).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].rule_id, "TYPO");
    }

    #[tokio::test]
    async fn server_error_is_reported_and_absorbed() {
        let url = failing_server(StatusCode::TOO_MANY_REQUESTS, "slow down").await;
        let client = LanguageToolClient::new(url);
        match client.try_check("text", "fr", CheckLevel::Picky).await {
            Err(CheckError::Server { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("expected server error, got {other:?}"),
        }
        assert!(client.check("text", "fr", CheckLevel::Picky).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_absorbed() {
        let url = failing_server(StatusCode::OK, "not json").await;
        let client = LanguageToolClient::new(url);
        assert!(matches!(
            client.try_check("text", "fr", CheckLevel::Picky).await,
            Err(CheckError::Json(_))
        ));
        assert!(client.check("text", "fr", CheckLevel::Picky).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_absorbed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = LanguageToolClient::new(format!("http://{addr}/v2/check"));
        assert!(client.check("text", "fr", CheckLevel::Picky).await.is_empty());
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let router = Router::new().route(
            "/v2/check",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"matches": []}))
            }),
        );
        let url = serve(router).await;
        let client = LanguageToolClient::new(url).with_timeout(Duration::from_millis(100));
        match client.try_check("text", "fr", CheckLevel::Picky).await {
            Err(CheckError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("brûlant", 3), "brû");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
