//! Findings returned by the grammar checker and the payload attached to
//! each rendered decoration.

use serde::{Deserialize, Serialize};

/// Maximum number of replacement suggestions kept per finding.
pub const MAX_REPLACEMENTS: usize = 5;

/// Fallback tooltip when the service gives no message at all.
pub const FALLBACK_TOOLTIP: &str = "Problème détecté";

/// Finding category, used to pick the underline style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Misspelling,
    Grammar,
    Other,
}

impl Severity {
    /// Classify a LanguageTool `issueType`. A missing type counts as a misspelling.
    pub fn from_issue_type(issue_type: Option<&str>) -> Self {
        match issue_type {
            None | Some("misspelling") => Self::Misspelling,
            Some("grammar") => Self::Grammar,
            Some(_) => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Misspelling => "misspelling",
            Self::Grammar => "grammar",
            Self::Other => "other",
        }
    }

    /// Style class of the underline. Everything that is not a misspelling
    /// renders as a grammar issue.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Misspelling => "lt-spelling",
            Self::Grammar | Self::Other => "lt-grammar",
        }
    }
}

/// Strictness requested from the checker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckLevel {
    Default,
    #[default]
    Picky,
}

impl CheckLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Picky => "picky",
        }
    }
}

impl std::str::FromStr for CheckLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "picky" => Ok(Self::Picky),
            other => Err(format!("unknown check level: {other}")),
        }
    }
}

/// One finding, with offsets relative to the submitted batch text.
///
/// Offsets and lengths are counted in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub offset: usize,
    pub length: usize,
    pub message: String,
    pub short_message: Option<String>,
    pub severity: Severity,
    pub replacements: Vec<String>,
    pub rule_id: String,
}

impl Match {
    /// Short message when present, else the full message, else a fallback.
    pub fn tooltip(&self) -> &str {
        match self.short_message.as_deref() {
            Some(short) if !short.is_empty() => short,
            _ if !self.message.is_empty() => &self.message,
            _ => FALLBACK_TOOLTIP,
        }
    }

    pub fn payload(&self) -> DecorationPayload {
        DecorationPayload {
            message: self.message.clone(),
            replacements: self
                .replacements
                .iter()
                .take(MAX_REPLACEMENTS)
                .cloned()
                .collect(),
            rule_id: self.rule_id.clone(),
        }
    }
}

/// Data carried by a decoration and handed to the suggestion popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationPayload {
    pub message: String,
    pub replacements: Vec<String>,
    pub rule_id: String,
}

impl DecorationPayload {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding() -> Match {
        Match {
            offset: 6,
            length: 5,
            message: "Possible spelling mistake found.".into(),
            short_message: Some("Spelling mistake".into()),
            severity: Severity::Misspelling,
            replacements: ["world", "wold", "word", "would", "wild", "weld"]
                .map(String::from)
                .to_vec(),
            rule_id: "MORFOLOGIK_RULE_EN_US".into(),
        }
    }

    #[test]
    fn issue_type_classification() {
        assert_eq!(Severity::from_issue_type(None), Severity::Misspelling);
        assert_eq!(
            Severity::from_issue_type(Some("misspelling")),
            Severity::Misspelling
        );
        assert_eq!(Severity::from_issue_type(Some("grammar")), Severity::Grammar);
        assert_eq!(Severity::from_issue_type(Some("style")), Severity::Other);
        assert_eq!(Severity::Other.class_name(), "lt-grammar");
    }

    #[test]
    fn tooltip_prefers_short_message() {
        let mut m = finding();
        assert_eq!(m.tooltip(), "Spelling mistake");
        m.short_message = Some(String::new());
        assert_eq!(m.tooltip(), "Possible spelling mistake found.");
        m.message.clear();
        assert_eq!(m.tooltip(), "Problème détecté");
    }

    #[test]
    fn payload_caps_replacements() {
        let payload = finding().payload();
        assert_eq!(payload.replacements.len(), MAX_REPLACEMENTS);
        assert_eq!(payload.replacements[0], "world");
        assert!(!payload.replacements.contains(&"weld".to_string()));
    }

    #[test]
    fn payload_uses_camel_case_rule_id() {
        let json = finding().payload().to_json().unwrap();
        assert!(json.contains("\"ruleId\":\"MORFOLOGIK_RULE_EN_US\""));
        let back = DecorationPayload::from_json(&json).unwrap();
        assert_eq!(back.rule_id, "MORFOLOGIK_RULE_EN_US");
    }

    #[test]
    fn check_level_parses() {
        assert_eq!("picky".parse::<CheckLevel>(), Ok(CheckLevel::Picky));
        assert_eq!(CheckLevel::default(), CheckLevel::Picky);
        assert!("strict".parse::<CheckLevel>().is_err());
    }
}
