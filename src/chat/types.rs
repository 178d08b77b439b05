use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// A selectable language-model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    Perplexity,
}

impl Provider {
    /// Every supported provider, in display order.
    pub const ALL: [Provider; 2] = [Provider::Gemini, Provider::Perplexity];

    /// Canonical lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Perplexity => "perplexity",
        }
    }

    /// Human-facing name used in system messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Perplexity => "Perplexity",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.trim().to_ascii_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == canonical)
            .ok_or_else(|| ChatError::UnsupportedProvider(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Message log
// ---------------------------------------------------------------------------

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single entry in a session's log. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub provider: Option<Provider>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur in the chat / LLM subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("no API key configured for provider: {0}")]
    MissingApiKey(String),

    #[error("query text is empty")]
    EmptyQuery,

    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    #[error("failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session {0} already has a query in flight")]
    SessionBusy(String),
}

/// The only failure the adapter registry reports to its callers. Provider
/// specifics stay in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("provider request failed")]
pub struct AdapterFailure;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("GeMiNi".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!(" PERPLEXITY ".parse::<Provider>().unwrap(), Provider::Perplexity);
    }

    #[test]
    fn provider_rejects_unknown() {
        let err = "bogus".parse::<Provider>().unwrap_err();
        assert!(matches!(err, ChatError::UnsupportedProvider(ref s) if s == "bogus"));
    }

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Provider::Perplexity).unwrap(), "perplexity");
        assert_eq!(Provider::Gemini.to_string(), "gemini");
        assert_eq!(Provider::Gemini.display_name(), "Gemini");
    }

    #[test]
    fn message_serializes_camel_case_and_skips_missing_prompt() {
        let msg = Message {
            id: 3,
            role: Role::System,
            provider: None,
            content: "hi".into(),
            prompt: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["role"], "system");
        assert!(json["provider"].is_null());
        assert!(json.get("prompt").is_none());
    }
}
