use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;

use super::types::{ChatError, Provider};

/// Reply substituted when a backend answers successfully but says nothing.
pub const NO_RESPONSE_TEXT: &str = "No response received.";

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM providers.  Each provider takes a free-form query and
/// returns the normalized reply text.
pub trait LlmProvider: Send + Sync {
    /// Send a query to the LLM and return the response text.
    ///
    /// Exactly one outbound request is made per call. An empty or missing
    /// reply comes back as [`NO_RESPONSE_TEXT`], not as an error.
    fn ask<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ChatError>> + Send + 'a>>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Substitute the fallback text for a missing or blank reply.
pub fn normalize_reply(reply: Option<String>) -> String {
    match reply {
        Some(text) if !text.trim().is_empty() => text,
        _ => NO_RESPONSE_TEXT.to_string(),
    }
}

async fn check_status(provider: &str, resp: reqwest::Response) -> Result<reqwest::Response, ChatError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    Err(ChatError::ProviderError(format!(
        "{provider} returned {status}: {text}"
    )))
}

// ---------------------------------------------------------------------------
// Gemini provider
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GeminiProvider {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiRequestPart>,
}

#[derive(Serialize)]
struct GeminiRequestPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// Text of the first candidate, all text parts joined.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let joined: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(joined)
    }
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ChatError> {
        if !config.is_configured() {
            return Err(ChatError::MissingApiKey("gemini".to_string()));
        }
        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }
}

impl LlmProvider for GeminiProvider {
    fn ask<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ChatError>> + Send + 'a>> {
        Box::pin(async move {
            let body = GeminiRequest {
                contents: vec![GeminiContent {
                    role: "user",
                    parts: vec![GeminiRequestPart {
                        text: query.to_string(),
                    }],
                }],
            };

            let resp = self
                .client
                .post(self.url())
                .header("Content-Type", "application/json")
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

            let parsed: GeminiResponse = check_status("gemini", resp)
                .await?
                .json()
                .await
                .map_err(|e| ChatError::ParseError(e.to_string()))?;

            Ok(normalize_reply(parsed.text()))
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ---------------------------------------------------------------------------
// Perplexity provider (OpenAI-style chat completions)
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PerplexityProvider {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct PerplexityRequest {
    model: String,
    messages: Vec<PerplexityMessage>,
}

#[derive(Serialize)]
struct PerplexityMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct PerplexityResponse {
    #[serde(default)]
    choices: Vec<PerplexityChoice>,
}

#[derive(Deserialize)]
struct PerplexityChoice {
    #[serde(default)]
    message: Option<PerplexityReply>,
}

#[derive(Deserialize)]
struct PerplexityReply {
    #[serde(default)]
    content: Option<String>,
}

impl PerplexityResponse {
    fn text(self) -> Option<String> {
        self.choices.into_iter().next()?.message?.content
    }
}

impl PerplexityProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ChatError> {
        if !config.is_configured() {
            return Err(ChatError::MissingApiKey("perplexity".to_string()));
        }
        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            client: reqwest::Client::new(),
        })
    }
}

impl LlmProvider for PerplexityProvider {
    fn ask<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ChatError>> + Send + 'a>> {
        Box::pin(async move {
            let body = PerplexityRequest {
                model: self.model.clone(),
                messages: vec![PerplexityMessage {
                    role: "user",
                    content: query.to_string(),
                }],
            };

            let resp = self
                .client
                .post(&self.endpoint)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

            let parsed: PerplexityResponse = check_status("perplexity", resp)
                .await?
                .json()
                .await
                .map_err(|e| ChatError::ParseError(e.to_string()))?;

            Ok(normalize_reply(parsed.text()))
        })
    }

    fn name(&self) -> &str {
        "perplexity"
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create the adapter for a provider from its config.
pub fn create_provider(
    provider: Provider,
    config: &ProviderConfig,
) -> Result<Box<dyn LlmProvider>, ChatError> {
    match provider {
        Provider::Gemini => Ok(Box::new(GeminiProvider::new(config)?)),
        Provider::Perplexity => Ok(Box::new(PerplexityProvider::new(config)?)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(key: &str, model: &str, endpoint: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: key.to_string(),
            model: model.to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    #[test]
    fn gemini_rejects_empty_key() {
        let result = GeminiProvider::new(&cfg("", "gemini-2.5-flash", "https://x"));
        assert!(matches!(result.unwrap_err(), ChatError::MissingApiKey(_)));
    }

    #[test]
    fn perplexity_rejects_empty_key() {
        assert!(PerplexityProvider::new(&cfg("", "sonar-pro", "https://x")).is_err());
    }

    #[test]
    fn gemini_url_joins_model_and_action() {
        let p = GeminiProvider::new(&cfg(
            "gem-test",
            "gemini-2.5-flash",
            "https://generativelanguage.googleapis.com/v1beta/models/",
        ))
        .unwrap();
        assert_eq!(
            p.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn factory_creates_each_provider() {
        for provider in Provider::ALL {
            let p = create_provider(provider, &cfg("key", "model", "https://x")).unwrap();
            assert_eq!(p.name(), provider.as_str());
        }
    }

    #[test]
    fn normalize_reply_substitutes_fallback() {
        assert_eq!(normalize_reply(None), NO_RESPONSE_TEXT);
        assert_eq!(normalize_reply(Some(String::new())), NO_RESPONSE_TEXT);
        assert_eq!(normalize_reply(Some("  \n".into())), NO_RESPONSE_TEXT);
        assert_eq!(normalize_reply(Some("hi".into())), "hi");
    }

    #[test]
    fn gemini_response_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}],"role":"model"}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Hello, world"));
    }

    #[test]
    fn gemini_response_without_candidates_is_empty() {
        let parsed: GeminiResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert_eq!(parsed.text(), None);
    }

    #[test]
    fn perplexity_response_reads_first_choice() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Sure."}}]}"#;
        let parsed: PerplexityResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Sure."));
    }

    #[test]
    fn perplexity_response_with_no_choices_is_empty() {
        let parsed: PerplexityResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(parsed.text(), None);
    }
}
