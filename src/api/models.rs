use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::{Message, Provider, Session, SubmitOutcome};

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub input: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Body of `POST /api/gemini-chat`.
#[derive(Debug, Default, Deserialize)]
pub struct GeminiChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Body of `POST /api/perplexity-chat`.
#[derive(Debug, Default, Deserialize)]
pub struct PerplexityChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub uptime: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub name: Provider,
    pub display_name: String,
    pub configured: bool,
}

/// Full view of a session, log included.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub state: String,
    pub started: bool,
    pub active_provider: Option<Provider>,
    pub sending: bool,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        SessionResponse {
            id: session.id.clone(),
            state: session.state().as_str().to_string(),
            started: session.started(),
            active_provider: session.active_provider(),
            sending: session.is_sending(),
            messages: session.messages().to_vec(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// List entry; the log itself is left out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub state: String,
    pub active_provider: Option<Provider>,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        SessionSummary {
            id: session.id.clone(),
            state: session.state().as_str().to_string(),
            active_provider: session.active_provider(),
            message_count: session.messages().len(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub outcome: SubmitOutcome,
    pub messages: Vec<Message>,
    pub session: SessionResponse,
}

#[derive(Debug, Serialize)]
pub struct GeminiChatResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PerplexityChatResponse {
    pub reply: String,
}
