use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::info;

use crate::chat::{FAILURE_TEXT, Provider};

use super::errors::ApiError;
use super::models::*;
use super::state::SharedState;

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "ai-chat-playground".to_string(),
        uptime,
    })
}

// =========================================================================
// Providers
// =========================================================================

/// GET /api/providers
pub async fn list_providers(State(state): State<SharedState>) -> Json<Vec<ProviderInfo>> {
    let registry = state.chat.registry();
    Json(
        Provider::ALL
            .into_iter()
            .map(|p| ProviderInfo {
                name: p,
                display_name: p.display_name().to_string(),
                configured: registry.is_configured(p),
            })
            .collect(),
    )
}

// =========================================================================
// Sessions
// =========================================================================

/// POST /api/sessions
pub async fn create_session(
    State(state): State<SharedState>,
) -> (StatusCode, Json<SessionResponse>) {
    let session = state.chat.create_session().await;
    (StatusCode::CREATED, Json(SessionResponse::from(&session)))
}

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<SharedState>,
    Query(query): Query<ListSessionsQuery>,
) -> Json<ListSessionsResponse> {
    let limit = query.limit.unwrap_or(10).min(100);
    let offset = query.offset.unwrap_or(0);

    let all = state.chat.list_sessions().await;
    let total = all.len();
    let page = all
        .iter()
        .skip(offset)
        .take(limit)
        .map(SessionSummary::from)
        .collect();

    Json(ListSessionsResponse {
        sessions: page,
        total,
        limit,
        offset,
    })
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    Ok(Json(state.snapshot(&id).await?))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !state.chat.delete_session(&id).await {
        return Err(ApiError::SessionNotFound(id));
    }
    state.ws.close_session(&id).await;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Session deleted".to_string(),
    }))
}

// =========================================================================
// Messages
// =========================================================================

/// GET /api/sessions/{id}/messages
pub async fn get_messages(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let session = state
        .chat
        .get_session(&id)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    Ok(Json(MessagesResponse {
        session_id: id,
        messages: session.messages().to_vec(),
    }))
}

/// POST /api/sessions/{id}/messages
pub async fn submit(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let result = state.submit(&id, &input.input).await?;
    let session = state.snapshot(&id).await?;
    Ok(Json(SubmitResponse {
        outcome: result.outcome,
        messages: result.messages,
        session,
    }))
}

// =========================================================================
// Direct provider endpoints
// =========================================================================

/// POST /api/gemini-chat
pub async fn gemini_chat(
    State(state): State<SharedState>,
    Json(input): Json<GeminiChatRequest>,
) -> Result<Json<GeminiChatResponse>, ApiError> {
    let prompt = required(input.prompt, "Prompt is required")?;
    let text = ask(&state, Provider::Gemini, &prompt).await?;
    Ok(Json(GeminiChatResponse { text }))
}

/// POST /api/perplexity-chat
pub async fn perplexity_chat(
    State(state): State<SharedState>,
    Json(input): Json<PerplexityChatRequest>,
) -> Result<Json<PerplexityChatResponse>, ApiError> {
    let message = required(input.message, "Message is required")?;
    let reply = ask(&state, Provider::Perplexity, &message).await?;
    Ok(Json(PerplexityChatResponse { reply }))
}

// =========================================================================
// Helpers
// =========================================================================

fn required(field: Option<String>, message: &str) -> Result<String, ApiError> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidRequest(message.to_string()))
}

async fn ask(state: &SharedState, provider: Provider, query: &str) -> Result<String, ApiError> {
    info!(provider = %provider, "direct query");
    state
        .chat
        .ask(provider, query)
        .await
        .map_err(|_| ApiError::ProviderFailure(FAILURE_TEXT.to_string()))
}

// =========================================================================
// Tests
// =========================================================================
