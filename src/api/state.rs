use std::sync::Arc;

use tracing::error;

use crate::chat::{AdapterRegistry, ChatService, Submission, SubmitOutcome, SubmitResult};
use crate::config::AppConfig;
use crate::ws::{WsEvent, WsManager};

use super::errors::ApiError;
use super::models::SessionResponse;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub ws: Arc<WsManager>,
    pub config: AppConfig,
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build state with adapters for every provider `config` has keys for.
    pub fn new(config: AppConfig) -> SharedState {
        let registry = AdapterRegistry::from_config(&config);
        Self::with_registry(config, registry)
    }

    /// Build state around an explicit registry.
    pub fn with_registry(config: AppConfig, registry: AdapterRegistry) -> SharedState {
        Arc::new(AppState {
            chat: ChatService::new(registry),
            ws: WsManager::new(),
            config,
            start_time: std::time::Instant::now(),
        })
    }

    /// Submit input to a session and push every resulting change to its
    /// WebSocket subscribers as it happens.
    ///
    /// A dispatched query runs on its own task, so dropping the caller
    /// cannot leave the session stuck in `sending`.
    pub async fn submit(
        self: &Arc<Self>,
        session_id: &str,
        raw: &str,
    ) -> Result<SubmitResult, ApiError> {
        match self.chat.begin(session_id, raw).await? {
            Submission::Ignored | Submission::Busy => Ok(SubmitResult {
                outcome: SubmitOutcome::Ignored,
                messages: Vec::new(),
            }),
            Submission::Replied(msg) => {
                self.ws
                    .broadcast(session_id, WsEvent::message_appended(session_id, &msg))
                    .await;
                Ok(SubmitResult {
                    outcome: SubmitOutcome::Replied,
                    messages: vec![msg],
                })
            }
            Submission::Dispatched { user, pending } => {
                let state = Arc::clone(self);
                let id = session_id.to_string();
                let appended = user.clone();
                let task = tokio::spawn(async move {
                    state
                        .ws
                        .broadcast(&id, WsEvent::message_appended(&id, &appended))
                        .await;
                    state
                        .ws
                        .broadcast(&id, WsEvent::sending_changed(&id, true))
                        .await;

                    let reply = state.chat.complete(&id, pending).await?;

                    state
                        .ws
                        .broadcast(&id, WsEvent::message_appended(&id, &reply))
                        .await;
                    state
                        .ws
                        .broadcast(&id, WsEvent::sending_changed(&id, false))
                        .await;
                    Ok::<_, ApiError>(reply)
                });

                let reply = task.await.map_err(|e| {
                    error!(session_id, "query task failed: {e}");
                    ApiError::InternalError("query task failed".to_string())
                })??;
                Ok(SubmitResult {
                    outcome: SubmitOutcome::Answered,
                    messages: vec![user, reply],
                })
            }
        }
    }

    /// Current snapshot of a session.
    pub async fn snapshot(&self, session_id: &str) -> Result<SessionResponse, ApiError> {
        self.chat
            .get_session(session_id)
            .await
            .map(|s| SessionResponse::from(&s))
            .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))
    }
}
