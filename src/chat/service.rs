use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use serde::Serialize;
use tracing::{info, warn};

use super::registry::AdapterRegistry;
use super::session::{PendingQuery, Session, Submission};
use super::types::{AdapterFailure, ChatError, Message, Provider};

// ---------------------------------------------------------------------------
// Submission results
// ---------------------------------------------------------------------------

/// How a submission was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitOutcome {
    /// Blank input.
    Ignored,
    /// Answered locally with a system message.
    Replied,
    /// Sent to a provider; user and assistant messages were appended.
    Answered,
}

/// Messages appended by one submission.
#[derive(Debug, Clone)]
pub struct SubmitResult {
    pub outcome: SubmitOutcome,
    pub messages: Vec<Message>,
}

// ---------------------------------------------------------------------------
// ChatService
// ---------------------------------------------------------------------------

/// Owns every live session and routes their queries through the registry.
pub struct ChatService {
    registry: AdapterRegistry,
    sessions: RwLock<HashMap<String, Session>>,
}

impl ChatService {
    /// Create a new `ChatService`.
    pub fn new(registry: AdapterRegistry) -> Arc<Self> {
        Arc::new(Self {
            registry,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Session management
    // -----------------------------------------------------------------------

    /// Create an empty session and return a snapshot of it.
    pub async fn create_session(&self) -> Session {
        let session = Session::new(uuid::Uuid::new_v4().to_string());
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        info!(session_id = %session.id, "session created");
        session
    }

    /// Snapshot of a session.
    pub async fn get_session(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Snapshots of every session, newest first.
    pub async fn list_sessions(&self) -> Vec<Session> {
        let mut all: Vec<Session> = self.sessions.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Drop a session. Returns whether it existed.
    pub async fn delete_session(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(session_id = id, "session deleted");
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// First half of a submission: apply `raw` to the session under the lock.
    ///
    /// A busy session is reported as [`ChatError::SessionBusy`].
    pub async fn begin(&self, id: &str, raw: &str) -> Result<Submission, ChatError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))?;
        match session.submit(raw) {
            Submission::Busy => Err(ChatError::SessionBusy(id.to_string())),
            other => Ok(other),
        }
    }

    /// Second half: call the backend without holding the lock, then record
    /// the reply.
    pub async fn complete(&self, id: &str, pending: PendingQuery) -> Result<Message, ChatError> {
        let outcome = self.registry.query(pending.provider, &pending.prompt).await;

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) => Ok(session.resolve(pending, outcome)),
            None => {
                warn!(session_id = id, "session dropped while a query was in flight");
                Err(ChatError::SessionNotFound(id.to_string()))
            }
        }
    }

    /// Stateless one-shot query, bypassing sessions.
    pub async fn ask(&self, provider: Provider, query: &str) -> Result<String, AdapterFailure> {
        self.registry.query(provider, query).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
