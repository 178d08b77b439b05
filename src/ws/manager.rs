//! Tracks which WebSocket clients watch which session and fans events out
//! to them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use super::messages::WsEvent;

/// Sending half of a client's event queue; the socket task owns the other.
pub type ClientSender = mpsc::UnboundedSender<WsEvent>;

/// A unique ID assigned to each connected WebSocket client.
pub type ClientId = u64;

#[derive(Debug)]
pub struct WsManager {
    /// session_id → { client_id → sender }
    subs: RwLock<HashMap<String, HashMap<ClientId, ClientSender>>>,
    next_id: AtomicU64,
}

impl WsManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a client for a session, returning (client_id, receiver).
    pub async fn subscribe(&self, session_id: &str) -> (ClientId, mpsc::UnboundedReceiver<WsEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        self.subs
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .insert(id, tx);

        debug!(session_id, client_id = id, "WS client subscribed");
        (id, rx)
    }

    pub async fn unsubscribe(&self, session_id: &str, client_id: ClientId) {
        let mut subs = self.subs.write().await;
        if let Some(clients) = subs.get_mut(session_id) {
            clients.remove(&client_id);
            if clients.is_empty() {
                subs.remove(session_id);
            }
        }
        debug!(session_id, client_id, "WS client unsubscribed");
    }

    /// Send `event` to every client of `session_id`, dropping clients whose
    /// receiver is gone.
    pub async fn broadcast(&self, session_id: &str, event: WsEvent) {
        let stale: Vec<ClientId> = {
            let subs = self.subs.read().await;
            let Some(clients) = subs.get(session_id) else {
                return;
            };
            clients
                .iter()
                .filter(|(_, tx)| tx.send(event.clone()).is_err())
                .map(|(&cid, _)| cid)
                .collect()
        };

        if stale.is_empty() {
            return;
        }
        let mut subs = self.subs.write().await;
        if let Some(clients) = subs.get_mut(session_id) {
            for cid in &stale {
                clients.remove(cid);
                warn!(session_id, client_id = cid, "removed stale WS client");
            }
            if clients.is_empty() {
                subs.remove(session_id);
            }
        }
    }

    /// Send `event` to a single client. Returns false if it is gone.
    pub async fn send_to(&self, session_id: &str, client_id: ClientId, event: WsEvent) -> bool {
        let subs = self.subs.read().await;
        subs.get(session_id)
            .and_then(|clients| clients.get(&client_id))
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    /// Drop every client of a session; their sockets close once the queue
    /// drains.
    pub async fn close_session(&self, session_id: &str) {
        if let Some(clients) = self.subs.write().await.remove(session_id) {
            debug!(session_id, clients = clients.len(), "closed WS clients for session");
        }
    }

    /// Number of subscribers for a session.
    pub async fn subscriber_count(&self, session_id: &str) -> usize {
        let subs = self.subs.read().await;
        subs.get(session_id).map_or(0, |c| c.len())
    }

    /// Total number of active connections across all sessions.
    pub async fn total_connections(&self) -> usize {
        let subs = self.subs.read().await;
        subs.values().map(|c| c.len()).sum()
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self {
            subs: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
