//! WebSocket upgrade handler — attaches a client to a session's live feed
//! and accepts input over the same socket.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::api::errors::ApiError;
use crate::api::state::SharedState;

use super::manager::ClientId;
use super::messages::{WsCommand, WsEvent};

/// GET /ws/sessions/{id} — upgrade to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, id, state))
}

async fn handle_socket(socket: WebSocket, session_id: String, state: SharedState) {
    let snapshot = match state.snapshot(&session_id).await {
        Ok(s) => s,
        Err(_) => {
            let (mut sink, _) = socket.split();
            let err = WsEvent::error(&format!("session not found: {session_id}"));
            let _ = sink.send(Message::Text(err.to_json().into())).await;
            let _ = sink.close().await;
            return;
        }
    };

    let (client_id, mut rx) = state.ws.subscribe(&session_id).await;
    let (mut sink, mut stream) = socket.split();

    if sink
        .send(Message::Text(WsEvent::subscribed(snapshot).to_json().into()))
        .await
        .is_err()
    {
        cleanup(&state, &session_id, client_id).await;
        return;
    }

    // Writer task: manager → socket.
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if sink
                .send(Message::Text(event.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Reader task: socket → session.
    let reader_state = state.clone();
    let reader_sid = session_id.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => {
                    handle_client_message(&reader_state, &reader_sid, client_id, &text).await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => { reader.abort(); }
        _ = &mut reader => { writer.abort(); }
    }

    cleanup(&state, &session_id, client_id).await;
}

async fn handle_client_message(
    state: &SharedState,
    session_id: &str,
    client_id: ClientId,
    text: &str,
) {
    let cmd = match serde_json::from_str::<WsCommand>(text) {
        Ok(c) => c,
        Err(e) => {
            debug!(session_id, "invalid WS command: {e}");
            state
                .ws
                .send_to(session_id, client_id, WsEvent::error("invalid command"))
                .await;
            return;
        }
    };

    match cmd {
        WsCommand::Ping => {
            state.ws.send_to(session_id, client_id, WsEvent::pong()).await;
        }
        WsCommand::Submit { input } => {
            // Run the query off the reader so pings still get answered
            // while a backend call is in flight.
            let state = state.clone();
            let session_id = session_id.to_string();
            tokio::spawn(async move {
                if let Err(e) = state.submit(&session_id, &input).await {
                    let text = match e {
                        ApiError::SessionBusy(_) => "session is still waiting for a reply".to_string(),
                        ApiError::SessionNotFound(_) => "session not found".to_string(),
                        _ => "request failed".to_string(),
                    };
                    state
                        .ws
                        .send_to(&session_id, client_id, WsEvent::error(&text))
                        .await;
                }
            });
        }
    }
}

async fn cleanup(state: &SharedState, session_id: &str, client_id: ClientId) {
    state.ws.unsubscribe(session_id, client_id).await;
    debug!(session_id, client_id, "WS session cleaned up");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify the handler function signature compiles as an Axum handler.
    #[tokio::test]
    async fn handler_type_check() {
        fn assert_handler<F, Fut, R>(_: F)
        where
            F: FnOnce(WebSocketUpgrade, Path<String>, State<SharedState>) -> Fut,
            Fut: std::future::Future<Output = R>,
            R: IntoResponse,
        {
        }
        assert_handler(ws_handler);
    }
}
