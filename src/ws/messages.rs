//! WebSocket message types for live session updates.

use serde::{Deserialize, Serialize};

use crate::api::models::SessionResponse;
use crate::chat::Message;

// ---------------------------------------------------------------------------
// Server → Client events
// ---------------------------------------------------------------------------

/// Envelope sent from server to every subscribed WebSocket client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsEvent {
    /// Discriminator so clients can switch on event type.
    #[serde(rename = "type")]
    pub event_type: WsEventType,
    /// Event-specific payload.
    #[serde(flatten)]
    pub payload: WsPayload,
}

/// Event type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WsEventType {
    Subscribed,
    MessageAppended,
    SendingChanged,
    Error,
    Pong,
}

/// Event payload variants.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WsPayload {
    Subscribed(SubscribedPayload),
    MessageAppended(MessageAppendedPayload),
    SendingChanged(SendingChangedPayload),
    Error(ErrorPayload),
    Pong(PongPayload),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedPayload {
    pub session_id: String,
    pub session: SessionResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAppendedPayload {
    pub session_id: String,
    pub message: Message,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendingChangedPayload {
    pub session_id: String,
    pub sending: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PongPayload {
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Client → Server commands
// ---------------------------------------------------------------------------

/// Commands sent from client to server over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsCommand {
    Submit { input: String },
    Ping,
}

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

impl WsEvent {
    pub fn subscribed(session: SessionResponse) -> Self {
        WsEvent {
            event_type: WsEventType::Subscribed,
            payload: WsPayload::Subscribed(SubscribedPayload {
                session_id: session.id.clone(),
                session,
            }),
        }
    }

    pub fn message_appended(session_id: &str, message: &Message) -> Self {
        WsEvent {
            event_type: WsEventType::MessageAppended,
            payload: WsPayload::MessageAppended(MessageAppendedPayload {
                session_id: session_id.to_string(),
                message: message.clone(),
            }),
        }
    }

    pub fn sending_changed(session_id: &str, sending: bool) -> Self {
        WsEvent {
            event_type: WsEventType::SendingChanged,
            payload: WsPayload::SendingChanged(SendingChangedPayload {
                session_id: session_id.to_string(),
                sending,
            }),
        }
    }

    pub fn error(message: &str) -> Self {
        WsEvent {
            event_type: WsEventType::Error,
            payload: WsPayload::Error(ErrorPayload {
                message: message.to_string(),
            }),
        }
    }

    pub fn pong() -> Self {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        WsEvent {
            event_type: WsEventType::Pong,
            payload: WsPayload::Pong(PongPayload { timestamp: ts }),
        }
    }

    /// Serialize to a JSON string for the wire.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error"}"#.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Session;

    fn parse(evt: &WsEvent) -> serde_json::Value {
        serde_json::from_str(&evt.to_json()).unwrap()
    }

    #[test]
    fn subscribed_event_carries_snapshot() {
        let session = Session::new("s1");
        let json = parse(&WsEvent::subscribed(SessionResponse::from(&session)));
        assert_eq!(json["type"], "subscribed");
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["session"]["state"], "not_started");
    }

    #[test]
    fn message_appended_event() {
        let mut session = Session::new("s1");
        session.submit("start ai");
        let msg = &session.messages()[0];
        let json = parse(&WsEvent::message_appended("s1", msg));
        assert_eq!(json["type"], "message_appended");
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["message"]["role"], "system");
        assert_eq!(json["message"]["id"], 1);
    }

    #[test]
    fn sending_changed_event() {
        let json = parse(&WsEvent::sending_changed("s1", true));
        assert_eq!(json["type"], "sending_changed");
        assert_eq!(json["sending"], true);
    }

    #[test]
    fn error_and_pong_events() {
        let json = parse(&WsEvent::error("boom"));
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "boom");

        let json = parse(&WsEvent::pong());
        assert_eq!(json["type"], "pong");
        assert!(json["timestamp"].as_u64().unwrap() > 0);
    }

    #[test]
    fn commands_deserialize() {
        let cmd: WsCommand = serde_json::from_str(r#"{"type":"submit","input":"use gemini"}"#).unwrap();
        assert!(matches!(cmd, WsCommand::Submit { ref input } if input == "use gemini"));
        let cmd: WsCommand = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(cmd, WsCommand::Ping));
        assert!(serde_json::from_str::<WsCommand>(r#"{"type":"dance"}"#).is_err());
    }
}
