//! Per-conversation state machine.
//!
//! A [`Session`] moves through three states:
//!
//! - `NotStarted`: only `start ai` does anything.
//! - `Started`: a provider must be chosen with `use <provider>`.
//! - `Active(p)`: queries go to `p`; `use <provider>` switches at any time.
//!
//! Queries are split in two halves so the caller can release whatever lock
//! guards the session while the backend is being called: [`Session::submit`]
//! records the user message and hands back a [`PendingQuery`], and
//! [`Session::resolve`] records the reply. Between the two the session is
//! `sending` and rejects further input.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::command::Command;
use super::registry::AdapterRegistry;
use super::types::{AdapterFailure, Message, Provider, Role};

pub const START_CONFIRMATION: &str =
    r#"AI session started. Type "use gemini" or "use perplexity" to pick a provider."#;
pub const NOT_STARTED_NOTICE: &str = r#"Session not started. Type "start ai" to begin."#;
pub const SELECT_PROVIDER_NOTICE: &str =
    r#"Select a provider first: type "use gemini" or "use perplexity"."#;
pub const FAILURE_TEXT: &str = "Something went wrong talking to the API.";

/// Coarse view of where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "provider")]
pub enum SessionState {
    NotStarted,
    Started,
    Active(Provider),
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::NotStarted => "not_started",
            SessionState::Started => "started",
            SessionState::Active(_) => "active",
        }
    }
}

/// A query that has been recorded but not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub provider: Provider,
    pub prompt: String,
}

/// What a single call to [`Session::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Blank input; nothing happened.
    Ignored,
    /// A query is already in flight; nothing was appended.
    Busy,
    /// A system message was appended; no backend call is needed.
    Replied(Message),
    /// The user message was appended; the caller must run `pending` and
    /// pass the outcome to [`Session::resolve`].
    Dispatched { user: Message, pending: PendingQuery },
}

/// One conversation's state: start flag, active provider and message log.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    started: bool,
    active_provider: Option<Provider>,
    log: Vec<Message>,
    sending: bool,
    next_message_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            started: false,
            active_provider: None,
            log: Vec::new(),
            sending: false,
            next_message_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn active_provider(&self) -> Option<Provider> {
        self.active_provider
    }

    /// Whether a query is currently in flight.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// The message log, in display order.
    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    pub fn state(&self) -> SessionState {
        match (self.started, self.active_provider) {
            (false, _) => SessionState::NotStarted,
            (true, None) => SessionState::Started,
            (true, Some(p)) => SessionState::Active(p),
        }
    }

    /// Apply one line of raw input.
    pub fn submit(&mut self, raw: &str) -> Submission {
        if self.sending {
            debug!(session_id = %self.id, "input rejected while sending");
            return Submission::Busy;
        }

        let Some(command) = Command::parse(raw, self.started, self.active_provider) else {
            return Submission::Ignored;
        };

        match (self.state(), command) {
            (SessionState::NotStarted, Command::Start) => {
                self.started = true;
                debug!(session_id = %self.id, "session started");
                Submission::Replied(self.push_system(START_CONFIRMATION))
            }
            (SessionState::NotStarted, _) => {
                Submission::Replied(self.push_system(NOT_STARTED_NOTICE))
            }
            (_, Command::SelectProvider(provider)) => {
                self.active_provider = Some(provider);
                debug!(session_id = %self.id, provider = %provider, "provider selected");
                let text = format!("Switched to {}.", provider.display_name());
                Submission::Replied(self.push_system(&text))
            }
            (SessionState::Active(provider), Command::Query(prompt)) => {
                self.sending = true;
                let user = self.push(Role::User, Some(provider), prompt.clone(), Some(prompt.clone()));
                Submission::Dispatched {
                    user,
                    pending: PendingQuery { provider, prompt },
                }
            }
            // Started without a provider: queries and anything unrecognized
            // are dropped with a reminder.
            _ => Submission::Replied(self.push_system(SELECT_PROVIDER_NOTICE)),
        }
    }

    /// Record the outcome of a dispatched query and clear the in-flight flag.
    ///
    /// The reply is attributed to the provider the query was sent to, even
    /// if the active provider changed in the meantime.
    pub fn resolve(
        &mut self,
        pending: PendingQuery,
        outcome: Result<String, AdapterFailure>,
    ) -> Message {
        self.sending = false;
        let content = outcome.unwrap_or_else(|_| FAILURE_TEXT.to_string());
        self.push(
            Role::Assistant,
            Some(pending.provider),
            content,
            Some(pending.prompt),
        )
    }

    /// Submit `raw` and, when it is a query, run it to completion against
    /// `registry`. Returns every message appended.
    ///
    /// For a caller that owns the session outright. Shared sessions go
    /// through `ChatService::begin` and `ChatService::complete` so the lock
    /// is not held across the backend call.
    pub async fn converse(&mut self, raw: &str, registry: &AdapterRegistry) -> Vec<Message> {
        match self.submit(raw) {
            Submission::Ignored | Submission::Busy => Vec::new(),
            Submission::Replied(msg) => vec![msg],
            Submission::Dispatched { user, pending } => {
                let outcome = registry.query(pending.provider, &pending.prompt).await;
                let reply = self.resolve(pending, outcome);
                vec![user, reply]
            }
        }
    }

    fn push_system(&mut self, text: &str) -> Message {
        self.push(Role::System, None, text.to_string(), None)
    }

    fn push(
        &mut self,
        role: Role,
        provider: Option<Provider>,
        content: String,
        prompt: Option<String>,
    ) -> Message {
        let now = Utc::now();
        let message = Message {
            id: self.next_message_id,
            role,
            provider,
            content,
            prompt,
            timestamp: now,
        };
        self.next_message_id += 1;
        self.updated_at = now;
        self.log.push(message.clone());
        message
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::chat::providers::NO_RESPONSE_TEXT;
    use crate::chat::registry::testing::Canned;

    fn registry(reply: &str) -> AdapterRegistry {
        AdapterRegistry::new()
            .with(Provider::Gemini, Box::new(Canned::ok(reply)))
            .with(Provider::Perplexity, Box::new(Canned::ok(reply)))
    }

    fn active(provider: Provider) -> Session {
        let mut s = Session::new("s1");
        s.submit("start ai");
        s.submit(&format!("use {provider}"));
        s
    }

    #[test]
    fn new_session_is_not_started() {
        let s = Session::new("s1");
        assert_eq!(s.state(), SessionState::NotStarted);
        assert!(s.messages().is_empty());
        assert!(!s.is_sending());
    }

    #[test]
    fn every_input_before_start_yields_one_system_message() {
        let mut s = Session::new("s1");
        for (i, input) in ["hello", "use gemini", "start", "start ai please"].iter().enumerate() {
            let out = s.submit(input);
            assert!(matches!(out, Submission::Replied(ref m) if m.content == NOT_STARTED_NOTICE));
            assert!(!s.started());
            assert_eq!(s.messages().len(), i + 1);
            assert!(s.messages().iter().all(|m| m.role == Role::System));
        }
    }

    #[test]
    fn blank_input_appends_nothing() {
        let mut s = Session::new("s1");
        assert_eq!(s.submit("   "), Submission::Ignored);
        assert!(s.messages().is_empty());
    }

    #[test]
    fn start_transitions_once() {
        let mut s = Session::new("s1");
        let out = s.submit("  Start AI ");
        assert!(matches!(out, Submission::Replied(ref m) if m.content == START_CONFIRMATION));
        assert_eq!(s.state(), SessionState::Started);
        assert_eq!(s.messages().len(), 1);
    }

    #[test]
    fn repeated_start_without_provider_hits_the_gate() {
        let mut s = Session::new("s1");
        s.submit("start ai");
        let out = s.submit("start ai");
        assert!(matches!(out, Submission::Replied(ref m) if m.content == SELECT_PROVIDER_NOTICE));
        assert_eq!(s.state(), SessionState::Started);
        assert_eq!(s.messages().len(), 2);
    }

    #[tokio::test]
    async fn repeated_start_with_provider_is_a_literal_query() {
        let mut s = active(Provider::Gemini);
        let appended = s.converse("start ai", &registry("ok")).await;
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].role, Role::User);
        assert_eq!(appended[0].content, "start ai");
        assert_eq!(s.active_provider(), Some(Provider::Gemini));
        assert_eq!(s.messages().len(), 4);
    }

    #[test]
    fn switching_providers_and_ignoring_unknown() {
        let mut s = Session::new("s1");
        s.submit("start ai");

        s.submit("use gemini");
        assert_eq!(s.active_provider(), Some(Provider::Gemini));
        assert_eq!(s.messages().last().unwrap().content, "Switched to Gemini.");

        s.submit("use perplexity");
        assert_eq!(s.active_provider(), Some(Provider::Perplexity));

        let out = s.submit("use bogus");
        match out {
            Submission::Dispatched { user, pending } => {
                assert_eq!(user.content, "use bogus");
                assert_eq!(pending.provider, Provider::Perplexity);
            }
            other => panic!("expected dispatch, got {other:?}"),
        }
        assert_eq!(s.active_provider(), Some(Provider::Perplexity));
    }

    #[tokio::test]
    async fn query_without_provider_never_reaches_registry() {
        let canned = Canned::ok("nope");
        let calls = canned.calls.clone();
        let registry = AdapterRegistry::new().with(Provider::Gemini, Box::new(canned));

        let mut s = Session::new("s1");
        s.submit("start ai");
        let appended = s.converse("what is rust?", &registry).await;

        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].content, SELECT_PROVIDER_NOTICE);
        assert!(s.messages().iter().all(|m| m.role != Role::User));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn query_appends_user_then_assistant() {
        let mut s = active(Provider::Gemini);
        let before = s.messages().len();
        let appended = s.converse("what is rust?", &registry("A language.")).await;

        assert_eq!(s.messages().len(), before + 2);
        let (user, reply) = (&appended[0], &appended[1]);
        assert_eq!(user.role, Role::User);
        assert_eq!(user.provider, Some(Provider::Gemini));
        assert_eq!(user.prompt.as_deref(), Some("what is rust?"));
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.provider, Some(Provider::Gemini));
        assert_eq!(reply.prompt.as_deref(), Some("what is rust?"));
        assert_eq!(reply.content, "A language.");
        assert!(!s.is_sending());
    }

    #[tokio::test]
    async fn failure_becomes_fixed_text_and_keeps_provider() {
        let registry =
            AdapterRegistry::new().with(Provider::Gemini, Box::new(Canned::err("HTTP 500")));
        let mut s = active(Provider::Gemini);
        let appended = s.converse("hello", &registry).await;

        assert_eq!(appended.len(), 2);
        assert_eq!(appended[1].role, Role::Assistant);
        assert_eq!(appended[1].provider, Some(Provider::Gemini));
        assert_eq!(appended[1].content, FAILURE_TEXT);
        assert!(!appended[1].content.contains("500"));
        assert_eq!(s.active_provider(), Some(Provider::Gemini));
        assert!(!s.is_sending());
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_softly() {
        let mut s = active(Provider::Perplexity);
        let appended = s.converse("hello", &AdapterRegistry::new()).await;
        assert_eq!(appended[1].content, FAILURE_TEXT);
    }

    #[tokio::test]
    async fn empty_reply_uses_fallback_text() {
        let mut s = active(Provider::Perplexity);
        let appended = s.converse("hello", &registry("")).await;
        assert_eq!(appended[1].content, NO_RESPONSE_TEXT);
    }

    #[test]
    fn input_is_rejected_while_sending() {
        let mut s = active(Provider::Gemini);
        let first = s.submit("first");
        let Submission::Dispatched { pending, .. } = first else {
            panic!("expected dispatch");
        };
        assert!(s.is_sending());
        let len = s.messages().len();

        assert_eq!(s.submit("second"), Submission::Busy);
        assert_eq!(s.submit("use perplexity"), Submission::Busy);
        assert_eq!(s.messages().len(), len);

        s.resolve(pending, Ok("done".into()));
        assert!(!s.is_sending());
        assert!(matches!(s.submit("second"), Submission::Dispatched { .. }));
    }

    #[test]
    fn reply_keeps_attribution_after_switch() {
        let mut s = active(Provider::Gemini);
        let Submission::Dispatched { pending, .. } = s.submit("q") else {
            panic!("expected dispatch");
        };
        // Force a provider change behind the in-flight query.
        s.active_provider = Some(Provider::Perplexity);
        let reply = s.resolve(pending, Ok("r".into()));
        assert_eq!(reply.provider, Some(Provider::Gemini));
        assert_eq!(s.messages()[s.messages().len() - 2].provider, Some(Provider::Gemini));
    }

    #[test]
    fn reselecting_active_provider_still_confirms() {
        let mut s = active(Provider::Gemini);
        let len = s.messages().len();
        let out = s.submit("use GEMINI");
        assert!(matches!(out, Submission::Replied(ref m) if m.content == "Switched to Gemini."));
        assert_eq!(s.messages().len(), len + 1);
        assert_eq!(s.active_provider(), Some(Provider::Gemini));
    }

    #[test]
    fn message_ids_increase() {
        let mut s = Session::new("s1");
        s.submit("hi");
        s.submit("start ai");
        s.submit("use gemini");
        let ids: Vec<u64> = s.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn state_serializes_with_provider() {
        let json = serde_json::to_value(SessionState::Active(Provider::Gemini)).unwrap();
        assert_eq!(json["state"], "active");
        assert_eq!(json["provider"], "gemini");
        assert_eq!(SessionState::Started.as_str(), "started");
    }
}
