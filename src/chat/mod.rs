pub mod command;
pub mod providers;
pub mod registry;
pub mod service;
pub mod session;
pub mod types;

pub use command::Command;
pub use providers::{LlmProvider, NO_RESPONSE_TEXT};
pub use registry::AdapterRegistry;
pub use service::{ChatService, SubmitOutcome, SubmitResult};
pub use session::{FAILURE_TEXT, PendingQuery, Session, SessionState, Submission};
pub use types::{AdapterFailure, ChatError, Message, Provider, Role};
