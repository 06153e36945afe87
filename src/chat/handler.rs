//! Request handler - one user turn at a time
//!
//! ```text
//! Idle ──input──► AwaitingSession ──ok──► Executing ──► Rendering ──► Idle
//!                       │
//!                       └──init error──► Unavailable (terminal)
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use super::log::ConversationLog;
use crate::agent::{ExecutionTrace, InitError, SessionCache};

/// Where the handler is in the turn lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerState {
    Idle,
    AwaitingSession,
    Executing,
    Rendering,
    /// Initialization failed; no further input is accepted
    Unavailable(InitError),
}

impl HandlerState {
    pub fn name(&self) -> &'static str {
        match self {
            HandlerState::Idle => "idle",
            HandlerState::AwaitingSession => "awaiting_session",
            HandlerState::Executing => "executing",
            HandlerState::Rendering => "rendering",
            HandlerState::Unavailable(_) => "unavailable",
        }
    }
}

/// What the page shows for a finished turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnView {
    /// Assistant text, or the rendered error
    pub reply: String,
    /// Supplementary diagnostics; not stored in the log
    pub trace: ExecutionTrace,
    /// False when the run ended with an execution error
    pub succeeded: bool,
}

/// Error type for turns that could not be processed at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Blank input; nothing happens
    EmptyInput,
    /// The agent system never came up
    Unavailable(InitError),
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerError::EmptyInput => write!(f, "Message is empty"),
            HandlerError::Unavailable(e) => write!(f, "Agent system is not available: {}", e),
        }
    }
}

impl std::error::Error for HandlerError {}

/// Drives a single chat session's turns
pub struct RequestHandler {
    cache: Arc<SessionCache>,
    state: HandlerState,
}

impl RequestHandler {
    pub fn new(cache: Arc<SessionCache>) -> Self {
        Self {
            cache,
            state: HandlerState::Idle,
        }
    }

    pub fn state(&self) -> &HandlerState {
        &self.state
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.state, HandlerState::Unavailable(_))
    }

    fn transition(&mut self, next: HandlerState) {
        debug!(from = self.state.name(), to = next.name(), "Handler state change");
        self.state = next;
    }

    /// Process one user input and append the exchange to `log`
    pub async fn handle(
        &mut self,
        input: &str,
        log: &mut ConversationLog,
    ) -> Result<TurnView, HandlerError> {
        if let HandlerState::Unavailable(e) = &self.state {
            return Err(HandlerError::Unavailable(e.clone()));
        }

        if input.trim().is_empty() {
            return Err(HandlerError::EmptyInput);
        }

        self.transition(HandlerState::AwaitingSession);
        let session = match self.cache.get_or_init().await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Agent system is not available");
                self.transition(HandlerState::Unavailable(e.clone()));
                return Err(HandlerError::Unavailable(e));
            }
        };

        self.transition(HandlerState::Executing);
        let report = session.run(input).await;

        self.transition(HandlerState::Rendering);
        let (reply, succeeded) = match report.outcome {
            Ok(response) => (response, true),
            Err(e) => (e.to_string(), false),
        };
        log.record_exchange(input, reply.clone());

        self.transition(HandlerState::Idle);
        Ok(TurnView {
            reply,
            trace: report.trace,
            succeeded,
        })
    }
}
