//! Chat layer - conversation history plus the per-session request handler
//!
//! Each browser tab owns one [`ChatSession`]. All sessions share the
//! process-wide [`SessionCache`](crate::agent::SessionCache), so discovery
//! happens once no matter how many tabs are open.

pub mod handler;
pub mod log;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

pub use handler::{HandlerError, HandlerState, RequestHandler, TurnView};
pub use log::{ConversationLog, ConversationTurn, Role};

use crate::agent::SessionCache;

/// History and handler for one interactive user
///
/// Turns are serialized on the handler lock. The log has its own lock and
/// is only written once a turn has finished, so it can be read while a turn
/// is still running.
pub struct ChatSession {
    log: RwLock<ConversationLog>,
    handler: Mutex<RequestHandler>,
}

impl ChatSession {
    pub fn new(cache: Arc<SessionCache>) -> Self {
        Self {
            log: RwLock::new(ConversationLog::new()),
            handler: Mutex::new(RequestHandler::new(cache)),
        }
    }

    /// Run one turn; the exchange lands in this session's log
    pub async fn submit(&self, input: &str) -> Result<TurnView, HandlerError> {
        let mut handler = self.handler.lock().await;
        let mut exchange = ConversationLog::new();
        let view = handler.handle(input, &mut exchange).await?;
        self.log.write().await.append(exchange);
        Ok(view)
    }

    /// Snapshot of the history
    pub async fn log(&self) -> ConversationLog {
        self.log.read().await.clone()
    }
}
