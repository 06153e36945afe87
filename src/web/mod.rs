//! Web chat interface
//!
//! Serves a single-page chat UI plus a small JSON API:
//! - `GET  /`             chat page
//! - `GET  /api/status`   agent system state (never triggers discovery)
//! - `GET  /api/history`  one session's conversation log
//! - `POST /api/chat`     run one turn
//! - `GET  /metrics`      Prometheus exposition

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::agent::{ExecutionTrace, InitError, SessionCache};
use crate::chat::{ChatSession, ConversationLog, HandlerError};
use crate::metrics;

/// Shown under the error banner once the agent system is down
pub const UNAVAILABLE_WARNING: &str =
    "Agent system is not available. Please resolve the errors above.";

/// Bounds on the in-memory chat session map
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Sessions kept at once; the least recently used one is dropped first
    pub max_sessions: usize,
    /// Sessions untouched for this long are dropped
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            idle_timeout: Duration::from_secs(3600),
        }
    }
}

struct SessionEntry {
    session: Arc<ChatSession>,
    last_seen: Instant,
}

type SessionMap = HashMap<Uuid, SessionEntry>;

/// Web application state
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<SessionCache>,
    sessions: Arc<Mutex<SessionMap>>,
    limits: SessionLimits,
}

impl AppState {
    pub fn new(cache: Arc<SessionCache>) -> Self {
        Self::with_limits(cache, SessionLimits::default())
    }

    pub fn with_limits(cache: Arc<SessionCache>, limits: SessionLimits) -> Self {
        Self {
            cache,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            limits,
        }
    }

    /// Number of chat sessions currently held
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Look up a chat session, creating it on first use
    async fn session(&self, id: Option<Uuid>) -> (Uuid, Arc<ChatSession>) {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let mut sessions = self.sessions.lock().await;

        if let Some(entry) = sessions.get_mut(&id) {
            entry.last_seen = Instant::now();
            return (id, Arc::clone(&entry.session));
        }

        self.evict(&mut sessions);
        info!(session = %id, "New chat session");
        let session = Arc::new(ChatSession::new(Arc::clone(&self.cache)));
        sessions.insert(
            id,
            SessionEntry {
                session: Arc::clone(&session),
                last_seen: Instant::now(),
            },
        );
        (id, session)
    }

    /// Drop idle sessions, then the least recently used ones until a new one fits
    fn evict(&self, sessions: &mut SessionMap) {
        let idle_timeout = self.limits.idle_timeout;
        sessions.retain(|_, entry| entry.last_seen.elapsed() < idle_timeout);

        while !sessions.is_empty() && sessions.len() >= self.limits.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            if let Some(id) = oldest {
                debug!(session = %id, "Evicting least recently used chat session");
                sessions.remove(&id);
            }
        }
    }

    async fn existing(&self, id: &Uuid) -> Option<Arc<ChatSession>> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.session))
    }

    async fn forget(&self, id: &Uuid) {
        self.sessions.lock().await.remove(id);
    }
}

#[derive(Serialize)]
pub struct OperationSummary {
    pub name: String,
    pub description: String,
}

/// Agent system status
#[derive(Serialize)]
pub struct StatusResponse {
    /// "pending", "ready" or "unavailable"
    pub state: &'static str,
    pub endpoint: String,
    pub agent: Option<String>,
    pub model: Option<String>,
    pub operations: Vec<OperationSummary>,
    /// Banner lines when unavailable
    pub error: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub session: Uuid,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session: Option<Uuid>,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session: Uuid,
    pub reply: String,
    pub trace: ExecutionTrace,
    pub succeeded: bool,
    pub log: ConversationLog,
}

/// Create the web router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(chat_page))
        .route("/api/status", get(status))
        .route("/api/history", get(history))
        .route("/api/chat", post(chat))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state)
}

async fn chat_page() -> Html<&'static str> {
    Html(CHAT_HTML)
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let endpoint = state.cache.endpoint().to_string();
    let response = match state.cache.peek() {
        None => StatusResponse {
            state: "pending",
            endpoint,
            agent: None,
            model: None,
            operations: Vec::new(),
            error: None,
        },
        Some(Ok(session)) => StatusResponse {
            state: "ready",
            endpoint,
            agent: Some(session.agent_name().to_string()),
            model: Some(session.model().to_string()),
            operations: session
                .operations()
                .iter()
                .map(|op| OperationSummary {
                    name: op.name.clone(),
                    description: op.description.clone(),
                })
                .collect(),
            error: None,
        },
        Some(Err(e)) => StatusResponse {
            state: "unavailable",
            endpoint,
            agent: None,
            model: None,
            operations: Vec::new(),
            error: Some(e.banner()),
        },
    };
    Json(response)
}

async fn history(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> Response {
    match state.existing(&query.session).await {
        Some(session) => Json(session.log().await).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Unknown session {}", query.session) })),
        )
            .into_response(),
    }
}

async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": HandlerError::EmptyInput.to_string() })),
        )
            .into_response();
    }

    // No session is created for a system that can never serve it
    if let Some(Err(e)) = state.cache.peek() {
        return unavailable(request.session, e);
    }

    let (id, session) = state.session(request.session).await;

    // The turn runs on its own task so a dropped connection cannot abandon it
    // halfway; the exchange still lands in the log.
    let turn = tokio::spawn(async move {
        let result = session.submit(&request.message).await;
        (result, session.log().await)
    });

    match turn.await {
        Ok((Ok(view), log)) => Json(ChatResponse {
            session: id,
            reply: view.reply,
            trace: view.trace,
            succeeded: view.succeeded,
            log,
        })
        .into_response(),
        Ok((Err(HandlerError::EmptyInput), _)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": HandlerError::EmptyInput.to_string() })),
        )
            .into_response(),
        Ok((Err(HandlerError::Unavailable(e)), _)) => {
            state.forget(&id).await;
            unavailable(None, &e)
        }
        Err(e) => {
            error!(session = %id, error = %e, "Chat turn task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Chat turn failed unexpectedly" })),
            )
                .into_response()
        }
    }
}

fn unavailable(session: Option<Uuid>, e: &InitError) -> Response {
    warn!(endpoint = %e.endpoint(), "Rejected turn: agent system unavailable");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "session": session,
            "error": e.to_string(),
            "banner": e.banner(),
            "warning": UNAVAILABLE_WARNING,
        })),
    )
        .into_response()
}

async fn prometheus_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_text(),
    )
}

/// Chat page
const CHAT_HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Multi-Agent System Interface</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #0e1117;
            color: #fafafa;
            min-height: 100vh;
            display: flex;
            flex-direction: column;
            align-items: center;
        }
        main { width: 100%; max-width: 760px; padding: 3rem 1rem 7rem; }
        h1 { font-size: 2.2rem; margin-bottom: 0.25rem; }
        .caption { color: #a3a8b8; font-size: 0.9rem; margin-bottom: 1.5rem; }
        .alert { border-radius: 8px; padding: 0.75rem 1rem; margin-bottom: 0.5rem; }
        .alert.error { background: #3e1c1f; color: #ffb4b4; }
        .alert.success { background: #173928; color: #7ee2a8; }
        .alert.warning { background: #3d3419; color: #ffe08a; }
        .msg { display: flex; gap: 0.75rem; padding: 1rem 0; }
        .avatar {
            width: 2rem; height: 2rem; border-radius: 6px; flex-shrink: 0;
            display: flex; align-items: center; justify-content: center;
        }
        .msg.user .avatar { background: #ff4b4b; }
        .msg.assistant .avatar { background: #ffbd45; }
        .content { flex: 1; white-space: pre-wrap; line-height: 1.5; }
        details {
            border: 1px solid #31333f; border-radius: 8px;
            margin-bottom: 0.75rem; padding: 0.5rem 0.75rem;
        }
        summary { cursor: pointer; color: #a3a8b8; }
        details h4 { margin: 0.75rem 0 0.5rem; }
        pre {
            background: #1a1c24; border-radius: 6px; padding: 0.75rem;
            overflow-x: auto; font-size: 0.8rem; white-space: pre-wrap;
        }
        form {
            position: fixed; bottom: 0; width: 100%; max-width: 760px;
            padding: 1rem; background: #0e1117;
        }
        input {
            width: 100%; padding: 0.8rem 1rem; border-radius: 8px;
            border: 1px solid #31333f; background: #262730; color: #fafafa;
            font-size: 1rem;
        }
        input:disabled { opacity: 0.5; }
    </style>
</head>
<body>
    <main>
        <h1>🤖 Multi-Agent System Interface</h1>
        <p class="caption">Interact with a supervisor agent that orchestrates specialized tasks.</p>
        <div id="banner"></div>
        <div id="messages"></div>
    </main>
    <form id="chat-form">
        <input id="chat-input" autocomplete="off"
               placeholder="Ask the agent to perform a multi-step task...">
    </form>

    <script>
        const messages = document.getElementById('messages');
        const banner = document.getElementById('banner');
        const input = document.getElementById('chat-input');
        let session = sessionStorage.getItem('a2a-console-session');

        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text;
            return div.innerHTML;
        }

        function addMessage(role, text) {
            const el = document.createElement('div');
            el.className = `msg ${role}`;
            el.innerHTML = `<div class="avatar">${role === 'user' ? '🧑' : '🤖'}</div>
                <div class="content">${escapeHtml(text)}</div>`;
            messages.appendChild(el);
            window.scrollTo(0, document.body.scrollHeight);
            return el.querySelector('.content');
        }

        function showUnavailable(lines, warning) {
            banner.innerHTML = lines.map(l => `<div class="alert error">${escapeHtml(l)}</div>`).join('')
                + `<div class="alert warning">${escapeHtml(warning)}</div>`;
            input.disabled = true;
        }

        function showStatus(status) {
            if (status.state === 'ready') {
                const ops = status.operations.map(o => o.name).join(', ');
                banner.innerHTML = `<div class="alert success">Successfully connected to the Supervisor Agent.`
                    + (ops ? ` Capabilities: ${escapeHtml(ops)}` : '') + `</div>`;
            } else if (status.state === 'unavailable') {
                showUnavailable(status.error || [],
                    'Agent system is not available. Please resolve the errors above.');
            }
        }

        async function loadPage() {
            const status = await (await fetch('/api/status')).json();
            showStatus(status);
            if (session) {
                const res = await fetch(`/api/history?session=${encodeURIComponent(session)}`);
                if (res.ok) {
                    for (const turn of await res.json()) addMessage(turn.role, turn.content);
                }
            }
        }

        document.getElementById('chat-form').addEventListener('submit', async (event) => {
            event.preventDefault();
            const text = input.value;
            if (!text.trim()) return;
            input.value = '';
            input.disabled = true;
            addMessage('user', text);

            const reply = addMessage('assistant', '');
            const panel = document.createElement('details');
            panel.open = true;
            panel.innerHTML = `<summary>Thinking and executing task...</summary>`;
            reply.appendChild(panel);

            try {
                const res = await fetch('/api/chat', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({ session, message: text }),
                });
                const body = await res.json();
                if (body.session) {
                    session = body.session;
                    sessionStorage.setItem('a2a-console-session', session);
                }
                if (res.status === 503) {
                    reply.closest('.msg').remove();
                    showUnavailable(body.banner || [body.error], body.warning);
                    return;
                }
                if (!res.ok) {
                    panel.remove();
                    reply.textContent = body.error;
                    input.disabled = false;
                    return;
                }
                panel.open = false;
                panel.innerHTML = `<summary>Task Complete!</summary>
                    <h4>Agent's Thought Process:</h4><pre>${escapeHtml(body.trace)}</pre>`;
                reply.appendChild(document.createTextNode(body.reply));
                fetch('/api/status').then(r => r.json()).then(showStatus);
            } catch (err) {
                panel.remove();
                reply.textContent = `Request failed: ${err}`;
            }
            input.disabled = false;
            input.focus();
        });

        loadPage();
    </script>
</body>
</html>
"#;
