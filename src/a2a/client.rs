//! HTTP client for A2A agents
//!
//! Two calls are needed by the console: fetching the agent card for
//! discovery, and `message/send` for invoking a skill.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::card::AgentCard;
use crate::metrics::A2A_REQUEST_DURATION;

/// Error type for A2A client operations
#[derive(Debug)]
pub enum ClientError {
    /// The agent could not be reached at all
    Connect(String),
    /// Timeout or body read failure
    Request(reqwest::Error),
    /// Non-success HTTP status
    Status { status: u16, url: String },
    /// JSON-RPC error object returned by the agent
    JsonRpc { code: i64, message: String },
    /// Response body did not have the expected shape
    Parse(String),
    /// The agent finished the task in a failed or rejected state
    TaskFailed { state: String, detail: String },
    /// The agent replied without any text
    EmptyReply,
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Connect(detail) => write!(f, "{}", detail),
            ClientError::Request(e) => write!(f, "Request error: {}", e),
            ClientError::Status { status, url } => {
                write!(f, "HTTP {} from {}", status, url)
            }
            ClientError::JsonRpc { code, message } => {
                write!(f, "JSON-RPC error: {} (code: {})", message, code)
            }
            ClientError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ClientError::TaskFailed { state, detail } => {
                write!(f, "Remote task {}: {}", state, detail)
            }
            ClientError::EmptyReply => write!(f, "Agent returned an empty reply"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            ClientError::Connect(root_cause(&e))
        } else {
            ClientError::Request(e)
        }
    }
}

/// Innermost message of an error chain (e.g. "Connection refused (os error 111)")
fn root_cause(e: &(dyn std::error::Error + 'static)) -> String {
    let mut cause = e;
    while let Some(source) = cause.source() {
        cause = source;
    }
    cause.to_string()
}

/// Client for a single A2A agent
pub struct A2aClient {
    base_url: String,
    client: reqwest::Client,
    request_id: AtomicI64,
}

impl A2aClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Agent base URL (e.g., "http://localhost:5000")
    /// * `timeout` - Per-request timeout applied to every call
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            request_id: AtomicI64::new(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the agent card for this agent
    pub fn card_url(&self) -> String {
        if self.base_url.ends_with("agent.json") {
            self.base_url.clone()
        } else {
            format!("{}/.well-known/agent.json", self.base_url)
        }
    }

    /// Fetch the agent card
    pub async fn get_agent_card(&self) -> Result<AgentCard, ClientError> {
        let url = self.card_url();
        let start = Instant::now();
        let response = self.client.get(&url).send().await;
        A2A_REQUEST_DURATION
            .with_label_values(&["agent_card"])
            .observe(start.elapsed().as_secs_f64());

        let response = response?;
        if response.status() != StatusCode::OK {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ClientError::Parse(format!("invalid agent card: {}", e)))
    }

    /// Send a text message and collect the agent's textual reply
    ///
    /// # Arguments
    /// * `rpc_url` - JSON-RPC endpoint (the card's `url`, or the base URL)
    /// * `text` - Message body
    /// * `skill` - Skill the message is addressed to, sent as metadata
    pub async fn send_message(
        &self,
        rpc_url: &str,
        text: &str,
        skill: Option<&str>,
    ) -> Result<String, ClientError> {
        let mut params = json!({
            "message": {
                "kind": "message",
                "role": "user",
                "messageId": Uuid::new_v4().to_string(),
                "parts": [{"kind": "text", "text": text}]
            }
        });
        if let Some(skill) = skill {
            params["metadata"] = json!({ "skill": skill });
        }

        let result = self.call("message/send", params, rpc_url).await?;
        reply_text(&result)
    }

    async fn call(&self, method: &str, params: Value, url: &str) -> Result<Value, ClientError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });

        debug!(method, id, url, "Sending JSON-RPC request");
        let start = Instant::now();
        let response = self.client.post(url).json(&request).send().await;
        A2A_REQUEST_DURATION
            .with_label_values(&[method])
            .observe(start.elapsed().as_secs_f64());

        let response = response?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        if let Some(error) = body.get("error") {
            return Err(ClientError::JsonRpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        body.get("result")
            .cloned()
            .ok_or_else(|| ClientError::Parse("missing 'result' field".to_string()))
    }
}

/// Extract the text of a `message/send` result
///
/// The result is either a `Message` or a `Task`. Text parts are collected from
/// the message itself, the task's status message, and the task's artifacts.
pub fn reply_text(result: &Value) -> Result<String, ClientError> {
    let mut chunks = Vec::new();
    collect_parts(result.get("parts"), &mut chunks);

    let status = result.get("status");
    collect_parts(
        status.and_then(|s| s.get("message")).and_then(|m| m.get("parts")),
        &mut chunks,
    );
    if let Some(artifacts) = result.get("artifacts").and_then(Value::as_array) {
        for artifact in artifacts {
            collect_parts(artifact.get("parts"), &mut chunks);
        }
    }

    let text = chunks.join("\n");
    let state = status
        .and_then(|s| s.get("state"))
        .and_then(Value::as_str)
        .unwrap_or("");
    if matches!(state, "failed" | "rejected" | "canceled") {
        return Err(ClientError::TaskFailed {
            state: state.to_string(),
            detail: if text.is_empty() {
                "no details".to_string()
            } else {
                text
            },
        });
    }

    if text.trim().is_empty() {
        return Err(ClientError::EmptyReply);
    }
    Ok(text)
}

fn collect_parts(parts: Option<&Value>, chunks: &mut Vec<String>) {
    let Some(parts) = parts.and_then(Value::as_array) else {
        return;
    };
    for part in parts {
        // Older agents use "type", newer ones "kind"
        let kind = part
            .get("kind")
            .or_else(|| part.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("text");
        if kind != "text" {
            continue;
        }
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            chunks.push(text.to_string());
        }
    }
}
