//! In-process fakes for the registry and the model backend

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::a2a::{CapabilityRegistry, ClientError, Discovery, NamedOperation};
use crate::ollama::{ChatError, ChatMessage, ChatResponse, ModelBackend, Tool, ToolCall};
use crate::ollama::tool_use::FunctionCall;

pub(crate) fn operation(name: &str) -> NamedOperation {
    NamedOperation {
        name: name.to_string(),
        description: format!("{} skill", name),
        parameters: json!({"type": "object", "properties": {"message": {"type": "string"}}}),
        route: name.to_string(),
    }
}

pub(crate) struct FakeRegistry {
    endpoint: String,
    operations: Result<Vec<String>, String>,
    failing_ops: HashSet<String>,
    discover_delay: Option<Duration>,
    pub discover_calls: AtomicUsize,
    pub invocations: Mutex<Vec<(String, String)>>,
}

impl FakeRegistry {
    pub fn with_operations(names: &[&str]) -> Self {
        Self {
            endpoint: "http://localhost:5000".to_string(),
            operations: Ok(names.iter().map(|n| n.to_string()).collect()),
            failing_ops: HashSet::new(),
            discover_delay: None,
            discover_calls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable(detail: &str) -> Self {
        Self {
            operations: Err(detail.to_string()),
            ..Self::with_operations(&[])
        }
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing_ops.insert(name.to_string());
        self
    }

    pub fn with_discover_delay(mut self, delay: Duration) -> Self {
        self.discover_delay = Some(delay);
        self
    }

    pub fn discover_count(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityRegistry for FakeRegistry {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn discover(&self) -> Result<Discovery, ClientError> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.discover_delay {
            tokio::time::sleep(delay).await;
        }
        match &self.operations {
            Ok(names) => Ok(Discovery {
                agent_name: "Supervisor".to_string(),
                operations: names.iter().map(|n| operation(n)).collect(),
            }),
            Err(detail) => Err(ClientError::Connect(detail.clone())),
        }
    }

    async fn invoke(
        &self,
        operation: &NamedOperation,
        arguments: &Value,
    ) -> Result<String, ClientError> {
        let message = arguments["message"].as_str().unwrap_or_default().to_string();
        self.invocations
            .lock()
            .unwrap()
            .push((operation.name.clone(), message.clone()));
        tokio::task::yield_now().await;

        if self.failing_ops.contains(&operation.name) {
            return Err(ClientError::JsonRpc {
                code: -32603,
                message: format!("{} exploded", operation.name),
            });
        }
        Ok(format!("{} result for {}", operation.name, message))
    }
}

pub(crate) fn reply(text: &str) -> Result<ChatResponse, ChatError> {
    Ok(ChatResponse {
        message: ChatMessage::assistant(text),
        done: true,
        eval_count: 0,
        eval_duration: 0,
    })
}

pub(crate) fn tool_calls(calls: &[(&str, &str)]) -> Result<ChatResponse, ChatError> {
    let mut message = ChatMessage::assistant("");
    message.tool_calls = Some(
        calls
            .iter()
            .map(|(name, text)| ToolCall {
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: json!({ "message": text }),
                },
            })
            .collect(),
    );
    Ok(ChatResponse {
        message,
        done: true,
        eval_count: 0,
        eval_duration: 0,
    })
}

/// Replays a fixed script, then answers `done` once exhausted
pub(crate) struct ScriptedBackend {
    script: Mutex<VecDeque<Result<ChatResponse, ChatError>>>,
    pub calls: AtomicUsize,
    pub seen_tools: Mutex<Vec<Vec<String>>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<ChatResponse, ChatError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            seen_tools: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn chat(
        &self,
        _messages: Vec<ChatMessage>,
        _model: &str,
        tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponse, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tools.lock().unwrap().push(
            tools
                .unwrap_or_default()
                .into_iter()
                .map(|t| t.function.name)
                .collect(),
        );
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| reply("done"))
    }
}

/// Stateless backend: searches for the user's text, then answers with the result
pub(crate) struct RoutingBackend;

#[async_trait]
impl ModelBackend for RoutingBackend {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        _model: &str,
        _tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponse, ChatError> {
        tokio::task::yield_now().await;
        let last = messages.last().cloned().unwrap_or_else(|| ChatMessage::user(""));
        if last.role == "user" {
            tool_calls(&[("search", last.content.as_str())])
        } else {
            reply(&format!("answer: {}", last.content))
        }
    }
}
