//! Capability Session - the client agent bound to discovered operations
//!
//! A session pairs the operations found on the supervisor with a model
//! backend. `run` drives the tool-calling loop for one request and captures
//! every diagnostic line into that run's own trace.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::cache::InitError;
use super::trace::{ExecutionTrace, TraceSink};
use crate::a2a::{CapabilityRegistry, Discovery, NamedOperation};
use crate::metrics::{AGENT_ITERATIONS_TOTAL, AGENT_TOOL_CALLS, AGENT_TURNS, LLM_CALL_TIME};
use crate::ollama::{
    parse_tool_calls_from_text, ChatError, ChatMessage, ModelBackend, Tool, ToolCall,
    DEFAULT_AGENT_SYSTEM_PROMPT,
};

/// Metric label for operations the model invented; the raw name only goes to logs
const UNKNOWN_OPERATION_LABEL: &str = "<unknown>";

/// Configuration for the client agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model to use on the backend (e.g., "qwen3")
    pub model: String,
    /// Maximum number of iterations (LLM calls) per run
    pub max_iterations: usize,
    /// Custom system prompt (uses default if None)
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "qwen3".to_string(),
            max_iterations: 10,
            system_prompt: None,
        }
    }
}

/// Error type for a single run
#[derive(Debug)]
pub enum ExecutionError {
    /// The model backend failed
    Backend(ChatError),
    /// The model kept calling tools past the iteration limit
    MaxIterationsReached(usize),
    /// The model finished without any text
    EmptyResponse,
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionError::Backend(e) => write!(f, "Model backend error: {}", e),
            ExecutionError::MaxIterationsReached(n) => {
                write!(f, "Stopped after {} model calls without a final answer", n)
            }
            ExecutionError::EmptyResponse => write!(f, "The model returned an empty response"),
        }
    }
}

impl std::error::Error for ExecutionError {}

impl From<ChatError> for ExecutionError {
    fn from(e: ChatError) -> Self {
        ExecutionError::Backend(e)
    }
}

/// Result of one run
#[derive(Debug)]
pub struct RunReport {
    /// Final response, or the error that ended the run
    pub outcome: Result<String, ExecutionError>,
    /// Diagnostics captured during this run only
    pub trace: ExecutionTrace,
    /// Number of LLM calls made
    pub iterations: usize,
    /// Number of tool calls executed
    pub tool_calls_made: usize,
    /// Unique trace ID for this run
    pub trace_id: String,
}

#[derive(Default)]
struct RunStats {
    iterations: usize,
    tool_calls_made: usize,
}

/// Client agent bound to the operations of one supervisor
pub struct CapabilitySession {
    endpoint: String,
    agent_name: String,
    operations: Vec<NamedOperation>,
    tools: Vec<Tool>,
    registry: Arc<dyn CapabilityRegistry>,
    backend: Arc<dyn ModelBackend>,
    config: AgentConfig,
}

impl std::fmt::Debug for CapabilitySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilitySession")
            .field("endpoint", &self.endpoint)
            .field("agent_name", &self.agent_name)
            .field("operations", &self.operation_names())
            .field("model", &self.config.model)
            .finish()
    }
}

impl CapabilitySession {
    /// Bind a discovery result to a backend
    ///
    /// Fails with `NoCapabilitiesFound` when nothing was discovered; a
    /// session always has at least one operation.
    pub fn bind(
        discovery: Discovery,
        registry: Arc<dyn CapabilityRegistry>,
        backend: Arc<dyn ModelBackend>,
        config: AgentConfig,
    ) -> Result<Self, InitError> {
        let endpoint = registry.endpoint().to_string();
        if discovery.operations.is_empty() {
            return Err(InitError::NoCapabilitiesFound { endpoint });
        }

        let tools = discovery.operations.iter().map(Tool::from).collect();
        Ok(Self {
            endpoint,
            agent_name: discovery.agent_name,
            operations: discovery.operations,
            tools,
            registry,
            backend,
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn operations(&self) -> &[NamedOperation] {
        &self.operations
    }

    pub fn operation_names(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.name.as_str()).collect()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn operation(&self, name: &str) -> Option<&NamedOperation> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Run one request to completion
    ///
    /// Never fails as a whole: errors are reported in `RunReport::outcome`
    /// alongside whatever trace was captured before the failure.
    pub async fn run(&self, request: &str) -> RunReport {
        let trace_id = Uuid::now_v7().to_string();
        let root_span = info_span!(
            "agent_task",
            trace_id = %trace_id,
            model = %self.config.model,
            otel.name = "agent_task"
        );

        let mut sink = TraceSink::new();
        let mut stats = RunStats::default();
        let outcome = self
            .agent_loop(request, &trace_id, &mut sink, &mut stats)
            .instrument(root_span)
            .await;

        let label = match &outcome {
            Ok(_) => "success",
            Err(ExecutionError::MaxIterationsReached(_)) => "max_iterations",
            Err(_) => "error",
        };
        AGENT_TURNS.with_label_values(&[label]).inc();
        AGENT_ITERATIONS_TOTAL.observe(stats.iterations as f64);

        if let Err(e) = &outcome {
            warn!(trace_id = %trace_id, error = %e, "Agent task failed");
            sink.line(format!("[AGENT] ❌ {}", e));
        }

        RunReport {
            outcome,
            trace: sink.finish(),
            iterations: stats.iterations,
            tool_calls_made: stats.tool_calls_made,
            trace_id,
        }
    }

    async fn agent_loop(
        &self,
        request: &str,
        trace_id: &str,
        sink: &mut TraceSink,
        stats: &mut RunStats,
    ) -> Result<String, ExecutionError> {
        info!(trace_id = %trace_id, "Starting agent task");
        sink.line(format!("[AGENT] Trace ID: {}", trace_id));
        sink.line(format!(
            "[AGENT] Tools: {}",
            self.operation_names().join(", ")
        ));

        let system_prompt = self
            .config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_AGENT_SYSTEM_PROMPT.to_string());
        let mut messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(request)];

        loop {
            if stats.iterations >= self.config.max_iterations {
                warn!(trace_id = %trace_id, iterations = stats.iterations, "Max iterations reached");
                return Err(ExecutionError::MaxIterationsReached(stats.iterations));
            }
            stats.iterations += 1;

            let llm_span = info_span!(
                "llm_call",
                trace_id = %trace_id,
                iteration = stats.iterations,
                model = %self.config.model,
                otel.name = "llm_call"
            );

            sink.line(format!(
                "[AGENT] Calling {} (iteration {})...",
                self.config.model, stats.iterations
            ));
            let call_start = Instant::now();

            let response = self
                .backend
                .chat(messages.clone(), &self.config.model, Some(self.tools.clone()))
                .instrument(llm_span)
                .await?;

            let call_duration = call_start.elapsed();
            LLM_CALL_TIME
                .with_label_values(&[&self.config.model])
                .observe(call_duration.as_secs_f64());
            let call_duration_ms = call_duration.as_secs_f64() * 1000.0;
            info!(trace_id = %trace_id, iteration = stats.iterations, duration_ms = call_duration_ms, "LLM call completed");
            sink.line(format!(
                "[AGENT] LLM call {} completed in {:.2}ms",
                stats.iterations, call_duration_ms
            ));

            messages.push(response.message.clone());

            // Native tool calls first; otherwise JSON in the text that names a known operation
            let tool_calls: Vec<ToolCall> = match response.message.tool_calls.clone() {
                Some(calls) if !calls.is_empty() => calls,
                _ => parse_tool_calls_from_text(&response.message.content)
                    .into_iter()
                    .filter(|call| self.operation(&call.function.name).is_some())
                    .collect(),
            };

            if tool_calls.is_empty() {
                let content = response.message.content.trim().to_string();
                if content.is_empty() {
                    return Err(ExecutionError::EmptyResponse);
                }
                info!(trace_id = %trace_id, iterations = stats.iterations, tool_calls = stats.tool_calls_made, "Agent task completed");
                sink.line("[AGENT] ✅ Final answer ready");
                return Ok(content);
            }

            for tool_call in tool_calls {
                stats.tool_calls_made += 1;
                let tool_response = self.invoke_tool(&tool_call, trace_id, sink).await;
                messages.push(ChatMessage::tool(tool_response));
            }
        }
    }

    /// Invoke one requested operation; failures become text for the model
    async fn invoke_tool(&self, call: &ToolCall, trace_id: &str, sink: &mut TraceSink) -> String {
        let name = call.function.name.as_str();
        let Some(op) = self.operation(name) else {
            warn!(trace_id = %trace_id, operation = name, "Model requested an unknown operation");
            AGENT_TOOL_CALLS
                .with_label_values(&[UNKNOWN_OPERATION_LABEL, "unknown"])
                .inc();
            sink.line(format!("[TOOL] ⚠️ Unknown operation `{}`", name));
            return format!(
                "Error: unknown operation `{}`. Available operations: {}",
                name,
                self.operation_names().join(", ")
            );
        };

        let arguments = &call.function.arguments;
        let tool_span = info_span!(
            "tool_call",
            trace_id = %trace_id,
            operation = %op.name,
            otel.name = "tool_call"
        );

        info!(trace_id = %trace_id, operation = %op.name, "Invoking operation");
        sink.line(format!("[TOOL] Invoking {} with {}", op.name, describe(arguments)));
        let start = Instant::now();

        match self.registry.invoke(op, arguments).instrument(tool_span).await {
            Ok(text) => {
                let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
                AGENT_TOOL_CALLS.with_label_values(&[&op.name, "success"]).inc();
                info!(trace_id = %trace_id, operation = %op.name, duration_ms, "Operation succeeded");
                sink.line(format!("[TOOL] ✅ {} returned in {:.2}ms", op.name, duration_ms));
                sink.block("│ ", &text);
                text
            }
            Err(e) => {
                AGENT_TOOL_CALLS.with_label_values(&[&op.name, "error"]).inc();
                warn!(trace_id = %trace_id, operation = %op.name, error = %e, "Operation failed");
                sink.line(format!("[TOOL] ❌ {} failed: {}", op.name, e));
                format!("Error: {}", e)
            }
        }
    }
}

fn describe(arguments: &Value) -> String {
    match arguments.get("message").and_then(Value::as_str) {
        Some(message) => format!("\"{}\"", message),
        None => arguments.to_string(),
    }
}
