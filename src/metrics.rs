//! Prometheus metrics for the console
//!
//! Collectors live in the default registry and are exposed at `/metrics`.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_histogram_vec,
    CounterVec, Encoder, Gauge, Histogram, HistogramVec, TextEncoder,
};

lazy_static! {
    // ─────────────────────────────────────────────────────────────────────────────
    // Discovery
    // ─────────────────────────────────────────────────────────────────────────────

    /// Discovery attempts by outcome ("success", "no_capabilities", "failed").
    ///
    /// At most one attempt is made per process, so this doubles as a status flag.
    pub static ref DISCOVERY_ATTEMPTS: CounterVec = register_counter_vec!(
        "a2a_console_discovery_attempts_total",
        "Capability discovery attempts by outcome",
        &["outcome"]
    ).expect("failed to register DISCOVERY_ATTEMPTS metric");

    /// Number of operations bound into the current session.
    pub static ref DISCOVERED_OPERATIONS: Gauge = register_gauge!(
        "a2a_console_discovered_operations",
        "Operations discovered on the supervisor agent"
    ).expect("failed to register DISCOVERED_OPERATIONS metric");

    // ─────────────────────────────────────────────────────────────────────────────
    // Agent runs
    // ─────────────────────────────────────────────────────────────────────────────

    /// Completed turns by outcome ("success", "error", "max_iterations").
    pub static ref AGENT_TURNS: CounterVec = register_counter_vec!(
        "a2a_console_agent_turns_total",
        "Agent turns by outcome",
        &["outcome"]
    ).expect("failed to register AGENT_TURNS metric");

    /// LLM calls needed per turn.
    pub static ref AGENT_ITERATIONS_TOTAL: Histogram = register_histogram!(
        "a2a_console_agent_iterations",
        "LLM calls per agent turn",
        vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0]
    ).expect("failed to register AGENT_ITERATIONS_TOTAL metric");

    /// Remote operation calls.
    ///
    /// Labels:
    /// - operation: tool name as seen by the model
    /// - status: "success", "error" or "unknown"
    pub static ref AGENT_TOOL_CALLS: CounterVec = register_counter_vec!(
        "a2a_console_tool_calls_total",
        "Remote operation invocations",
        &["operation", "status"]
    ).expect("failed to register AGENT_TOOL_CALLS metric");

    /// Duration of single model calls in seconds.
    pub static ref LLM_CALL_TIME: HistogramVec = register_histogram_vec!(
        "a2a_console_llm_call_seconds",
        "Duration of a single chat call to the model backend",
        &["model"],
        vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    ).expect("failed to register LLM_CALL_TIME metric");

    /// Duration of A2A HTTP calls in seconds, by JSON-RPC method.
    pub static ref A2A_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "a2a_console_a2a_request_seconds",
        "Duration of requests to the supervisor agent",
        &["method"],
        vec![0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]
    ).expect("failed to register A2A_REQUEST_DURATION metric");
}

/// Initialize metrics with default values.
///
/// Called during startup so the gauges appear before the first turn.
pub fn init() {
    DISCOVERED_OPERATIONS.set(0.0);
}

/// Render every registered metric in the Prometheus text format
pub fn gather_text() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
