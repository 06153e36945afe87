//! Command-line / environment configuration

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::agent::AgentConfig;
use crate::web::SessionLimits;

#[derive(Parser, Debug, Clone)]
#[clap(version, about = "Chat console for a multi-agent A2A supervisor")]
pub struct ConsoleConfig {
    /// Base URL of the supervisor agent (serves /.well-known/agent.json)
    #[clap(long, env = "SUPERVISOR_URL", default_value = "http://localhost:5000")]
    pub supervisor_url: String,

    /// Ollama server used for reasoning
    #[clap(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Model id passed to Ollama
    #[clap(long, env = "A2A_CONSOLE_MODEL", default_value = "qwen3")]
    pub model: String,

    /// Address the web UI listens on
    #[clap(long, env = "A2A_CONSOLE_LISTEN", default_value = "127.0.0.1:8501")]
    pub listen: SocketAddr,

    /// Upper bound on model calls per turn
    #[clap(long, default_value = "10")]
    pub max_iterations: usize,

    /// Timeout for each outbound HTTP request, in seconds
    #[clap(long, default_value = "120")]
    pub http_timeout_secs: u64,

    /// Replace the built-in system prompt
    #[clap(long, env = "A2A_CONSOLE_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// OTLP collector; traces are only exported when set
    #[clap(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Write logs as JSON lines instead of human-readable text
    #[clap(long, env = "A2A_CONSOLE_LOG_JSON")]
    pub log_json: bool,

    /// Chat sessions kept in memory at once
    #[clap(long, default_value = "1000")]
    pub max_sessions: usize,

    /// Chat sessions idle for longer than this are dropped, in seconds
    #[clap(long, default_value = "3600")]
    pub session_idle_secs: u64,

    /// Discover the supervisor's capabilities before serving the first request
    #[clap(long)]
    pub discover_on_start: bool,
}

impl ConsoleConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_sessions: self.max_sessions,
            idle_timeout: Duration::from_secs(self.session_idle_secs),
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            model: self.model.clone(),
            max_iterations: self.max_iterations,
            system_prompt: self.system_prompt.clone(),
        }
    }
}
