//! a2a-console - chat front end for a multi-agent A2A supervisor
//!
//! The console discovers the operations a supervisor agent exposes over the
//! A2A protocol, binds them as tools to a local Ollama model, and serves a
//! chat page where each user request runs through a tool-calling loop.
//!
//! # Modules
//!
//! - `a2a` - A2A client, agent card types, and the capability registry
//! - `ollama` - Ollama chat client with tool calling
//! - `agent` - session cache and the tool-calling agent loop
//! - `chat` - per-user conversation log and request handler
//! - `web` - axum chat UI and JSON API
//! - `config` - command-line / environment configuration
//! - `metrics` - Prometheus metrics for observability
//! - `tracing` - logging and optional OpenTelemetry export
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use a2a_console::{A2aClient, A2aRegistry, AgentConfig, ChatClient, ChatSession, SessionCache};
//!
//! let registry = A2aRegistry::new(A2aClient::new("http://localhost:5000", timeout)?);
//! let backend = ChatClient::new("http://localhost:11434", timeout)?;
//! let cache = Arc::new(SessionCache::new(Arc::new(registry), Arc::new(backend), AgentConfig::default()));
//!
//! let mut chat = ChatSession::new(cache);
//! let view = chat.submit("find and summarize the latest release notes").await?;
//! println!("{}", view.reply);
//! ```

pub mod a2a;
pub mod agent;
pub mod chat;
pub mod config;
pub mod metrics;
pub mod ollama;
pub mod tracing;
pub mod web;

// Re-export commonly used types at crate root for convenience
pub use a2a::{A2aClient, A2aRegistry, CapabilityRegistry};
pub use agent::{AgentConfig, CapabilitySession, InitError, SessionCache};
pub use chat::{ChatSession, ConversationLog, HandlerError};
pub use config::ConsoleConfig;
pub use ollama::{ChatClient, ModelBackend};
