//! A2A (agent-to-agent) integration
//!
//! The supervisor agent is reached over HTTP:
//!
//! ```text
//! discover ──GET /.well-known/agent.json──► AgentCard ──► skills → operations
//! invoke   ──POST message/send (JSON-RPC)─► Message | Task ──► reply text
//! ```

pub mod card;
pub mod client;
pub mod registry;

pub use card::{AgentCapabilities, AgentCard, AgentSkill};
pub use client::{A2aClient, ClientError};
pub use registry::{A2aRegistry, CapabilityRegistry, Discovery, NamedOperation};
