//! Client agent that delegates to the supervisor's operations
//!
//! # Architecture
//!
//! ```text
//! SessionCache.get_or_init() ──first call──► CapabilityRegistry.discover()
//!        │                                          │
//!        │◄──── Arc<CapabilitySession> ─────────────┘ (cached for the process)
//!        ▼
//! CapabilitySession.run(request)
//!        │
//!        ├──► ModelBackend.chat(messages, tools)
//!        │          ↓
//!        │    Tool call: <operation>
//!        │          ↓
//!        ├──► CapabilityRegistry.invoke(operation, arguments)
//!        │          ↓
//!        │    Feed result back to the model → Loop or Complete
//!        ▼
//! RunReport { outcome, trace }
//! ```

pub mod cache;
pub mod session;
pub mod trace;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{InitError, SessionCache};
pub use session::{AgentConfig, CapabilitySession, ExecutionError, RunReport};
pub use trace::{ExecutionTrace, TraceSink};
