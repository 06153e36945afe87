//! Session cache - one discovery per process
//!
//! The first caller performs discovery and binds the session; every later
//! caller gets the same outcome back, including a failed one. Concurrent
//! first callers wait on the same initialization instead of racing.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info};

use super::session::{AgentConfig, CapabilitySession};
use crate::a2a::CapabilityRegistry;
use crate::metrics::{DISCOVERED_OPERATIONS, DISCOVERY_ATTEMPTS};
use crate::ollama::ModelBackend;

/// Why no session could be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// The registry could not be reached or answered garbage
    DiscoveryFailed { endpoint: String, detail: String },
    /// The registry answered but offers no operations
    NoCapabilitiesFound { endpoint: String },
}

impl InitError {
    pub fn endpoint(&self) -> &str {
        match self {
            InitError::DiscoveryFailed { endpoint, .. } => endpoint,
            InitError::NoCapabilitiesFound { endpoint } => endpoint,
        }
    }

    /// Lines shown in the blocking error banner
    pub fn banner(&self) -> Vec<String> {
        match self {
            InitError::DiscoveryFailed { endpoint, detail } => vec![
                format!("Failed to connect to Supervisor Agent at {}.", endpoint),
                "Please ensure the supervisor agent is running.".to_string(),
                format!("Details: {}", detail),
            ],
            InitError::NoCapabilitiesFound { endpoint } => vec![
                format!("No tools discovered from the agent at {}.", endpoint),
                "Ensure the Supervisor Agent has defined tools.".to_string(),
            ],
        }
    }
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::DiscoveryFailed { endpoint, detail } => {
                write!(f, "Failed to connect to Supervisor Agent at {}: {}", endpoint, detail)
            }
            InitError::NoCapabilitiesFound { endpoint } => {
                write!(f, "No tools discovered from the agent at {}", endpoint)
            }
        }
    }
}

impl std::error::Error for InitError {}

/// Lazily-initialized, process-wide session slot
pub struct SessionCache {
    registry: Arc<dyn CapabilityRegistry>,
    backend: Arc<dyn ModelBackend>,
    config: AgentConfig,
    slot: OnceCell<Result<Arc<CapabilitySession>, InitError>>,
}

impl SessionCache {
    pub fn new(
        registry: Arc<dyn CapabilityRegistry>,
        backend: Arc<dyn ModelBackend>,
        config: AgentConfig,
    ) -> Self {
        Self {
            registry,
            backend,
            config,
            slot: OnceCell::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.registry.endpoint()
    }

    /// Return the session, discovering it on the first call
    pub async fn get_or_init(&self) -> Result<Arc<CapabilitySession>, InitError> {
        self.slot.get_or_init(|| self.initialize()).await.clone()
    }

    /// The cached outcome, if discovery has already happened
    pub fn peek(&self) -> Option<&Result<Arc<CapabilitySession>, InitError>> {
        self.slot.get()
    }

    async fn initialize(&self) -> Result<Arc<CapabilitySession>, InitError> {
        let endpoint = self.registry.endpoint().to_string();
        info!(endpoint = %endpoint, "Attempting to discover agent");

        let discovery = match self.registry.discover().await {
            Ok(discovery) => discovery,
            Err(e) => {
                DISCOVERY_ATTEMPTS.with_label_values(&["failed"]).inc();
                error!(endpoint = %endpoint, error = %e, "Failed to connect to supervisor agent");
                return Err(InitError::DiscoveryFailed {
                    endpoint,
                    detail: e.to_string(),
                });
            }
        };

        match CapabilitySession::bind(
            discovery,
            Arc::clone(&self.registry),
            Arc::clone(&self.backend),
            self.config.clone(),
        ) {
            Ok(session) => {
                DISCOVERY_ATTEMPTS.with_label_values(&["success"]).inc();
                DISCOVERED_OPERATIONS.set(session.operations().len() as f64);
                info!(
                    endpoint = %endpoint,
                    agent = %session.agent_name(),
                    "Successfully discovered the following capabilities:"
                );
                for op in session.operations() {
                    info!(operation = %op.name, "- {}", op.description);
                }
                Ok(Arc::new(session))
            }
            Err(e) => {
                DISCOVERY_ATTEMPTS.with_label_values(&["no_capabilities"]).inc();
                error!(endpoint = %endpoint, "No tools discovered from the agent");
                Err(e)
            }
        }
    }
}
