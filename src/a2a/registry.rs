//! Remote capability registry
//!
//! A registry answers two questions: which operations can be called, and what
//! happens when one is called. `A2aRegistry` answers both by talking to an A2A
//! supervisor: its agent card lists the skills, and `message/send` runs them.

use std::collections::HashSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::card::{AgentCard, AgentSkill};
use super::client::{A2aClient, ClientError};

/// A remotely-invocable operation offered by a registry
#[derive(Debug, Clone, PartialEq)]
pub struct NamedOperation {
    /// Tool name shown to the model (`[A-Za-z0-9_-]` only)
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments
    pub parameters: Value,
    /// Registry-specific routing key (the skill id for A2A)
    pub route: String,
}

/// Result of a discovery call
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Display name of the remote agent
    pub agent_name: String,
    pub operations: Vec<NamedOperation>,
}

/// A source of callable operations
#[async_trait]
pub trait CapabilityRegistry: Send + Sync {
    /// Address the registry is discovered from, for display
    fn endpoint(&self) -> &str;

    /// Query the registry for the operations it exposes
    async fn discover(&self) -> Result<Discovery, ClientError>;

    /// Invoke a discovered operation and return its textual result
    async fn invoke(&self, operation: &NamedOperation, arguments: &Value)
        -> Result<String, ClientError>;
}

/// Registry backed by a single A2A supervisor agent
pub struct A2aRegistry {
    client: A2aClient,
    /// JSON-RPC endpoint from the card, set by the first successful discovery
    rpc_url: OnceLock<String>,
}

impl A2aRegistry {
    pub fn new(client: A2aClient) -> Self {
        Self {
            client,
            rpc_url: OnceLock::new(),
        }
    }

    fn rpc_url(&self) -> String {
        self.rpc_url
            .get()
            .cloned()
            .unwrap_or_else(|| format!("{}/", self.client.base_url()))
    }
}

#[async_trait]
impl CapabilityRegistry for A2aRegistry {
    fn endpoint(&self) -> &str {
        self.client.base_url()
    }

    async fn discover(&self) -> Result<Discovery, ClientError> {
        let card = self.client.get_agent_card().await?;
        if !card.url.is_empty() {
            let _ = self.rpc_url.set(card.url.clone());
        }
        info!(
            agent = %card.name,
            version = %card.version,
            skills = card.skills.len(),
            "Fetched agent card"
        );
        Ok(discovery_from_card(&card))
    }

    async fn invoke(
        &self,
        operation: &NamedOperation,
        arguments: &Value,
    ) -> Result<String, ClientError> {
        let message = message_argument(arguments);
        debug!(operation = %operation.name, skill = %operation.route, "Invoking remote skill");
        self.client
            .send_message(&self.rpc_url(), &message, Some(&operation.route))
            .await
    }
}

/// Map every skill on the card to an operation
pub fn discovery_from_card(card: &AgentCard) -> Discovery {
    let mut seen = HashSet::new();
    let operations = card
        .skills
        .iter()
        .map(|skill| operation_for_skill(skill, &mut seen))
        .collect();

    Discovery {
        agent_name: card.name.clone(),
        operations,
    }
}

fn operation_for_skill(skill: &AgentSkill, seen: &mut HashSet<String>) -> NamedOperation {
    let base = tool_name(&skill.id);
    let mut name = base.clone();
    let mut n = 2;
    while !seen.insert(name.clone()) {
        name = format!("{}_{}", base, n);
        n += 1;
    }

    NamedOperation {
        name,
        description: skill.summary(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "Natural-language instruction for this skill"
                }
            },
            "required": ["message"]
        }),
        route: skill.id.clone(),
    }
}

/// Sanitize an identifier into a tool name models accept
pub fn tool_name(id: &str) -> String {
    let name: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        "skill".to_string()
    } else {
        name
    }
}

/// The text to send for a call; falls back to the raw arguments
fn message_argument(arguments: &Value) -> String {
    match arguments.get("message").and_then(Value::as_str) {
        Some(text) => text.to_string(),
        None => match arguments {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn skill(id: &str) -> AgentSkill {
        AgentSkill {
            id: id.to_string(),
            name: id.to_string(),
            description: Some(format!("{} skill", id)),
            tags: vec![],
            examples: vec![],
        }
    }

    #[test]
    fn test_tool_name_sanitizes() {
        assert_eq!(tool_name("web.search v2"), "web_search_v2");
        assert_eq!(tool_name("summarize"), "summarize");
        assert_eq!(tool_name(""), "skill");
    }

    #[test]
    fn test_duplicate_names_are_suffixed() {
        let card = AgentCard {
            name: "Supervisor".to_string(),
            description: None,
            url: String::new(),
            version: String::new(),
            capabilities: Default::default(),
            default_input_modes: vec![],
            default_output_modes: vec![],
            skills: vec![skill("a.b"), skill("a_b"), skill("c")],
        };

        let discovery = discovery_from_card(&card);
        let names: Vec<_> = discovery.operations.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a_b", "a_b_2", "c"]);
        assert_eq!(discovery.operations[1].route, "a_b");
        assert_eq!(discovery.agent_name, "Supervisor");
    }

    #[test]
    fn test_message_argument() {
        assert_eq!(message_argument(&json!({"message": "hi"})), "hi");
        assert_eq!(message_argument(&json!("plain")), "plain");
        assert_eq!(message_argument(&json!({"query": "x"})), r#"{"query":"x"}"#);
    }

    #[tokio::test]
    async fn test_discover_then_invoke_uses_card_url() {
        let mut server = Server::new_async().await;
        let rpc_url = format!("{}/rpc", server.url());
        let card = json!({
            "name": "Supervisor",
            "url": rpc_url,
            "skills": [{"id": "search", "name": "Search"}, {"id": "summarize", "name": "Summarize"}]
        });
        let _card = server
            .mock("GET", "/.well-known/agent.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(card.to_string())
            .create_async()
            .await;
        let rpc = server
            .mock("POST", "/rpc")
            .match_body(Matcher::PartialJson(json!({"params": {"metadata": {"skill": "summarize"}}})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc": "2.0", "id": 1, "result": {"kind": "message", "parts": [{"kind": "text", "text": "summary"}]}}"#)
            .create_async()
            .await;

        let registry = A2aRegistry::new(A2aClient::new(server.url(), Duration::from_secs(5)).unwrap());
        let discovery = registry.discover().await.unwrap();
        assert_eq!(discovery.operations.len(), 2);

        let reply = registry
            .invoke(&discovery.operations[1], &json!({"message": "summarize X"}))
            .await
            .unwrap();
        assert_eq!(reply, "summary");
        rpc.assert_async().await;
    }
}
