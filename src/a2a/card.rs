//! Agent card types served at `/.well-known/agent.json`
//!
//! Only the fields the console reads are modelled; unknown fields are ignored
//! so newer cards still parse.

use serde::{Deserialize, Serialize};

/// Public description of a remote agent and the skills it offers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON-RPC endpoint of the agent
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    #[serde(default)]
    pub default_input_modes: Vec<String>,
    #[serde(default)]
    pub default_output_modes: Vec<String>,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

/// Optional protocol features an agent advertises
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub push_notifications: bool,
    #[serde(default)]
    pub state_transition_history: bool,
}

/// A single skill; each one becomes a callable operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl AgentSkill {
    /// Description for the model, falling back to the display name
    pub fn summary(&self) -> String {
        let mut summary = self
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| self.name.clone());
        if !self.examples.is_empty() {
            summary.push_str(" Examples: ");
            summary.push_str(&self.examples.join("; "));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_parses_with_unknown_fields() {
        let json = r#"{
            "name": "Supervisor",
            "url": "http://localhost:5000/",
            "version": "0.1.0",
            "protocolVersion": "0.3.0",
            "capabilities": {"streaming": true},
            "defaultInputModes": ["text"],
            "defaultOutputModes": ["text"],
            "skills": [
                {"id": "search", "name": "Search", "description": "Web search", "tags": ["web"]},
                {"id": "summarize", "name": "Summarize"}
            ]
        }"#;

        let card: AgentCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.name, "Supervisor");
        assert!(card.capabilities.streaming);
        assert_eq!(card.skills.len(), 2);
        assert_eq!(card.skills[1].description, None);
    }

    #[test]
    fn test_missing_skills_defaults_to_empty() {
        let card: AgentCard = serde_json::from_str(r#"{"name": "Bare"}"#).unwrap();
        assert!(card.skills.is_empty());
        assert!(card.url.is_empty());
    }

    #[test]
    fn test_skill_summary() {
        let skill = AgentSkill {
            id: "summarize".to_string(),
            name: "Summarize".to_string(),
            description: None,
            tags: vec![],
            examples: vec!["summarize this page".to_string()],
        };
        assert_eq!(skill.summary(), "Summarize Examples: summarize this page");
    }
}
