//! Integration tests for the agent system
//!
//! These tests verify configuration, tool definitions, and the full
//! discover → tool call → reply flow against stubbed HTTP services.
//! Tests that need a real supervisor and Ollama are marked #[ignore].

use std::sync::Arc;
use std::time::Duration;

use a2a_console::a2a::NamedOperation;
use a2a_console::agent::AgentConfig;
use a2a_console::chat::{ConversationLog, HandlerError, RequestHandler};
use a2a_console::ollama::tool_use::{ChatMessage, Tool, ToolFunction};
use a2a_console::{A2aClient, A2aRegistry, ChatClient, InitError, SessionCache};
use mockito::Matcher;
use serde_json::json;

/// Test that AgentConfig has sensible defaults
#[test]
fn test_agent_config_defaults() {
    let config = AgentConfig::default();

    assert_eq!(config.model, "qwen3");
    assert_eq!(config.max_iterations, 10);
    assert!(config.system_prompt.is_none());
}

/// Test that AgentConfig can be customized
#[test]
fn test_agent_config_custom() {
    let config = AgentConfig {
        model: "llama3.2".to_string(),
        max_iterations: 5,
        system_prompt: Some("You are a helpful assistant.".to_string()),
    };

    assert_eq!(config.model, "llama3.2");
    assert_eq!(config.max_iterations, 5);
}

/// Test ChatMessage construction with helper methods
#[test]
fn test_chat_message_construction() {
    let user_msg = ChatMessage::user("Hello, world!");
    assert_eq!(user_msg.role, "user");
    assert_eq!(user_msg.content, "Hello, world!");
    assert!(user_msg.tool_calls.is_none());

    assert_eq!(ChatMessage::system("You are helpful.").role, "system");
    assert_eq!(ChatMessage::assistant("I can help!").role, "assistant");
    assert_eq!(ChatMessage::tool("Result: 42").role, "tool");
}

/// Test that a discovered operation becomes a function tool
#[test]
fn test_tool_from_operation() {
    let op = NamedOperation {
        name: "summarize".to_string(),
        description: "Summarize a document".to_string(),
        parameters: json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"]
        }),
        route: "summarize".to_string(),
    };

    let tool = Tool::from(&op);
    assert_eq!(tool.tool_type, "function");
    assert_eq!(tool.function.name, "summarize");
    assert_eq!(tool.function.parameters["required"][0], "message");
}

/// Test Tool serialization to JSON
#[test]
fn test_tool_serialization() {
    let tool = Tool {
        tool_type: "function".to_string(),
        function: ToolFunction {
            name: "test_func".to_string(),
            description: "A test function".to_string(),
            parameters: json!({"type": "object"}),
        },
    };

    let json = serde_json::to_string(&tool).unwrap();
    assert!(json.contains("\"type\":\"function\""));
    assert!(json.contains("\"name\":\"test_func\""));
}

/// Test ChatMessage serialization
#[test]
fn test_chat_message_serialization() {
    let msg = ChatMessage::user("test message");
    let json = serde_json::to_string(&msg).unwrap();

    assert!(json.contains("\"role\":\"user\""));
    assert!(json.contains("\"content\":\"test message\""));
    // tool_calls should be skipped when None
    assert!(!json.contains("tool_calls"));
}

fn card(url: &str) -> String {
    json!({
        "name": "Supervisor",
        "url": format!("{}/", url),
        "version": "1.0.0",
        "skills": [
            { "id": "search", "name": "Search", "description": "Search the web" },
            { "id": "summarize", "name": "Summarize", "description": "Summarize text" }
        ]
    })
    .to_string()
}

fn cache(supervisor: &str, ollama: &str) -> SessionCache {
    let timeout = Duration::from_secs(5);
    SessionCache::new(
        Arc::new(A2aRegistry::new(A2aClient::new(supervisor, timeout).unwrap())),
        Arc::new(ChatClient::new(ollama, timeout).unwrap()),
        AgentConfig::default(),
    )
}

/// Discover over HTTP, call one remote skill, answer with its result
#[tokio::test]
async fn test_run_against_stubbed_services() {
    let mut supervisor = mockito::Server::new_async().await;
    let mut ollama = mockito::Server::new_async().await;

    let card_mock = supervisor
        .mock("GET", "/.well-known/agent.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(card(&supervisor.url()))
        .expect(1)
        .create_async()
        .await;

    let skill_mock = supervisor
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "message/send",
            "params": { "metadata": { "skill": "search" } }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "kind": "message",
                    "role": "agent",
                    "messageId": "m-1",
                    "parts": [{ "kind": "text", "text": "3 results for X" }]
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    // First model call: only the user's message so far
    let plan_mock = ollama
        .mock("POST", "/api/chat")
        .match_body(Matcher::Regex(r#""role":"user"\}\]"#.to_string()))
        .with_status(200)
        .with_body(
            json!({
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{
                        "function": { "name": "search", "arguments": { "message": "X" } }
                    }]
                },
                "done": true
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    // Second model call: the tool result is the last message
    let answer_mock = ollama
        .mock("POST", "/api/chat")
        .match_body(Matcher::Regex(r#""role":"tool"\}\]"#.to_string()))
        .with_status(200)
        .with_body(
            json!({
                "message": { "role": "assistant", "content": "Found 3 results for X." },
                "done": true
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let cache = cache(&supervisor.url(), &ollama.url());
    let session = cache.get_or_init().await.unwrap();
    assert_eq!(session.operation_names(), vec!["search", "summarize"]);

    let report = session.run("search for X").await;
    assert_eq!(report.outcome.unwrap(), "Found 3 results for X.");
    assert_eq!(report.tool_calls_made, 1);
    assert!(report.trace.as_str().contains("3 results for X"));

    // Second lookup reuses the session
    cache.get_or_init().await.unwrap();

    card_mock.assert_async().await;
    skill_mock.assert_async().await;
    plan_mock.assert_async().await;
    answer_mock.assert_async().await;
}

/// An unreachable card is reported with the endpoint that was tried
#[tokio::test]
async fn test_card_error_is_discovery_failure() {
    let mut supervisor = mockito::Server::new_async().await;
    supervisor
        .mock("GET", "/.well-known/agent.json")
        .with_status(500)
        .create_async()
        .await;

    let cache = cache(&supervisor.url(), "http://127.0.0.1:9");
    match cache.get_or_init().await {
        Err(InitError::DiscoveryFailed { endpoint, .. }) => {
            assert_eq!(endpoint, supervisor.url());
        }
        other => panic!("unexpected: {:?}", other),
    }
}

/// Nothing listens on the discard port, so the first turn fails discovery
#[tokio::test]
async fn test_closed_port_makes_handler_unavailable() {
    let closed = "http://127.0.0.1:9";
    let mut handler = RequestHandler::new(Arc::new(cache(closed, closed)));
    let mut log = ConversationLog::new();

    let error = match handler.handle("hello", &mut log).await {
        Err(HandlerError::Unavailable(e @ InitError::DiscoveryFailed { .. })) => e,
        other => panic!("unexpected: {:?}", other),
    };
    let banner = error.banner();
    assert!(banner[0].starts_with("Failed to connect to Supervisor Agent at http://127.0.0.1:9"));
    assert!(banner[2].starts_with("Details: "));
    assert!(!banner[2].contains("Parse error"));
    assert!(handler.is_unavailable());

    assert!(matches!(
        handler.handle("hello again", &mut log).await,
        Err(HandlerError::Unavailable(_))
    ));
    assert!(log.is_empty());
}

/// Test a live run (requires a supervisor on :5000 and Ollama)
#[tokio::test]
#[ignore = "Requires a running supervisor agent and Ollama"]
async fn test_live_supervisor() {
    let cache = cache("http://localhost:5000", "http://localhost:11434");
    let session = cache.get_or_init().await.unwrap();
    let report = session.run("What can you do?").await;
    assert!(report.outcome.is_ok());
}
