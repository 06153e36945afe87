//! Ollama LLM integration module
//!
//! The client agent's model runs on Ollama and is driven through the
//! `/api/chat` endpoint with native tool calling.

pub mod tool_use;

pub use tool_use::{
    parse_tool_calls_from_text, ChatClient, ChatError, ChatMessage, ChatResponse, ModelBackend,
    Tool, ToolCall, ToolFunction, DEFAULT_AGENT_SYSTEM_PROMPT,
};
