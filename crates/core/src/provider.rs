//! Provider trait: the abstraction over the LLM tool-calling service.
//!
//! A Provider takes the working message list, the system instructions, and
//! the tool schema, and returns one complete model turn. There is no partial
//! token handling at this layer: the agent loop suspends until the whole turn
//! has arrived.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{ChatMessage, ContentBlock};
use crate::tool::ToolCall;

/// A tool definition sent to the LLM so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub input_schema: serde_json::Value,
}

/// One request to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// The model to use (e.g., "claude-haiku-4-5-20251001")
    pub model: String,

    /// System instructions, sent outside the message list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// The working message list, oldest first
    pub messages: Vec<ChatMessage>,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Why the model stopped generating.
///
/// Only `ToolUse` changes what the agent loop does next; every other value is
/// treated as a final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

impl StopReason {
    pub fn wants_tools(&self) -> bool {
        matches!(self, Self::ToolUse)
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A complete model turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Provider-assigned message id
    pub id: String,

    /// Which model actually responded
    pub model: String,

    /// Content blocks in arrival order
    pub content: Vec<ContentBlock>,

    pub stop_reason: StopReason,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ModelResponse {
    /// Text fragments in arrival order.
    pub fn text_fragments(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Tool-use requests in arrival order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

/// The core Provider trait.
///
/// The agent loop calls `complete()` without knowing which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and wait for the complete model turn.
    async fn complete(&self, request: ModelRequest)
        -> std::result::Result<ModelResponse, ProviderError>;
}
