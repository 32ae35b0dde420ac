//! Tool trait: the abstraction over lookups the model may request.
//!
//! Tools are what let the agent answer from real data: order lookups,
//! customer disambiguation, product search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ToolError;
use crate::message::ContentBlock;
use crate::provider::ToolDefinition;

/// Content reported back to the model when it names a tool we don't have.
pub const UNKNOWN_TOOL: &str = "Unknown tool";

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_use id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub input: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result answers
    pub tool_use_id: String,

    /// Serialized outcome
    pub content: String,
}

impl From<ToolResult> for ContentBlock {
    fn from(result: ToolResult) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: result.tool_use_id,
            content: result.content,
        }
    }
}

/// The core Tool trait.
///
/// `execute` returns the serialized outcome the model will read. An `Err`
/// is reserved for failures the tool cannot classify (the data store is
/// down, say); those abort the current invocation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_order").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, input: serde_json::Value) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Resolve and execute tool calls the LLM requests
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    /// Registration order, so the schema sent to the model is stable.
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Get all tool definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.to_definition())
            .collect()
    }

    /// Execute a tool call.
    ///
    /// An unrecognized name is not an error: the call is answered with
    /// [`UNKNOWN_TOOL`] so the model can recover inside the conversation.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let content = match self.tools.get(&call.name) {
            Some(tool) => tool.execute(call.input.clone()).await?,
            None => {
                tracing::warn!(tool = %call.name, "Model requested an unknown tool");
                UNKNOWN_TOOL.to_string()
            }
        };
        Ok(ToolResult {
            tool_use_id: call.id.clone(),
            content,
        })
    }

    /// List all registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
