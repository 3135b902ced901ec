//! Tool trait — the actions the agent may request.
//!
//! Tools are what give the agent the ability to act on the sandbox:
//! run commands, write files, read files, list directories. Every tool
//! failure is converted into data at the registry boundary so a single
//! failing call never terminates a run.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use crate::sandbox::SandboxHandle;
use crate::state::SharedState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution, returned into the conversation.
///
/// Failures are data: a handler that fails produces a result with `error`
/// set so the agent can see what went wrong and react.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output content
    pub output: String,

    /// Set when the call failed; contains a descriptive message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The text fed back into the conversation: the error message if the
    /// call failed, the output otherwise.
    pub fn text(&self) -> &str {
        self.error.as_deref().unwrap_or(&self.output)
    }
}

/// What a tool handler gets to work with: the run's sandbox and the shared
/// agent state behind its run-scoped lock.
#[derive(Clone)]
pub struct ToolContext {
    pub sandbox: Arc<dyn SandboxHandle>,
    pub state: SharedState,
}

/// The core Tool trait.
///
/// Each tool (terminal, create_or_update_files, read_files, list_files)
/// implements this trait. Tools are registered in the ToolRegistry and made
/// available to the agent loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "terminal").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    ///
    /// An `Err` here means the handler could not produce a result at all
    /// (bad arguments, internal failure); the registry converts it into an
    /// error-bearing [`ToolResult`] — it never escapes to the run loop.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Look up and execute tools when the LLM requests them
///
/// The catalog is immutable for the duration of a run.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Duplicate names are a configuration error, caught
    /// at setup time rather than at call time.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Execute a tool call. Infallible from the caller's perspective:
    /// unknown names, invalid arguments, and handler failures all come back
    /// as error-bearing results the agent can react to.
    pub async fn dispatch(&self, call: &ToolCall, ctx: &ToolContext) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "Unknown tool requested");
            return ToolResult::err(format!("Unknown tool: {}", call.name));
        };

        match tool.execute(call.arguments.clone(), ctx).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolResult::err(e.to_string())
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
