//! Terminal tool — run shell commands in the sandbox.

use async_trait::async_trait;
use codeforge_core::error::ToolError;
use codeforge_core::sandbox::OutputBuffers;
use codeforge_core::tool::{Tool, ToolContext, ToolResult};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct TerminalArgs {
    command: String,
}

/// Execute a shell command in the run's sandbox.
///
/// Output streams into buffers owned here, so partial output survives a
/// failed command and can be reported back to the agent.
pub struct TerminalTool;

#[async_trait]
impl Tool for TerminalTool {
    fn name(&self) -> &str {
        "terminal"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the sandbox and return its stdout. Use this for installing dependencies, running builds, and inspecting the environment."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let args: TerminalArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        debug!(command = %args.command, "Running terminal command");

        let mut buffers = OutputBuffers::default();
        match ctx.sandbox.run_command(&args.command, &mut buffers).await {
            Ok(output) => {
                let stdout = if output.stdout.is_empty() {
                    buffers.stdout
                } else {
                    output.stdout
                };
                Ok(ToolResult::ok(stdout))
            }
            Err(e) => Ok(ToolResult::err(format!(
                "Command failed: {e}\nstdout: {}\nstderr: {}",
                buffers.stdout, buffers.stderr
            ))),
        }
    }
}
