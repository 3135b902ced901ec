//! Directory listing tool.

use async_trait::async_trait;
use codeforge_core::error::ToolError;
use codeforge_core::tool::{Tool, ToolContext, ToolResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ListFilesArgs {
    #[serde(default = "default_path")]
    path: String,
}

fn default_path() -> String {
    ".".into()
}

/// List a sandbox directory.
pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List the entries of a directory in the sandbox. Defaults to the sandbox root."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The directory to list (default: \".\")"
                }
            }
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        // Some models omit arguments entirely for parameterless calls.
        let arguments = if arguments.is_null() {
            serde_json::json!({})
        } else {
            arguments
        };
        let args: ListFilesArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        match ctx.sandbox.list_dir(&args.path).await {
            Ok(entries) => {
                let output = serde_json::to_string_pretty(&entries).map_err(|e| {
                    ToolError::ExecutionFailed {
                        tool_name: "list_files".into(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(ToolResult::ok(output))
            }
            Err(e) => Ok(ToolResult::err(format!(
                "Failed to list {}: {e}",
                args.path
            ))),
        }
    }
}
