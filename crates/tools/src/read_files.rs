//! File read tool — read a batch of sandbox files.

use async_trait::async_trait;
use codeforge_core::error::ToolError;
use codeforge_core::tool::{Tool, ToolContext, ToolResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ReadFilesArgs {
    paths: Vec<String>,
}

/// Read files from the sandbox.
///
/// Each path is read independently: a per-file failure records an error
/// string in place of that file's content and the remaining paths are still
/// read. The call itself never fails.
pub struct ReadFilesTool;

#[async_trait]
impl Tool for ReadFilesTool {
    fn name(&self) -> &str {
        "read_files"
    }

    fn description(&self) -> &str {
        "Read the contents of one or more files in the sandbox. Returns a JSON object mapping each path to its content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "paths": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "The file paths to read"
                }
            },
            "required": ["paths"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let args: ReadFilesArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let mut contents = serde_json::Map::new();
        for path in &args.paths {
            let value = match ctx.sandbox.read_file(path).await {
                Ok(content) => content,
                Err(e) => format!("Error: {e}"),
            };
            contents.insert(path.clone(), serde_json::Value::String(value));
        }

        let output = serde_json::to_string_pretty(&serde_json::Value::Object(contents))
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "read_files".into(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult::ok(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeforge_core::state;
    use codeforge_sandbox::LocalSandbox;
    use std::sync::Arc;

    fn ctx(dir: &tempfile::TempDir) -> ToolContext {
        ToolContext {
            sandbox: Arc::new(LocalSandbox::new("test", dir.path())),
            state: state::shared(),
        }
    }

    #[tokio::test]
    async fn reads_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), "content-x").unwrap();

        let result = ReadFilesTool
            .execute(serde_json::json!({"paths": ["x.txt"]}), &ctx(&dir))
            .await
            .unwrap();

        assert!(!result.is_error());
        let parsed: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(parsed["x.txt"], "content-x");
    }

    #[tokio::test]
    async fn missing_file_recorded_in_place_others_still_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), "content-x").unwrap();

        let result = ReadFilesTool
            .execute(
                serde_json::json!({"paths": ["x.txt", "y.txt"]}),
                &ctx(&dir),
            )
            .await
            .unwrap();

        assert!(!result.is_error());
        let parsed: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(parsed["x.txt"], "content-x");
        assert!(parsed["y.txt"].as_str().unwrap().starts_with("Error:"));
    }

    #[tokio::test]
    async fn missing_paths_argument() {
        let dir = tempfile::tempdir().unwrap();
        let result = ReadFilesTool
            .execute(serde_json::json!({}), &ctx(&dir))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
