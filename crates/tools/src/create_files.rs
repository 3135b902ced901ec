//! File creation tool — write a batch of files to the sandbox and record
//! them in the shared agent state.

use async_trait::async_trait;
use codeforge_core::error::ToolError;
use codeforge_core::tool::{Tool, ToolContext, ToolResult};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct FileSpec {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CreateFilesArgs {
    files: Vec<FileSpec>,
}

/// Create or update files in the sandbox.
///
/// The batch is atomic with respect to the in-memory file map: the map is
/// merged only after every sandbox write succeeded, so the reported state
/// never includes content from a batch that failed partway. Sandbox-side
/// writes that happened before the failure are NOT rolled back — on-disk
/// state and the file map can diverge after a partial failure.
pub struct CreateOrUpdateFilesTool;

#[async_trait]
impl Tool for CreateOrUpdateFilesTool {
    fn name(&self) -> &str {
        "create_or_update_files"
    }

    fn description(&self) -> &str {
        "Create or overwrite files in the sandbox. Takes a list of {path, content} entries; parent directories are created as needed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "files": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "path": { "type": "string" },
                            "content": { "type": "string" }
                        },
                        "required": ["path", "content"]
                    }
                }
            },
            "required": ["files"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let args: CreateFilesArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        debug!(count = args.files.len(), "Writing file batch");

        let mut written = Vec::with_capacity(args.files.len());
        for file in &args.files {
            if let Err(e) = ctx.sandbox.write_file(&file.path, &file.content).await {
                return Ok(ToolResult::err(format!(
                    "Failed to write {}: {e}",
                    file.path
                )));
            }
            written.push((file.path.clone(), file.content.clone()));
        }

        let paths: Vec<&str> = written.iter().map(|(p, _)| p.as_str()).collect();
        let summary = format!("Updated {} file(s): {}", written.len(), paths.join(", "));

        ctx.state.lock().await.merge_files(written);

        Ok(ToolResult::ok(summary))
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
    async fn successful_batch_merges_into_state() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(&dir);

        let result = CreateOrUpdateFilesTool
            .execute(
                serde_json::json!({"files": [
                    {"path": "a.txt", "content": "1"},
                    {"path": "b.txt", "content": "2"}
                ]}),
                &ctx,
            )
            .await
            .unwrap();

        assert!(!result.is_error());
        assert!(result.output.contains("2 file(s)"));

        let state = ctx.state.lock().await;
        assert_eq!(state.files()["a.txt"], "1");
        assert_eq!(state.files()["b.txt"], "2");
    }

    #[tokio::test]
    async fn partial_failure_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(&dir);

        // Second write escapes the sandbox root and fails.
        let result = CreateOrUpdateFilesTool
            .execute(
                serde_json::json!({"files": [
                    {"path": "a.txt", "content": "1"},
                    {"path": "../escape.txt", "content": "2"}
                ]}),
                &ctx,
            )
            .await
            .unwrap();

        assert!(result.is_error());
        assert!(result.text().contains("../escape.txt"));

        // In-memory map untouched; the first sandbox write is not rolled back.
        assert!(ctx.state.lock().await.files().is_empty());
        assert!(dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn overwrite_wins_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(&dir);

        for content in ["old", "new"] {
            CreateOrUpdateFilesTool
                .execute(
                    serde_json::json!({"files": [{"path": "app.ts", "content": content}]}),
                    &ctx,
                )
                .await
                .unwrap();
        }

        assert_eq!(ctx.state.lock().await.files()["app.ts"], "new");
    }

    #[tokio::test]
    async fn concurrent_batches_lose_no_updates() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(&dir);

        // Disjoint paths plus one overlapping path, dispatched concurrently
        // as two calls of the same step would be.
        let left = CreateOrUpdateFilesTool.execute(
            serde_json::json!({"files": [
                {"path": "left.txt", "content": "l"},
                {"path": "shared.txt", "content": "from-left"}
            ]}),
            &ctx,
        );
        let right = CreateOrUpdateFilesTool.execute(
            serde_json::json!({"files": [
                {"path": "right.txt", "content": "r"},
                {"path": "shared.txt", "content": "from-right"}
            ]}),
            &ctx,
        );

        let (a, b) = tokio::join!(left, right);
        assert!(!a.unwrap().is_error());
        assert!(!b.unwrap().is_error());

        let state = ctx.state.lock().await;
        assert_eq!(state.files()["left.txt"], "l");
        assert_eq!(state.files()["right.txt"], "r");
        // One of the two writers wins the overlapping path; neither is lost.
        let shared = &state.files()["shared.txt"];
        assert!(shared == "from-left" || shared == "from-right");
        assert_eq!(state.files().len(), 3);
    }

    #[tokio::test]
    async fn malformed_arguments_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = CreateOrUpdateFilesTool
            .execute(serde_json::json!({"files": "not-a-list"}), &ctx(&dir))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
