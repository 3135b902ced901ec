//! Process-local sandbox — a scoped directory plus `sh -c`.
//!
//! Not isolated the way the remote service is; intended for development and
//! tests. Paths are confined to the sandbox root: absolute paths and `..`
//! components are rejected.

use async_trait::async_trait;
use codeforge_core::error::SandboxError;
use codeforge_core::sandbox::{
    CommandOutput, CommandSink, DirEntry, OutputStream, SandboxClient, SandboxHandle,
};
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Provisions local sandboxes as subdirectories of a root.
pub struct LocalSandboxClient {
    root: PathBuf,
}

impl LocalSandboxClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl SandboxClient for LocalSandboxClient {
    async fn create(&self, template: &str) -> Result<String, SandboxError> {
        let id = uuid::Uuid::new_v4().to_string();
        let dir = self.root.join(&id);
        debug!(template, sandbox = %id, "Creating local sandbox");

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SandboxError::Provision(e.to_string()))?;
        Ok(id)
    }

    async fn connect(&self, sandbox_id: &str) -> Result<Arc<dyn SandboxHandle>, SandboxError> {
        let dir = self.root.join(sandbox_id);
        if !dir.is_dir() {
            return Err(SandboxError::Connect {
                sandbox_id: sandbox_id.to_string(),
                reason: "no such sandbox directory".into(),
            });
        }
        Ok(Arc::new(LocalSandbox::new(sandbox_id, dir)))
    }
}

/// A connected local sandbox.
pub struct LocalSandbox {
    id: String,
    dir: PathBuf,
}

impl LocalSandbox {
    pub fn new(id: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            dir: dir.into(),
        }
    }

    /// Resolve a sandbox-relative path, rejecting escapes.
    fn resolve(&self, path: &str) -> Result<PathBuf, SandboxError> {
        let rel = Path::new(path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(SandboxError::File {
                path: path.to_string(),
                reason: "path escapes sandbox root".into(),
            });
        }
        Ok(self.dir.join(rel))
    }

    fn file_error(path: &str, reason: impl std::fmt::Display) -> SandboxError {
        SandboxError::File {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl SandboxHandle for LocalSandbox {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run_command(
        &self,
        command: &str,
        sink: &mut dyn CommandSink,
    ) -> Result<CommandOutput, SandboxError> {
        debug!(sandbox = %self.id, command, "Executing local command");

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SandboxError::Transport(format!("spawn failed: {e}")))?;

        let mut child_stdout = child
            .stdout
            .take()
            .ok_or_else(|| SandboxError::Transport("stdout pipe unavailable".into()))?;
        let mut child_stderr = child
            .stderr
            .take()
            .ok_or_else(|| SandboxError::Transport("stderr pipe unavailable".into()))?;

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut out_buf = [0u8; 4096];
        let mut err_buf = [0u8; 4096];
        let mut out_done = false;
        let mut err_done = false;

        // Drain both pipes as chunks arrive so the sink sees output
        // incrementally rather than once at exit.
        while !(out_done && err_done) {
            tokio::select! {
                read = child_stdout.read(&mut out_buf), if !out_done => {
                    match read {
                        Ok(0) => out_done = true,
                        Ok(n) => {
                            let chunk = String::from_utf8_lossy(&out_buf[..n]).into_owned();
                            sink.on_chunk(OutputStream::Stdout, &chunk);
                            stdout.push_str(&chunk);
                        }
                        Err(e) => return Err(SandboxError::Transport(e.to_string())),
                    }
                }
                read = child_stderr.read(&mut err_buf), if !err_done => {
                    match read {
                        Ok(0) => err_done = true,
                        Ok(n) => {
                            let chunk = String::from_utf8_lossy(&err_buf[..n]).into_owned();
                            sink.on_chunk(OutputStream::Stderr, &chunk);
                            stderr.push_str(&chunk);
                        }
                        Err(e) => return Err(SandboxError::Transport(e.to_string())),
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| SandboxError::Transport(e.to_string()))?;

        match status.code() {
            Some(0) => Ok(CommandOutput {
                stdout,
                stderr,
                exit_code: 0,
            }),
            code => {
                warn!(sandbox = %self.id, exit_code = ?code, "Command failed");
                Err(SandboxError::CommandFailed { exit_code: code })
            }
        }
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), SandboxError> {
        let full = self.resolve(path)?;

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::file_error(path, e))?;
        }

        tokio::fs::write(&full, content)
            .await
            .map_err(|e| Self::file_error(path, e))
    }

    async fn read_file(&self, path: &str) -> Result<String, SandboxError> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| Self::file_error(path, e))
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, SandboxError> {
        let full = self.resolve(path)?;

        let mut read_dir = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| Self::file_error(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| Self::file_error(path, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn public_host(&self, port: u16) -> Result<String, SandboxError> {
        // Local sandboxes are only reachable on loopback.
        Ok(format!("127.0.0.1:{port}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeforge_core::sandbox::OutputBuffers;

    fn sandbox(dir: &tempfile::TempDir) -> LocalSandbox {
        LocalSandbox::new("test", dir.path())
    }

    #[tokio::test]
    async fn run_echo_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let sb = sandbox(&dir);

        let mut buffers = OutputBuffers::default();
        let output = sb.run_command("echo hello", &mut buffers).await.unwrap();

        assert_eq!(output.exit_code, 0);
        assert!(output.stdout.contains("hello"));
        assert!(buffers.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn failing_command_reports_exit_code_and_streams_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let sb = sandbox(&dir);

        let mut buffers = OutputBuffers::default();
        let err = sb
            .run_command("echo oops >&2; exit 3", &mut buffers)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SandboxError::CommandFailed { exit_code: Some(3) }
        ));
        assert!(buffers.stderr.contains("oops"));
    }

    #[tokio::test]
    async fn write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let sb = sandbox(&dir);

        sb.write_file("src/app.tsx", "export default {}")
            .await
            .unwrap();
        let content = sb.read_file("src/app.tsx").await.unwrap();
        assert_eq!(content, "export default {}");
    }

    #[tokio::test]
    async fn read_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let sb = sandbox(&dir);

        let err = sb.read_file("nope.txt").await.unwrap_err();
        assert!(matches!(err, SandboxError::File { .. }));
    }

    #[tokio::test]
    async fn list_dir_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let sb = sandbox(&dir);

        sb.write_file("b.txt", "2").await.unwrap();
        sb.write_file("a.txt", "1").await.unwrap();
        sb.write_file("nested/c.txt", "3").await.unwrap();

        let entries = sb.list_dir(".").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "nested"]);
        assert!(entries[2].is_dir);
    }

    #[tokio::test]
    async fn path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sb = sandbox(&dir);

        assert!(sb.write_file("../escape.txt", "x").await.is_err());
        assert!(sb.read_file("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn client_create_and_connect() {
        let dir = tempfile::tempdir().unwrap();
        let client = LocalSandboxClient::new(dir.path());

        let id = client.create("any-template").await.unwrap();
        let handle = client.connect(&id).await.unwrap();
        assert_eq!(handle.id(), id);

        assert!(client.connect("missing").await.is_err());
    }

    #[tokio::test]
    async fn public_host_is_loopback() {
        let dir = tempfile::tempdir().unwrap();
        let sb = sandbox(&dir);
        assert_eq!(sb.public_host(3000).await.unwrap(), "127.0.0.1:3000");
    }
}
