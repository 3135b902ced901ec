//! Sandbox capability surface — the isolated execution environment.
//!
//! A sandbox is provisioned externally by template and addressed by ID; the
//! core only depends on this interface. Command output streams through a
//! [`CommandSink`] so the caller owns accumulation, not the client.

use crate::error::SandboxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which output stream a command chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives incremental command output.
pub trait CommandSink: Send {
    fn on_chunk(&mut self, stream: OutputStream, chunk: &str);
}

/// A [`CommandSink`] that accumulates chunks into per-stream buffers.
#[derive(Debug, Default)]
pub struct OutputBuffers {
    pub stdout: String,
    pub stderr: String,
}

impl CommandSink for OutputBuffers {
    fn on_chunk(&mut self, stream: OutputStream, chunk: &str) {
        match stream {
            OutputStream::Stdout => self.stdout.push_str(chunk),
            OutputStream::Stderr => self.stderr.push_str(chunk),
        }
    }
}

/// The final output of a successfully completed command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// One entry in a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// A connected sandbox instance.
///
/// All operations may fail with a transport or resource error; callers wrap
/// every call site so failures become data rather than run-terminating
/// exceptions.
#[async_trait]
pub trait SandboxHandle: Send + Sync {
    /// The sandbox's identifier.
    fn id(&self) -> &str;

    /// Run a shell command, streaming output into `sink`.
    ///
    /// Returns `Ok` only for a zero exit status; a non-zero exit surfaces as
    /// [`SandboxError::CommandFailed`] with the output already delivered to
    /// the sink.
    async fn run_command(
        &self,
        command: &str,
        sink: &mut dyn CommandSink,
    ) -> std::result::Result<CommandOutput, SandboxError>;

    /// Write a file, creating parent directories as needed.
    async fn write_file(
        &self,
        path: &str,
        content: &str,
    ) -> std::result::Result<(), SandboxError>;

    /// Read a file's contents.
    async fn read_file(&self, path: &str) -> std::result::Result<String, SandboxError>;

    /// List a directory.
    async fn list_dir(&self, path: &str) -> std::result::Result<Vec<DirEntry>, SandboxError>;

    /// Resolve the sandbox's externally reachable hostname for `port`.
    async fn public_host(&self, port: u16) -> std::result::Result<String, SandboxError>;
}

/// Provisions and connects to sandboxes.
#[async_trait]
pub trait SandboxClient: Send + Sync {
    /// Create a new sandbox from a template, returning its ID.
    async fn create(&self, template: &str) -> std::result::Result<String, SandboxError>;

    /// Connect to an existing sandbox by ID.
    async fn connect(
        &self,
        sandbox_id: &str,
    ) -> std::result::Result<Arc<dyn SandboxHandle>, SandboxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_accumulate_by_stream() {
        let mut buffers = OutputBuffers::default();
        buffers.on_chunk(OutputStream::Stdout, "hello ");
        buffers.on_chunk(OutputStream::Stderr, "oops");
        buffers.on_chunk(OutputStream::Stdout, "world");

        assert_eq!(buffers.stdout, "hello world");
        assert_eq!(buffers.stderr, "oops");
    }
}
