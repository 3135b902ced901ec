//! HTTP sandbox client — talks to a remote sandbox provisioning service.
//!
//! The service exposes sandbox lifecycle and file operations as JSON over
//! HTTP. Command execution streams newline-delimited JSON events
//! (stdout/stderr chunks, then a final exit event) so output reaches the
//! caller's sink incrementally.

use async_trait::async_trait;
use codeforge_core::error::SandboxError;
use codeforge_core::sandbox::{
    CommandOutput, CommandSink, DirEntry, OutputStream, SandboxClient, SandboxHandle,
};
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Client for a remote sandbox provisioning service.
pub struct HttpSandboxClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpSandboxClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    sandbox_id: String,
}

#[async_trait]
impl SandboxClient for HttpSandboxClient {
    async fn create(&self, template: &str) -> Result<String, SandboxError> {
        let url = format!("{}/v1/sandboxes", self.base_url);
        debug!(template, "Provisioning sandbox");

        let response = self
            .authorize(self.client.post(&url))
            .json(&serde_json::json!({ "template": template }))
            .send()
            .await
            .map_err(|e| SandboxError::Provision(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SandboxError::Provision(format!("{status}: {body}")));
        }

        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| SandboxError::Provision(format!("Malformed create response: {e}")))?;

        Ok(created.sandbox_id)
    }

    async fn connect(&self, sandbox_id: &str) -> Result<Arc<dyn SandboxHandle>, SandboxError> {
        let url = format!("{}/v1/sandboxes/{sandbox_id}", self.base_url);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| SandboxError::Connect {
                sandbox_id: sandbox_id.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SandboxError::Connect {
                sandbox_id: sandbox_id.to_string(),
                reason: format!("service returned {}", response.status()),
            });
        }

        Ok(Arc::new(HttpSandboxHandle {
            base_url: format!("{}/v1/sandboxes/{sandbox_id}", self.base_url),
            id: sandbox_id.to_string(),
            api_key: self.api_key.clone(),
            client: self.client.clone(),
        }))
    }
}

/// A connected remote sandbox.
pub struct HttpSandboxHandle {
    base_url: String,
    id: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpSandboxHandle {
    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    fn file_error(path: &str, reason: impl std::fmt::Display) -> SandboxError {
        SandboxError::File {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// One event on the exec stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ExecEvent {
    Stdout { data: String },
    Stderr { data: String },
    Exit { code: i32 },
}

#[async_trait]
impl SandboxHandle for HttpSandboxHandle {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run_command(
        &self,
        command: &str,
        sink: &mut dyn CommandSink,
    ) -> Result<CommandOutput, SandboxError> {
        let url = format!("{}/exec", self.base_url);
        debug!(sandbox = %self.id, command, "Executing command");

        let response = self
            .authorize(self.client.post(&url))
            .json(&serde_json::json!({ "command": command }))
            .send()
            .await
            .map_err(|e| SandboxError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SandboxError::Transport(format!("{status}: {body}")));
        }

        let mut byte_stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut stdout = String::new();
        let mut stderr = String::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let bytes =
                chunk_result.map_err(|e| SandboxError::Transport(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // Process complete lines
            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim_end_matches('\r').to_string();
                buffer = buffer[line_end + 1..].to_string();

                if line.is_empty() {
                    continue;
                }

                match serde_json::from_str::<ExecEvent>(&line) {
                    Ok(ExecEvent::Stdout { data }) => {
                        sink.on_chunk(OutputStream::Stdout, &data);
                        stdout.push_str(&data);
                    }
                    Ok(ExecEvent::Stderr { data }) => {
                        sink.on_chunk(OutputStream::Stderr, &data);
                        stderr.push_str(&data);
                    }
                    Ok(ExecEvent::Exit { code }) => {
                        if code == 0 {
                            return Ok(CommandOutput {
                                stdout,
                                stderr,
                                exit_code: 0,
                            });
                        }
                        warn!(sandbox = %self.id, code, "Command exited non-zero");
                        return Err(SandboxError::CommandFailed {
                            exit_code: Some(code),
                        });
                    }
                    Err(e) => {
                        trace!(sandbox = %self.id, line = %line, error = %e, "Ignoring unparseable exec event");
                    }
                }
            }
        }

        Err(SandboxError::Transport(
            "exec stream ended without exit event".into(),
        ))
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), SandboxError> {
        let url = format!("{}/files", self.base_url);

        let response = self
            .authorize(self.client.post(&url))
            .json(&serde_json::json!({ "path": path, "content": content }))
            .send()
            .await
            .map_err(|e| Self::file_error(path, e))?;

        if !response.status().is_success() {
            return Err(Self::file_error(path, response.status()));
        }
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<String, SandboxError> {
        let url = format!("{}/files", self.base_url);

        let response = self
            .authorize(self.client.get(&url))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| Self::file_error(path, e))?;

        if !response.status().is_success() {
            return Err(Self::file_error(path, response.status()));
        }

        response.text().await.map_err(|e| Self::file_error(path, e))
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, SandboxError> {
        let url = format!("{}/entries", self.base_url);

        let response = self
            .authorize(self.client.get(&url))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| Self::file_error(path, e))?;

        if !response.status().is_success() {
            return Err(Self::file_error(path, response.status()));
        }

        response.json().await.map_err(|e| Self::file_error(path, e))
    }

    async fn public_host(&self, port: u16) -> Result<String, SandboxError> {
        let url = format!("{}/host", self.base_url);

        let response = self
            .authorize(self.client.get(&url))
            .query(&[("port", port.to_string())])
            .send()
            .await
            .map_err(|e| SandboxError::HostResolution(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SandboxError::HostResolution(format!(
                "service returned {}",
                response.status()
            )));
        }

        #[derive(Deserialize)]
        struct HostResponse {
            host: String,
        }

        let host: HostResponse = response
            .json()
            .await
            .map_err(|e| SandboxError::HostResolution(e.to_string()))?;

        Ok(host.host)
    }
}
