//! Configuration loading, validation, and management for Codeforge.
//!
//! Loads configuration from `~/.codeforge/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.codeforge/config.toml`.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Run loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Sandbox service settings
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

/// Settings for the model provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model to use for agent steps
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per model response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

/// Settings for the run loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum agent steps per run (safety cap)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Override the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_max_iterations() -> u32 {
    15
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            system_prompt: None,
        }
    }
}

/// Settings for the sandbox service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Base URL of the sandbox provisioning service
    #[serde(default = "default_sandbox_url")]
    pub api_url: String,

    /// Template to provision sandboxes from
    #[serde(default = "default_template")]
    pub template: String,

    /// Port the generated app is exposed on inside the sandbox
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_sandbox_url() -> String {
    "http://127.0.0.1:49152".into()
}
fn default_template() -> String {
    "codeforge-nextjs".into()
}
fn default_port() -> u16 {
    3000
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            api_url: default_sandbox_url(),
            template: default_template(),
            port: default_port(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("agent", &self.agent)
            .field("sandbox", &self.sandbox)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.codeforge/config.toml).
    ///
    /// Environment variable overrides:
    /// - `CODEFORGE_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `CODEFORGE_MODEL`
    /// - `CODEFORGE_SANDBOX_URL`
    /// - `CODEFORGE_SANDBOX_TEMPLATE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("CODEFORGE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("CODEFORGE_MODEL") {
            config.provider.model = model;
        }

        if let Ok(url) = std::env::var("CODEFORGE_SANDBOX_URL") {
            config.sandbox.api_url = url;
        }

        if let Ok(template) = std::env::var("CODEFORGE_SANDBOX_TEMPLATE") {
            config.sandbox.template = template;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".codeforge")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.sandbox.template.is_empty() {
            return Err(ConfigError::ValidationError(
                "sandbox.template must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string (for onboarding).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.agent.max_iterations, 15);
        assert_eq!(config.sandbox.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.model, config.provider.model);
        assert_eq!(parsed.sandbox.port, config.sandbox.port);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            provider: ProviderConfig {
                temperature: 5.0,
                ..ProviderConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let config = AppConfig {
            agent: AgentConfig {
                max_iterations: 0,
                ..AgentConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().agent.max_iterations, 15);
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[sandbox]\ntemplate = \"my-template\"").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.sandbox.template, "my-template");
        assert_eq!(config.sandbox.port, 3000);
        assert_eq!(config.agent.max_iterations, 15);
    }

    #[test]
    fn api_key_redacted_in_debug() {
        let config = AppConfig {
            provider: ProviderConfig {
                api_key: Some("sk-secret".into()),
                ..ProviderConfig::default()
            },
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("max_iterations"));
        assert!(toml_str.contains("3000"));
    }
}
