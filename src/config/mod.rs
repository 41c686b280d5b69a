// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Service configuration
//!
//! Settings come from an optional TOML file; every field has a default.
//! Command-line flags and environment variables are applied on top by the
//! CLI layer. The model credential is never read from the file, only from
//! the environment variable named by `model.api_key_env`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::SignError;

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub pipeline: PipelineConfig,
    pub model: ModelConfig,
}

impl ServiceConfig {
    /// Load configuration from a TOML file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self, SignError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content =
            std::fs::read_to_string(path).map_err(|e| SignError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, SignError> {
        toml::from_str(content).map_err(Into::into)
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<(), SignError> {
        if self.model.max_attempts == 0 {
            return Err(SignError::InvalidConfig {
                reason: "model.max_attempts must be at least 1".into(),
            });
        }

        if self.model.backend == Backend::OpenAi && self.model.base_url.trim().is_empty() {
            return Err(SignError::InvalidConfig {
                reason: "model.base_url must not be empty".into(),
            });
        }

        if let Some(t) = self.model.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(SignError::InvalidConfig {
                    reason: format!("model.temperature must be within 0.0..=2.0, got {}", t),
                });
            }
        }

        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Allow cross-origin requests from any origin
    pub cors: bool,
    /// Number of words returned by the vocabulary sample endpoint
    pub sample_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors: true,
            sample_size: 20,
        }
    }
}

/// Data file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON object whose values form the vocabulary
    pub vocabulary: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            vocabulary: PathBuf::from("data/english_words.json"),
        }
    }
}

/// Stage definition settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// YAML stage definitions (built-in definitions when unset)
    pub stages: Option<PathBuf>,
}

/// Which executor runs the stages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OpenAI-compatible chat completions API
    #[default]
    OpenAi,
    /// Offline executor that echoes its input
    Echo,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Echo => write!(f, "echo"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "echo" => Ok(Self::Echo),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: Backend,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// API key, resolved from the environment at startup
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Total attempts per stage invocation (1 = no retries)
    pub max_attempts: u32,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            timeout_seconds: 60,
            max_attempts: 2,
            temperature: Some(0.7),
            max_tokens: None,
        }
    }
}

impl ModelConfig {
    /// Fill `api_key` from the environment unless already set
    pub fn resolve_api_key(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var(&self.api_key_env)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}
