// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Stage executors
//!
//! This module provides the executor trait and implementations that turn a
//! rendered stage prompt into text (OpenAI-compatible API, offline echo).

mod echo;
mod openai;

pub use echo::EchoExecutor;
pub use openai::OpenAiExecutor;

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{Backend, ModelConfig};
use crate::errors::SignError;
use crate::pipeline::StageRequest;

/// What an executor produced for one stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    /// Plain text
    Text(String),
    /// Structured output, rendered as JSON when text is needed
    Structured(serde_json::Value),
}

impl StageOutput {
    /// Coerce to the text passed to the next stage
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Structured(serde_json::Value::String(text)) => text,
            Self::Structured(value) => value.to_string(),
        }
    }
}

impl From<String> for StageOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Trait for stage executors
#[async_trait]
pub trait StageExecutor: Send + Sync {
    /// Label recorded in traces for results this executor produced
    fn name(&self) -> &str;

    /// Whether the executor has everything it needs to run
    fn is_configured(&self) -> bool {
        true
    }

    /// Execute one stage
    ///
    /// # Arguments
    /// * `request` - The stage, its semantic input, wired context and prompt
    /// * `cancel` - Fires when the caller abandons the run
    async fn execute(
        &self,
        request: &StageRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<StageOutput, SignError>;
}

/// Create the executor selected by the model configuration
pub fn create_executor(config: &ModelConfig) -> Result<Arc<dyn StageExecutor>, SignError> {
    match config.backend {
        Backend::OpenAi => Ok(Arc::new(OpenAiExecutor::new(config.clone())?)),
        Backend::Echo => Ok(Arc::new(EchoExecutor::new())),
    }
}
