// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! OpenAI-compatible executor
//!
//! Sends each stage prompt to `{base_url}/chat/completions` and returns the
//! first choice's message content. Transport failures, rate limits and
//! server errors are retried with linear backoff up to `max_attempts`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{StageExecutor, StageOutput};
use crate::config::ModelConfig;
use crate::errors::SignError;
use crate::pipeline::StageRequest;

const BACKOFF_STEP: Duration = Duration::from_millis(250);

/// Chat message in an OpenAI-compatible request
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Body of a chat completions request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions executor
pub struct OpenAiExecutor {
    config: ModelConfig,
    client: reqwest::Client,
    label: String,
}

impl OpenAiExecutor {
    /// Create a new executor
    pub fn new(config: ModelConfig) -> Result<Self, SignError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("signgpt/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SignError::InvalidConfig {
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            label: format!("openai:{}", config.model),
            config,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(
        &self,
        api_key: &str,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<String, SignError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SignError::ModelRequest {
                message: format!("HTTP {}: {}", status, truncate(&detail, 300)),
                status: Some(status.as_u16()),
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SignError::ModelRequest {
                message: "response contained no message content".into(),
                status: Some(status.as_u16()),
            })
    }
}

/// Whether a failed request is worth another attempt
fn is_retriable(error: &SignError) -> bool {
    match error {
        SignError::ModelRequest { status: None, .. } => true,
        SignError::ModelRequest {
            status: Some(code), ..
        } => *code == 429 || *code >= 500,
        _ => false,
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let head: String = text.chars().take(limit).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[async_trait]
impl StageExecutor for OpenAiExecutor {
    fn name(&self) -> &str {
        &self.label
    }

    fn is_configured(&self) -> bool {
        self.config.has_api_key()
    }

    async fn execute(
        &self,
        request: &StageRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<StageOutput, SignError> {
        let stage = &request.stage.name;

        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(SignError::ModelUnconfigured {
                reason: format!("{} is not set", self.config.api_key_env),
            });
        };

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt.user,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(SignError::Cancelled { stage: stage.clone() });
                }
                outcome = self.send_once(api_key, &body) => outcome,
            };

            match outcome {
                Ok(text) => return Ok(StageOutput::Text(text)),
                Err(e) if attempt < max_attempts && is_retriable(&e) => {
                    tracing::warn!(
                        "Model request for stage '{}' failed (attempt {}/{}): {}",
                        stage,
                        attempt,
                        max_attempts,
                        e
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Err(SignError::Cancelled { stage: stage.clone() });
                        }
                        _ = tokio::time::sleep(BACKOFF_STEP * attempt) => {}
                    }

                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
