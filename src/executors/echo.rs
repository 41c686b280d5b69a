// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Echo executor
//!
//! Offline executor for dry runs. Returns the stage's semantic input, or the
//! wired context when there is one, without calling any model.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{StageExecutor, StageOutput};
use crate::errors::SignError;
use crate::pipeline::{StageInput, StageRequest};

/// Echo executor
pub struct EchoExecutor;

impl EchoExecutor {
    /// Create a new echo executor
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StageExecutor for EchoExecutor {
    fn name(&self) -> &str {
        "echo"
    }

    async fn execute(
        &self,
        request: &StageRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<StageOutput, SignError> {
        if cancel.is_cancelled() {
            return Err(SignError::Cancelled {
                stage: request.stage.name.clone(),
            });
        }

        let text = match (request.context, request.input) {
            (Some(context), _) => context.output.clone(),
            (None, StageInput::Message(message)) => message.to_string(),
            (None, StageInput::Tokens { words, .. }) => words.join(" "),
        };

        Ok(StageOutput::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineDefinition;

    #[test]
    fn test_echo_returns_tokens() {
        let definition = PipelineDefinition::builtin().unwrap();
        let stage = definition.get_stage("finish_sentence").unwrap();
        let words = vec!["YOU".to_string(), "NAME".to_string(), "WHAT".to_string()];
        let request = StageRequest::new(
            stage,
            StageInput::Tokens {
                words: &words,
                vocabulary: None,
            },
            None,
        );

        let output = tokio_test::block_on(
            EchoExecutor::new().execute(&request, &CancellationToken::new()),
        )
        .unwrap();

        assert_eq!(output, StageOutput::Text("YOU NAME WHAT".into()));
    }

    #[tokio::test]
    async fn test_echo_respects_cancellation() {
        let definition = PipelineDefinition::builtin().unwrap();
        let stage = definition.get_stage("chat").unwrap();
        let request = StageRequest::new(stage, StageInput::Message("hi"), None);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = EchoExecutor::new().execute(&request, &cancel).await;
        assert!(matches!(result, Err(SignError::Cancelled { .. })));
    }
}
