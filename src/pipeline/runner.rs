// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Pipeline runner
//!
//! Executes an [`ExecutionPlan`] one stage at a time. The runner keeps no
//! state between calls; every run allocates its own trace, so concurrent
//! runs never see each other's results.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::errors::SignError;
use crate::pipeline::{CallerInputs, ExecutionPlan, ExecutionTrace, StageRequest, StageResult};

/// Result of running a plan to completion
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Output of the last stage
    pub content: String,
    /// Every stage's result, in execution order
    pub trace: ExecutionTrace,
    /// Total execution time
    pub duration: Duration,
}

/// Sequential plan runner
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineRunner;

impl PipelineRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a plan with the caller's inputs
    ///
    /// Fails as a unit: if any stage fails or the token is cancelled, no
    /// partial trace is returned.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        inputs: &CallerInputs,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput, SignError> {
        let start = Instant::now();
        let input = inputs.semantic_input();
        let mut trace = ExecutionTrace::with_capacity(plan.len());

        tracing::debug!(
            "Running plan [{}] with {} input",
            plan.stage_names().join(" -> "),
            if input.is_message() { "message" } else { "token" }
        );

        for (idx, step) in plan.steps().iter().enumerate() {
            let stage = &step.stage;
            let name = stage.name();

            if cancel.is_cancelled() {
                return Err(SignError::Cancelled {
                    stage: name.to_string(),
                });
            }

            let context = step.context_from.and_then(|i| trace.get(i));
            let request = StageRequest::new(stage.config(), input, context);
            let stage_start = Instant::now();

            let output = tokio::select! {
                _ = cancel.cancelled() => Err(SignError::Cancelled { stage: name.to_string() }),
                output = stage.executor().execute(&request, cancel) => output,
            }
            .map_err(|e| {
                tracing::warn!("Stage '{}' failed: {}", name, e);
                e.in_stage(name)
            })?;

            let text = output.into_text();

            tracing::info!(
                "Stage {} '{}' completed in {:.2}s",
                idx + 1,
                name,
                stage_start.elapsed().as_secs_f64()
            );

            let result = StageResult {
                index: idx,
                stage: name.to_string(),
                description: stage.config().short_description(),
                role: stage.config().role.clone(),
                executor: stage.executor().name().to_string(),
                output: text,
            };
            drop(request);
            trace.push(result);
        }

        let content = trace
            .last()
            .map(|r| r.output.clone())
            .ok_or_else(|| SignError::InvalidPlan {
                reason: "a plan needs at least one stage".into(),
            })?;

        let duration = start.elapsed();
        tracing::info!(
            "Pipeline completed {} stage{} in {:.2}s",
            trace.len(),
            if trace.len() == 1 { "" } else { "s" },
            duration.as_secs_f64()
        );

        Ok(PipelineOutput {
            content,
            trace,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::{EchoExecutor, StageExecutor, StageOutput};
    use crate::pipeline::{PipelineBuilder, PipelineDefinition, PipelineGraph, StageInput};
    use crate::vocabulary::VocabularyIndex;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Records what every invocation saw and fails on a chosen stage
    #[derive(Default)]
    struct RecordingExecutor {
        fail_on: Option<String>,
        seen: Mutex<Vec<(String, String, Option<String>)>>,
    }

    #[async_trait]
    impl StageExecutor for RecordingExecutor {
        fn name(&self) -> &str {
            "recording"
        }

        async fn execute(
            &self,
            request: &StageRequest<'_>,
            _cancel: &CancellationToken,
        ) -> Result<StageOutput, SignError> {
            let input = match request.input {
                StageInput::Message(m) => format!("message:{}", m),
                StageInput::Tokens { words, .. } => format!("tokens:{}", words.join(" ")),
            };
            self.seen.lock().unwrap().push((
                request.stage.name.clone(),
                input.clone(),
                request.context.map(|c| c.stage.clone()),
            ));

            if self.fail_on.as_deref() == Some(request.stage.name.as_str()) {
                return Err(SignError::ModelRequest {
                    message: "upstream exploded".into(),
                    status: Some(500),
                });
            }

            // Let concurrent runs interleave
            tokio::task::yield_now().await;

            let upstream = request.context.map(|c| c.output.as_str()).unwrap_or("");
            Ok(StageOutput::Text(format!("{}<{}>{}", upstream, request.stage.name, input)))
        }
    }

    /// Never finishes until cancelled
    struct HangingExecutor;

    #[async_trait]
    impl StageExecutor for HangingExecutor {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn execute(
            &self,
            _request: &StageRequest<'_>,
            _cancel: &CancellationToken,
        ) -> Result<StageOutput, SignError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    fn graph_with(executor: Arc<dyn StageExecutor>) -> PipelineGraph {
        PipelineGraph::with_executor(PipelineDefinition::builtin().unwrap(), executor).unwrap()
    }

    fn token_inputs(words: &[&str]) -> CallerInputs {
        let vocabulary = Arc::new(VocabularyIndex::from_words(["YOU", "NAME", "WHAT"]));
        CallerInputs::tokens(words.iter().copied(), vocabulary)
    }

    #[tokio::test]
    async fn test_full_plan_chains_outputs() {
        let executor = Arc::new(RecordingExecutor::default());
        let graph = graph_with(executor.clone());
        let plan = PipelineBuilder::new(&graph).build_named("full").unwrap();

        let output = PipelineRunner::new()
            .run(&plan, &token_inputs(&["YOU", "NAME"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.trace.len(), 3);
        assert_eq!(output.content, output.trace.last().unwrap().output);
        assert!(output
            .content
            .starts_with("<finish_sentence>tokens:YOU NAME<chat>"));

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen[0].2, None);
        assert_eq!(seen[1].2.as_deref(), Some("finish_sentence"));
        assert_eq!(seen[2].2.as_deref(), Some("chat"));

        let stages: Vec<&str> = output.trace.iter().map(|r| r.stage.as_str()).collect();
        assert_eq!(stages, vec!["finish_sentence", "chat", "sentence_split"]);
        assert!(output.trace.iter().all(|r| r.executor == "recording"));
        assert_eq!(output.trace.get(1).unwrap().role, "Conversational Assistant");
    }

    #[tokio::test]
    async fn test_failure_in_middle_returns_no_trace() {
        let executor = Arc::new(RecordingExecutor {
            fail_on: Some("chat".into()),
            ..Default::default()
        });
        let graph = graph_with(executor.clone());
        let plan = PipelineBuilder::new(&graph).build_named("full").unwrap();

        let result = PipelineRunner::new()
            .run(&plan, &token_inputs(&["YOU"]), &CancellationToken::new())
            .await;

        match result {
            Err(SignError::StageExecution { stage, source }) => {
                assert_eq!(stage, "chat");
                assert!(source.to_string().contains("upstream exploded"));
            }
            other => panic!("expected StageExecution, got {:?}", other),
        }

        // The third stage never ran
        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn test_chat_shortcut_routes_message_branch() {
        let executor = Arc::new(RecordingExecutor::default());
        let graph = graph_with(executor.clone());
        let plan = PipelineBuilder::new(&graph).build_named("chat").unwrap();

        let inputs = CallerInputs::message("hi");
        assert!(inputs.words.is_empty());

        let output = PipelineRunner::new()
            .run(&plan, &inputs, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.content, "<chat>message:hi");
        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[("chat".to_string(), "message:hi".to_string(), None)]);
    }

    #[tokio::test]
    async fn test_concurrent_runs_do_not_cross_talk() {
        let executor = Arc::new(RecordingExecutor::default());
        let graph = Arc::new(graph_with(executor.clone()));
        let runner = PipelineRunner::new();

        let run = |words: &'static [&'static str]| {
            let graph = graph.clone();
            async move {
                let plan = PipelineBuilder::new(&graph).build_named("full").unwrap();
                runner
                    .run(&plan, &token_inputs(words), &CancellationToken::new())
                    .await
                    .unwrap()
            }
        };

        let (a, b) = tokio::join!(run(&["YOU"]), run(&["NAME", "WHAT"]));

        for result in &a.trace {
            assert!(result.output.contains("tokens:YOU"));
            assert!(!result.output.contains("NAME"));
        }
        for result in &b.trace {
            assert!(result.output.contains("tokens:NAME WHAT"));
            assert!(!result.output.contains("tokens:YOU"));
        }

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_stage() {
        let graph = graph_with(Arc::new(HangingExecutor));
        let plan = PipelineBuilder::new(&graph).build_named("chat").unwrap();
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = PipelineRunner::new()
            .run(&plan, &CallerInputs::message("hi"), &cancel)
            .await;

        assert!(matches!(result, Err(SignError::Cancelled { stage }) if stage == "chat"));
    }

    #[tokio::test]
    async fn test_echo_plan_end_to_end() {
        let graph = graph_with(Arc::new(EchoExecutor::new()));
        let plan = PipelineBuilder::new(&graph).build_named("chat_only").unwrap();

        let output = PipelineRunner::new()
            .run(&plan, &token_inputs(&["YOU", "NAME", "WHAT"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.content, "YOU NAME WHAT");
        assert_eq!(output.trace.len(), 2);
        assert_eq!(output.trace.get(0).unwrap().executor, "echo");
    }
}
