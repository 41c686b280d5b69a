// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Execution plan builder
//!
//! Turns a requested, ordered list of stage names into an [`ExecutionPlan`].
//! The caller's order is kept as is. Each step reads context only from the
//! step immediately before it, so a plan is always a linear chain.

use std::sync::Arc;

use crate::errors::SignError;
use crate::pipeline::{PipelineGraph, Stage};

/// One stage of a plan with its context wiring
#[derive(Debug, Clone)]
pub struct PlanStep {
    pub stage: Arc<Stage>,
    /// Plan index of the step whose result this step reads
    pub context_from: Option<usize>,
}

/// Ordered, context-wired stages for one run
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.stage.name()).collect()
    }
}

/// Builds execution plans against a stage graph
pub struct PipelineBuilder<'g> {
    graph: &'g PipelineGraph,
}

impl<'g> PipelineBuilder<'g> {
    pub fn new(graph: &'g PipelineGraph) -> Self {
        Self { graph }
    }

    /// Build a plan from stage names, in the order given
    pub fn build<S: AsRef<str>>(&self, stage_names: &[S]) -> Result<ExecutionPlan, SignError> {
        if stage_names.is_empty() {
            return Err(SignError::InvalidPlan {
                reason: "a plan needs at least one stage".into(),
            });
        }

        let mut steps = Vec::with_capacity(stage_names.len());

        for (idx, name) in stage_names.iter().enumerate() {
            let name = name.as_ref();
            let stage = self
                .graph
                .stage(name)
                .ok_or_else(|| SignError::UnknownStage {
                    stage: name.to_string(),
                })?;

            let context_from = idx.checked_sub(1);

            if let Some(prev) = context_from {
                let prev_name = stage_names[prev].as_ref();
                if !stage.config().context.iter().any(|c| c == prev_name) {
                    tracing::warn!(
                        "Stage '{}' will read context from '{}', which it does not declare",
                        name,
                        prev_name
                    );
                }
            }

            steps.push(PlanStep {
                stage: stage.clone(),
                context_from,
            });
        }

        Ok(ExecutionPlan { steps })
    }

    /// Build one of the definition's named plans
    pub fn build_named(&self, plan_name: &str) -> Result<ExecutionPlan, SignError> {
        let stage_names = self.graph.definition().plan(plan_name)?;
        self.build(stage_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::EchoExecutor;
    use crate::pipeline::PipelineDefinition;

    fn graph() -> PipelineGraph {
        PipelineGraph::with_executor(
            PipelineDefinition::builtin().unwrap(),
            Arc::new(EchoExecutor::new()),
        )
        .unwrap()
    }

    fn assert_chained(plan: &ExecutionPlan) {
        for (i, step) in plan.steps().iter().enumerate() {
            assert_eq!(step.context_from, i.checked_sub(1), "step {}", i);
        }
    }

    #[test]
    fn test_named_plans_are_chained() {
        let graph = graph();
        let builder = PipelineBuilder::new(&graph);

        for (plan_name, expected_len) in [("full", 3), ("chat_only", 2), ("chat", 1)] {
            let plan = builder.build_named(plan_name).unwrap();
            assert_eq!(plan.len(), expected_len, "plan {}", plan_name);
            assert_chained(&plan);
        }
    }

    #[test]
    fn test_build_preserves_requested_order() {
        let graph = graph();
        let plan = PipelineBuilder::new(&graph)
            .build(&["sentence_split", "finish_sentence"])
            .unwrap();

        assert_eq!(plan.stage_names(), vec!["sentence_split", "finish_sentence"]);
        assert_chained(&plan);
    }

    #[test]
    fn test_declared_but_unplanned_stage_is_buildable() {
        let graph = graph();
        let plan = PipelineBuilder::new(&graph)
            .build(&["finish_sentence", "chat", "sentence_split", "rearrange_word"])
            .unwrap();

        assert_eq!(plan.len(), 4);
        assert_eq!(plan.steps()[3].context_from, Some(2));
    }

    #[test]
    fn test_unknown_stage() {
        let graph = graph();
        let result = PipelineBuilder::new(&graph).build(&["finish_sentence", "translate"]);

        match result {
            Err(SignError::UnknownStage { stage }) => assert_eq!(stage, "translate"),
            other => panic!("expected UnknownStage, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_request() {
        let graph = graph();
        let result = PipelineBuilder::new(&graph).build::<&str>(&[]);
        assert!(matches!(result, Err(SignError::InvalidPlan { .. })));
    }

    #[test]
    fn test_unknown_named_plan() {
        let graph = graph();
        let result = PipelineBuilder::new(&graph).build_named("everything");
        assert!(matches!(result, Err(SignError::InvalidPlan { .. })));
    }
}
