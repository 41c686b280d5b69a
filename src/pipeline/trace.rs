// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Execution trace
//!
//! One [`StageResult`] per executed stage, in execution order.

use serde::Serialize;

/// Output of one stage invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    /// Position in the plan
    #[serde(rename = "task_index")]
    pub index: usize,
    /// Stage identity
    pub stage: String,
    /// Task description, truncated for display
    #[serde(rename = "task_description")]
    pub description: String,
    #[serde(rename = "agent_role")]
    pub role: String,
    /// Label of the executor that produced the output
    pub executor: String,
    pub output: String,
}

/// Append-only record of one plan execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExecutionTrace {
    results: Vec<StageResult>,
}

impl ExecutionTrace {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: StageResult) {
        self.results.push(result);
    }

    pub fn get(&self, index: usize) -> Option<&StageResult> {
        self.results.get(index)
    }

    pub fn last(&self) -> Option<&StageResult> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StageResult> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for &'a ExecutionTrace {
    type Item = &'a StageResult;
    type IntoIter = std::slice::Iter<'a, StageResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
