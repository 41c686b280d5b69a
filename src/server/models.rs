// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Request and response bodies

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pipeline::{ExecutionTrace, PipelineGraph};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProcessTokensRequest {
    /// ASL gloss tokens
    pub words: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Tokens to validate, either a bare array or `{ "tokens": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TokenList {
    Bare(Vec<String>),
    Wrapped { tokens: Vec<String> },
}

impl TokenList {
    pub fn into_tokens(self) -> Vec<String> {
        match self {
            Self::Bare(tokens) | Self::Wrapped { tokens } => tokens,
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: String,
    pub asl_dataset_size: usize,
}

/// Result of a token plan run
#[derive(Debug, Serialize)]
pub struct ProcessTokensResponse {
    pub content: String,
    pub output_history: ExecutionTrace,
}

#[derive(Debug, Serialize)]
pub struct AgentInfo {
    pub agent_role: String,
    pub agent_goal: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub content: String,
    pub agent_info: AgentInfo,
}

#[derive(Debug, Serialize)]
pub struct AslDatasetResponse {
    pub total_words: usize,
    pub sample_words: Vec<String>,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StageSummary {
    pub name: String,
    pub role: String,
    pub inputs: Vec<String>,
    pub context: Vec<String>,
    pub dependents: Vec<String>,
}

/// Declared stages, their context edges and the named plans
#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub name: String,
    pub description: Option<String>,
    pub stages: Vec<StageSummary>,
    pub plans: BTreeMap<String, Vec<String>>,
}

impl PipelineResponse {
    pub fn from_graph(graph: &PipelineGraph) -> Self {
        let definition = graph.definition();

        let stages = graph
            .stages()
            .map(|stage| {
                let config = stage.config();
                StageSummary {
                    name: config.name.clone(),
                    role: config.role.clone(),
                    inputs: config.inputs.iter().map(|i| i.to_string()).collect(),
                    context: config.context.clone(),
                    dependents: graph.topology().dependents(&config.name).unwrap_or_default(),
                }
            })
            .collect();

        Self {
            name: definition.name.clone(),
            description: definition.description.clone(),
            stages,
            plans: definition.plans.clone(),
        }
    }
}
