// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Route handlers
//!
//! Each run gets its own cancellation token. The handler holds the token's
//! drop guard, so when the client goes away and axum drops the handler
//! future, the stage in flight is cancelled.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use tokio_util::sync::CancellationToken;

use super::error::ApiError;
use super::models::{
    AgentInfo, AslDatasetResponse, ChatRequest, ChatResponse, HealthResponse, PipelineResponse,
    ProcessTokensRequest, ProcessTokensResponse, RootResponse, TokenList,
};
use super::{AppState, CHAT_ONLY_PLAN, CHAT_PLAN, FULL_PLAN};
use crate::errors::SignError;
use crate::pipeline::{CallerInputs, PipelineBuilder, PipelineOutput};
use crate::vocabulary::TokenValidation;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "SignGPT pipeline service is running",
        health: "/health",
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let configured = state.graph.is_configured();

    Json(HealthResponse {
        status: if configured { "healthy" } else { "warning" },
        message: if configured {
            "Service is running".to_string()
        } else {
            format!("Service running but {} not configured", state.credential_env)
        },
        asl_dataset_size: state.vocabulary.size(),
    })
}

pub async fn process_tokens(
    State(state): State<AppState>,
    payload: Result<Json<ProcessTokensRequest>, JsonRejection>,
) -> ApiResult<ProcessTokensResponse> {
    run_token_plan(&state, FULL_PLAN, payload?.0).await
}

pub async fn process_tokens_chat_only(
    State(state): State<AppState>,
    payload: Result<Json<ProcessTokensRequest>, JsonRejection>,
) -> ApiResult<ProcessTokensResponse> {
    run_token_plan(&state, CHAT_ONLY_PLAN, payload?.0).await
}

async fn run_token_plan(
    state: &AppState,
    plan_name: &str,
    request: ProcessTokensRequest,
) -> ApiResult<ProcessTokensResponse> {
    if request.words.is_empty() {
        return Err(SignError::validation("words", "Words list cannot be empty").into());
    }
    ensure_configured(state)?;

    let inputs = CallerInputs::tokens(request.words, state.vocabulary.clone());
    let output = run_plan(state, plan_name, &inputs).await?;

    Ok(Json(ProcessTokensResponse {
        content: output.content,
        output_history: output.trace,
    }))
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let Json(request) = payload?;

    if request.message.trim().is_empty() {
        return Err(SignError::validation("message", "Message cannot be empty").into());
    }
    ensure_configured(&state)?;

    let inputs = CallerInputs::message(request.message);
    let output = run_plan(&state, CHAT_PLAN, &inputs).await?;

    let Some(last) = output.trace.last() else {
        return Err(SignError::InvalidPlan {
            reason: "the chat plan produced no result".into(),
        }
        .into());
    };
    let agent_goal = state
        .graph
        .stage(&last.stage)
        .map(|s| s.config().goal.clone())
        .unwrap_or_default();

    Ok(Json(ChatResponse {
        agent_info: AgentInfo {
            agent_role: last.role.clone(),
            agent_goal,
            model: state.model.clone(),
        },
        content: output.content,
    }))
}

pub async fn asl_dataset(State(state): State<AppState>) -> Json<AslDatasetResponse> {
    Json(AslDatasetResponse {
        total_words: state.vocabulary.size(),
        sample_words: state.vocabulary.sample(state.sample_size).to_vec(),
        description: "Available ASL vocabulary tokens",
    })
}

pub async fn validate_tokens(
    State(state): State<AppState>,
    payload: Result<Json<TokenList>, JsonRejection>,
) -> ApiResult<TokenValidation> {
    let tokens = payload?.0.into_tokens();
    Ok(Json(state.vocabulary.validate_many(&tokens)))
}

pub async fn pipeline(State(state): State<AppState>) -> Json<PipelineResponse> {
    Json(PipelineResponse::from_graph(&state.graph))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

fn ensure_configured(state: &AppState) -> Result<(), ApiError> {
    if state.graph.is_configured() {
        Ok(())
    } else {
        Err(SignError::ModelUnconfigured {
            reason: format!(
                "{} not configured. Please set it in your environment",
                state.credential_env
            ),
        }
        .into())
    }
}

async fn run_plan(
    state: &AppState,
    plan_name: &str,
    inputs: &CallerInputs,
) -> Result<PipelineOutput, ApiError> {
    let plan = PipelineBuilder::new(&state.graph).build_named(plan_name)?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    tracing::info!("Running plan '{}' ({} stages)", plan_name, plan.len());
    Ok(state.runner.run(&plan, inputs, &cancel).await?)
}
