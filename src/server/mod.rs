// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! HTTP boundary
//!
//! JSON endpoints over the pipeline. Requests share only the vocabulary and
//! the stage graph; both are read-only after startup.

pub mod error;
pub mod handlers;
pub mod models;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{Backend, ServiceConfig};
use crate::errors::SignError;
use crate::executors::create_executor;
use crate::pipeline::{
    PipelineBuilder, PipelineDefinition, PipelineGraph, PipelineRunner, PipelineValidator,
};
use crate::vocabulary::VocabularyIndex;

pub use error::ApiError;

/// Plan behind `/process-tokens`
pub const FULL_PLAN: &str = "full";
/// Plan behind `/process-tokens-chat-only`
pub const CHAT_ONLY_PLAN: &str = "chat_only";
/// Plan behind `/chat`
pub const CHAT_PLAN: &str = "chat";

/// Plans the routes look up by name; startup fails without them
pub const ROUTE_PLANS: [&str; 3] = [FULL_PLAN, CHAT_ONLY_PLAN, CHAT_PLAN];

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub vocabulary: Arc<VocabularyIndex>,
    pub graph: Arc<PipelineGraph>,
    pub runner: PipelineRunner,
    /// Model identifier reported by `/chat`
    pub model: String,
    /// Environment variable named in "not configured" messages
    pub credential_env: String,
    /// Words returned by `/asl-dataset`
    pub sample_size: usize,
}

impl AppState {
    pub fn new(vocabulary: Arc<VocabularyIndex>, graph: Arc<PipelineGraph>) -> Self {
        let defaults = ServiceConfig::default();
        Self {
            vocabulary,
            graph,
            runner: PipelineRunner::new(),
            model: defaults.model.model,
            credential_env: defaults.model.api_key_env,
            sample_size: defaults.server.sample_size,
        }
    }

    /// Load the vocabulary and build every stage
    ///
    /// Fails if the vocabulary cannot be loaded, the stage definitions are
    /// invalid, or a plan in [`ROUTE_PLANS`] is missing. A missing model
    /// credential is not fatal: the service starts and reports it through
    /// `/health`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, SignError> {
        config.validate()?;

        let vocabulary = VocabularyIndex::load(&config.data.vocabulary)?;
        tracing::info!(
            "Loaded {} vocabulary tokens from {}",
            vocabulary.size(),
            config.data.vocabulary.display()
        );

        let definition = PipelineDefinition::load(config.pipeline.stages.as_deref())?;
        for warning in PipelineValidator::validate(&definition).into_result()? {
            tracing::warn!("{}", warning);
        }

        let executor = create_executor(&config.model)?;
        if !executor.is_configured() {
            tracing::warn!(
                "{} is not set; pipeline endpoints will fail until it is",
                config.model.api_key_env
            );
        }

        let graph = PipelineGraph::with_executor(definition, executor)?;
        ensure_route_plans(&graph)?;
        tracing::info!(
            "Registered {} stages: {}",
            graph.definition().stages.len(),
            graph.definition().stage_names().join(", ")
        );

        Ok(Self {
            model: match config.model.backend {
                Backend::OpenAi => config.model.model.clone(),
                Backend::Echo => "echo".to_string(),
            },
            credential_env: config.model.api_key_env.clone(),
            sample_size: config.server.sample_size,
            ..Self::new(Arc::new(vocabulary), Arc::new(graph))
        })
    }
}

/// Check that every plan a route runs exists and builds
pub fn ensure_route_plans(graph: &PipelineGraph) -> Result<(), SignError> {
    let builder = PipelineBuilder::new(graph);

    for plan_name in ROUTE_PLANS {
        builder
            .build_named(plan_name)
            .map_err(|e| SignError::InvalidPlan {
                reason: format!(
                    "the HTTP routes need plan '{}': {}",
                    plan_name,
                    match e {
                        SignError::InvalidPlan { reason } => reason,
                        other => other.to_string(),
                    }
                ),
            })?;
    }

    Ok(())
}

/// Build the router with every endpoint
pub fn create_router(state: AppState, cors: bool) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/process-tokens", post(handlers::process_tokens))
        .route(
            "/process-tokens-chat-only",
            post(handlers::process_tokens_chat_only),
        )
        .route("/chat", post(handlers::chat))
        .route("/asl-dataset", get(handlers::asl_dataset))
        .route("/validate-tokens", post(handlers::validate_tokens))
        .route("/pipeline", get(handlers::pipeline))
        .fallback(handlers::not_found)
        .with_state(state);

    if cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl-C
pub async fn start_server(state: AppState, config: &ServiceConfig) -> Result<(), SignError> {
    let app = create_router(state, config.server.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SignError::Io {
            message: format!("Failed to bind to {}: {}", addr, e),
        })?;

    tracing::info!("SignGPT listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SignError::Io {
            message: format!("Server error: {}", e),
        })?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
