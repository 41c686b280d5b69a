// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Error types
//!
//! Every failure in signgpt is a [`SignError`]. Callers that need to decide
//! how to report a failure (HTTP status, exit code) match on
//! [`SignError::kind`] instead of on transport-specific details.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`SignError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Vocabulary source missing or malformed
    DataLoad,
    /// Stage definitions, plans or service settings are invalid
    Config,
    /// A requested stage is not registered
    UnknownStage,
    /// A stage invocation failed
    StageExecution,
    /// Caller input rejected before any stage ran
    Validation,
    /// The model backend has no credential
    Unconfigured,
    /// The run was cancelled by the caller
    Cancelled,
    /// IO and serialization failures
    Internal,
}

/// Main error type for signgpt
#[derive(Error, Debug, Diagnostic)]
pub enum SignError {
    // ─────────────────────────────────────────────────────────────────────────
    // Data Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to load vocabulary from '{path}': {reason}")]
    #[diagnostic(
        code(signgpt::data_load),
        help("The vocabulary file must be a JSON object mapping keys to words")
    )]
    DataLoad { path: PathBuf, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(signgpt::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Invalid pipeline configuration: {reason}")]
    #[diagnostic(code(signgpt::invalid_pipeline))]
    InvalidPipeline {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Stage '{stage}' is not registered")]
    #[diagnostic(
        code(signgpt::unknown_stage),
        help("Run 'signgpt graph' to list the declared stages")
    )]
    UnknownStage { stage: String },

    #[error("Stage '{stage}' reads context from unknown stage '{dependency}'")]
    #[diagnostic(
        code(signgpt::unknown_context),
        help("Check that '{dependency}' is defined in your stage definitions")
    )]
    UnknownContext { stage: String, dependency: String },

    #[error("Circular context dependency detected: {}", .stages.join(" -> "))]
    #[diagnostic(
        code(signgpt::circular_context),
        help("Review the 'context' lists of your stages to remove the cycle")
    )]
    CircularContext { stages: Vec<String> },

    #[error("Invalid execution plan: {reason}")]
    #[diagnostic(code(signgpt::invalid_plan))]
    InvalidPlan { reason: String },

    #[error("Invalid service configuration: {reason}")]
    #[diagnostic(code(signgpt::invalid_config))]
    InvalidConfig { reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage '{stage}' failed: {source}")]
    #[diagnostic(code(signgpt::stage_execution))]
    StageExecution {
        stage: String,
        #[source]
        source: Box<SignError>,
    },

    #[error("Model backend is not configured: {reason}")]
    #[diagnostic(
        code(signgpt::model_unconfigured),
        help("Set OPENAI_API_KEY in your environment, or run with --backend echo")
    )]
    ModelUnconfigured { reason: String },

    #[error("Model request failed: {message}")]
    #[diagnostic(code(signgpt::model_request))]
    ModelRequest {
        message: String,
        status: Option<u16>,
    },

    #[error("Run cancelled during stage '{stage}'")]
    #[diagnostic(code(signgpt::cancelled))]
    Cancelled { stage: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(signgpt::validation))]
    Validation { field: String, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(signgpt::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(signgpt::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(signgpt::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(signgpt::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for SignError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for SignError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for SignError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for SignError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<reqwest::Error> for SignError {
    fn from(e: reqwest::Error) -> Self {
        Self::ModelRequest {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl SignError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DataLoad { .. } => ErrorKind::DataLoad,
            Self::FileReadError { .. }
            | Self::InvalidPipeline { .. }
            | Self::UnknownContext { .. }
            | Self::CircularContext { .. }
            | Self::InvalidPlan { .. }
            | Self::InvalidConfig { .. }
            | Self::Yaml { .. }
            | Self::Toml { .. } => ErrorKind::Config,
            Self::UnknownStage { .. } => ErrorKind::UnknownStage,
            Self::StageExecution { .. } | Self::ModelRequest { .. } => ErrorKind::StageExecution,
            Self::ModelUnconfigured { .. } => ErrorKind::Unconfigured,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Io { .. } | Self::Json { .. } => ErrorKind::Internal,
        }
    }

    /// Create a validation error for a caller-supplied field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Wrap an executor failure with the stage it happened in
    ///
    /// Cancellation passes through unwrapped so callers can tell an aborted
    /// run from a failed one.
    pub fn in_stage(self, stage: &str) -> Self {
        match self {
            Self::Cancelled { .. } | Self::StageExecution { .. } => self,
            other => Self::StageExecution {
                stage: stage.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost cause, following stage wrappers
    pub fn root_cause(&self) -> &SignError {
        match self {
            Self::StageExecution { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_stage_wraps_cause() {
        let err = SignError::ModelRequest {
            message: "boom".into(),
            status: Some(502),
        }
        .in_stage("chat");

        assert_eq!(err.kind(), ErrorKind::StageExecution);
        assert!(err.to_string().contains("Stage 'chat' failed"));
        assert!(err.to_string().contains("boom"));
        assert!(matches!(
            err.root_cause(),
            SignError::ModelRequest { status: Some(502), .. }
        ));
    }

    #[test]
    fn test_in_stage_keeps_cancellation() {
        let err = SignError::Cancelled {
            stage: "chat".into(),
        }
        .in_stage("chat");

        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_unconfigured_wrapped_is_still_visible() {
        let err = SignError::ModelUnconfigured {
            reason: "OPENAI_API_KEY not set".into(),
        }
        .in_stage("finish_sentence");

        assert_eq!(err.kind(), ErrorKind::StageExecution);
        assert_eq!(err.root_cause().kind(), ErrorKind::Unconfigured);
    }
}
