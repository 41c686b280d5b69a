// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Pipeline definitions and types
//!
//! This module defines the stage registry, the context graph between stages,
//! plan building, prompt composition and the sequential runner.

mod builder;
mod definition;
mod graph;
pub mod prompt;
mod request;
mod runner;
mod trace;
mod validation;

pub use builder::{ExecutionPlan, PipelineBuilder, PlanStep};
pub use definition::*;
pub use graph::{ContextGraph, PipelineGraph, Stage};
pub use prompt::Prompt;
pub use request::{CallerInputs, StageInput, StageRequest};
pub use runner::{PipelineOutput, PipelineRunner};
pub use trace::{ExecutionTrace, StageResult};
pub use validation::{PipelineValidator, ValidationResult};
