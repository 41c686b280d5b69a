// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! # signgpt - ASL gloss to natural language pipeline
//!
//! `signgpt` turns lists of American Sign Language gloss tokens into natural
//! language by running them through a fixed sequence of language-model
//! stages, and offers a direct single-stage chat shortcut.
//!
//! ## Features
//!
//! - **Stage registry** - Stages and their context edges are declared in YAML
//! - **Partial plans** - Run any ordered subset of stages, chained output to input
//! - **Vocabulary checks** - Validate tokens against a controlled vocabulary
//! - **HTTP service** - JSON endpoints with per-request cancellation
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the service
//! signgpt serve
//!
//! # Run the full plan once without calling a model
//! signgpt run YOU NAME WHAT --dry-run
//!
//! # Show how stages feed each other
//! signgpt graph --format mermaid
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod executors;
pub mod pipeline;
pub mod server;
pub mod utils;
pub mod vocabulary;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use errors::SignError;
pub use pipeline::{PipelineBuilder, PipelineGraph, PipelineRunner, Stage};
pub use vocabulary::VocabularyIndex;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
