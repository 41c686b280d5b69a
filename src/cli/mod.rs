// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for signgpt.

pub mod check;
pub mod graph;
pub mod run;
pub mod serve;
pub mod validate;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Backend, ServiceConfig};
use crate::errors::SignError;

/// ASL gloss to natural language pipeline service
#[derive(Parser, Debug)]
#[clap(
    name = "signgpt",
    version,
    about = "Turn ASL gloss tokens into natural language through a staged model pipeline",
    long_about = None,
    after_help = "Examples:\n\
        signgpt serve                        Start the HTTP service\n\
        signgpt run YOU NAME WHAT            Run the full plan on tokens\n\
        signgpt run --message \"hi\" -p chat   Chat with the chat stage\n\
        signgpt check YOU XYZ                Check tokens against the vocabulary\n\n\
        See 'signgpt <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    #[clap(flatten)]
    pub settings: Settings,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,
}

/// Options that override the service configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct Settings {
    /// Service configuration file (TOML)
    #[clap(short, long, global = true, env = "SIGNGPT_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Vocabulary JSON file
    #[clap(long, global = true, env = "SIGNGPT_DATA", value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Stage definitions YAML file (built-in definitions when unset)
    #[clap(long, global = true, env = "SIGNGPT_STAGES", value_name = "FILE")]
    pub stages: Option<PathBuf>,

    /// Model backend (openai, echo)
    #[clap(long, global = true, env = "SIGNGPT_BACKEND")]
    pub backend: Option<Backend>,

    /// Model identifier
    #[clap(long, global = true, env = "SIGNGPT_MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[clap(long, global = true, env = "OPENAI_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,
}

impl Settings {
    /// Load the configuration file and apply overrides on top
    pub fn resolve(&self) -> Result<ServiceConfig, SignError> {
        let mut config = ServiceConfig::load(self.config.as_deref())?;

        if let Some(ref data) = self.data {
            config.data.vocabulary = data.clone();
        }
        if let Some(ref stages) = self.stages {
            config.pipeline.stages = Some(stages.clone());
        }
        if let Some(backend) = self.backend {
            config.model.backend = backend;
        }
        if let Some(ref model) = self.model {
            config.model.model = model.clone();
        }
        if let Some(ref base_url) = self.base_url {
            config.model.base_url = base_url.clone();
        }

        config.model.resolve_api_key();
        config.validate()?;

        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP service
    Serve {
        /// Address to bind
        #[clap(long, env = "SIGNGPT_HOST")]
        host: Option<String>,

        /// Port to bind
        #[clap(short, long, env = "SIGNGPT_PORT")]
        port: Option<u16>,
    },

    /// Run a plan once and print the result
    Run {
        /// ASL gloss tokens
        words: Vec<String>,

        /// Named plan to run
        #[clap(short, long, default_value = "full")]
        plan: String,

        /// Run these stages in order instead of a named plan
        #[clap(short, long)]
        stage: Vec<String>,

        /// Free-text message (replaces the tokens)
        #[clap(short, long)]
        message: Option<String>,

        /// Use the offline echo backend instead of the model
        #[clap(long)]
        dry_run: bool,
    },

    /// Check tokens against the vocabulary
    Check {
        /// Tokens to check
        #[clap(required = true)]
        tokens: Vec<String>,

        /// Output format (text, json)
        #[clap(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate stage definitions and plans
    Validate,

    /// Show the stage context graph
    Graph {
        /// Output format (text, dot, mermaid)
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,
    },
}

/// Output format for the check command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signgpt.toml");
        std::fs::write(
            &path,
            "[data]\nvocabulary = \"from-file.json\"\n\n[model]\nmodel = \"file-model\"\n",
        )
        .unwrap();

        let settings = Settings {
            config: Some(path),
            model: Some("flag-model".into()),
            backend: Some(Backend::Echo),
            ..Settings::default()
        };
        let config = settings.resolve().unwrap();

        assert_eq!(config.data.vocabulary, PathBuf::from("from-file.json"));
        assert_eq!(config.model.model, "flag-model");
        assert_eq!(config.model.backend, Backend::Echo);
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "signgpt", "run", "YOU", "NAME", "--plan", "chat_only", "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                words,
                plan,
                dry_run,
                ..
            } => {
                assert_eq!(words, vec!["YOU", "NAME"]);
                assert_eq!(plan, "chat_only");
                assert!(dry_run);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_graph_format_parsing() {
        assert_eq!("DOT".parse::<GraphFormat>().unwrap(), GraphFormat::Dot);
        assert!("svg".parse::<GraphFormat>().is_err());
    }
}
