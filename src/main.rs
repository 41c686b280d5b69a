// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! signgpt - ASL gloss to natural language pipeline service

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signgpt::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "signgpt=debug,tower_http=debug"
    } else {
        "signgpt=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let settings = &cli.settings;

    // Dispatch to command handlers
    match cli.command {
        Commands::Serve { host, port } => {
            signgpt::cli::serve::run(settings, host, port, cli.verbose).await
        }
        Commands::Run {
            words,
            plan,
            stage,
            message,
            dry_run,
        } => {
            signgpt::cli::run::run(settings, words, plan, stage, message, dry_run, cli.verbose)
                .await
        }
        Commands::Check { tokens, format } => {
            signgpt::cli::check::run(settings, tokens, format, cli.verbose).await
        }
        Commands::Validate => signgpt::cli::validate::run(settings, cli.verbose).await,
        Commands::Graph { format } => {
            signgpt::cli::graph::run(settings, format, cli.verbose).await
        }
    }
}
