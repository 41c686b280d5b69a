// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Serve command - start the HTTP service

use colored::Colorize;
use miette::Result;

use super::Settings;
use crate::server::{start_server, AppState};

/// Run the serve command
pub async fn run(
    settings: &Settings,
    host: Option<String>,
    port: Option<u16>,
    verbose: bool,
) -> Result<()> {
    let mut config = settings.resolve()?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = AppState::from_config(&config)?;

    println!(
        "{} SignGPT on {}:{} ({} backend, model {})",
        "Starting".green().bold(),
        config.server.host,
        config.server.port,
        config.model.backend,
        state.model
    );

    if verbose {
        println!(
            "  Stages: {}",
            state.graph.definition().stage_names().join(", ")
        );
        println!(
            "  Plans: {}",
            state
                .graph
                .definition()
                .plans
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    start_server(state, &config).await?;
    Ok(())
}
