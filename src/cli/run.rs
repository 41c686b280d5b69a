// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Run command - execute one plan and print the result

use colored::Colorize;
use miette::Result;
use tokio_util::sync::CancellationToken;

use super::Settings;
use crate::config::Backend;
use crate::errors::SignError;
use crate::pipeline::{CallerInputs, PipelineBuilder};
use crate::server::AppState;
use crate::utils::create_spinner;

/// Run a plan once
pub async fn run(
    settings: &Settings,
    words: Vec<String>,
    plan_name: String,
    stages: Vec<String>,
    message: Option<String>,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    let mut config = settings.resolve()?;
    if dry_run {
        config.model.backend = Backend::Echo;
    }

    let state = AppState::from_config(&config)?;

    let inputs = match message {
        Some(message) if !message.trim().is_empty() => CallerInputs::message(message),
        Some(_) => return Err(SignError::validation("message", "Message cannot be empty").into()),
        None if words.is_empty() => {
            return Err(
                SignError::validation("words", "Provide tokens or --message to run a plan").into(),
            )
        }
        None => CallerInputs::tokens(words, state.vocabulary.clone()),
    };

    if !state.graph.is_configured() {
        return Err(SignError::ModelUnconfigured {
            reason: format!("{} is not set", config.model.api_key_env),
        }
        .into());
    }

    let builder = PipelineBuilder::new(&state.graph);
    let plan = if stages.is_empty() {
        builder.build_named(&plan_name)?
    } else {
        builder.build(&stages)?
    };

    println!(
        "{} {}",
        "Running".bold(),
        plan.stage_names().join(" -> ").cyan()
    );

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let spinner = create_spinner(&format!(
        "Executing {} stage{}...",
        plan.len(),
        if plan.len() == 1 { "" } else { "s" }
    ));
    let result = state.runner.run(&plan, &inputs, &cancel).await;
    spinner.finish_and_clear();

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            eprintln!("  {} {}", "✗".red(), e);
            return Err(e.into());
        }
    };

    println!();
    for result in &output.trace {
        println!(
            "  {} [{}] {} {}",
            "✓".green(),
            result.index + 1,
            result.stage.bold(),
            format!("({}, {})", result.role, result.executor).dimmed()
        );
        if verbose {
            for line in result.output.lines() {
                println!("      {}", line);
            }
        }
    }

    println!();
    println!("{}", output.content);

    if verbose {
        println!();
        println!(
            "{}",
            format!("Completed in {:.2}s", output.duration.as_secs_f64()).dimmed()
        );
    }

    Ok(())
}
