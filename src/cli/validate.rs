// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Validate command - check stage definitions and plans

use colored::Colorize;
use miette::Result;

use super::Settings;
use crate::pipeline::{PipelineDefinition, PipelineValidator};

/// Run the validate command
pub async fn run(settings: &Settings, verbose: bool) -> Result<()> {
    println!("{}", "Validating stage definitions...".bold());
    println!();

    let config = settings.resolve()?;
    let source = config
        .pipeline
        .stages
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in definitions".to_string());

    let definition = match PipelineDefinition::load(config.pipeline.stages.as_deref()) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("  {} Failed to parse {}", "✗".red(), source);
            eprintln!();
            return Err(e.into());
        }
    };

    println!("  {} Parsed {}", "✓".green(), source);

    let validation = PipelineValidator::validate(&definition);

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if validation.has_warnings() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Definition summary".bold());
        println!("  Name: {}", definition.name);
        println!("  Stages: {}", definition.stages.len());
        for stage in &definition.stages {
            let context = if stage.context.is_empty() {
                String::new()
            } else {
                format!(" [context: {}]", stage.context.join(", "))
            };
            println!("    - {} ({}){}", stage.name, stage.role, context.dimmed());
        }
        println!("  Plans:");
        for (name, stages) in &definition.plans {
            println!("    - {}: {}", name, stages.join(" -> "));
        }
    }

    println!();

    if !validation.is_valid() {
        return Err(miette::miette!("Stage definition validation failed"));
    }

    if validation.has_warnings() {
        println!(
            "{}",
            "Definitions are valid but have warnings.".yellow().bold()
        );
    } else {
        println!("{}", "Definitions are valid!".green().bold());
    }

    Ok(())
}
