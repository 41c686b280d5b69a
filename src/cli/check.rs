// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Check command - validate tokens against the vocabulary

use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use super::{OutputFormat, Settings};
use crate::vocabulary::VocabularyIndex;

/// Run the check command
pub async fn run(
    settings: &Settings,
    tokens: Vec<String>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = settings.resolve()?;
    let vocabulary = VocabularyIndex::load(&config.data.vocabulary)?;
    let validation = vocabulary.validate_many(&tokens);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&validation).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            if verbose {
                println!(
                    "Vocabulary: {} tokens from {}",
                    vocabulary.size(),
                    config.data.vocabulary.display()
                );
                println!();
            }

            for verdict in &validation.results {
                match verdict.normalized {
                    Some(ref normalized) if normalized != &verdict.token => {
                        println!("  {} {} -> {}", "✓".green(), verdict.token, normalized)
                    }
                    Some(_) => println!("  {} {}", "✓".green(), verdict.token),
                    None => println!("  {} {}", "✗".red(), verdict.token),
                }
            }

            let summary = &validation.summary;
            println!();
            println!(
                "{} valid, {} invalid of {} tokens",
                summary.valid_count.to_string().green(),
                summary.invalid_count.to_string().red(),
                summary.total_tokens
            );
        }
    }

    if validation.summary.invalid_count > 0 {
        return Err(miette::miette!(
            "Not in the vocabulary: {}",
            validation.summary.invalid_tokens.join(", ")
        ));
    }

    Ok(())
}
