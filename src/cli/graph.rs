// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Graph command - visualize stage context edges

use miette::Result;

use super::{GraphFormat, Settings};
use crate::pipeline::{ContextGraph, PipelineDefinition};

/// Run the graph command
pub async fn run(settings: &Settings, format: GraphFormat, verbose: bool) -> Result<()> {
    let config = settings.resolve()?;
    let definition = PipelineDefinition::load(config.pipeline.stages.as_deref())?;

    let graph = ContextGraph::build(&definition)?;

    let output = match format {
        GraphFormat::Text => {
            let mut text = graph.to_text(&definition);
            if verbose && !definition.plans.is_empty() {
                text.push_str("\nPlans:\n");
                for (name, stages) in &definition.plans {
                    text.push_str(&format!("  {}: {}\n", name, stages.join(" -> ")));
                }
            }
            text
        }
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    print!("{}", output);

    Ok(())
}
