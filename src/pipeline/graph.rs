// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Stage registry and context graph
//!
//! [`ContextGraph`] holds the declared context edges between stages (an edge
//! `a -> b` means `b` may read `a`'s output) and rejects unknown references
//! and cycles. [`PipelineGraph`] pairs that topology with the executable
//! [`Stage`]s, constructed once at startup.

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::SignError;
use crate::executors::StageExecutor;
use crate::pipeline::{PipelineDefinition, StageConfig};

/// A declared stage bound to the executor that runs it
pub struct Stage {
    config: StageConfig,
    executor: Arc<dyn StageExecutor>,
}

impl Stage {
    pub fn new(config: StageConfig, executor: Arc<dyn StageExecutor>) -> Self {
        Self { config, executor }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn executor(&self) -> &Arc<dyn StageExecutor> {
        &self.executor
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.config.name)
            .field("executor", &self.executor.name())
            .finish()
    }
}

/// Declared context dependencies between stages
#[derive(Debug)]
pub struct ContextGraph {
    graph: DiGraph<usize, ()>,
    name_to_index: HashMap<String, NodeIndex>,
    index_to_name: HashMap<NodeIndex, String>,
    declared: Vec<String>,
}

impl ContextGraph {
    /// Build the context graph of a definition
    pub fn build(definition: &PipelineDefinition) -> Result<Self, SignError> {
        let mut graph = DiGraph::new();
        let mut name_to_index = HashMap::new();
        let mut index_to_name = HashMap::new();
        let mut declared = Vec::with_capacity(definition.stages.len());

        // Add all stages as nodes
        for (idx, stage) in definition.stages.iter().enumerate() {
            if name_to_index.contains_key(&stage.name) {
                return Err(SignError::InvalidPipeline {
                    reason: format!("duplicate stage name '{}'", stage.name),
                    help: Some("Stage names must be unique".into()),
                });
            }

            let node = graph.add_node(idx);
            name_to_index.insert(stage.name.clone(), node);
            index_to_name.insert(node, stage.name.clone());
            declared.push(stage.name.clone());
        }

        // Add context edges
        for stage in &definition.stages {
            let stage_node = name_to_index[&stage.name];

            for dep_name in &stage.context {
                let dep_node =
                    name_to_index
                        .get(dep_name)
                        .ok_or_else(|| SignError::UnknownContext {
                            stage: stage.name.clone(),
                            dependency: dep_name.clone(),
                        })?;

                if !graph.contains_edge(*dep_node, stage_node) {
                    graph.add_edge(*dep_node, stage_node, ());
                }
            }
        }

        let built = Self {
            graph,
            name_to_index,
            index_to_name,
            declared,
        };
        built.validate_acyclic()?;

        Ok(built)
    }

    fn validate_acyclic(&self) -> Result<(), SignError> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(_) => Err(SignError::CircularContext {
                stages: self.cycle_members(),
            }),
        }
    }

    /// Names of the stages in the first cycle found, in declaration order
    fn cycle_members(&self) -> Vec<String> {
        let cycle = kosaraju_scc(&self.graph).into_iter().find(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|n| self.graph.contains_edge(*n, *n))
        });

        let Some(mut component) = cycle else {
            return Vec::new();
        };

        component.sort_by_key(|n| self.graph[*n]);
        component
            .into_iter()
            .map(|n| self.index_to_name[&n].clone())
            .collect()
    }

    /// Stage names in declaration order
    pub fn stage_names(&self) -> &[String] {
        &self.declared
    }

    /// Get topologically sorted stage names
    pub fn topological_order_names(&self) -> Vec<String> {
        // Acyclic by construction
        toposort(&self.graph, None)
            .map(|nodes| {
                nodes
                    .into_iter()
                    .map(|n| self.index_to_name[&n].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Stages whose output this stage may read
    pub fn dependencies(&self, stage_name: &str) -> Option<Vec<String>> {
        self.neighbors(stage_name, petgraph::Direction::Incoming)
    }

    /// Stages that may read this stage's output
    pub fn dependents(&self, stage_name: &str) -> Option<Vec<String>> {
        self.neighbors(stage_name, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, stage_name: &str, direction: petgraph::Direction) -> Option<Vec<String>> {
        let node = self.name_to_index.get(stage_name)?;
        let mut names: Vec<(usize, String)> = self
            .graph
            .neighbors_directed(*node, direction)
            .map(|n| (self.graph[n], self.index_to_name[&n].clone()))
            .collect();
        names.sort();
        Some(names.into_iter().map(|(_, name)| name).collect())
    }

    /// Check if stage A reads (directly or transitively) from stage B
    pub fn depends_on(&self, stage_a: &str, stage_b: &str) -> bool {
        let Some(node_a) = self.name_to_index.get(stage_a) else {
            return false;
        };
        let Some(node_b) = self.name_to_index.get(stage_b) else {
            return false;
        };

        node_a != node_b
            && petgraph::algo::has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    /// Every declared edge as `(from, to)`, in declaration order
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(from, to)| {
                (
                    self.index_to_name[&from].as_str(),
                    self.index_to_name[&to].as_str(),
                )
            })
            .collect()
    }

    /// Generate Mermaid diagram of the graph
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for name in &self.declared {
            out.push_str(&format!("    {}[{}]\n", name, name));
        }

        for (from, to) in self.edges() {
            out.push_str(&format!("    {} --> {}\n", from, to));
        }

        out
    }

    /// Generate DOT diagram of the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for (from, to) in self.edges() {
            out.push_str(&format!("    \"{}\" -> \"{}\";\n", from, to));
        }

        // Isolated nodes are not implied by any edge
        for name in &self.declared {
            let node = self.name_to_index[name];
            if self.graph.neighbors_undirected(node).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", name));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text listing of stages in dependency order
    pub fn to_text(&self, definition: &PipelineDefinition) -> String {
        let mut out = String::new();

        for (i, name) in self.topological_order_names().iter().enumerate() {
            let role = definition
                .get_stage(name)
                .map(|s| s.role.as_str())
                .unwrap_or("?");
            let deps = self.dependencies(name).unwrap_or_default();

            out.push_str(&format!("{}. {} ({})", i + 1, name, role));

            if !deps.is_empty() {
                out.push_str(&format!(" [context: {}]", deps.join(", ")));
            }

            out.push('\n');
        }

        out
    }
}

/// Every available stage, built once at startup and read-only afterwards
#[derive(Debug)]
pub struct PipelineGraph {
    definition: PipelineDefinition,
    topology: ContextGraph,
    stages: HashMap<String, Arc<Stage>>,
}

impl PipelineGraph {
    /// Construct every stage of a definition
    ///
    /// `construct` is called once per declared stage and returns the
    /// executor that will run it.
    pub fn build<F>(definition: PipelineDefinition, mut construct: F) -> Result<Self, SignError>
    where
        F: FnMut(&StageConfig) -> Arc<dyn StageExecutor>,
    {
        let topology = ContextGraph::build(&definition)?;

        let stages = definition
            .stages
            .iter()
            .map(|config| {
                let executor = construct(config);
                tracing::debug!(
                    "Registered stage '{}' with executor '{}'",
                    config.name,
                    executor.name()
                );
                (
                    config.name.clone(),
                    Arc::new(Stage::new(config.clone(), executor)),
                )
            })
            .collect();

        Ok(Self {
            definition,
            topology,
            stages,
        })
    }

    /// Construct every stage with the same executor
    pub fn with_executor(
        definition: PipelineDefinition,
        executor: Arc<dyn StageExecutor>,
    ) -> Result<Self, SignError> {
        Self::build(definition, |_| executor.clone())
    }

    pub fn stage(&self, name: &str) -> Option<&Arc<Stage>> {
        self.stages.get(name)
    }

    /// Stages in declaration order
    pub fn stages(&self) -> impl Iterator<Item = &Arc<Stage>> {
        self.topology
            .stage_names()
            .iter()
            .filter_map(|name| self.stages.get(name))
    }

    pub fn definition(&self) -> &PipelineDefinition {
        &self.definition
    }

    pub fn topology(&self) -> &ContextGraph {
        &self.topology
    }

    /// Whether every stage's executor has what it needs to run
    pub fn is_configured(&self) -> bool {
        self.stages.values().all(|s| s.executor().is_configured())
    }
}
