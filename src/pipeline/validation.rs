// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Definition validation
//!
//! Validates stage definitions and named plans before the service starts.

use std::collections::HashSet;

use crate::errors::SignError;
use crate::pipeline::prompt::placeholders;
use crate::pipeline::{ContextGraph, InputKey, PipelineDefinition, StageConfig};

/// Definition validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate a pipeline definition
    pub fn validate(definition: &PipelineDefinition) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Check for empty stages
        if definition.stages.is_empty() {
            result.add_error("Definition has no stages");
        }

        // Check for duplicate stage names
        let mut seen_names = HashSet::new();
        for stage in &definition.stages {
            if !seen_names.insert(&stage.name) {
                result.add_error(&format!("Duplicate stage name: '{}'", stage.name));
            }
        }

        // Context graph structure (unknown references and cycles)
        let graph = match ContextGraph::build(definition) {
            Ok(graph) => Some(graph),
            Err(SignError::CircularContext { stages }) => {
                result.add_error(&format!("Circular context: {}", stages.join(" -> ")));
                None
            }
            Err(SignError::UnknownContext { stage, dependency }) => {
                result.add_error(&format!(
                    "Stage '{}' reads context from unknown stage '{}'",
                    stage, dependency
                ));
                None
            }
            // Duplicates are already reported above
            Err(SignError::InvalidPipeline { .. }) => None,
            Err(e) => {
                result.add_error(&format!("Context graph error: {}", e));
                None
            }
        };

        for stage in &definition.stages {
            Self::validate_stage(stage, &mut result);
        }

        for (plan_name, stage_names) in &definition.plans {
            Self::validate_plan(plan_name, stage_names, definition, graph.as_ref(), &mut result);
        }

        result
    }

    /// Validate a single stage
    fn validate_stage(stage: &StageConfig, result: &mut ValidationResult) {
        if stage.name.trim().is_empty() {
            result.add_error("Stage with an empty name");
        }

        if stage.description.trim().is_empty() {
            result.add_error(&format!("Stage '{}': Task description is empty", stage.name));
        }

        if stage.role.trim().is_empty() || stage.goal.trim().is_empty() {
            result.add_warning(&format!(
                "Stage '{}': Role or goal is empty - the model gets no behavior descriptor",
                stage.name
            ));
        }

        let templates = std::iter::once(&stage.description).chain(&stage.message_description);
        for template in templates {
            for placeholder in placeholders(template) {
                match InputKey::from_placeholder(&placeholder) {
                    Some(key) if !stage.reads(key) => {
                        result.add_warning(&format!(
                            "Stage '{}': Template uses {{{}}} but the stage does not declare input '{}'",
                            stage.name, placeholder, key
                        ));
                    }
                    Some(_) => {}
                    None => {
                        result.add_warning(&format!(
                            "Stage '{}': Unknown placeholder {{{}}} will be left as is",
                            stage.name, placeholder
                        ));
                    }
                }
            }
        }

        if stage.message_description.is_some() && !stage.reads(InputKey::Message) {
            result.add_warning(&format!(
                "Stage '{}': Has a message template but does not declare input 'message'",
                stage.name
            ));
        }
    }

    /// Validate a named plan
    fn validate_plan(
        plan_name: &str,
        stage_names: &[String],
        definition: &PipelineDefinition,
        graph: Option<&ContextGraph>,
        result: &mut ValidationResult,
    ) {
        if stage_names.is_empty() {
            result.add_error(&format!("Plan '{}' has no stages", plan_name));
            return;
        }

        for (idx, name) in stage_names.iter().enumerate() {
            let Some(stage) = definition.get_stage(name) else {
                result.add_error(&format!(
                    "Plan '{}': References unknown stage '{}'",
                    plan_name, name
                ));
                continue;
            };

            if let Some(prev) = idx.checked_sub(1).map(|i| &stage_names[i]) {
                if graph.is_some_and(|g| g.depends_on(prev, name)) {
                    result.add_warning(&format!(
                        "Plan '{}': Stage '{}' runs before '{}' but reads context from it",
                        plan_name, prev, name
                    ));
                } else if !stage.context.contains(prev) {
                    result.add_warning(&format!(
                        "Plan '{}': Stage '{}' follows '{}' but does not declare it as context",
                        plan_name, name, prev
                    ));
                }
            }
        }
    }
}

/// Result of definition validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Convert to an error when there are errors
    pub fn into_result(self) -> Result<Vec<String>, SignError> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(SignError::InvalidPipeline {
                reason: self.errors.join("; "),
                help: Some("Run 'signgpt validate' for details".into()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> PipelineDefinition {
        PipelineDefinition::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_builtin_definition_is_valid() {
        let result = PipelineValidator::validate(&PipelineDefinition::builtin().unwrap());
        assert!(result.is_valid(), "errors: {:?}", result.errors);
        assert!(!result.has_warnings(), "warnings: {:?}", result.warnings);
    }

    #[test]
    fn test_validate_empty_definition() {
        let result = PipelineValidator::validate(&parse("name: empty\nstages: []\n"));
        assert!(!result.is_valid());
        assert!(result.errors[0].contains("no stages"));
    }

    #[test]
    fn test_validate_duplicate_names() {
        let result = PipelineValidator::validate(&parse(
            r#"
name: dup
stages:
  - { name: a, role: r, goal: g, description: d }
  - { name: a, role: r, goal: g, description: d }
"#,
        ));

        assert!(!result.is_valid());
        assert_eq!(
            result.errors.iter().filter(|e| e.contains("Duplicate")).count(),
            1
        );
    }

    #[test]
    fn test_validate_cycle_and_unknown_context() {
        let cyclic = PipelineValidator::validate(&parse(
            r#"
name: cyclic
stages:
  - { name: a, role: r, goal: g, description: d, context: [b] }
  - { name: b, role: r, goal: g, description: d, context: [a] }
"#,
        ));
        assert!(cyclic.errors.iter().any(|e| e.contains("Circular context")));

        let unknown = PipelineValidator::validate(&parse(
            r#"
name: unknown
stages:
  - { name: a, role: r, goal: g, description: d, context: [ghost] }
"#,
        ));
        assert!(unknown.errors.iter().any(|e| e.contains("'ghost'")));
    }

    #[test]
    fn test_validate_plans() {
        let result = PipelineValidator::validate(&parse(
            r#"
name: plans
stages:
  - { name: a, role: r, goal: g, description: d }
  - { name: b, role: r, goal: g, description: d }
plans:
  empty: []
  broken: [a, ghost]
  unwired: [a, b]
"#,
        ));

        assert!(result.errors.iter().any(|e| e.contains("'empty' has no stages")));
        assert!(result.errors.iter().any(|e| e.contains("unknown stage 'ghost'")));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("'b' follows 'a'")));
    }

    #[test]
    fn test_validate_plan_against_context_order() {
        let result = PipelineValidator::validate(&parse(
            r#"
name: reversed
stages:
  - { name: a, role: r, goal: g, description: d }
  - { name: b, role: r, goal: g, description: d, context: [a] }
  - { name: c, role: r, goal: g, description: d, context: [b] }
plans:
  forward: [a, b, c]
  backward: [c, a]
"#,
        ));

        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1, "warnings: {:?}", result.warnings);
        assert!(result.warnings[0].contains("'c' runs before 'a'"));
    }

    #[test]
    fn test_validate_undeclared_placeholder_warns() {
        let result = PipelineValidator::validate(&parse(
            r#"
name: placeholders
stages:
  - name: a
    role: r
    goal: g
    description: "Use {words} and {colour}"
    message_description: "Reply to {message}"
"#,
        ));

        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.contains("{words}")));
        assert!(result.warnings.iter().any(|w| w.contains("{colour}")));
        assert!(result.warnings.iter().any(|w| w.contains("message template")));
    }

    #[test]
    fn test_into_result() {
        let mut result = ValidationResult::new();
        result.add_warning("careful");
        assert_eq!(result.into_result().unwrap(), vec!["careful"]);

        let mut result = ValidationResult::new();
        result.add_error("broken");
        assert!(matches!(
            result.into_result(),
            Err(SignError::InvalidPipeline { .. })
        ));
    }
}
