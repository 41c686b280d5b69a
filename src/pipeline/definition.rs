// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Pipeline definition structures
//!
//! Defines the schema for stage definition YAML files. A built-in
//! definition is compiled into the binary and used when no file is given.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::SignError;

const BUILTIN_STAGES: &str = include_str!("../../config/stages.yaml");

/// Stage definitions and named plans
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Definition version (for future compatibility)
    #[serde(default = "default_version")]
    pub version: String,

    /// Pipeline name
    pub name: String,

    /// Pipeline description
    #[serde(default)]
    pub description: Option<String>,

    /// Every stage that can appear in a plan
    pub stages: Vec<StageConfig>,

    /// Named plans: ordered stage names
    #[serde(default)]
    pub plans: BTreeMap<String, Vec<String>>,
}

fn default_version() -> String {
    "1".to_string()
}

impl PipelineDefinition {
    /// The definition shipped with signgpt
    pub fn builtin() -> Result<Self, SignError> {
        Self::from_yaml(BUILTIN_STAGES)
    }

    /// Load the definition from a YAML file, or the built-in one
    pub fn load(path: Option<&Path>) -> Result<Self, SignError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    /// Load definition from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, SignError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SignError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        Self::from_yaml(&content)
    }

    /// Parse definition from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, SignError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Get a stage by name
    pub fn get_stage(&self, name: &str) -> Option<&StageConfig> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Get all stage names
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Stage names of a named plan
    pub fn plan(&self, name: &str) -> Result<&[String], SignError> {
        self.plans
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SignError::InvalidPlan {
                reason: format!(
                    "no plan named '{}' (available: {})",
                    name,
                    self.plans.keys().cloned().collect::<Vec<_>>().join(", ")
                ),
            })
    }
}

/// One stage: the behavior descriptor and the task it performs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stage name (must be unique within the definition)
    pub name: String,

    /// Who the model acts as
    pub role: String,

    /// What the model is trying to achieve
    pub goal: String,

    /// Background that shapes the model's behavior
    #[serde(default)]
    pub backstory: String,

    /// Task template used with token input
    pub description: String,

    /// Task template used when the caller sends a free-text message
    #[serde(default)]
    pub message_description: Option<String>,

    /// Description of the expected output
    #[serde(default)]
    pub expected_output: String,

    /// Caller-supplied inputs this stage reads
    #[serde(default)]
    pub inputs: Vec<InputKey>,

    /// Stages whose output this stage may read as context
    #[serde(default)]
    pub context: Vec<String>,
}

impl StageConfig {
    /// Check whether the stage declares an input
    pub fn reads(&self, key: InputKey) -> bool {
        self.inputs.contains(&key)
    }

    /// Description truncated for display in traces
    pub fn short_description(&self) -> String {
        const LIMIT: usize = 100;

        let description = self.description.trim();
        if description.chars().count() > LIMIT {
            let truncated: String = description.chars().take(LIMIT).collect();
            format!("{}...", truncated)
        } else {
            description.to_string()
        }
    }
}

/// Caller-supplied parameters a stage may read
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InputKey {
    /// ASL gloss tokens
    Words,
    /// The controlled vocabulary
    Vocabulary,
    /// Free-text message
    Message,
}

impl InputKey {
    /// Map a template placeholder to the input it reads
    pub fn from_placeholder(name: &str) -> Option<Self> {
        match name {
            "words" => Some(Self::Words),
            "vocabulary" | "ASL_dataset" => Some(Self::Vocabulary),
            "message" => Some(Self::Message),
            _ => None,
        }
    }
}

impl std::fmt::Display for InputKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Words => write!(f, "words"),
            Self::Vocabulary => write!(f, "vocabulary"),
            Self::Message => write!(f, "message"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_definition_parses() {
        let definition = PipelineDefinition::builtin().unwrap();
        assert_eq!(
            definition.stage_names(),
            vec!["finish_sentence", "chat", "sentence_split", "rearrange_word"]
        );
        assert_eq!(
            definition.plan("full").unwrap(),
            &["finish_sentence", "chat", "sentence_split"]
        );
        assert_eq!(definition.plan("chat_only").unwrap(), &["finish_sentence", "chat"]);
        assert_eq!(definition.plan("chat").unwrap(), &["chat"]);
    }

    #[test]
    fn test_rearrange_word_declared_but_not_planned() {
        let definition = PipelineDefinition::builtin().unwrap();
        assert!(definition.get_stage("rearrange_word").is_some());
        assert!(definition
            .plans
            .values()
            .all(|plan| !plan.iter().any(|s| s == "rearrange_word")));
    }

    #[test]
    fn test_parse_minimal_stage() {
        let yaml = r#"
name: "tiny"
stages:
  - name: "only"
    role: "Echo"
    goal: "Repeat"
    description: "Repeat {words}"
    inputs: [words]
"#;

        let definition = PipelineDefinition::from_yaml(yaml).unwrap();
        assert_eq!(definition.version, "1");
        assert!(definition.plans.is_empty());

        let stage = &definition.stages[0];
        assert!(stage.reads(InputKey::Words));
        assert!(!stage.reads(InputKey::Message));
        assert!(stage.context.is_empty());
        assert!(stage.message_description.is_none());
    }

    #[test]
    fn test_unknown_input_key_rejected() {
        let yaml = r#"
name: "bad"
stages:
  - name: "only"
    role: "Echo"
    goal: "Repeat"
    description: "Repeat"
    inputs: [colour]
"#;

        assert!(matches!(
            PipelineDefinition::from_yaml(yaml),
            Err(SignError::Yaml { .. })
        ));
    }

    #[test]
    fn test_unknown_plan_lists_available() {
        let definition = PipelineDefinition::builtin().unwrap();
        let err = definition.plan("nope").unwrap_err();
        assert!(err.to_string().contains("chat_only"));
    }

    #[test]
    fn test_short_description_truncates() {
        let mut stage = PipelineDefinition::builtin().unwrap().stages[0].clone();
        stage.description = "x".repeat(150);
        let short = stage.short_description();
        assert_eq!(short.len(), 103);
        assert!(short.ends_with("..."));

        stage.description = "short".into();
        assert_eq!(stage.short_description(), "short");
    }

    #[test]
    fn test_from_file_missing() {
        let result = PipelineDefinition::from_file(Path::new("/no/such/stages.yaml"));
        assert!(matches!(result, Err(SignError::FileReadError { .. })));
    }
}
