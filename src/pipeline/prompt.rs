// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Prompt composition
//!
//! Task templates use `{name}` placeholders. Known names are `words`,
//! `vocabulary` (alias `ASL_dataset`) and `message`; anything else is left
//! untouched so literal braces in prompts survive.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::pipeline::{StageConfig, StageInput, StageResult};

/// System and user messages for one stage invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Placeholder names used by a template, in order of first use
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Substitute known placeholders; unknown ones are kept verbatim
pub fn render_template(template: &str, vars: &HashMap<&str, String>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn template_vars(input: &StageInput<'_>) -> HashMap<&'static str, String> {
    let mut vars = HashMap::new();

    match input {
        StageInput::Message(message) => {
            vars.insert("message", message.to_string());
            vars.insert("words", String::new());
            vars.insert("vocabulary", String::new());
            vars.insert("ASL_dataset", String::new());
        }
        StageInput::Tokens { words, vocabulary } => {
            let vocabulary = vocabulary
                .map(|v| v.entries().join(", "))
                .unwrap_or_default();

            vars.insert("words", words.join(" "));
            vars.insert("vocabulary", vocabulary.clone());
            vars.insert("ASL_dataset", vocabulary);
            vars.insert("message", String::new());
        }
    }

    vars
}

/// Build the prompt for a stage from its config, input and wired context
pub fn compose(stage: &StageConfig, input: &StageInput<'_>, context: Option<&StageResult>) -> Prompt {
    let mut system = format!("You are {}.", stage.role.trim());
    if !stage.backstory.trim().is_empty() {
        system.push(' ');
        system.push_str(stage.backstory.trim());
    }
    system.push_str(&format!("\nYour goal: {}", stage.goal.trim()));

    let template = match (input, &stage.message_description) {
        (StageInput::Message(_), Some(message_template)) => message_template,
        _ => &stage.description,
    };

    let mut user = render_template(template.trim(), &template_vars(input));

    if !stage.expected_output.trim().is_empty() {
        user.push_str(&format!("\n\nExpected output: {}", stage.expected_output.trim()));
    }

    if let Some(context) = context {
        user.push_str(&format!(
            "\n\nContext from '{}':\n{}",
            context.stage, context.output
        ));
    }

    Prompt { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineDefinition;
    use crate::vocabulary::VocabularyIndex;

    fn stage(name: &str) -> StageConfig {
        PipelineDefinition::builtin()
            .unwrap()
            .get_stage(name)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_render_known_placeholders_only() {
        let mut vars = HashMap::new();
        vars.insert("words", "YOU NAME".to_string());

        let rendered = render_template("Glosses: {words}; keep {unknown} and {}", &vars);
        assert_eq!(rendered, "Glosses: YOU NAME; keep {unknown} and {}");
    }

    #[test]
    fn test_placeholders_deduplicated_in_order() {
        assert_eq!(
            placeholders("{words} then {ASL_dataset} then {words}"),
            vec!["words", "ASL_dataset"]
        );
        assert!(placeholders("no braces here").is_empty());
    }

    #[test]
    fn test_compose_token_input() {
        let vocabulary = VocabularyIndex::from_words(["YOU", "NAME", "WHAT"]);
        let words = vec!["YOU".to_string(), "NAME".to_string()];
        let input = StageInput::Tokens {
            words: &words,
            vocabulary: Some(&vocabulary),
        };

        let prompt = compose(&stage("finish_sentence"), &input, None);

        assert!(prompt.system.starts_with("You are ASL Sentence Finisher."));
        assert!(prompt.system.contains("Your goal:"));
        assert!(prompt.user.contains("YOU NAME"));
        assert!(prompt.user.contains("YOU, NAME, WHAT"));
        assert!(prompt.user.contains("Expected output:"));
        assert!(!prompt.user.contains("Context from"));
    }

    #[test]
    fn test_compose_message_uses_message_template() {
        let prompt = compose(&stage("chat"), &StageInput::Message("What is your name?"), None);

        assert!(prompt.user.contains("What is your name?"));
        assert!(!prompt.user.contains("{message}"));
    }

    #[test]
    fn test_compose_appends_context() {
        let context = StageResult {
            index: 0,
            stage: "finish_sentence".into(),
            description: String::new(),
            role: String::new(),
            executor: "echo".into(),
            output: "What is your name?".into(),
        };
        let words: Vec<String> = vec![];
        let input = StageInput::Tokens {
            words: &words,
            vocabulary: None,
        };

        let prompt = compose(&stage("chat"), &input, Some(&context));
        assert!(prompt
            .user
            .ends_with("Context from 'finish_sentence':\nWhat is your name?"));
    }
}
