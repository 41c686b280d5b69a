// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Caller inputs and per-stage invocation requests

use std::sync::Arc;

use crate::pipeline::{Prompt, StageConfig, StageResult};
use crate::vocabulary::VocabularyIndex;

/// Parameters supplied by the caller for one run
#[derive(Debug, Clone, Default)]
pub struct CallerInputs {
    /// ASL gloss tokens
    pub words: Vec<String>,
    /// Free-text message; takes precedence over `words` when present
    pub message: Option<String>,
    /// Vocabulary the token stages may reference
    pub vocabulary: Option<Arc<VocabularyIndex>>,
}

impl CallerInputs {
    /// Inputs for a token run
    pub fn tokens<I, S>(words: I, vocabulary: Arc<VocabularyIndex>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            message: None,
            vocabulary: Some(vocabulary),
        }
    }

    /// Inputs for a free-text chat run
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            words: Vec::new(),
            message: Some(message.into()),
            vocabulary: None,
        }
    }

    /// The single semantic input stages act on
    ///
    /// A non-blank `message` wins: `words` and the vocabulary are then
    /// ignored entirely.
    pub fn semantic_input(&self) -> StageInput<'_> {
        match self.message.as_deref() {
            Some(message) if !message.trim().is_empty() => StageInput::Message(message),
            _ => StageInput::Tokens {
                words: &self.words,
                vocabulary: self.vocabulary.as_deref(),
            },
        }
    }
}

/// What a stage receives from the caller
#[derive(Debug, Clone, Copy)]
pub enum StageInput<'a> {
    /// Free-text message
    Message(&'a str),
    /// Gloss tokens with the vocabulary they are drawn from
    Tokens {
        words: &'a [String],
        vocabulary: Option<&'a VocabularyIndex>,
    },
}

impl StageInput<'_> {
    pub fn is_message(&self) -> bool {
        matches!(self, Self::Message(_))
    }
}

/// Everything an executor needs to run one stage
#[derive(Debug)]
pub struct StageRequest<'a> {
    pub stage: &'a StageConfig,
    pub input: StageInput<'a>,
    /// Result of the immediately preceding stage, if wired
    pub context: Option<&'a StageResult>,
    /// Rendered prompt
    pub prompt: Prompt,
}

impl<'a> StageRequest<'a> {
    pub fn new(
        stage: &'a StageConfig,
        input: StageInput<'a>,
        context: Option<&'a StageResult>,
    ) -> Self {
        let prompt = crate::pipeline::prompt::compose(stage, &input, context);
        Self {
            stage,
            input,
            context,
            prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_takes_precedence_over_words() {
        let inputs = CallerInputs {
            words: vec!["YOU".into()],
            message: Some("hi".into()),
            vocabulary: Some(Arc::new(VocabularyIndex::from_words(["YOU"]))),
        };

        assert!(matches!(inputs.semantic_input(), StageInput::Message("hi")));
    }

    #[test]
    fn test_blank_message_falls_back_to_tokens() {
        let inputs = CallerInputs {
            words: vec!["YOU".into()],
            message: Some("   ".into()),
            vocabulary: None,
        };

        match inputs.semantic_input() {
            StageInput::Tokens { words, vocabulary } => {
                assert_eq!(words, &["YOU"]);
                assert!(vocabulary.is_none());
            }
            other => panic!("expected tokens, got {:?}", other),
        }
    }

    #[test]
    fn test_token_constructor() {
        let vocabulary = Arc::new(VocabularyIndex::from_words(["YOU", "NAME"]));
        let inputs = CallerInputs::tokens(["YOU", "NAME"], vocabulary);

        assert!(!inputs.semantic_input().is_message());
        assert_eq!(inputs.words, vec!["YOU", "NAME"]);
    }
}
