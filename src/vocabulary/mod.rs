// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Controlled ASL vocabulary
//!
//! The vocabulary is loaded once at startup from a JSON object whose values
//! are words (keys are ignored). Every word is stored in canonical uppercase
//! form. The index is never mutated after loading, so it can be shared
//! between concurrent requests behind an `Arc` without locking.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

use crate::errors::SignError;

/// Canonical form of a token
///
/// Idempotent: `canonicalize(&canonicalize(t)) == canonicalize(t)`.
pub fn canonicalize(token: &str) -> String {
    token.to_uppercase()
}

/// Read-only set of canonical vocabulary tokens, in load order
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    entries: Vec<String>,
    members: HashSet<String>,
}

impl VocabularyIndex {
    /// Load the vocabulary from a JSON file
    pub fn load(path: &Path) -> Result<Self, SignError> {
        let content = std::fs::read_to_string(path).map_err(|e| SignError::DataLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_json(&content).map_err(|e| SignError::DataLoad {
            path: path.to_path_buf(),
            reason: match e {
                SignError::Json { message } => message,
                other => other.to_string(),
            },
        })
    }

    /// Parse a vocabulary from a JSON object of `key -> word`
    pub fn from_json(json: &str) -> Result<Self, SignError> {
        let value: Value = serde_json::from_str(json)?;

        let Value::Object(map) = value else {
            return Err(SignError::Json {
                message: "expected a JSON object mapping keys to words".to_string(),
            });
        };

        let mut words = Vec::with_capacity(map.len());
        for (key, word) in map {
            match word {
                Value::String(word) => words.push(word),
                other => {
                    return Err(SignError::Json {
                        message: format!(
                            "value for key '{}' must be a string, found {}",
                            key, other
                        ),
                    })
                }
            }
        }

        Ok(Self::from_words(words))
    }

    /// Build a vocabulary from words; duplicates keep their first position
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        for word in words {
            let canonical = canonicalize(word.as_ref());
            if index.members.insert(canonical.clone()) {
                index.entries.push(canonical);
            }
        }
        index
    }

    /// Check whether a token (in any case) is in the vocabulary
    pub fn contains(&self, token: &str) -> bool {
        self.members.contains(&canonicalize(token))
    }

    /// First `n` entries in load order
    pub fn sample(&self, n: usize) -> &[String] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// All entries in load order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate a batch of tokens against the vocabulary
    ///
    /// Results are reported per input token, in input order. Repeated tokens
    /// appear once per occurrence.
    pub fn validate_many<S: AsRef<str>>(&self, tokens: &[S]) -> TokenValidation {
        let mut results = Vec::with_capacity(tokens.len());
        let mut summary = ValidationSummary::default();

        for token in tokens {
            let token = token.as_ref();
            let canonical = canonicalize(token);
            let valid = self.members.contains(&canonical);

            if valid {
                summary.valid_tokens.push(canonical.clone());
            } else {
                summary.invalid_tokens.push(token.to_string());
            }

            results.push(TokenVerdict {
                token: token.to_string(),
                valid,
                normalized: valid.then_some(canonical),
            });
        }

        summary.total_tokens = tokens.len();
        summary.valid_count = summary.valid_tokens.len();
        summary.invalid_count = summary.invalid_tokens.len();

        TokenValidation { results, summary }
    }
}

/// Validation outcome for one input token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenVerdict {
    /// Token as supplied by the caller
    pub token: String,
    pub valid: bool,
    /// Canonical form, only for valid tokens
    pub normalized: Option<String>,
}

/// Aggregate counts for a validated batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total_tokens: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// Canonical forms of the valid tokens, in input order
    pub valid_tokens: Vec<String>,
    /// Invalid tokens as supplied, in input order
    pub invalid_tokens: Vec<String>,
}

/// Result of [`VocabularyIndex::validate_many`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenValidation {
    #[serde(rename = "validation_results")]
    pub results: Vec<TokenVerdict>,
    pub summary: ValidationSummary,
}
