//! Heuristic choosing between targeted patches and full regeneration.

use crate::domain::models::{DecisionResult, FixRequest};

/// Prompt keywords indicating a surgical, targeted edit.
const PATCH_INDICATORS: &[&str] = &[
    "fix", "add", "remove", "update", "modify", "change", "missing", "error", "issue",
];

/// Prompt keywords indicating a sweeping rewrite.
const REGEN_INDICATORS: &[&str] = &[
    "rewrite",
    "redesign",
    "refactor all",
    "change all",
    "transform",
    "convert",
    "generate",
    "create from scratch",
];

/// HTTP method tokens recognized in prompts.
const HTTP_METHODS: &[&str] = &[
    "get", "post", "put", "delete", "patch", "options", "head", "trace",
];

/// Documents smaller than this are cheap to regenerate outright.
const SMALL_DOCUMENT_BYTES: usize = 5000;

/// Pure, deterministic patch-vs-regeneration decision.
///
/// Rules are evaluated in order; the first match wins. A keyword-score tie
/// at the prompt-scoring rule resolves to patch mode — an intentional,
/// auditable default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Decide how to execute a fix request. No I/O; same inputs always
    /// produce the same result.
    pub fn decide(&self, request: &FixRequest) -> DecisionResult {
        if request.force_regeneration {
            return DecisionResult::regeneration("forced regeneration");
        }

        if !request.validation_errors.is_empty() {
            return DecisionResult::patches(format!(
                "targeted fix for {} validation error(s)",
                request.validation_errors.len()
            ));
        }

        if request.target_path.is_some() || request.target_method.is_some() {
            let scope = match (&request.target_path, &request.target_method) {
                (Some(path), Some(method)) => format!("{} {}", method.to_uppercase(), path),
                (Some(path), None) => path.clone(),
                (None, Some(method)) => method.to_uppercase(),
                (None, None) => unreachable!(),
            };
            return DecisionResult::patches(format!("scoped to operation {scope}"));
        }

        let prompt = request.prompt.to_lowercase();

        if prompt_names_operation(&prompt) {
            return DecisionResult::patches("prompt names a specific path and method");
        }

        let patch_score = score(&prompt, PATCH_INDICATORS);
        let regen_score = score(&prompt, REGEN_INDICATORS);
        if regen_score > patch_score {
            return DecisionResult::regeneration(format!(
                "prompt suggests regeneration (score {regen_score} vs {patch_score})"
            ));
        }
        if patch_score > 0 {
            return DecisionResult::patches(format!(
                "prompt suggests targeted edits (score {patch_score} vs {regen_score})"
            ));
        }

        if request.document_size_bytes < SMALL_DOCUMENT_BYTES {
            return DecisionResult::regeneration(format!(
                "small document ({} bytes): full regeneration is cheap",
                request.document_size_bytes
            ));
        }

        DecisionResult::patches("default: prefer minimal edits")
    }
}

/// Count how many indicators from the set appear in the prompt.
fn score(prompt: &str, indicators: &[&str]) -> usize {
    indicators.iter().filter(|kw| prompt.contains(*kw)).count()
}

/// True when the prompt contains both a slash-delimited path segment and an
/// HTTP method token.
fn prompt_names_operation(prompt: &str) -> bool {
    let mut has_path = false;
    let mut has_method = false;
    for token in prompt.split_whitespace() {
        if token.len() > 1 && token.contains('/') {
            has_path = true;
        }
        let bare = token.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if HTTP_METHODS.contains(&bare) {
            has_method = true;
        }
    }
    has_path && has_method
}
