//! LLM-backed generation of targeted patch sets.
//!
//! Extracts the minimal relevant slice of the document to bound prompt size,
//! asks the collaborator for patch-shaped JSON, and validates what comes
//! back. A response that cannot be parsed yields an empty patch set with
//! zero confidence — the explicit failure signal the orchestrator falls
//! back on, not an exception.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::domain::errors::{MutationError, MutationResult};
use crate::domain::models::{Document, PatchOperation, PatchSet};
use crate::domain::pointer;
use crate::domain::ports::LlmClient;
use crate::services::extract_json_from_response;

/// Caller-supplied context for a generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    /// Pointer to the part of the document the fix concerns.
    pub path: Option<String>,

    /// Additional context forwarded into the prompt.
    pub extra: Map<String, Value>,
}

/// Result of one generation request.
#[derive(Debug, Clone)]
pub struct GeneratedPatches {
    pub patches: PatchSet,
    pub explanation: String,
    /// Model-reported confidence, clamped to [0, 1]. Zero when the
    /// response was unusable.
    pub confidence: f64,
    pub warnings: Vec<String>,
}

impl GeneratedPatches {
    fn unusable(reason: impl Into<String>) -> Self {
        Self {
            patches: Vec::new(),
            explanation: String::new(),
            confidence: 0.0,
            warnings: vec![reason.into()],
        }
    }
}

/// Shape the collaborator is instructed to return.
#[derive(Debug, Deserialize)]
struct PatchProposal {
    #[serde(default)]
    patches: Vec<Value>,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    confidence: f64,
}

/// Generates patch sets through the language-model collaborator.
pub struct PatchGenerator {
    llm: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl PatchGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    /// Request a patch set for a rule violation or free-form fix.
    ///
    /// Only collaborator transport failures surface as errors; an
    /// unusable response is a normal `GeneratedPatches` with an empty set.
    #[instrument(skip(self, document, context))]
    pub async fn generate(
        &self,
        document: &Document,
        rule_id: &str,
        context: &GenerationContext,
        hint_message: Option<&str>,
    ) -> MutationResult<GeneratedPatches> {
        let slice = extract_relevant_slice(document, rule_id, context);
        let prompt = self.build_prompt(&slice, rule_id, context, hint_message);

        let response = self
            .llm
            .generate_json(&prompt, self.max_tokens)
            .await
            .map_err(|e| MutationError::CollaboratorUnavailable(e.to_string()))?;

        Ok(parse_proposal(&response))
    }

    fn build_prompt(
        &self,
        slice: &Value,
        rule_id: &str,
        context: &GenerationContext,
        hint_message: Option<&str>,
    ) -> String {
        let slice_text =
            serde_json::to_string_pretty(slice).unwrap_or_else(|_| slice.to_string());
        let hint_text = hint_message.unwrap_or("None provided");
        let extra_text = if context.extra.is_empty() {
            "None".to_string()
        } else {
            Value::Object(context.extra.clone()).to_string()
        };

        format!(
            r#"You are an OpenAPI specification repair assistant.

## Rule To Address
{rule_id}

## Hint
{hint_text}

## Additional Context
{extra_text}

## Relevant Excerpt Of The Specification
```json
{slice_text}
```

## Instructions
Produce the smallest RFC 6902 JSON Patch that fixes the issue in the full
document. Paths are JSON Pointers into the complete specification, not into
the excerpt. Do not restructure anything the fix does not require.

## Required Output Format (JSON)
Respond with a JSON object containing:
```json
{{
  "patches": [
    {{"op": "add|remove|replace|move|copy|test", "path": "/info/title", "value": "...", "from": "/optional/source"}}
  ],
  "explanation": "What the patch changes and why",
  "confidence": 0.0
}}
```

IMPORTANT: Output ONLY the JSON object, no other text."#
        )
    }
}

/// Parse and validate the collaborator's reply.
fn parse_proposal(response: &str) -> GeneratedPatches {
    let json_str = extract_json_from_response(response);
    let proposal: PatchProposal = match serde_json::from_str(&json_str) {
        Ok(proposal) => proposal,
        Err(e) => {
            warn!(error = %e, "patch proposal was not valid JSON");
            return GeneratedPatches::unusable(format!(
                "collaborator response was not a valid patch proposal: {e}"
            ));
        }
    };

    let mut warnings = Vec::new();
    let mut patches = Vec::new();
    for (i, raw) in proposal.patches.into_iter().enumerate() {
        match serde_json::from_value::<PatchOperation>(raw) {
            Ok(op) if op.path.starts_with('/') => patches.push(op),
            Ok(op) => {
                warnings.push(format!(
                    "dropped operation {i}: path {:?} does not start with '/'",
                    op.path
                ));
            }
            Err(e) => {
                warnings.push(format!("dropped operation {i}: {e}"));
            }
        }
    }

    debug!(
        patch_count = patches.len(),
        dropped = warnings.len(),
        "parsed patch proposal"
    );

    GeneratedPatches {
        patches,
        explanation: proposal.explanation,
        confidence: proposal.confidence.clamp(0.0, 1.0),
        warnings,
    }
}

/// Extract the reduced slice of the document relevant to a rule.
///
/// Bounds prompt size and request cost: the collaborator sees only the
/// sections a rule of this kind can touch, plus `info` for orientation.
fn extract_relevant_slice(
    document: &Document,
    rule_id: &str,
    context: &GenerationContext,
) -> Value {
    if let Some(path) = context.path.as_deref() {
        if let Some(target) = pointer::resolve(document, path) {
            let mut slice = Map::new();
            if let Some(info) = document.get("info") {
                slice.insert("info".to_string(), info.clone());
            }
            slice.insert(path.to_string(), target.clone());
            return Value::Object(slice);
        }
    }

    let rule = rule_id.to_lowercase();
    if rule.contains("security") || rule.contains("auth") {
        let mut slice = pick_top_level(document, &["security", "info"]);
        if let Some(schemes) = pointer::resolve(document, "/components/securitySchemes") {
            slice.insert(
                "components".to_string(),
                json!({ "securitySchemes": schemes.clone() }),
            );
        }
        return Value::Object(slice);
    }
    if rule.contains("server") {
        return Value::Object(pick_top_level(document, &["servers", "info"]));
    }
    if rule.contains("operation") || rule.contains("path") {
        return Value::Object(pick_top_level(document, &["paths", "info"]));
    }

    Value::Object(pick_top_level(
        document,
        &["info", "servers", "paths", "components"],
    ))
}

fn pick_top_level(document: &Document, keys: &[&str]) -> Map<String, Value> {
    let mut slice = Map::new();
    for key in keys {
        if let Some(value) = document.get(*key) {
            slice.insert((*key).to_string(), value.clone());
        }
    }
    slice
}
