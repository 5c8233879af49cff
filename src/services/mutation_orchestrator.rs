//! Composition of the hybrid mutation pipeline.
//!
//! Runs the state machine
//! `Start -> Decided -> {Patching -> Applied | PatchFailed} -> {Done |
//! FellBackToRegeneration} -> RegenDone`, reading the result cache before
//! computing and writing it after any terminal success. Fallbacks are
//! driven by pattern-matching on outcomes, never by catching exceptions.

use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{MutationError, MutationResult};
use crate::domain::models::{
    DecisionResult, Document, FixRequest, LlmConfig, MutationMethod, MutationOutcome,
    MutationReport,
};
use crate::domain::ports::{ChatMessage, LlmClient};
use crate::services::cache_service::{derive_key, CacheService};
use crate::services::decision_engine::DecisionEngine;
use crate::services::extract_json_from_response;
use crate::services::patch_applier::PatchApplier;
use crate::services::patch_generator::{GenerationContext, PatchGenerator};

/// Cache namespace holding terminal mutation outcomes.
const OUTCOME_NAMESPACE: &str = "explanation";

/// Rule id used when the caller supplies only a free-form prompt.
const GENERAL_FIX_RULE: &str = "general-fix";

/// One mutation request against a parsed document.
#[derive(Debug, Clone, Default)]
pub struct MutationRequest {
    pub document: Document,
    pub prompt: String,
    pub rule_id: Option<String>,
    pub context: GenerationContext,
    pub validation_errors: Vec<String>,
    pub target_path: Option<String>,
    pub target_method: Option<String>,
    pub force_regeneration: bool,
}

/// Orchestrates decision, patching, fallback, and regeneration.
pub struct MutationOrchestrator {
    decision_engine: DecisionEngine,
    generator: PatchGenerator,
    applier: PatchApplier,
    llm: Arc<dyn LlmClient>,
    cache: Arc<CacheService>,
    temperature: f64,
    max_tokens: u32,
}

impl MutationOrchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, cache: Arc<CacheService>, config: &LlmConfig) -> Self {
        Self {
            decision_engine: DecisionEngine::new(),
            generator: PatchGenerator::new(Arc::clone(&llm), config.max_tokens),
            applier: PatchApplier::new(),
            llm,
            cache,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Execute one request to a terminal outcome.
    ///
    /// Collaborator failures surface as a terminal `Failed` outcome; only
    /// malformed input propagates as an error.
    #[instrument(
        skip(self, request),
        fields(request_id = tracing::field::Empty, rule_id = request.rule_id.as_deref())
    )]
    pub async fn execute(&self, request: MutationRequest) -> MutationResult<MutationReport> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));

        let serialized = serde_json::to_string(&request.document)
            .map_err(|e| MutationError::InvalidDocument(e.to_string()))?;
        let cache_key = request_cache_key(&request);

        if let Some(cached) = self.cache.get(OUTCOME_NAMESPACE, &cache_key).await {
            // A corrupt cached value is a miss, never a request failure.
            match serde_json::from_value::<MutationOutcome>(cached) {
                Ok(outcome) => {
                    debug!(key = %cache_key, "serving mutation outcome from cache");
                    let decision = self.decision_engine.decide(&fix_request(&request, serialized.len()));
                    return Ok(report(request_id, outcome, decision, started, Vec::new(), true));
                }
                Err(e) => warn!(error = %e, "cached outcome was unreadable; recomputing"),
            }
        }

        let decision = self
            .decision_engine
            .decide(&fix_request(&request, serialized.len()));
        debug!(use_patches = decision.use_patches, reasoning = %decision.reasoning, "decided");

        let mut warnings = Vec::new();

        if decision.use_patches {
            match self.try_patches(&request, &mut warnings).await {
                Ok(Some(outcome)) => {
                    self.store_outcome(&cache_key, &outcome).await;
                    return Ok(report(request_id, outcome, decision, started, warnings, false));
                }
                // Recoverable: fall through to regeneration.
                Ok(None) => {}
                Err(error) => {
                    let outcome = MutationOutcome::Failed {
                        error: error.to_string(),
                    };
                    return Ok(report(request_id, outcome, decision, started, warnings, false));
                }
            }
        }

        let outcome = match self.regenerate(&request).await {
            Ok(outcome) => outcome,
            Err(error) => MutationOutcome::Failed {
                error: error.to_string(),
            },
        };
        if outcome.is_success() {
            self.store_outcome(&cache_key, &outcome).await;
        }
        Ok(report(request_id, outcome, decision, started, warnings, false))
    }

    /// The patching arm. `Ok(Some)` is a terminal success, `Ok(None)` means
    /// fall back to regeneration, `Err` is a collaborator failure.
    async fn try_patches(
        &self,
        request: &MutationRequest,
        warnings: &mut Vec<String>,
    ) -> MutationResult<Option<MutationOutcome>> {
        let rule_id = request.rule_id.as_deref().unwrap_or(GENERAL_FIX_RULE);

        let mut context = request.context.clone();
        if !request.validation_errors.is_empty() {
            context.extra.insert(
                "validation_errors".to_string(),
                json!(request.validation_errors),
            );
        }
        let hint = if request.prompt.is_empty() {
            None
        } else {
            Some(request.prompt.as_str())
        };

        let generated = self
            .generator
            .generate(&request.document, rule_id, &context, hint)
            .await?;
        warnings.extend(generated.warnings.iter().cloned());

        if generated.patches.is_empty() {
            info!("patch generation produced no usable operations; falling back to regeneration");
            warnings.push("patch generation produced no usable operations".to_string());
            return Ok(None);
        }

        let applied = self.applier.apply(&request.document, &generated.patches);
        if !applied.success {
            info!(errors = ?applied.errors, "patch apply failed; falling back to regeneration");
            warnings.extend(
                applied
                    .errors
                    .iter()
                    .map(|e| format!("patch apply failed: {e}")),
            );
            return Ok(None);
        }

        Ok(Some(MutationOutcome::PatchesApplied {
            result_document: applied.result,
            patches_used: generated.patches,
            confidence: generated.confidence,
        }))
    }

    /// The full-regeneration arm.
    async fn regenerate(&self, request: &MutationRequest) -> MutationResult<MutationOutcome> {
        let document_text = serde_json::to_string_pretty(&request.document)
            .map_err(|e| MutationError::InvalidDocument(e.to_string()))?;
        let prompt = format!(
            r#"You are an OpenAPI specification editor.

## Request
{}

## Current Specification
```json
{}
```

## Instructions
Apply the request to the specification and return the complete corrected
document. Preserve everything the request does not ask to change.

IMPORTANT: Output ONLY the corrected specification as a JSON object, no
other text."#,
            request.prompt, document_text
        );

        let response = self
            .llm
            .chat(
                &[ChatMessage::user(prompt)],
                self.temperature,
                self.max_tokens,
            )
            .await
            .map_err(|e| MutationError::CollaboratorUnavailable(e.to_string()))?;

        let json_str = extract_json_from_response(&response);
        match serde_json::from_str::<Document>(&json_str) {
            Ok(result_document) if result_document.is_object() => {
                Ok(MutationOutcome::RegenerationApplied {
                    result_document,
                    explanation: format!("full regeneration: {}", request.prompt),
                })
            }
            Ok(_) | Err(_) => Ok(MutationOutcome::Failed {
                error: "regeneration did not return a usable document".to_string(),
            }),
        }
    }

    async fn store_outcome(&self, cache_key: &str, outcome: &MutationOutcome) {
        match serde_json::to_value(outcome) {
            Ok(value) => {
                self.cache
                    .set(OUTCOME_NAMESPACE, cache_key, value, None)
                    .await;
            }
            Err(e) => warn!(error = %e, "could not serialize outcome for caching"),
        }
    }
}

fn fix_request(request: &MutationRequest, document_size_bytes: usize) -> FixRequest {
    FixRequest {
        validation_errors: request.validation_errors.clone(),
        target_path: request.target_path.clone(),
        target_method: request.target_method.clone(),
        prompt: request.prompt.clone(),
        document_size_bytes,
        force_regeneration: request.force_regeneration,
    }
}

/// Cache key over (document, prompt, scope).
fn request_cache_key(request: &MutationRequest) -> String {
    derive_key(&json!({
        "document": request.document,
        "prompt": request.prompt,
        "scope": {
            "rule_id": request.rule_id,
            "target_path": request.target_path,
            "target_method": request.target_method,
            "context_path": request.context.path,
        },
    }))
}

fn report(
    request_id: Uuid,
    outcome: MutationOutcome,
    decision: DecisionResult,
    started: Instant,
    warnings: Vec<String>,
    cached: bool,
) -> MutationReport {
    let method_used = match &outcome {
        MutationOutcome::PatchesApplied { .. } => MutationMethod::Patch,
        _ => MutationMethod::FullRegeneration,
    };
    MutationReport {
        request_id,
        outcome,
        decision,
        method_used,
        processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        warnings,
        cached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_key_ignores_scope_field_order() {
        let request = MutationRequest {
            document: json!({"info": {"title": "A"}}),
            prompt: "fix".to_string(),
            rule_id: Some("r1".to_string()),
            ..MutationRequest::default()
        };
        assert_eq!(request_cache_key(&request), request_cache_key(&request));
    }

    #[test]
    fn test_cache_key_varies_with_scope() {
        let base = MutationRequest {
            document: json!({"info": {}}),
            prompt: "fix".to_string(),
            ..MutationRequest::default()
        };
        let mut scoped = base.clone();
        scoped.target_method = Some("get".to_string());
        assert_ne!(request_cache_key(&base), request_cache_key(&scoped));
    }
}
