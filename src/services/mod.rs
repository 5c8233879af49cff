//! Business logic of the hybrid mutation engine.

pub mod cache_service;
pub mod decision_engine;
pub mod mutation_orchestrator;
pub mod patch_applier;
pub mod patch_generator;
pub mod signature_cache;

pub use cache_service::{derive_key, CacheService, CacheStats, EntryMetadata};
pub use decision_engine::DecisionEngine;
pub use mutation_orchestrator::{MutationOrchestrator, MutationRequest};
pub use patch_applier::{ApplyReport, PatchApplier};
pub use patch_generator::{GeneratedPatches, GenerationContext, PatchGenerator};
pub use signature_cache::{finding_signature, SignatureCache, SignatureCacheStats};

/// Extract the JSON payload from a model response, tolerating markdown code
/// fences and surrounding prose.
pub fn extract_json_from_response(response: &str) -> String {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after).trim_start();
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed.to_string();
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::extract_json_from_response;

    #[test]
    fn test_extract_json_plain() {
        assert_eq!(
            extract_json_from_response(r#"{"a": 1}"#),
            r#"{"a": 1}"#
        );
    }

    #[test]
    fn test_extract_json_code_block() {
        assert_eq!(
            extract_json_from_response("```json\n{\"a\": 1}\n```"),
            r#"{"a": 1}"#
        );
    }

    #[test]
    fn test_extract_json_bare_fence() {
        assert_eq!(
            extract_json_from_response("```\n{\"a\": 1}\n```"),
            r#"{"a": 1}"#
        );
    }

    #[test]
    fn test_extract_json_embedded_in_prose() {
        assert_eq!(
            extract_json_from_response("Here you go: {\"a\": 1} hope that helps"),
            r#"{"a": 1}"#
        );
    }
}
