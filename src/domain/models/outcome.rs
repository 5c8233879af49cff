//! Terminal outcomes of a mutation request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decision::DecisionResult;
use super::patch::PatchSet;

/// How the accepted result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationMethod {
    Patch,
    FullRegeneration,
}

impl std::fmt::Display for MutationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationMethod::Patch => f.write_str("patch"),
            MutationMethod::FullRegeneration => f.write_str("full_regeneration"),
        }
    }
}

/// Terminal outcome of the mutation state machine.
///
/// The orchestrator pattern-matches on this instead of driving fallback
/// through exceptions. `PatchesUnavailable` is the recoverable signal that
/// triggers the regeneration path; `Failed` is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MutationOutcome {
    PatchesApplied {
        result_document: Value,
        patches_used: PatchSet,
        confidence: f64,
    },
    PatchesUnavailable {
        reason: String,
    },
    RegenerationApplied {
        result_document: Value,
        explanation: String,
    },
    Failed {
        error: String,
    },
}

impl MutationOutcome {
    /// The resulting document, when the outcome carries one.
    pub fn result_document(&self) -> Option<&Value> {
        match self {
            MutationOutcome::PatchesApplied {
                result_document, ..
            }
            | MutationOutcome::RegenerationApplied {
                result_document, ..
            } => Some(result_document),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            MutationOutcome::PatchesApplied { .. } | MutationOutcome::RegenerationApplied { .. }
        )
    }
}

/// Full report returned to the caller for one mutation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationReport {
    /// Id of the request this report answers.
    pub request_id: uuid::Uuid,
    pub outcome: MutationOutcome,
    pub decision: DecisionResult,
    pub method_used: MutationMethod,
    pub processing_time_ms: u64,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Whether the outcome was served from the result cache.
    #[serde(default)]
    pub cached: bool,
}
