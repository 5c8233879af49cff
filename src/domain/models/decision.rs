//! Fix request attributes and the patch-vs-regeneration decision.

use serde::{Deserialize, Serialize};

/// Attributes of a fix request that feed the decision engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixRequest {
    /// Validator messages attached to the request, if any.
    #[serde(default)]
    pub validation_errors: Vec<String>,

    /// Specific path item the fix targets (e.g. `/pets/{id}`).
    #[serde(default)]
    pub target_path: Option<String>,

    /// Specific HTTP method the fix targets (e.g. `get`).
    #[serde(default)]
    pub target_method: Option<String>,

    /// The natural-language fix request.
    pub prompt: String,

    /// Serialized size of the document under edit.
    #[serde(default)]
    pub document_size_bytes: usize,

    /// Caller override forcing full regeneration.
    #[serde(default)]
    pub force_regeneration: bool,
}

/// Outcome of the decision engine. Produced once per request; immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub use_patches: bool,
    pub reasoning: String,
}

impl DecisionResult {
    pub fn patches(reasoning: impl Into<String>) -> Self {
        Self {
            use_patches: true,
            reasoning: reasoning.into(),
        }
    }

    pub fn regeneration(reasoning: impl Into<String>) -> Self {
        Self {
            use_patches: false,
            reasoning: reasoning.into(),
        }
    }
}
