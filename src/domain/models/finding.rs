//! Security finding records and their signature projection.

use serde::{Deserialize, Serialize};

/// A security-analysis finding over an API document.
///
/// Findings are produced by external analysis stages; the mutation engine
/// only consumes them as cache-signature inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Unique id of this finding instance. Not part of the signature:
    /// two scans of the same document produce fresh ids.
    pub finding_id: String,

    /// Finding category (e.g. "bola", "auth", "exposure").
    pub category: String,

    /// Severity label (e.g. "critical", "high", "medium", "low").
    pub severity: String,

    /// Endpoint the finding applies to.
    pub endpoint: String,

    /// Schema name involved, if any.
    #[serde(default)]
    pub schema: Option<String>,

    /// Whether the endpoint is publicly reachable.
    #[serde(default)]
    pub is_public: bool,

    /// Whether the endpoint requires authentication.
    #[serde(default)]
    pub auth_required: bool,

    /// Free-text description. Not part of the signature.
    #[serde(default)]
    pub description: String,
}

/// The stable, field-selected projection of a finding used for signature
/// hashing. Anything not in here can change without invalidating cached
/// multi-step reasoning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingProjection {
    pub category: String,
    pub severity: String,
    pub endpoint: String,
    pub schema: Option<String>,
    pub is_public: bool,
    pub auth_required: bool,
}

impl Finding {
    pub fn projection(&self) -> FindingProjection {
        FindingProjection {
            category: self.category.clone(),
            severity: self.severity.clone(),
            endpoint: self.endpoint.clone(),
            schema: self.schema.clone(),
            is_public: self.is_public,
            auth_required: self.auth_required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_drops_identity_fields() {
        let finding = Finding {
            finding_id: "f-123".to_string(),
            category: "auth".to_string(),
            severity: "high".to_string(),
            endpoint: "/pets".to_string(),
            schema: Some("Pet".to_string()),
            is_public: true,
            auth_required: false,
            description: "missing auth".to_string(),
        };
        let mut other = finding.clone();
        other.finding_id = "f-456".to_string();
        other.description = "different text".to_string();

        assert_eq!(finding.projection(), other.projection());
    }
}
