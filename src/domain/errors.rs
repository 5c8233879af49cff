//! Domain errors for the specmend mutation engine.

use thiserror::Error;

/// Format a list of per-operation errors as a single readable string.
fn format_op_errors(errors: &[String]) -> String {
    errors.join("; ")
}

/// Domain-level errors that can occur in the mutation engine.
///
/// An empty patch set from the generator is deliberately NOT an error:
/// it is a normal outcome that triggers the orchestrator's fallback to
/// full regeneration.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Patch validation failed: {}", format_op_errors(.0))]
    PatchValidation(Vec<String>),

    #[error("Language model collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Cache read failed: {0}")]
    CacheRead(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type MutationResult<T> = Result<T, MutationError>;

impl From<serde_json::Error> for MutationError {
    fn from(err: serde_json::Error) -> Self {
        MutationError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_validation_display_joins_errors() {
        let err = MutationError::PatchValidation(vec![
            "op 0: missing value".to_string(),
            "op 2: bad pointer".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Patch validation failed: op 0: missing value; op 2: bad pointer"
        );
    }

    #[test]
    fn test_from_serde_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err: MutationError = serde_err.into();
        assert!(matches!(err, MutationError::Serialization(_)));
    }
}
