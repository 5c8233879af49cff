//! Raw specification parsing and serialization.
//!
//! The mutation pipeline works on parsed documents; this module is the
//! boundary that turns raw JSON or YAML text into the document tree and
//! back, preserving the input format on output.

use crate::domain::errors::{MutationError, MutationResult};
use crate::domain::models::Document;

/// Detected serialization format of a raw specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

/// Guess the format from the first significant character.
pub fn detect_format(raw: &str) -> DocumentFormat {
    match raw.trim_start().chars().next() {
        Some('{' | '[') => DocumentFormat::Json,
        _ => DocumentFormat::Yaml,
    }
}

/// Parse raw specification text into a document, detecting the format.
pub fn parse(raw: &str) -> MutationResult<(Document, DocumentFormat)> {
    match detect_format(raw) {
        DocumentFormat::Json => serde_json::from_str(raw)
            .map(|doc| (doc, DocumentFormat::Json))
            .map_err(|e| MutationError::InvalidDocument(format!("invalid JSON: {e}"))),
        DocumentFormat::Yaml => serde_yaml::from_str(raw)
            .map(|doc| (doc, DocumentFormat::Yaml))
            .map_err(|e| MutationError::InvalidDocument(format!("invalid YAML: {e}"))),
    }
}

/// Serialize a document back to text in the given format.
pub fn serialize(document: &Document, format: DocumentFormat) -> MutationResult<String> {
    match format {
        DocumentFormat::Json => serde_json::to_string_pretty(document)
            .map_err(|e| MutationError::Serialization(e.to_string())),
        DocumentFormat::Yaml => {
            serde_yaml::to_string(document).map_err(|e| MutationError::Serialization(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_json() {
        assert_eq!(detect_format("  {\"openapi\": \"3.0.0\"}"), DocumentFormat::Json);
        assert_eq!(detect_format("[1, 2]"), DocumentFormat::Json);
    }

    #[test]
    fn test_detect_yaml() {
        assert_eq!(detect_format("openapi: 3.0.0\n"), DocumentFormat::Yaml);
    }

    #[test]
    fn test_parse_json() {
        let (doc, format) = parse(r#"{"info": {"title": "A"}}"#).unwrap();
        assert_eq!(format, DocumentFormat::Json);
        assert_eq!(doc["info"]["title"], "A");
    }

    #[test]
    fn test_parse_yaml() {
        let (doc, format) = parse("info:\n  title: A\n").unwrap();
        assert_eq!(format, DocumentFormat::Yaml);
        assert_eq!(doc["info"]["title"], "A");
    }

    #[test]
    fn test_parse_invalid_fails() {
        assert!(matches!(
            parse("{not json"),
            Err(MutationError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_round_trip_preserves_format() {
        let doc = json!({"info": {"title": "A", "version": "1.0.0"}});
        let as_yaml = serialize(&doc, DocumentFormat::Yaml).unwrap();
        assert!(as_yaml.contains("title: A"));
        let (reparsed, _) = parse(&as_yaml).unwrap();
        assert_eq!(reparsed, doc);
    }
}
