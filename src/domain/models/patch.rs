//! RFC 6902 JSON Patch operation model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The six JSON Patch operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

impl std::fmt::Display for PatchOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PatchOp::Add => "add",
            PatchOp::Remove => "remove",
            PatchOp::Replace => "replace",
            PatchOp::Move => "move",
            PatchOp::Copy => "copy",
            PatchOp::Test => "test",
        };
        f.write_str(name)
    }
}

/// A single JSON Patch operation.
///
/// `path` and `from` are JSON Pointers. `value` is required for
/// add/replace/test; `from` is required for move/copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// Ordered sequence of patch operations; applied left-to-right.
pub type PatchSet = Vec<PatchOperation>;

impl PatchOperation {
    /// Structural validation of a single operation, independent of any
    /// target document. Returns a human-readable reason on rejection.
    pub fn validate(&self) -> Result<(), String> {
        if !self.path.is_empty() && !self.path.starts_with('/') {
            return Err(format!(
                "{} operation has invalid path {:?}: must start with '/'",
                self.op, self.path
            ));
        }
        match self.op {
            PatchOp::Add | PatchOp::Replace | PatchOp::Test => {
                if self.value.is_none() {
                    return Err(format!("{} operation requires a value", self.op));
                }
            }
            PatchOp::Move | PatchOp::Copy => match &self.from {
                None => return Err(format!("{} operation requires a 'from' pointer", self.op)),
                Some(from) if !from.is_empty() && !from.starts_with('/') => {
                    return Err(format!(
                        "{} operation has invalid 'from' pointer {from:?}: must start with '/'",
                        self.op
                    ));
                }
                Some(_) => {}
            },
            PatchOp::Remove => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_from_wire_shape() {
        let op: PatchOperation = serde_json::from_value(json!({
            "op": "replace",
            "path": "/info/version",
            "value": "2.0.0"
        }))
        .unwrap();
        assert_eq!(op.op, PatchOp::Replace);
        assert_eq!(op.path, "/info/version");
        assert_eq!(op.value, Some(json!("2.0.0")));
        assert_eq!(op.from, None);
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let op = PatchOperation {
            op: PatchOp::Remove,
            path: "/info/contact".to_string(),
            value: None,
            from: None,
        };
        let wire = serde_json::to_value(&op).unwrap();
        assert_eq!(wire, json!({"op": "remove", "path": "/info/contact"}));
    }

    #[test]
    fn test_validate_add_requires_value() {
        let op = PatchOperation {
            op: PatchOp::Add,
            path: "/info/title".to_string(),
            value: None,
            from: None,
        };
        assert!(op.validate().unwrap_err().contains("requires a value"));
    }

    #[test]
    fn test_validate_move_requires_from() {
        let op = PatchOperation {
            op: PatchOp::Move,
            path: "/a".to_string(),
            value: None,
            from: None,
        };
        assert!(op.validate().unwrap_err().contains("'from'"));
    }

    #[test]
    fn test_validate_rejects_relative_path() {
        let op = PatchOperation {
            op: PatchOp::Remove,
            path: "info/title".to_string(),
            value: None,
            from: None,
        };
        assert!(op.validate().is_err());
    }
}
