//! Atomic application of RFC 6902 patch sets to a document.

use serde_json::Value;

use crate::domain::models::{Document, PatchOp, PatchOperation};
use crate::domain::pointer;

/// Result of applying a patch set.
///
/// On failure `result` is the original document, structurally unchanged.
#[derive(Debug, Clone)]
pub struct ApplyReport {
    pub success: bool,
    pub result: Document,
    pub errors: Vec<String>,
}

/// Applies patch sets all-or-nothing.
///
/// Operations are validated and applied strictly in order against a working
/// copy; the first invalid or inapplicable operation aborts the entire apply
/// and the caller gets the original document back. There is no partial-apply
/// state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchApplier;

impl PatchApplier {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, document: &Document, patches: &[PatchOperation]) -> ApplyReport {
        // Structural validation first, collecting every malformed operation
        // so the caller sees all of them at once.
        let structural_errors: Vec<String> = patches
            .iter()
            .enumerate()
            .filter_map(|(i, op)| op.validate().err().map(|e| format!("operation {i}: {e}")))
            .collect();
        if !structural_errors.is_empty() {
            return ApplyReport {
                success: false,
                result: document.clone(),
                errors: structural_errors,
            };
        }

        let mut working = document.clone();
        for (i, op) in patches.iter().enumerate() {
            if let Err(reason) = apply_one(&mut working, op) {
                return ApplyReport {
                    success: false,
                    result: document.clone(),
                    errors: vec![format!("operation {i} ({} {}): {reason}", op.op, op.path)],
                };
            }
        }

        ApplyReport {
            success: true,
            result: working,
            errors: Vec::new(),
        }
    }
}

fn apply_one(working: &mut Value, op: &PatchOperation) -> Result<(), String> {
    match op.op {
        PatchOp::Add => {
            // validate() guarantees the value is present
            let value = op.value.clone().unwrap_or(Value::Null);
            add(working, &op.path, value)
        }
        PatchOp::Remove => remove(working, &op.path).map(|_| ()),
        PatchOp::Replace => {
            let value = op.value.clone().unwrap_or(Value::Null);
            replace(working, &op.path, value)
        }
        PatchOp::Move => {
            let from = op.from.as_deref().unwrap_or_default();
            if op.path.starts_with(&format!("{from}/")) {
                return Err(format!("cannot move {from:?} into its own child {:?}", op.path));
            }
            if from == op.path {
                return Ok(());
            }
            let value = remove(working, from)?;
            add(working, &op.path, value)
        }
        PatchOp::Copy => {
            let from = op.from.as_deref().unwrap_or_default();
            let value = pointer::resolve(working, from)
                .cloned()
                .ok_or_else(|| format!("'from' path {from:?} not found"))?;
            add(working, &op.path, value)
        }
        PatchOp::Test => {
            let expected = op.value.as_ref().unwrap_or(&Value::Null);
            let actual = pointer::resolve(working, &op.path)
                .ok_or_else(|| "target path not found".to_string())?;
            if actual == expected {
                Ok(())
            } else {
                Err(format!("test failed: expected {expected}, found {actual}"))
            }
        }
    }
}

fn add(working: &mut Value, path: &str, value: Value) -> Result<(), String> {
    if path.is_empty() {
        *working = value;
        return Ok(());
    }
    let (parent_ptr, leaf) =
        pointer::split_parent(path).ok_or_else(|| "invalid pointer".to_string())?;
    let parent = pointer::resolve_mut(working, &parent_ptr)
        .ok_or_else(|| "parent path not found".to_string())?;
    match parent {
        Value::Object(map) => {
            map.insert(leaf, value);
            Ok(())
        }
        Value::Array(items) => {
            if leaf == "-" {
                items.push(value);
                return Ok(());
            }
            // insertion point may be one past the end
            let index = pointer::parse_index(&leaf, items.len() + 1)
                .ok_or_else(|| format!("array index {leaf:?} out of bounds"))?;
            items.insert(index, value);
            Ok(())
        }
        _ => Err("parent is not a container".to_string()),
    }
}

fn remove(working: &mut Value, path: &str) -> Result<Value, String> {
    if path.is_empty() {
        return Err("cannot remove the document root".to_string());
    }
    let (parent_ptr, leaf) =
        pointer::split_parent(path).ok_or_else(|| "invalid pointer".to_string())?;
    let parent = pointer::resolve_mut(working, &parent_ptr)
        .ok_or_else(|| "parent path not found".to_string())?;
    match parent {
        Value::Object(map) => map
            .remove(&leaf)
            .ok_or_else(|| "target path not found".to_string()),
        Value::Array(items) => {
            let index = pointer::parse_index(&leaf, items.len())
                .ok_or_else(|| "target path not found".to_string())?;
            Ok(items.remove(index))
        }
        _ => Err("parent is not a container".to_string()),
    }
}

fn replace(working: &mut Value, path: &str, value: Value) -> Result<(), String> {
    let target = pointer::resolve_mut(working, path)
        .ok_or_else(|| "target path not found".to_string())?;
    *target = value;
    Ok(())
}
