//! Patch operations and document parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LifecycleError, Result};

/// SCIM Patch Operation schema URI.
pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// Kind of a patch operation. Parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Replace,
    Remove,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "replace" => Ok(Self::Replace),
            "remove" => Ok(Self::Remove),
            _ => Err(LifecycleError::InvalidPatch(format!(
                "unknown operation '{s}'"
            ))),
        }
    }
}

/// One unit of a patch: `op` applied to the field named by `path`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub op: OperationKind,
    pub path: String,
    pub value: Value,
}

impl Operation {
    pub fn new(op: OperationKind, path: impl Into<String>, value: Value) -> Self {
        Self {
            op,
            path: path.into(),
            value,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.path)
    }
}

#[derive(Deserialize)]
struct RawOperation {
    op: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    value: Option<Value>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    schemas: Vec<String>,
    #[serde(rename = "Operations")]
    operations: Vec<Value>,
}

/// Parses a patch document into operations.
///
/// Accepts a bare array of `{op, path, value}` objects, a SCIM `PatchOp`
/// envelope, or either of those encoded as a JSON string. An `add` or
/// `replace` without a path whose value is an object expands into one
/// operation per member.
pub fn parse_operations(document: &Value) -> Result<Vec<Operation>> {
    let owned;
    let document = match document {
        Value::String(text) => {
            owned = serde_json::from_str::<Value>(text)
                .map_err(|e| LifecycleError::InvalidPatch(format!("malformed JSON: {e}")))?;
            &owned
        }
        other => other,
    };

    let items = match document {
        Value::Array(items) => items.clone(),
        Value::Object(map) if map.contains_key("Operations") => {
            let envelope: RawEnvelope = serde_json::from_value(document.clone())
                .map_err(|e| LifecycleError::InvalidPatch(e.to_string()))?;
            if !envelope.schemas.iter().any(|s| s == PATCH_OP_SCHEMA) {
                return Err(LifecycleError::InvalidPatch(
                    "Missing PatchOp schema".to_string(),
                ));
            }
            envelope.operations
        }
        _ => {
            return Err(LifecycleError::InvalidPatch(
                "expected an array of operations".to_string(),
            ))
        }
    };

    let mut operations = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let raw: RawOperation = serde_json::from_value(item).map_err(|e| {
            LifecycleError::InvalidPatch(format!("operation at index {index}: {e}"))
        })?;
        let op: OperationKind = raw.op.parse()?;

        match (op, raw.path, raw.value) {
            (OperationKind::Remove, Some(path), value) => {
                operations.push(Operation::new(op, path, value.unwrap_or(Value::Null)));
            }
            (OperationKind::Remove, None, _) => {
                return Err(LifecycleError::InvalidPatch(format!(
                    "Remove operation at index {index} requires a path"
                )));
            }
            (_, Some(path), Some(value)) => operations.push(Operation::new(op, path, value)),
            (_, None, Some(Value::Object(members))) => {
                for (path, value) in members {
                    operations.push(Operation::new(op, path, value));
                }
            }
            (_, _, _) => {
                return Err(LifecycleError::InvalidPatch(format!(
                    "Operation '{op}' at index {index} requires a value"
                )));
            }
        }
    }

    Ok(operations)
}
