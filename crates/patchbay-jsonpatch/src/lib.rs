//! Structured-document patching.
//!
//! Applies an ordered sequence of add/remove/replace operations (a subset
//! of RFC 6902) to a parsed JSON document. Operation paths are
//! slash-delimited segments; a final `-` segment appends to an array.
//!
//! Every operation is validated before any is applied, so a validation
//! failure leaves the caller with zero side effects. Move, copy and test
//! from the full RFC surface are explicitly unsupported.
//!
//! The result is re-emitted in canonical pretty-printed form; the original
//! document's formatting is not preserved.

use patchbay_core::Strictness;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from structured-document patching.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JsonPatchError {
    /// The target document failed to parse. Fatal for the whole request.
    #[error("target document is not valid JSON: {0}")]
    InvalidDocument(String),

    /// An operation carried an unrecognized or unsupported `op`.
    #[error("operation {index}: unsupported op {op:?} (only add, remove and replace are supported)")]
    UnsupportedOp { index: usize, op: String },

    /// An operation carried an empty or missing path.
    #[error("operation {index}: empty path")]
    EmptyPath { index: usize },

    /// An add/replace operation carried no value.
    #[error("operation {index}: {op} on {path:?} requires a value")]
    MissingValue {
        index: usize,
        op: String,
        path: String,
    },

    /// The addressed path does not exist (strict mode; lenient removal of a
    /// missing path is a no-op).
    #[error("operation {index}: path {path:?} does not exist")]
    MissingTarget { index: usize, path: String },

    /// A segment addressing an array was not a valid index.
    #[error("operation {index}: invalid array index {segment:?} in {path:?}")]
    BadArrayIndex {
        index: usize,
        segment: String,
        path: String,
    },

    /// Traversal hit a scalar where a container was required.
    #[error("operation {index}: cannot descend into non-container value at {path:?}")]
    NotAContainer { index: usize, path: String },
}

/// Result type for structured patching.
pub type Result<T> = std::result::Result<T, JsonPatchError>;

/// Supported operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Remove,
    Replace,
}

impl OpKind {
    fn as_str(self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Remove => "remove",
            OpKind::Replace => "replace",
        }
    }
}

/// One validated patch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOp {
    pub kind: OpKind,
    /// Slash-split path segments, leading empty segment dropped.
    pub segments: Vec<String>,
    /// The path as it appeared on the wire, for error messages.
    pub raw_path: String,
    /// Present for add/replace.
    pub value: Option<Value>,
}

impl PatchOp {
    /// Validate one wire object (`{"op": ..., "path": ..., "value": ...}`).
    fn from_wire(index: usize, raw: &Value) -> Result<Self> {
        let op = raw
            .get("op")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let kind = match op.as_str() {
            "add" => OpKind::Add,
            "remove" => OpKind::Remove,
            "replace" => OpKind::Replace,
            _ => return Err(JsonPatchError::UnsupportedOp { index, op }),
        };

        let raw_path = raw
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let segments: Vec<String> = raw_path
            .split('/')
            .skip_while(|s| s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() || segments.iter().all(|s| s.is_empty()) {
            return Err(JsonPatchError::EmptyPath { index });
        }

        let value = raw.get("value").cloned();
        if value.is_none() && !matches!(kind, OpKind::Remove) {
            return Err(JsonPatchError::MissingValue {
                index,
                op,
                path: raw_path,
            });
        }

        Ok(Self {
            kind,
            segments,
            raw_path,
            value,
        })
    }
}

/// Engine applying an ordered operation sequence to one document.
pub struct StructuredPatchEngine;

impl StructuredPatchEngine {
    /// Parse `document_text`, validate every operation, apply them in
    /// order and return the pretty-printed result.
    pub fn apply(
        document_text: &str,
        operations: &[Value],
        strictness: Strictness,
    ) -> Result<String> {
        let mut document: Value = serde_json::from_str(document_text)
            .map_err(|e| JsonPatchError::InvalidDocument(e.to_string()))?;

        // Validate everything up front; nothing is applied on failure.
        let ops: Vec<PatchOp> = operations
            .iter()
            .enumerate()
            .map(|(index, raw)| PatchOp::from_wire(index, raw))
            .collect::<Result<_>>()?;

        for (index, op) in ops.iter().enumerate() {
            match op.kind {
                OpKind::Add | OpKind::Replace => Self::insert(&mut document, index, op)?,
                OpKind::Remove => Self::remove(&mut document, index, op, strictness)?,
            }
        }

        serde_json::to_string_pretty(&document)
            .map_err(|e| JsonPatchError::InvalidDocument(e.to_string()))
    }

    /// Apply an add or replace.
    ///
    /// Missing intermediate object containers are created on the way down;
    /// a final `-` segment appends to an array, a numeric final segment
    /// inserts (add) or assigns (replace).
    fn insert(document: &mut Value, index: usize, op: &PatchOp) -> Result<()> {
        let value = op.value.clone().ok_or_else(|| JsonPatchError::MissingValue {
            index,
            op: op.kind.as_str().to_string(),
            path: op.raw_path.clone(),
        })?;

        let (last, parents) = match op.segments.split_last() {
            Some(split) => split,
            None => return Err(JsonPatchError::EmptyPath { index }),
        };

        let mut node = document;
        for segment in parents {
            node = match node {
                Value::Object(map) => map
                    .entry(segment.clone())
                    .or_insert_with(|| Value::Object(Map::new())),
                Value::Array(items) => {
                    let i = parse_index(index, segment, &op.raw_path)?;
                    items
                        .get_mut(i)
                        .ok_or_else(|| JsonPatchError::MissingTarget {
                            index,
                            path: op.raw_path.clone(),
                        })?
                }
                _ => {
                    return Err(JsonPatchError::NotAContainer {
                        index,
                        path: op.raw_path.clone(),
                    })
                }
            };
        }

        match node {
            Value::Object(map) => {
                map.insert(last.clone(), value);
            }
            Value::Array(items) => {
                if last == "-" {
                    items.push(value);
                } else {
                    let i = parse_index(index, last, &op.raw_path)?;
                    match op.kind {
                        OpKind::Add => {
                            if i > items.len() {
                                return Err(JsonPatchError::MissingTarget {
                                    index,
                                    path: op.raw_path.clone(),
                                });
                            }
                            items.insert(i, value);
                        }
                        _ => {
                            let slot = items.get_mut(i).ok_or_else(|| {
                                JsonPatchError::MissingTarget {
                                    index,
                                    path: op.raw_path.clone(),
                                }
                            })?;
                            *slot = value;
                        }
                    }
                }
            }
            _ => {
                return Err(JsonPatchError::NotAContainer {
                    index,
                    path: op.raw_path.clone(),
                })
            }
        }

        Ok(())
    }

    /// Apply a remove. In strict mode a missing target is an error; in
    /// lenient mode it is the historical silent no-op.
    fn remove(
        document: &mut Value,
        index: usize,
        op: &PatchOp,
        strictness: Strictness,
    ) -> Result<()> {
        let missing = |index: usize, op: &PatchOp| {
            if strictness.is_lenient() {
                Ok(())
            } else {
                Err(JsonPatchError::MissingTarget {
                    index,
                    path: op.raw_path.clone(),
                })
            }
        };

        let (last, parents) = match op.segments.split_last() {
            Some(split) => split,
            None => return Err(JsonPatchError::EmptyPath { index }),
        };

        let mut node = document;
        for segment in parents {
            let next = match node {
                Value::Object(map) => map.get_mut(segment),
                Value::Array(items) => match segment.parse::<usize>() {
                    Ok(i) => items.get_mut(i),
                    Err(_) => None,
                },
                _ => None,
            };
            node = match next {
                Some(value) => value,
                None => return missing(index, op),
            };
        }

        match node {
            Value::Object(map) => {
                if map.remove(last).is_none() {
                    return missing(index, op);
                }
            }
            Value::Array(items) => match last.parse::<usize>() {
                Ok(i) if i < items.len() => {
                    items.remove(i);
                }
                _ => return missing(index, op),
            },
            _ => return missing(index, op),
        }

        Ok(())
    }
}

fn parse_index(index: usize, segment: &str, path: &str) -> Result<usize> {
    segment
        .parse::<usize>()
        .map_err(|_| JsonPatchError::BadArrayIndex {
            index,
            segment: segment.to_string(),
            path: path.to_string(),
        })
}
