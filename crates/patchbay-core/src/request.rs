//! Request envelope consumed from the transport boundary.
//!
//! The envelope is a closed set of shapes: unknown fields and unknown format
//! strings are rejected at deserialization time, before any path is resolved
//! or any file is read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

/// Patch format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PatchFormat {
    /// Standard `---`/`+++`/`@@` unified diff text (the default).
    #[default]
    #[serde(rename = "unified-diff")]
    UnifiedDiff,
    /// Ordered add/remove/replace operations (RFC 6902 subset).
    #[serde(rename = "structured")]
    Structured,
}

impl std::fmt::Display for PatchFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PatchFormat::UnifiedDiff => "unified-diff",
            PatchFormat::Structured => "structured",
        };
        write!(f, "{}", s)
    }
}

/// Raw patch payload: diff text for `unified-diff`, an operation array for
/// `structured`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchPayload {
    Text(String),
    Operations(Vec<Value>),
}

/// One patch-application request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchRequest {
    /// The patch itself.
    pub patch: PatchPayload,

    /// Requested format; defaults to `unified-diff`.
    #[serde(default)]
    pub format: PatchFormat,

    /// True to write changes to disk; false (the default) computes a
    /// preview without mutating anything.
    #[serde(default)]
    pub commit: bool,

    /// Target document for `structured` format. Ignored for `unified-diff`,
    /// where the diff's embedded paths are authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_file: Option<String>,
}

impl PatchRequest {
    /// Parse a request envelope from JSON text.
    ///
    /// Any shape problem (unknown fields, unknown format strings, a missing
    /// `patch`) is an input error reported in the response envelope.
    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        serde_json::from_str(raw)
            .map_err(|e| EngineError::Input(format!("invalid request envelope: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_unified_diff_preview() {
        let request = PatchRequest::from_json(r#"{"patch": "--- a\n+++ b\n"}"#).unwrap();
        assert_eq!(request.format, PatchFormat::UnifiedDiff);
        assert!(!request.commit);
        assert!(request.target_file.is_none());
        assert!(matches!(request.patch, PatchPayload::Text(_)));
    }

    #[test]
    fn structured_request_with_operation_array() {
        let request = PatchRequest::from_json(
            r#"{
                "patch": [{"op": "replace", "path": "/debug", "value": true}],
                "format": "structured",
                "commit": true,
                "targetFile": "config.json"
            }"#,
        )
        .unwrap();
        assert_eq!(request.format, PatchFormat::Structured);
        assert!(request.commit);
        assert_eq!(request.target_file.as_deref(), Some("config.json"));
        match request.patch {
            PatchPayload::Operations(ops) => assert_eq!(ops.len(), 1),
            PatchPayload::Text(_) => panic!("expected an operation array"),
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = PatchRequest::from_json(r#"{"patch": "x", "format": "xml"}"#).unwrap_err();
        assert!(err.to_string().starts_with("input:"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = PatchRequest::from_json(r#"{"patch": "x", "shell": "rm -rf /"}"#).unwrap_err();
        assert!(err.to_string().starts_with("input:"));
    }

    #[test]
    fn missing_patch_is_rejected() {
        let err = PatchRequest::from_json(r#"{"format": "structured"}"#).unwrap_err();
        assert!(err.to_string().starts_with("input:"));
    }
}
