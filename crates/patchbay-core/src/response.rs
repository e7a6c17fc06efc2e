//! Response envelope produced for the transport boundary.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileChangeStatus {
    /// The target did not exist and was created from the diff's additions.
    Created,
    /// The target existed and was rewritten.
    Modified,
    /// Preview mode: the change was computed but not written.
    DryRun,
}

/// Per-file outcome reported in a unified-diff response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileApplyOutcome {
    pub file: String,
    pub status: FileChangeStatus,
    pub lines_added: usize,
    pub lines_removed: usize,
}

/// Aggregate counts across every file of a unified-diff request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub files_changed: Vec<String>,
    pub total_hunks: usize,
    pub total_lines_added: usize,
    pub total_lines_removed: usize,
}

/// Successful unified-diff response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    pub applied: bool,
    pub summary: DiffSummary,
    pub files: Vec<FileApplyOutcome>,
}

/// Successful structured-patch response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResponse {
    pub applied: bool,
    pub target_file: String,
    pub operation_count: usize,
    /// The would-be document text, present in preview mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Failure response: a message naming the stage that failed and, where
/// applicable, the offending path or operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureResponse {
    pub error: String,
}

/// Response envelope for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchResponse {
    Diff(DiffResponse),
    Structured(StructuredResponse),
    Failure(FailureResponse),
}

impl PatchResponse {
    /// Build the failure envelope for an engine error.
    pub fn failure(err: &EngineError) -> Self {
        PatchResponse::Failure(FailureResponse {
            error: err.to_string(),
        })
    }

    /// True for the two success variants.
    pub fn is_success(&self) -> bool {
        !matches!(self, PatchResponse::Failure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_response_uses_camel_case_wire_names() {
        let response = PatchResponse::Diff(DiffResponse {
            applied: true,
            summary: DiffSummary {
                files_changed: vec!["src/main.rs".to_string()],
                total_hunks: 2,
                total_lines_added: 3,
                total_lines_removed: 1,
            },
            files: vec![FileApplyOutcome {
                file: "src/main.rs".to_string(),
                status: FileChangeStatus::Modified,
                lines_added: 3,
                lines_removed: 1,
            }],
        });

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"filesChanged\""));
        assert!(json.contains("\"totalHunks\""));
        assert!(json.contains("\"totalLinesAdded\""));
        assert!(json.contains("\"linesRemoved\""));
        assert!(json.contains("\"Modified\""));
    }

    #[test]
    fn structured_response_omits_absent_preview() {
        let response = PatchResponse::Structured(StructuredResponse {
            applied: true,
            target_file: "config.json".to_string(),
            operation_count: 2,
            preview: None,
        });

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"targetFile\""));
        assert!(json.contains("\"operationCount\""));
        assert!(!json.contains("\"preview\""));
    }

    #[test]
    fn failure_from_engine_error() {
        let response = PatchResponse::failure(&EngineError::Input("missing patch".to_string()));
        assert!(!response.is_success());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("input: missing patch"));
    }
}
