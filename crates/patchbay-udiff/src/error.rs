//! Error types for unified diff parsing and application.

use thiserror::Error;

/// Errors from parsing or applying a unified diff.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UdiffError {
    /// The diff text contained no `---`/`+++` file header pairs.
    #[error("no patches found in diff text")]
    NoPatches,

    /// A file entry carried neither a source nor a target path.
    #[error("file patch has no usable path")]
    MissingPath,

    /// A hunk's computed start position lies outside the current file
    /// content (strict mode only; lenient mode clamps).
    #[error("hunk {hunk_idx} targets line {start_line}, but the file has {line_count} lines")]
    StartOutOfBounds {
        hunk_idx: usize,
        start_line: usize,
        line_count: usize,
    },

    /// A context or deletion line did not match the file content at its
    /// computed position (strict mode only; lenient mode splices blindly).
    #[error("hunk {hunk_idx} does not match file content at line {line_number}: expected {expected:?}, found {found:?}")]
    ContentMismatch {
        hunk_idx: usize,
        /// 1-based line number in the partially patched content.
        line_number: usize,
        expected: String,
        found: Option<String>,
    },
}

/// Result type for unified-diff operations.
pub type Result<T> = std::result::Result<T, UdiffError>;
