//! Error taxonomy for patch-application requests.
//!
//! Every failure is reported synchronously in the response envelope with the
//! stage that produced it (input, parse, path-resolution, validation, apply)
//! so callers can tell a malformed envelope from a sandbox denial or an I/O
//! failure. Nothing here is retried internally; retry policy belongs to the
//! caller.

use thiserror::Error;

/// Errors that can abort a patch-application request.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed request fields. Recovered locally and surfaced
    /// as a user-facing message; never fatal to the host process.
    #[error("input: {0}")]
    Input(String),

    /// Diff or document text failed to tokenize/decode. Aborts the whole
    /// request with zero side effects.
    #[error("parse: {0}")]
    Parse(String),

    /// A target path failed the sandbox or allow-list check. Aborts before
    /// any write and identifies the offending path.
    #[error("path-resolution: access denied for {path}: {reason}")]
    AccessDenied { path: String, reason: String },

    /// Operation validation failed before any mutation was attempted.
    #[error("validation: {0}")]
    Validation(String),

    /// I/O or application failure on an already-validated path. Across a
    /// multi-file diff, earlier files may already have been written when
    /// this occurs; files are mutated independently.
    #[error("apply: {0}")]
    Apply(String),
}

/// Result type for patch-engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_stage() {
        let err = EngineError::Parse("no patches found".to_string());
        assert_eq!(err.to_string(), "parse: no patches found");

        let err = EngineError::AccessDenied {
            path: "../outside.txt".to_string(),
            reason: "outside workspace".to_string(),
        };
        assert!(err.to_string().starts_with("path-resolution:"));
        assert!(err.to_string().contains("../outside.txt"));
    }
}
