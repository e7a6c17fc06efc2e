//! Engine strictness selection.

use serde::{Deserialize, Serialize};

/// How forgiving the engines are about conditions that older releases
/// silently tolerated: hunk positions outside the current file and removal
/// of a structured-document path that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Out-of-range hunk positions, context/deletion mismatches and
    /// remove-on-missing operations are explicit apply errors.
    #[default]
    Strict,
    /// Restore the historical behavior: positions clamp, content is spliced
    /// without verification, missing removal targets are no-ops.
    Lenient,
}

impl Strictness {
    /// True when running with the historical lenient semantics.
    pub fn is_lenient(self) -> bool {
        matches!(self, Strictness::Lenient)
    }
}

impl std::fmt::Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Strictness::Strict => "strict",
            Strictness::Lenient => "lenient",
        };
        write!(f, "{}", s)
    }
}
