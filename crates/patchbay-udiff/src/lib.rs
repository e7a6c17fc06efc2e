//! Unified diff parsing and application.
//!
//! This crate turns a unified-diff text block into an ordered sequence of
//! per-file patches and applies one file's hunks to that file's current
//! content, tracking how earlier hunks shift the line positions of later
//! ones.
//!
//! # Architecture
//!
//! This is an infrastructure crate:
//! - Depends on: patchbay-core (shared strictness selector)
//! - Used by: patchbay (orchestrator)
//!
//! Hunks are addressed by line number, not by context matching: when the
//! target file has drifted from what the diff was generated against, strict
//! mode reports a mismatch instead of relocating the hunk.

mod applier;
mod error;
mod parser;

pub use applier::{AppliedFile, HunkApplier};
pub use error::{Result, UdiffError};
pub use parser::{DiffLine, FilePatch, Hunk, UdiffParser};
