//! Applies parsed hunks to file content with running line-offset tracking.

use patchbay_core::Strictness;
use tracing::debug;

use crate::error::{Result, UdiffError};
use crate::parser::{DiffLine, FilePatch};

/// Result of applying one file's hunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFile {
    /// The new file content.
    pub content: String,
    /// Addition lines inserted across all hunks.
    pub lines_added: usize,
    /// Deletion lines removed across all hunks.
    pub lines_removed: usize,
}

/// Applier for one file's hunks.
pub struct HunkApplier;

impl HunkApplier {
    /// Apply `patch` to existing file content.
    ///
    /// Hunks are applied strictly in header order; there is no reordering
    /// and no overlap detection. A running `offset` accumulates the
    /// difference between insertions and removals from hunks already
    /// applied, so each hunk's `old_start`, which refers to the pre-patch
    /// line numbering, lands on the right line of the partially mutated
    /// content: the true start index is `old_start - 1 + offset`.
    ///
    /// From the start index the hunk body is walked with a cursor: context
    /// lines advance it, deletions remove the line under it, additions
    /// insert at it. In strict mode the cursor position must hold the exact
    /// context/deletion text the hunk names; in lenient mode out-of-range
    /// positions clamp and content is spliced without verification.
    pub fn apply(
        original: &str,
        patch: &FilePatch,
        strictness: Strictness,
    ) -> Result<AppliedFile> {
        let had_trailing_newline = original.ends_with('\n');
        let mut lines: Vec<String> = original.lines().map(str::to_string).collect();
        let mut offset: isize = 0;
        let mut lines_added = 0usize;
        let mut lines_removed = 0usize;

        for (hunk_idx, hunk) in patch.hunks.iter().enumerate() {
            let signed_start = hunk.old_start as isize - 1 + offset;
            let start = if signed_start < 0 || signed_start as usize > lines.len() {
                if strictness.is_lenient() {
                    signed_start.clamp(0, lines.len() as isize) as usize
                } else {
                    return Err(UdiffError::StartOutOfBounds {
                        hunk_idx,
                        start_line: hunk.old_start,
                        line_count: lines.len(),
                    });
                }
            } else {
                signed_start as usize
            };

            let mut cursor = start;
            let mut inserted = 0usize;
            let mut removed = 0usize;

            for line in &hunk.lines {
                match line {
                    DiffLine::Context(expected) => {
                        match lines.get(cursor) {
                            Some(found) if found == expected => cursor += 1,
                            found => {
                                if !strictness.is_lenient() {
                                    return Err(UdiffError::ContentMismatch {
                                        hunk_idx,
                                        line_number: cursor + 1,
                                        expected: expected.clone(),
                                        found: found.cloned(),
                                    });
                                }
                                cursor = (cursor + 1).min(lines.len());
                            }
                        }
                    }
                    DiffLine::Deletion(expected) => match lines.get(cursor) {
                        Some(found) => {
                            if found != expected && !strictness.is_lenient() {
                                return Err(UdiffError::ContentMismatch {
                                    hunk_idx,
                                    line_number: cursor + 1,
                                    expected: expected.clone(),
                                    found: Some(found.clone()),
                                });
                            }
                            lines.remove(cursor);
                            removed += 1;
                        }
                        None => {
                            if !strictness.is_lenient() {
                                return Err(UdiffError::ContentMismatch {
                                    hunk_idx,
                                    line_number: cursor + 1,
                                    expected: expected.clone(),
                                    found: None,
                                });
                            }
                            // Lenient: deleting past the end is the
                            // historical clamped-splice no-op.
                        }
                    },
                    DiffLine::Addition(text) => {
                        let at = cursor.min(lines.len());
                        lines.insert(at, text.clone());
                        cursor = at + 1;
                        inserted += 1;
                    }
                }
            }

            debug!(
                hunk_idx,
                old_start = hunk.old_start,
                offset,
                inserted,
                removed,
                "Applied hunk"
            );

            lines_added += inserted;
            lines_removed += removed;
            offset += inserted as isize - removed as isize;
        }

        let mut content = lines.join("\n");
        if had_trailing_newline && !content.is_empty() {
            content.push('\n');
        }

        Ok(AppliedFile {
            content,
            lines_added,
            lines_removed,
        })
    }

    /// Synthesize content for a file that does not exist yet.
    ///
    /// Every addition line across all hunks, in order; positions and
    /// context are ignored entirely. This is the canonical file-creation
    /// path for a diff targeting an absent file.
    pub fn synthesize(patch: &FilePatch) -> AppliedFile {
        let lines: Vec<&str> = patch
            .hunks
            .iter()
            .flat_map(|h| h.lines.iter())
            .filter_map(|l| match l {
                DiffLine::Addition(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        AppliedFile {
            lines_added: lines.len(),
            lines_removed: 0,
            content: lines.join("\n"),
        }
    }

    /// Count additions and deletions without applying anything (the
    /// preview path). Returns `(lines_added, lines_removed)`.
    pub fn count_changes(patch: &FilePatch) -> (usize, usize) {
        patch.hunks.iter().fold((0, 0), |(added, removed), hunk| {
            (added + hunk.additions(), removed + hunk.deletions())
        })
    }
}
