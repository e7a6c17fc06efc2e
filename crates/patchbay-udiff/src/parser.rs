//! Unified diff tokenizer.
//!
//! Scans the diff text line by line. `--- ` and `+++ ` file markers and
//! `@@` hunk headers take precedence over body classification, which
//! resolves most of the format's ambiguity; a deletion line whose own text
//! starts with `-- ` is the one shape this cannot distinguish. A body line
//! that is none of the recognized shapes ends the current hunk but not the
//! scan.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, UdiffError};

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hunk header regex is valid")
});

/// One line of a hunk body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    /// Unchanged line carried for position; blank raw lines parse as
    /// `Context("")`.
    Context(String),
    /// Line present only in the new file (`+` prefix).
    Addition(String),
    /// Line present only in the old file (`-` prefix).
    Deletion(String),
}

/// One contiguous change region, anchored by 1-based old/new start lines.
///
/// Counts omitted from the header default to 1 (single-line hunk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Number of addition lines in the body.
    pub fn additions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, DiffLine::Addition(_)))
            .count()
    }

    /// Number of deletion lines in the body.
    pub fn deletions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, DiffLine::Deletion(_)))
            .count()
    }
}

/// All hunks for a single file within a multi-file diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePatch {
    /// Path from the `--- ` header, `a/` prefix stripped.
    pub source_path: Option<String>,
    /// Path from the `+++ ` header, `b/` prefix stripped.
    pub target_path: Option<String>,
    pub hunks: Vec<Hunk>,
}

impl FilePatch {
    /// The path this patch applies to: the `+++` side when present, else
    /// the `---` side.
    pub fn effective_path(&self) -> Option<&str> {
        self.target_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.source_path.as_deref().filter(|p| !p.is_empty()))
    }
}

/// Tokenizer for unified diff text.
pub struct UdiffParser;

impl UdiffParser {
    /// Parse a diff block into an ordered sequence of per-file patches.
    ///
    /// A `--- ` line starts a new file entry; the following `+++ ` line
    /// completes the pair and pushes it into the output. A diff that yields
    /// zero file entries is an error. A `---`/`+++` pair with no hunks is
    /// valid (new-file creation is handled by the applier).
    pub fn parse(diff_text: &str) -> Result<Vec<FilePatch>> {
        let mut patches: Vec<FilePatch> = Vec::new();
        let mut pending: Option<FilePatch> = None;
        let mut in_hunk = false;

        for line in diff_text.lines() {
            if let Some(rest) = line.strip_prefix("--- ") {
                pending = Some(FilePatch {
                    source_path: Some(strip_file_prefix(rest)),
                    ..Default::default()
                });
                in_hunk = false;
                continue;
            }

            if let Some(rest) = line.strip_prefix("+++ ") {
                let mut patch = pending.take().unwrap_or_default();
                patch.target_path = Some(strip_file_prefix(rest));
                patches.push(patch);
                in_hunk = false;
                continue;
            }

            if let Some(caps) = HUNK_HEADER.captures(line) {
                if let Some(patch) = patches.last_mut() {
                    patch.hunks.push(Hunk {
                        old_start: capture_number(&caps, 1, 1),
                        old_count: capture_number(&caps, 2, 1),
                        new_start: capture_number(&caps, 3, 1),
                        new_count: capture_number(&caps, 4, 1),
                        lines: Vec::new(),
                    });
                    in_hunk = true;
                }
                continue;
            }

            if in_hunk {
                let hunk = match patches.last_mut().and_then(|p| p.hunks.last_mut()) {
                    Some(h) => h,
                    None => continue,
                };
                if line.is_empty() {
                    hunk.lines.push(DiffLine::Context(String::new()));
                } else if let Some(text) = line.strip_prefix('+') {
                    hunk.lines.push(DiffLine::Addition(text.to_string()));
                } else if let Some(text) = line.strip_prefix('-') {
                    hunk.lines.push(DiffLine::Deletion(text.to_string()));
                } else if let Some(text) = line.strip_prefix(' ') {
                    hunk.lines.push(DiffLine::Context(text.to_string()));
                } else {
                    in_hunk = false;
                }
            }
        }

        if patches.is_empty() {
            return Err(UdiffError::NoPatches);
        }
        Ok(patches)
    }
}

fn capture_number(caps: &regex::Captures<'_>, group: usize, default: usize) -> usize {
    caps.get(group)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(default)
}

/// Strip the `a/`/`b/` variant prefix and any trailing tab-separated
/// timestamp from a file-header path.
fn strip_file_prefix(raw: &str) -> String {
    let raw = raw.split('\t').next().unwrap_or(raw).trim();
    if let Some(stripped) = raw.strip_prefix("a/").or_else(|| raw.strip_prefix("b/")) {
        stripped.to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_file_single_hunk() {
        let diff = "--- a/src/lib.rs\n\
                    +++ b/src/lib.rs\n\
                    @@ -2,1 +2,1 @@\n\
                    -line2\n\
                    +new\n";

        let patches = UdiffParser::parse(diff).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].source_path.as_deref(), Some("src/lib.rs"));
        assert_eq!(patches[0].target_path.as_deref(), Some("src/lib.rs"));
        assert_eq!(patches[0].effective_path(), Some("src/lib.rs"));
        assert_eq!(patches[0].hunks.len(), 1);

        let hunk = &patches[0].hunks[0];
        assert_eq!(hunk.old_start, 2);
        assert_eq!(hunk.old_count, 1);
        assert_eq!(
            hunk.lines,
            vec![
                DiffLine::Deletion("line2".to_string()),
                DiffLine::Addition("new".to_string()),
            ]
        );
    }

    #[test]
    fn omitted_counts_default_to_one() {
        let diff = "--- a/f\n+++ b/f\n@@ -5 +5 @@\n-x\n+y\n";
        let patches = UdiffParser::parse(diff).unwrap();
        let hunk = &patches[0].hunks[0];
        assert_eq!(hunk.old_start, 5);
        assert_eq!(hunk.old_count, 1);
        assert_eq!(hunk.new_start, 5);
        assert_eq!(hunk.new_count, 1);
    }

    #[test]
    fn parses_multi_file_diff() {
        let diff = "--- a/one.txt\n\
                    +++ b/one.txt\n\
                    @@ -1,1 +1,1 @@\n\
                    -old\n\
                    +new\n\
                    --- a/two.txt\n\
                    +++ b/two.txt\n\
                    @@ -3,2 +3,1 @@\n\
                    -a\n\
                    -b\n\
                    +c\n";

        let patches = UdiffParser::parse(diff).unwrap();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].effective_path(), Some("one.txt"));
        assert_eq!(patches[1].effective_path(), Some("two.txt"));
        assert_eq!(patches[1].hunks[0].deletions(), 2);
        assert_eq!(patches[1].hunks[0].additions(), 1);
    }

    #[test]
    fn header_pair_without_hunks_is_valid() {
        let diff = "--- a/new.txt\n+++ b/new.txt\n";
        let patches = UdiffParser::parse(diff).unwrap();
        assert_eq!(patches.len(), 1);
        assert!(patches[0].hunks.is_empty());
    }

    #[test]
    fn empty_diff_is_an_error() {
        assert_eq!(UdiffParser::parse(""), Err(UdiffError::NoPatches));
        assert_eq!(
            UdiffParser::parse("not a diff at all\n"),
            Err(UdiffError::NoPatches)
        );
    }

    #[test]
    fn blank_lines_in_hunk_body_are_empty_context() {
        let diff = "--- a/f\n+++ b/f\n@@ -1,3 +1,3 @@\n x\n\n y\n";
        let patches = UdiffParser::parse(diff).unwrap();
        assert_eq!(
            patches[0].hunks[0].lines,
            vec![
                DiffLine::Context("x".to_string()),
                DiffLine::Context(String::new()),
                DiffLine::Context("y".to_string()),
            ]
        );
    }

    #[test]
    fn unrecognized_line_ends_hunk_collection() {
        let diff = "--- a/f\n\
                    +++ b/f\n\
                    @@ -1,1 +1,1 @@\n\
                    -old\n\
                    +new\n\
                    diff --git a/f b/f\n\
                    +stray\n\
                    @@ -9,1 +9,1 @@\n\
                    -p\n\
                    +q\n";

        let patches = UdiffParser::parse(diff).unwrap();
        assert_eq!(patches[0].hunks.len(), 2);
        // The stray `+` after the terminator is not collected anywhere.
        assert_eq!(patches[0].hunks[0].lines.len(), 2);
        assert_eq!(patches[0].hunks[1].old_start, 9);
    }

    #[test]
    fn prefix_stripping_leaves_bare_paths_alone() {
        let diff = "--- one.txt\n+++ one.txt\n";
        let patches = UdiffParser::parse(diff).unwrap();
        assert_eq!(patches[0].effective_path(), Some("one.txt"));
    }

    #[test]
    fn header_timestamps_are_dropped() {
        let diff = "--- a/f.txt\t2024-01-01 00:00:00\n+++ b/f.txt\t2024-01-02 00:00:00\n";
        let patches = UdiffParser::parse(diff).unwrap();
        assert_eq!(patches[0].source_path.as_deref(), Some("f.txt"));
        assert_eq!(patches[0].target_path.as_deref(), Some("f.txt"));
    }

    #[test]
    fn effective_path_falls_back_to_source() {
        let patch = FilePatch {
            source_path: Some("only.txt".to_string()),
            target_path: Some(String::new()),
            hunks: Vec::new(),
        };
        assert_eq!(patch.effective_path(), Some("only.txt"));
    }
}
