//! Workspace path sandbox for patch targets.
//!
//! Every path referenced by a patch must resolve inside the workspace root,
//! or inside an explicitly configured allow-list entry, before any file is
//! touched. Resolution canonicalizes symlinks; for targets that do not exist
//! yet (file creation via diff) the deepest existing ancestor is
//! canonicalized and the remaining components re-appended, so `..` segments
//! or symlink tricks cannot place a new file outside the sandbox.
//!
//! The sandbox performs read-only filesystem queries only (canonicalization
//! and existence checks); it never writes.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Why a requested path was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct Denial {
    /// The path as the caller requested it.
    pub path: String,
    /// Human-readable reason for the refusal.
    pub reason: String,
}

/// One allow-list entry, resolved once at sandbox construction.
///
/// Directory entries grant their entire subtree; file entries grant exactly
/// that path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowlistEntry {
    Dir(PathBuf),
    File(PathBuf),
}

impl AllowlistEntry {
    fn permits(&self, candidate: &Path) -> bool {
        match self {
            AllowlistEntry::Dir(dir) => candidate == dir || candidate.starts_with(dir),
            AllowlistEntry::File(file) => candidate == file,
        }
    }
}

/// Resolves requested paths against a workspace root and an optional
/// allow-list.
///
/// With an empty allow-list, a path is permitted iff its canonical form is
/// workspace-confined. With a non-empty allow-list, the resolved path must
/// be contained in (or equal to) some entry: the list both extends access
/// outside the workspace and further restricts it within (administrators
/// who want plain confinement plus extras list the workspace root itself).
#[derive(Debug, Clone)]
pub struct PathSandbox {
    root: PathBuf,
    allowlist: Vec<AllowlistEntry>,
}

impl PathSandbox {
    /// Create a sandbox rooted at `root` with the configured allow-list
    /// paths.
    ///
    /// The root must exist. Allow-list entries must be absolute; entries
    /// that are not are a configuration error and are skipped with a
    /// warning. Entries that exist are symlink-resolved and classified as
    /// directory or file; entries that do not exist yet are kept as exact
    /// file entries.
    pub fn new(root: impl AsRef<Path>, allowed_paths: &[String]) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;

        let mut allowlist = Vec::with_capacity(allowed_paths.len());
        for raw in allowed_paths {
            let path = Path::new(raw);
            if !path.is_absolute() {
                warn!(entry = %raw, "Skipping non-absolute allow-list entry");
                continue;
            }
            let entry = match path.canonicalize() {
                Ok(resolved) if resolved.is_dir() => AllowlistEntry::Dir(resolved),
                Ok(resolved) => AllowlistEntry::File(resolved),
                Err(_) => AllowlistEntry::File(path.to_path_buf()),
            };
            allowlist.push(entry);
        }

        Ok(Self { root, allowlist })
    }

    /// The canonicalized workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a requested path to its canonical on-disk form, or refuse it.
    ///
    /// Relative paths are resolved against the workspace root first;
    /// absolute paths are canonicalized directly. Never panics: every
    /// refusal is a [`Denial`] with a reason.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, Denial> {
        let requested_path = Path::new(requested);
        let joined = if requested_path.is_absolute() {
            requested_path.to_path_buf()
        } else {
            self.root.join(requested_path)
        };

        let canonical = canonicalize_allowing_new(&joined)
            .map_err(|e| self.denial(requested, format!("cannot resolve path: {}", e)))?;

        let confined = canonical == self.root || canonical.starts_with(&self.root);

        if self.allowlist.is_empty() {
            if !confined {
                return Err(self.denial(
                    requested,
                    format!("path is outside workspace {}", self.root.display()),
                ));
            }
        } else if !self.allowlist.iter().any(|e| e.permits(&canonical)) {
            let reason = if confined {
                "path is not permitted by the configured allow-list".to_string()
            } else {
                format!(
                    "path is outside workspace {} and not in the allow-list",
                    self.root.display()
                )
            };
            return Err(self.denial(requested, reason));
        }

        debug!(requested = %requested, resolved = %canonical.display(), "Resolved patch target");
        Ok(canonical)
    }

    fn denial(&self, requested: &str, reason: String) -> Denial {
        Denial {
            path: requested.to_string(),
            reason,
        }
    }
}

/// Canonicalize a path that may not exist yet.
///
/// For existing paths this is plain `canonicalize`. For new files, the
/// deepest existing ancestor is canonicalized and the non-existent tail is
/// re-appended. A tail component of `..` stops the walk, which makes the
/// subsequent canonicalization fail and the path resolve to a denial rather
/// than an escape.
fn canonicalize_allowing_new(path: &Path) -> io::Result<PathBuf> {
    if path.exists() {
        return path.canonicalize();
    }

    let mut missing: Vec<OsString> = Vec::new();
    let mut probe = path;
    while !probe.exists() {
        match (probe.file_name(), probe.parent()) {
            (Some(name), Some(parent)) if !parent.as_os_str().is_empty() => {
                missing.push(name.to_os_string());
                probe = parent;
            }
            _ => break,
        }
    }

    let mut resolved = probe.canonicalize()?;
    for part in missing.iter().rev() {
        resolved.push(part);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn sandbox(root: &Path) -> PathSandbox {
        PathSandbox::new(root, &[]).unwrap()
    }

    #[test]
    fn relative_path_inside_workspace_is_allowed() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), "content").unwrap();

        let resolved = sandbox(dir.path()).resolve("file.txt").unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap().join("file.txt"));
    }

    #[test]
    fn new_file_inside_workspace_is_allowed() {
        let dir = tempdir().unwrap();
        let resolved = sandbox(dir.path()).resolve("sub/dir/new.txt").unwrap();
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn parent_traversal_is_denied() {
        let dir = tempdir().unwrap();
        let err = sandbox(dir.path()).resolve("../outside.txt").unwrap_err();
        assert_eq!(err.path, "../outside.txt");
        assert!(err.reason.contains("outside workspace") || err.reason.contains("cannot resolve"));
    }

    #[test]
    fn absolute_path_outside_workspace_is_denied() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let target = outside.path().join("secret.txt");
        std::fs::write(&target, "secret").unwrap();

        let err = sandbox(dir.path())
            .resolve(target.to_str().unwrap())
            .unwrap_err();
        assert!(err.reason.contains("outside workspace"));
    }

    #[test]
    fn absolute_path_inside_workspace_is_allowed() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), "content").unwrap();
        let absolute = dir.path().canonicalize().unwrap().join("file.txt");

        let resolved = sandbox(dir.path())
            .resolve(absolute.to_str().unwrap())
            .unwrap();
        assert_eq!(resolved, absolute);
    }

    #[test]
    fn allowlist_directory_grants_its_subtree() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let target = outside.path().join("granted.txt");
        std::fs::write(&target, "ok").unwrap();

        let sandbox = PathSandbox::new(
            dir.path(),
            &[outside.path().to_string_lossy().into_owned()],
        )
        .unwrap();

        let resolved = sandbox.resolve(target.to_str().unwrap()).unwrap();
        assert_eq!(resolved, target.canonicalize().unwrap());
    }

    #[test]
    fn allowlist_file_entry_grants_only_that_path() {
        let outside = tempdir().unwrap();
        let granted = outside.path().join("granted.txt");
        let sibling = outside.path().join("sibling.txt");
        std::fs::write(&granted, "ok").unwrap();
        std::fs::write(&sibling, "no").unwrap();

        let dir = tempdir().unwrap();
        let sandbox =
            PathSandbox::new(dir.path(), &[granted.to_string_lossy().into_owned()]).unwrap();

        assert!(sandbox.resolve(granted.to_str().unwrap()).is_ok());
        assert!(sandbox.resolve(sibling.to_str().unwrap()).is_err());
    }

    #[test]
    fn non_empty_allowlist_restricts_confined_paths() {
        let dir = tempdir().unwrap();
        let granted_dir = dir.path().join("editable");
        std::fs::create_dir(&granted_dir).unwrap();
        std::fs::write(granted_dir.join("inside.txt"), "ok").unwrap();
        std::fs::write(dir.path().join("locked.txt"), "no").unwrap();

        let sandbox = PathSandbox::new(
            dir.path(),
            &[granted_dir.to_string_lossy().into_owned()],
        )
        .unwrap();

        assert!(sandbox.resolve("editable/inside.txt").is_ok());
        let err = sandbox.resolve("locked.txt").unwrap_err();
        assert!(err.reason.contains("allow-list"));
    }

    #[test]
    fn allowlisting_the_root_restores_plain_confinement() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), "content").unwrap();

        let sandbox = PathSandbox::new(
            dir.path(),
            &[dir.path().to_string_lossy().into_owned()],
        )
        .unwrap();

        assert!(sandbox.resolve("file.txt").is_ok());
        assert!(sandbox.resolve("../outside.txt").is_err());
    }

    #[test]
    fn non_absolute_allowlist_entries_are_skipped() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), "content").unwrap();

        // The relative entry is dropped, leaving the list empty: plain
        // confinement applies.
        let sandbox = PathSandbox::new(dir.path(), &["relative/entry".to_string()]).unwrap();
        assert!(sandbox.resolve("file.txt").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_the_workspace_is_denied() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let target = outside.path().join("real.txt");
        std::fs::write(&target, "secret").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

        let err = sandbox(dir.path()).resolve("link.txt").unwrap_err();
        assert!(err.reason.contains("outside workspace"));
    }

    proptest! {
        // Whatever mix of normal and `..` segments is requested, a
        // successful resolution with no allow-list always lands inside the
        // workspace root.
        #[test]
        fn resolution_never_escapes_the_root(
            segments in proptest::collection::vec("([a-z]{1,8}|\\.\\.)", 1..6)
        ) {
            let dir = tempdir().unwrap();
            let sandbox = sandbox(dir.path());
            let requested = segments.join("/");

            if let Ok(resolved) = sandbox.resolve(&requested) {
                prop_assert!(
                    resolved == sandbox.root() || resolved.starts_with(sandbox.root())
                );
            }
        }
    }
}
