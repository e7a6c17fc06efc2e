//! Settings schema definitions for patchbay configuration.
//!
//! All settings structs use `#[serde(default)]` to allow partial
//! configuration files. Missing fields are filled with sensible defaults.

use patchbay_core::Strictness;
use serde::{Deserialize, Serialize};

/// Logging level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        write!(f, "{}", s)
    }
}

/// Root settings structure for patchbay.
///
/// Loaded from `~/.patchbay/settings.toml`. The version field enables
/// future migrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchbaySettings {
    /// Schema version for migrations.
    pub version: u32,

    /// Workspace defaults.
    pub workspace: WorkspaceSettings,

    /// Path access policy.
    pub access: AccessSettings,

    /// Patch engine behavior.
    pub engine: EngineSettings,

    /// Commit audit trail.
    pub audit: AuditSettings,

    /// Diagnostic logging.
    pub logging: LoggingSettings,
}

/// Workspace defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Default workspace root when the CLI does not supply one. When unset,
    /// the current directory is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

/// Path access policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSettings {
    /// Absolute paths accessible in addition to the workspace root; when
    /// non-empty the list also restricts access within it. Directory
    /// entries grant their subtree, file entries grant only that path.
    pub allowed_paths: Vec<String>,
}

/// Patch engine behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Strict (default) errors on out-of-range hunks, content mismatches
    /// and removal of missing document paths; lenient restores the
    /// historical silent behavior.
    pub strictness: Strictness,

    /// Requests whose diff text exceeds this size are rejected up front.
    pub max_patch_size_bytes: usize,
}

/// Commit audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Record every commit-mode invocation.
    pub enabled: bool,

    /// Directory for audit records. Defaults to `~/.patchbay/audit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

/// Diagnostic logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level when `RUST_LOG` is not set.
    pub log_level: LogLevel,

    /// When set, diagnostics are appended to `patchbay.log` in this
    /// directory instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_max_patch_size_bytes() -> usize {
    512 * 1024
}

impl Default for PatchbaySettings {
    fn default() -> Self {
        Self {
            version: 1,
            workspace: WorkspaceSettings::default(),
            access: AccessSettings::default(),
            engine: EngineSettings::default(),
            audit: AuditSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            strictness: Strictness::default(),
            max_patch_size_bytes: default_max_patch_size_bytes(),
        }
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            log_dir: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: None,
        }
    }
}
