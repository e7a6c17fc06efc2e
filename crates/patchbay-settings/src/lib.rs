//! Centralized TOML-based settings for patchbay.
//!
//! This crate provides configuration management for the patch-application
//! service, including:
//! - Loading settings from `~/.patchbay/settings.toml` (or an explicit path)
//! - Atomic file writes with temp file + rename
//! - Type-safe settings schema with serde defaults
//!
//! Settings are loaded once per invocation and passed down explicitly;
//! there is no process-wide configuration singleton.

pub mod loader;
pub mod schema;

pub use loader::{load, save, settings_path};
pub use schema::{
    AccessSettings, AuditSettings, EngineSettings, LogLevel, LoggingSettings, PatchbaySettings,
    WorkspaceSettings,
};
