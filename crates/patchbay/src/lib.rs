//! Sandboxed patch application for automated agents.
//!
//! The orchestrator accepts one request envelope per invocation, resolves
//! every target path through the workspace sandbox before touching any
//! file, and either previews or commits the requested changes. Commits are
//! recorded through the audit sink.
//!
//! # Architecture
//!
//! This is the application crate on top of the engine crates:
//! - patchbay-udiff: unified diff parsing and application
//! - patchbay-jsonpatch: structured-document patching
//! - patchbay-sandbox: workspace confinement and allow-list checks
//! - patchbay-settings: TOML configuration
//! - patchbay-core: envelopes and the error taxonomy

pub mod audit;
pub mod orchestrator;
pub mod transport;

pub use audit::{AuditRecord, AuditSink, JsonlAuditSink};
pub use orchestrator::{OrchestratorConfig, PatchOrchestrator};
