//! Foundation types for patchbay.
//!
//! This crate defines the request and response envelopes exchanged with the
//! transport collaborator, the per-file apply outcomes, and the error
//! taxonomy shared by every stage of request processing.
//!
//! # Architecture
//!
//! This is the foundation crate of the workspace:
//! - Depends on: serde/serde_json and thiserror only
//! - Used by: patchbay-udiff, patchbay-jsonpatch, patchbay-settings,
//!   patchbay (main application)

mod error;
mod request;
mod response;
mod strictness;

pub use error::{EngineError, Result};
pub use request::{PatchFormat, PatchPayload, PatchRequest};
pub use response::{
    DiffResponse, DiffSummary, FailureResponse, FileApplyOutcome, FileChangeStatus, PatchResponse,
    StructuredResponse,
};
pub use strictness::Strictness;
