//! Top-level request orchestration.
//!
//! One orchestrator handles one request: dispatch on the requested format,
//! resolve every target path through the sandbox, then either preview or
//! commit. Preview mode computes line-accurate statistics without touching
//! disk. Path validation is all-or-nothing: a single denial aborts the
//! request before any write. Writes across a multi-file diff are not
//! transactional: files are mutated independently, and an I/O failure
//! mid-way leaves earlier files written.

use std::path::PathBuf;

use patchbay_core::{
    DiffResponse, DiffSummary, EngineError, FileApplyOutcome, FileChangeStatus, PatchFormat,
    PatchPayload, PatchRequest, PatchResponse, Result, Strictness, StructuredResponse,
};
use patchbay_jsonpatch::{JsonPatchError, StructuredPatchEngine};
use patchbay_sandbox::PathSandbox;
use patchbay_udiff::{FilePatch, HunkApplier, UdiffParser};
use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};

use crate::audit::{AuditRecord, AuditSink};

/// Everything the orchestrator needs, passed in explicitly at construction.
pub struct OrchestratorConfig {
    pub sandbox: PathSandbox,
    pub strictness: Strictness,
    /// Requests whose diff text exceeds this are rejected before parsing.
    pub max_patch_size_bytes: usize,
    /// Where commit records go; `None` disables auditing.
    pub audit: Option<Box<dyn AuditSink>>,
}

/// Handles one patch-application request per invocation.
pub struct PatchOrchestrator {
    sandbox: PathSandbox,
    strictness: Strictness,
    max_patch_size_bytes: usize,
    audit: Option<Box<dyn AuditSink>>,
}

impl PatchOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            sandbox: config.sandbox,
            strictness: config.strictness,
            max_patch_size_bytes: config.max_patch_size_bytes,
            audit: config.audit,
        }
    }

    /// Handle a request, turning every failure into the failure envelope.
    pub async fn handle(&self, request: PatchRequest) -> PatchResponse {
        match self.try_handle(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Request failed");
                PatchResponse::failure(&err)
            }
        }
    }

    async fn try_handle(&self, request: &PatchRequest) -> Result<PatchResponse> {
        match request.format {
            PatchFormat::UnifiedDiff => self.handle_unified_diff(request).await,
            PatchFormat::Structured => self.handle_structured(request).await,
        }
    }

    async fn handle_unified_diff(&self, request: &PatchRequest) -> Result<PatchResponse> {
        let diff_text = match &request.patch {
            PatchPayload::Text(text) => text,
            PatchPayload::Operations(_) => {
                return Err(EngineError::Input(
                    "unified-diff format requires diff text in `patch`".to_string(),
                ))
            }
        };
        if diff_text.len() > self.max_patch_size_bytes {
            return Err(EngineError::Input(format!(
                "patch size {} exceeds the {} byte limit",
                diff_text.len(),
                self.max_patch_size_bytes
            )));
        }

        let patches =
            UdiffParser::parse(diff_text).map_err(|e| EngineError::Parse(e.to_string()))?;

        // Resolve every referenced path before any file is touched, in
        // preview and commit mode alike. One denial aborts the request.
        let mut targets: Vec<(&FilePatch, PathBuf, String)> = Vec::with_capacity(patches.len());
        for patch in &patches {
            let display = patch
                .effective_path()
                .ok_or_else(|| EngineError::Parse("file patch has no usable path".to_string()))?
                .to_string();
            let resolved = self.sandbox.resolve(&display).map_err(|denial| {
                EngineError::AccessDenied {
                    path: denial.path,
                    reason: denial.reason,
                }
            })?;
            targets.push((patch, resolved, display));
        }

        let total_hunks: usize = patches.iter().map(|p| p.hunks.len()).sum();
        let mut files: Vec<FileApplyOutcome> = Vec::with_capacity(targets.len());

        if request.commit {
            for (patch, resolved, display) in &targets {
                let outcome = self.commit_file(patch, resolved, display).await?;
                files.push(outcome);
            }
        } else {
            for (patch, _, display) in &targets {
                let (lines_added, lines_removed) = HunkApplier::count_changes(patch);
                files.push(FileApplyOutcome {
                    file: display.clone(),
                    status: FileChangeStatus::DryRun,
                    lines_added,
                    lines_removed,
                });
            }
        }

        let summary = DiffSummary {
            files_changed: files.iter().map(|f| f.file.clone()).collect(),
            total_hunks,
            total_lines_added: files.iter().map(|f| f.lines_added).sum(),
            total_lines_removed: files.iter().map(|f| f.lines_removed).sum(),
        };

        if request.commit {
            info!(
                files = summary.files_changed.len(),
                hunks = summary.total_hunks,
                added = summary.total_lines_added,
                removed = summary.total_lines_removed,
                "Committed unified diff"
            );
            self.emit_audit(AuditRecord::new(
                "unified-diff",
                summary.files_changed.clone(),
                summary.total_lines_added,
                summary.total_lines_removed,
                None,
            ))
            .await;
        }

        Ok(PatchResponse::Diff(DiffResponse {
            applied: request.commit,
            summary,
            files,
        }))
    }

    /// Apply one file's hunks on disk: create the target from the diff's
    /// additions when it is absent, rewrite it otherwise.
    async fn commit_file(
        &self,
        patch: &FilePatch,
        resolved: &PathBuf,
        display: &str,
    ) -> Result<FileApplyOutcome> {
        if resolved.exists() {
            let current = fs::read_to_string(resolved)
                .await
                .map_err(|e| EngineError::Apply(format!("failed to read {}: {}", display, e)))?;
            let applied = HunkApplier::apply(&current, patch, self.strictness)
                .map_err(|e| EngineError::Apply(format!("{}: {}", display, e)))?;
            fs::write(resolved, &applied.content)
                .await
                .map_err(|e| EngineError::Apply(format!("failed to write {}: {}", display, e)))?;
            Ok(FileApplyOutcome {
                file: display.to_string(),
                status: FileChangeStatus::Modified,
                lines_added: applied.lines_added,
                lines_removed: applied.lines_removed,
            })
        } else {
            let created = HunkApplier::synthesize(patch);
            if let Some(parent) = resolved.parent() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    EngineError::Apply(format!("failed to create directories for {}: {}", display, e))
                })?;
            }
            fs::write(resolved, &created.content)
                .await
                .map_err(|e| EngineError::Apply(format!("failed to write {}: {}", display, e)))?;
            Ok(FileApplyOutcome {
                file: display.to_string(),
                status: FileChangeStatus::Created,
                lines_added: created.lines_added,
                lines_removed: created.lines_removed,
            })
        }
    }

    async fn handle_structured(&self, request: &PatchRequest) -> Result<PatchResponse> {
        let target_rel = request.target_file.as_deref().ok_or_else(|| {
            EngineError::Input("structured format requires `targetFile`".to_string())
        })?;

        let operations: Vec<Value> = match &request.patch {
            PatchPayload::Operations(ops) => ops.clone(),
            PatchPayload::Text(text) => serde_json::from_str(text).map_err(|e| {
                EngineError::Parse(format!("structured patch is not an operation array: {}", e))
            })?,
        };

        let resolved =
            self.sandbox
                .resolve(target_rel)
                .map_err(|denial| EngineError::AccessDenied {
                    path: denial.path,
                    reason: denial.reason,
                })?;

        let current = fs::read_to_string(&resolved)
            .await
            .map_err(|e| EngineError::Apply(format!("failed to read {}: {}", target_rel, e)))?;

        let updated = StructuredPatchEngine::apply(&current, &operations, self.strictness)
            .map_err(map_jsonpatch_error)?;

        if !request.commit {
            return Ok(PatchResponse::Structured(StructuredResponse {
                applied: false,
                target_file: target_rel.to_string(),
                operation_count: operations.len(),
                preview: Some(updated),
            }));
        }

        fs::write(&resolved, &updated)
            .await
            .map_err(|e| EngineError::Apply(format!("failed to write {}: {}", target_rel, e)))?;

        info!(target = %target_rel, operations = operations.len(), "Committed structured patch");
        self.emit_audit(AuditRecord::new(
            "structured",
            vec![target_rel.to_string()],
            0,
            0,
            Some(render_unified_diff(&current, &updated)),
        ))
        .await;

        Ok(PatchResponse::Structured(StructuredResponse {
            applied: true,
            target_file: target_rel.to_string(),
            operation_count: operations.len(),
            preview: None,
        }))
    }

    /// Record a commit. Audit failures are logged, never surfaced.
    async fn emit_audit(&self, record: AuditRecord) {
        if let Some(sink) = &self.audit {
            if let Err(e) = sink.record(&record).await {
                warn!(error = %e, "Failed to record audit entry");
            }
        }
    }
}

fn map_jsonpatch_error(err: JsonPatchError) -> EngineError {
    match err {
        JsonPatchError::InvalidDocument(_) => EngineError::Parse(err.to_string()),
        JsonPatchError::UnsupportedOp { .. }
        | JsonPatchError::EmptyPath { .. }
        | JsonPatchError::MissingValue { .. } => EngineError::Validation(err.to_string()),
        _ => EngineError::Apply(err.to_string()),
    }
}

/// Render a plain unified diff of one document change, for audit records.
fn render_unified_diff(old: &str, new: &str) -> String {
    use similar::{ChangeTag, TextDiff};

    let diff = TextDiff::from_lines(old, new);
    let mut result = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        result.push_str(sign);
        result.push_str(change.value());
        if !change.value().ends_with('\n') {
            result.push('\n');
        }
    }

    result
}
