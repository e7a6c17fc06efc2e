//! Commit audit trail.
//!
//! Every commit-mode invocation appends one JSON record to a JSONL file
//! under the configured audit directory. The sink is a collaborator, not
//! part of the engine's correctness: a failure to record is logged and
//! never fails the request.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// One committed invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique ID for this invocation.
    pub id: String,
    /// RFC 3339 timestamp of the commit.
    pub timestamp: String,
    /// Patch format that was applied ("unified-diff" or "structured").
    pub format: String,
    /// Files written, as requested by the caller.
    pub files: Vec<String>,
    pub lines_added: usize,
    pub lines_removed: usize,
    /// Rendered diff of the change, where cheap to produce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditRecord {
    /// Build a record stamped with a fresh ID and the current time.
    pub fn new(
        format: &str,
        files: Vec<String>,
        lines_added: usize,
        lines_removed: usize,
        detail: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            format: format.to_string(),
            files,
            lines_added,
            lines_removed,
            detail,
        }
    }
}

/// Destination for audit records.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record.
    async fn record(&self, record: &AuditRecord) -> anyhow::Result<()>;
}

/// Appends records as JSON lines to `<dir>/audit.jsonl`.
pub struct JsonlAuditSink {
    path: PathBuf,
}

impl JsonlAuditSink {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join("audit.jsonl"),
        }
    }

    /// Location of the record file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait::async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, record: &AuditRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), id = %record.id, "Recorded commit audit entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn appends_one_json_line_per_record() {
        let dir = tempdir().unwrap();
        let sink = JsonlAuditSink::new(dir.path().to_path_buf());

        let first = AuditRecord::new("unified-diff", vec!["a.txt".to_string()], 2, 1, None);
        let second = AuditRecord::new(
            "structured",
            vec!["config.json".to_string()],
            0,
            0,
            Some("-old\n+new\n".to_string()),
        );
        sink.record(&first).await.unwrap();
        sink.record(&second).await.unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.format, "unified-diff");
        assert_eq!(parsed.files, vec!["a.txt".to_string()]);
        assert_ne!(first.id, second.id);
    }
}
