//! Stdin/stdout envelope transport.
//!
//! One invocation consumes exactly one request envelope and produces
//! exactly one response envelope. Anything interactive or long-running
//! lives outside this process; timeouts and retries are the caller's
//! responsibility.

use std::path::Path;

use anyhow::{Context, Result};
use patchbay_core::PatchResponse;
use tokio::io::AsyncReadExt;

/// Read the raw request envelope from `input`, or from stdin when no file
/// is given.
pub async fn read_request(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read request from {}", path.display())),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read request from stdin")?;
            Ok(raw)
        }
    }
}

/// Write the response envelope to stdout.
pub fn write_response(response: &PatchResponse) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(response).context("failed to render response envelope")?;
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reads_request_from_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(&path, r#"{"patch": "x"}"#).unwrap();

        let raw = read_request(Some(&path)).await.unwrap();
        assert_eq!(raw, r#"{"patch": "x"}"#);
    }

    #[tokio::test]
    async fn missing_input_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = read_request(Some(&dir.path().join("absent.json")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
