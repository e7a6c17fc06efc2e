//! Loading and saving the settings file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::debug;

use crate::schema::PatchbaySettings;

/// Default settings location: `~/.patchbay/settings.toml`.
pub fn settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".patchbay").join("settings.toml"))
}

/// Load settings from `path`, or from the default location when `path` is
/// `None`. A missing file yields the defaults.
pub async fn load(path: Option<&Path>) -> Result<PatchbaySettings> {
    let resolved = match path {
        Some(p) => p.to_path_buf(),
        None => match settings_path() {
            Some(p) => p,
            None => {
                debug!("No home directory; using default settings");
                return Ok(PatchbaySettings::default());
            }
        },
    };

    if !resolved.exists() {
        debug!(path = %resolved.display(), "Settings file not found, using defaults");
        return Ok(PatchbaySettings::default());
    }

    let raw = fs::read_to_string(&resolved)
        .await
        .with_context(|| format!("Failed to read settings: {}", resolved.display()))?;
    let settings = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse settings: {}", resolved.display()))?;
    debug!(path = %resolved.display(), "Loaded settings");
    Ok(settings)
}

/// Save settings to `path` atomically (temp file + rename), creating parent
/// directories as needed.
pub async fn save(settings: &PatchbaySettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let rendered = toml::to_string_pretty(settings).context("Failed to render settings")?;
    let tmp = path.with_extension("toml.tmp");
    fs::write(&tmp, rendered.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move settings into place at {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = load(Some(&dir.path().join("absent.toml"))).await.unwrap();
        assert_eq!(settings.version, 1);
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut settings = PatchbaySettings::default();
        settings.access.allowed_paths = vec!["/srv/shared".to_string()];
        settings.audit.enabled = false;

        save(&settings, &path).await.unwrap();
        let loaded = load(Some(&path)).await.unwrap();
        assert_eq!(loaded.access.allowed_paths, vec!["/srv/shared".to_string()]);
        assert!(!loaded.audit.enabled);
        // No temp file left behind.
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "version = \"not a number\"").unwrap();

        assert!(load(Some(&path)).await.is_err());
    }
}
