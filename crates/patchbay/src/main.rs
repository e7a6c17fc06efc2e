//! patchbay: apply unified-diff or structured patches inside a sandboxed
//! workspace.
//!
//! Reads one request envelope from stdin (or `--input`), applies or
//! previews it, and writes one response envelope to stdout. Diagnostics go
//! to stderr or, when configured, to a log file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use patchbay::{JsonlAuditSink, OrchestratorConfig, PatchOrchestrator};
use patchbay_core::{PatchRequest, PatchResponse, Strictness};
use patchbay_sandbox::PathSandbox;
use patchbay_settings::LoggingSettings;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "patchbay",
    version,
    about = "Apply unified-diff or structured patches inside a sandboxed workspace"
)]
struct Cli {
    /// Workspace root that all patch targets must resolve into.
    /// Defaults to the configured root, then the current directory.
    #[arg(long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Settings file (defaults to ~/.patchbay/settings.toml).
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Read the request envelope from FILE instead of stdin.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Force commit mode regardless of the envelope's `commit` field.
    #[arg(long)]
    commit: bool,

    /// Restore the historical lenient behavior for out-of-range hunks and
    /// removal of missing document paths.
    #[arg(long)]
    lenient: bool,
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured
/// level. Returns the appender guard that must stay alive for file logging.
fn init_tracing(settings: &LoggingSettings) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_string()));

    match &settings.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, "patchbay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = patchbay_settings::load(cli.settings.as_deref()).await?;
    let _guard = init_tracing(&settings.logging);

    let workspace = match cli
        .workspace
        .or_else(|| settings.workspace.root.clone().map(PathBuf::from))
    {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };

    let sandbox = PathSandbox::new(&workspace, &settings.access.allowed_paths)
        .with_context(|| format!("invalid workspace root {}", workspace.display()))?;

    let strictness = if cli.lenient {
        Strictness::Lenient
    } else {
        settings.engine.strictness
    };

    let audit = if settings.audit.enabled {
        settings
            .audit
            .log_dir
            .clone()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".patchbay").join("audit")))
            .map(|dir| Box::new(JsonlAuditSink::new(dir)) as Box<dyn patchbay::AuditSink>)
    } else {
        None
    };

    let orchestrator = PatchOrchestrator::new(OrchestratorConfig {
        sandbox,
        strictness,
        max_patch_size_bytes: settings.engine.max_patch_size_bytes,
        audit,
    });

    let raw = patchbay::transport::read_request(cli.input.as_deref()).await?;
    let response = match PatchRequest::from_json(&raw) {
        Ok(mut request) => {
            if cli.commit {
                request.commit = true;
            }
            orchestrator.handle(request).await
        }
        Err(err) => PatchResponse::failure(&err),
    };

    patchbay::transport::write_response(&response)
}
