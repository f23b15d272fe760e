//! Lintra batch reporter - analyze files from the command line and print
//! every finding.
//!
//! ```text
//! lintra [--config <path>] <file>...
//! ```
//!
//! Each file is stored, swept through the configured backend, and reported
//! via the pull-diagnostics surface. A file that fails is logged and
//! skipped; the rest of the batch still runs. The process exits non-zero
//! when any file failed or any mandatory (error-severity) finding exists.
//! Editor protocol transport is an external collaborator; this binary only
//! drives the analysis core.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use lintra_config::{LintraConfig, load_prompt};
use lintra_engine::{AnalysisEngine, AnalysisOutcome};
use lintra_lsp::pull_diagnostics;
use lintra_providers::{AnalysisBackend, Backend, BackendConfig};
use lintra_store::DocumentStore;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Findings go to stdout; logs stay on stderr so reports pipe cleanly.
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

struct Args {
    config_path: Option<PathBuf>,
    files: Vec<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    let mut files = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .context("--config requires a path argument")?;
                config_path = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("usage: lintra [--config <path>] <file>...");
                std::process::exit(0);
            }
            other => files.push(PathBuf::from(other)),
        }
    }

    if files.is_empty() {
        bail!("no input files; usage: lintra [--config <path>] <file>...");
    }
    Ok(Args { config_path, files })
}

/// How one file came out of the analyze-and-report cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    /// Analysis or reporting failed; the file was logged and skipped.
    Failed,
    Clean,
    Findings { has_errors: bool },
}

/// Analyze one file and print its report.
///
/// Failures never abort the batch: the file is logged, marked failed, and
/// the caller moves on to the next one. A uri whose last cycle exhausted
/// every attempt has stored content but no diagnostics entry, so the report
/// lookup can miss even after an `AlreadyUpToDate` outcome.
async fn analyze_and_report<B: AnalysisBackend>(
    engine: &AnalysisEngine<B>,
    store: &mut DocumentStore,
    file: &Path,
) -> FileOutcome {
    let uri = format!("file://{}", file.display());
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(uri, %err, "failed to read file");
            return FileOutcome::Failed;
        }
    };

    match engine.analyze(store, &uri, &text).await {
        Ok(AnalysisOutcome::Updated { count }) => {
            tracing::info!(uri, count, "analysis complete");
        }
        Ok(AnalysisOutcome::AlreadyUpToDate) => {
            tracing::info!(uri, "already up to date");
        }
        Err(err) => {
            tracing::error!(uri, %err, "analysis failed");
            return FileOutcome::Failed;
        }
    }

    let report = match pull_diagnostics(store, &uri) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(uri, %err, "no diagnostics available");
            return FileOutcome::Failed;
        }
    };
    if report.is_empty() {
        println!("{}: no findings", file.display());
        return FileOutcome::Clean;
    }
    for item in &report.items {
        println!(
            "{}:{}: {}: [{}] {}",
            file.display(),
            item.line + 1,
            item.severity.label(),
            item.code,
            item.message
        );
    }
    FileOutcome::Findings {
        has_errors: report.has_errors(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = parse_args()?;

    let config = match &args.config_path {
        Some(path) => LintraConfig::load(path)?,
        None => LintraConfig::load_default()?,
    };

    let retry_prompt = load_prompt(&config.retry_prompt_file)
        .context("retry prompt is required for analysis")?;

    let backend_config = BackendConfig::new(config.backend, config.strategy, &config.prompt_file)
        .with_params(config.model.clone())
        .with_connect_test(config.connect_test)
        .with_chunk_size(config.chunk_size);
    let mut backend = Backend::new(backend_config);
    backend.start().await.context("backend failed to start")?;

    let engine = AnalysisEngine::new(backend, retry_prompt).with_max_attempts(config.max_attempts);
    let mut store = DocumentStore::new();
    let mut failed = false;
    let mut errors_found = false;

    for file in &args.files {
        match analyze_and_report(&engine, &mut store, file).await {
            FileOutcome::Failed => failed = true,
            FileOutcome::Clean => {}
            FileOutcome::Findings { has_errors } => errors_found |= has_errors,
        }
    }

    if failed || errors_found {
        std::process::exit(1);
    }
    Ok(())
}
