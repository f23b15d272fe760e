//! Turns raw provider output into stored diagnostics, retrying with a
//! corrective instruction when the output cannot be parsed.
//!
//! One analysis cycle walks a small state machine: request a sweep, persist
//! the raw text, parse it, and either replace the document's diagnostics
//! wholesale or retry with the retry prompt as an attempt-scoped
//! instruction. Attempts are bounded by [`MAX_ATTEMPTS`]; the engine bounds
//! attempt count, not wall-clock time.
//!
//! Analysis is synchronous from the caller's perspective: the future
//! completes only after the full sweep, all retry attempts included. The
//! caller owns serialization of store access per uri.

mod extract;

use thiserror::Error;

use lintra_providers::{AnalysisBackend, BackendError};
use lintra_store::DocumentStore;

pub use extract::{NoDiagnostics, extract_diagnostics};

/// Upper bound on analysis attempts per cycle.
pub const MAX_ATTEMPTS: u32 = 5;

/// How an analysis cycle ended short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Diagnostics were replaced for the uri.
    Updated { count: usize },
    /// Content hash matched the stored document; nothing to do.
    AlreadyUpToDate,
}

/// Terminal errors for an analysis cycle.
///
/// Either way the document's previously stored diagnostics are left
/// untouched: stale-but-valid, never cleared.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Provider failure, propagated unmodified.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// No parseable diagnostic array after exhausting every attempt.
    #[error("no parseable diagnostics after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Per-document analysis driver over a polymorphic backend.
pub struct AnalysisEngine<B> {
    backend: B,
    /// Corrective instruction prepended to every request on a retry
    /// attempt; loaded once at startup.
    retry_prompt: String,
    max_attempts: u32,
}

impl<B: AnalysisBackend> AnalysisEngine<B> {
    pub fn new(backend: B, retry_prompt: impl Into<String>) -> Self {
        Self {
            backend,
            retry_prompt: retry_prompt.into(),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Override the attempt bound; values below 1 are clamped to 1.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Store the document and run one full analysis cycle.
    ///
    /// Identical content (matching hash) short-circuits: the store reports
    /// `AlreadyStored`, which is swallowed here as "already up to date"
    /// rather than surfaced as an error. The raw provider text is persisted
    /// on every attempt, successful or not, so the last output is always
    /// available for inspection.
    pub async fn analyze(
        &self,
        store: &mut DocumentStore,
        uri: &str,
        text: &str,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if store.store(uri, text).is_err() {
            tracing::debug!(uri, "document unchanged, diagnostics already up to date");
            return Ok(AnalysisOutcome::AlreadyUpToDate);
        }

        let mut instruction = String::new();
        for attempt in 1..=self.max_attempts {
            let raw = self.backend.analyse_document(uri, text, &instruction).await?;
            store.store_analysis(uri, &raw);

            match extract_diagnostics(uri, &raw) {
                Ok(diagnostics) => {
                    let count = diagnostics.len();
                    store.update_diagnostics(uri, diagnostics);
                    tracing::info!(uri, attempt, count, "diagnostics updated");
                    return Ok(AnalysisOutcome::Updated { count });
                }
                Err(err) if attempt < self.max_attempts => {
                    tracing::warn!(
                        uri,
                        attempt,
                        max_attempts = self.max_attempts,
                        %err,
                        "analysis attempt failed, retrying"
                    );
                    instruction.clear();
                    instruction.push_str(&self.retry_prompt);
                }
                Err(err) => {
                    tracing::warn!(
                        uri,
                        attempt,
                        max_attempts = self.max_attempts,
                        %err,
                        "analysis failed, no more retries"
                    );
                    return Err(AnalysisError::Exhausted {
                        attempts: self.max_attempts,
                    });
                }
            }
        }

        Err(AnalysisError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
