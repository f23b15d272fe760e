//! Best-effort extraction of diagnostic records from free-form text.
//!
//! The provider's output is not guaranteed parseable, so this is a narrow
//! "text to records" seam with an explicit success/failure result: the
//! matching strategy can be swapped without touching the retry logic.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use lintra_types::Diagnostic;

/// No parseable diagnostic array was found in the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no valid JSON diagnostic array found")]
pub struct NoDiagnostics;

/// Bounded, non-overlapping matcher for substrings shaped like a JSON
/// array of objects.
fn array_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[\s*\{[^]]+\}\s*\]").expect("diagnostic array pattern is valid")
    })
}

/// Scan raw provider text for JSON arrays of diagnostic objects and parse
/// each matched span independently.
///
/// A malformed span is logged and skipped, never fatal. Every successfully
/// parsed record is stamped with `uri`. Fails only when the union of all
/// parsed spans is empty.
pub fn extract_diagnostics(uri: &str, raw: &str) -> Result<Vec<Diagnostic>, NoDiagnostics> {
    let mut all = Vec::new();

    for span in array_pattern().find_iter(raw) {
        match serde_json::from_str::<Vec<Diagnostic>>(span.as_str()) {
            Ok(parsed) => all.extend(parsed),
            Err(err) => {
                tracing::warn!(%err, span_bytes = span.as_str().len(), "skipping malformed diagnostic array");
            }
        }
    }

    if all.is_empty() {
        return Err(NoDiagnostics);
    }

    for diagnostic in &mut all {
        diagnostic.uri = uri.to_string();
    }
    Ok(all)
}
