//! Editor-facing views over stored diagnostics.
//!
//! Pure, side-effect-free mapping from internal records to the two consumer
//! contracts: pull-diagnostics reports and hover markdown. The wire-level
//! editor protocol (transport, framing, capability negotiation) is an
//! external collaborator and lives elsewhere.

use serde::Serialize;

use lintra_store::{DocumentStore, StoreError};
use lintra_types::{Diagnostic, Severity, markdown_markup, pretty_text};

/// A single finding shaped for an editor client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedDiagnostic {
    /// 0-based line index.
    pub line: u32,
    pub severity: Severity,
    /// `"{source} {rule}"`, e.g. `"misra R12"`.
    pub code: String,
    pub message: String,
    /// Short pretty text (source/severity/recommendation).
    pub detail: String,
}

/// Full diagnostic report for one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticReport {
    pub items: Vec<ReportedDiagnostic>,
}

impl DiagnosticReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any finding maps to the error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|item| item.severity.is_error())
    }
}

fn reported(d: &Diagnostic) -> ReportedDiagnostic {
    ReportedDiagnostic {
        line: d.line_index(),
        severity: d.severity(),
        code: format!("{} {}", d.source, d.rule),
        message: d.description.clone(),
        detail: pretty_text(d),
    }
}

/// Pull-diagnostics contract: the full report for a uri, or an explicit
/// `NotFound` distinguishing "never analyzed" from "analyzed, zero
/// findings" (an empty report).
pub fn pull_diagnostics(
    store: &DocumentStore,
    uri: &str,
) -> Result<DiagnosticReport, StoreError> {
    let diagnostics = store.get_diagnostics(uri)?;
    tracing::debug!(uri, count = diagnostics.len(), "serving pull diagnostics");
    Ok(DiagnosticReport {
        items: diagnostics.iter().map(reported).collect(),
    })
}

/// Hover contract: rendered markdown for every diagnostic on the 0-based
/// line, blank-line separated; the empty string when the line is clean.
pub fn hover(store: &DocumentStore, uri: &str, line: u32) -> Result<String, StoreError> {
    let diagnostics = store.get_diagnostics(uri)?;
    let blocks: Vec<String> = diagnostics
        .iter()
        .filter(|d| d.line_index() == line)
        .filter_map(|d| match markdown_markup(d) {
            Ok(block) => Some(block),
            Err(err) => {
                tracing::warn!(uri, line, %err, "failed to render hover block");
                None
            }
        })
        .collect();
    Ok(blocks.join("\n\n"))
}
