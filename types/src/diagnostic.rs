//! The diagnostic record and its display formatting.
//!
//! [`Diagnostic`] is the interchange shape shared with every consumer; the
//! serde field names are a compatibility contract and must not change. The
//! formatting functions are pure: no IO, no state.

use serde::{Deserialize, Serialize};

/// A single finding attached to a document line.
///
/// The provider is asked to answer with JSON arrays of exactly this shape.
/// `uri` is stamped by the extraction layer after parsing; providers never
/// see it in the payload they produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub uri: String,
    /// 1-based line number within the document.
    pub line_number: u32,
    /// Origin of the finding (e.g. "misra").
    #[serde(default)]
    pub source: String,
    /// Rule identifier within the source standard.
    #[serde(default)]
    pub rule: String,
    /// Internal severity label; mapped to [`Severity`] for display.
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
}

impl Diagnostic {
    /// External severity derived from the internal label.
    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::from_label(&self.severity)
    }

    /// 0-based line index, saturating for malformed records claiming line 0.
    #[must_use]
    pub fn line_index(&self) -> u32 {
        self.line_number.saturating_sub(1)
    }
}

/// External 3-level severity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Hint = 3,
}

impl Severity {
    /// Map an internal severity label to the external classification.
    ///
    /// `"advisory"` → Warning, `"mandatory"` → Error, anything else
    /// (including the empty string) → Hint.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "advisory" => Self::Warning,
            "mandatory" => Self::Error,
            _ => Self::Hint,
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
        }
    }
}

/// Short human-readable rendering for inline display.
#[must_use]
pub fn pretty_text(d: &Diagnostic) -> String {
    format!(
        "\nSource: {}\nSeverity: {}\nRecommendation: {}\n",
        d.source, d.severity, d.recommendation
    )
}

/// Markdown block embedding the record as pretty-printed JSON.
///
/// Consumed by hover surfaces that render markdown.
pub fn markdown_markup(d: &Diagnostic) -> Result<String, serde_json::Error> {
    let value = serde_json::to_string_pretty(d)?;
    Ok(format!("#### diagnostics\n```json\n{value}\n```"))
}
