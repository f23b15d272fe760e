//! Backend tags and model tuning parameters.
//!
//! The provider and sweep strategy are tagged variants chosen once at
//! construction and injected; nothing downstream branches on configuration
//! strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which text-generation service backs the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    OpenAi,
}

impl ProviderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
        }
    }

    /// Default model name for this provider.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Ollama => "deepseek-coder",
            Self::OpenAi => "gpt-4-1106-preview",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a document sweep is decomposed into provider requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepStrategy {
    /// One request per chunk, static system prompt.
    #[default]
    WholeChunk,
    /// One request per (rule x chunk) pair over the enumerated rule set.
    RuleSweep,
}

impl SweepStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WholeChunk => "whole-chunk",
            Self::RuleSweep => "rule-sweep",
        }
    }
}

impl fmt::Display for SweepStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a configuration tag does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} value '{raw}'; expected one of: {expected:?}")]
pub struct TagParseError {
    kind: &'static str,
    raw: String,
    expected: &'static [&'static str],
}

impl TagParseError {
    fn new(kind: &'static str, raw: &str, expected: &'static [&'static str]) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
            expected,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            _ => Err(TagParseError::new("backend", s, &["ollama", "openai"])),
        }
    }
}

impl FromStr for SweepStrategy {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whole-chunk" => Ok(Self::WholeChunk),
            "rule-sweep" => Ok(Self::RuleSweep),
            _ => Err(TagParseError::new(
                "strategy",
                s,
                &["whole-chunk", "rule-sweep"],
            )),
        }
    }
}

/// Model tuning knobs sent with every provider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Model name; empty means the provider default.
    pub name: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub seed: i64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            name: String::new(),
            max_tokens: 4096,
            temperature: f64::MIN_POSITIVE,
            seed: 42,
        }
    }
}

impl ModelParams {
    /// Model name to send, falling back to the provider default.
    #[must_use]
    pub fn model_for(&self, provider: ProviderKind) -> &str {
        if self.name.is_empty() {
            provider.default_model()
        } else {
            &self.name
        }
    }
}
