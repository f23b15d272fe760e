//! Backend adapter over a text-generation service.
//!
//! # Architecture
//!
//! The crate is organized around a provider dispatch pattern:
//!
//! - [`Backend`] - the adapter owning the sweep strategies and the
//!   single-flight request slot
//! - [`openai`] - OpenAI Chat Completions client
//! - [`ollama`] - Ollama local daemon client
//!
//! The provider and sweep strategy are tagged variants fixed at
//! construction via [`BackendConfig`]; nothing branches on configuration
//! strings after that point.
//!
//! # Error Handling
//!
//! Provider errors (connectivity, auth, malformed request) propagate
//! unmodified as [`BackendError`]. This layer performs no retry: bounded
//! retry on unparseable output belongs to the extraction engine, and
//! transport-level retry is deliberately absent so a sweep fails fast.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use thiserror::Error;

mod backend;
pub mod rules;

pub(crate) mod ollama;
pub(crate) mod openai;

pub use backend::{AnalysisBackend, Backend, BackendConfig};

/// Canonical OpenAI API base URL.
pub const OPENAI_API_URL: &str = "https://api.openai.com";
/// Default Ollama daemon base URL.
pub const OLLAMA_API_URL: &str = "http://localhost:11434";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Errors from the provider layer, fatal to the current attempt but never
/// to the process.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("OPENAI_API_KEY not set")]
    MissingApiKey,
    #[error("failed to read prompt file {path}")]
    Prompt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("provider request failed")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("provider returned an empty completion")]
    EmptyResponse,
    #[error("request superseded by a newer request")]
    Cancelled,
    #[error("backend used before start()")]
    NotStarted,
}

/// One chat exchange: a system prompt (or prompt + rule) paired with the
/// query text, plus the model tuning knobs sent on every request.
#[derive(Debug)]
pub(crate) struct ChatRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f64,
    pub seed: i64,
}

/// Enum-dispatched chat client, fixed at backend construction.
#[derive(Debug, Clone)]
pub(crate) enum ChatClient {
    OpenAi(openai::Client),
    Ollama(ollama::Client),
}

impl ChatClient {
    pub(crate) async fn chat(&self, request: &ChatRequest<'_>) -> Result<String, BackendError> {
        match self {
            Self::OpenAi(client) => client.chat(request).await,
            Self::Ollama(client) => client.chat(request).await,
        }
    }
}

/// Shared hardened HTTP client: bounded connect timeout, no redirects.
pub(crate) fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default()
    })
}

/// Read an error response body, capped so a misbehaving provider cannot
/// balloon log output.
pub(crate) async fn read_capped_error_body(response: reqwest::Response) -> String {
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY_BYTES {
        let mut end = MAX_ERROR_BODY_BYTES;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...(truncated)");
    }
    body
}
