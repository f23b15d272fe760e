//! The backend adapter: capability surface, sweep strategies, and the
//! single-flight request slot.
//!
//! One [`Backend`] instance owns exactly one outstanding-request slot: a
//! sweep mutex held for the duration of a sweep plus a single stored
//! cancellation handle. Issuing a new request fires the stored handle,
//! aborting any prior in-flight network call on this instance
//! (newest-request-wins, no queueing). Cancellation aborts only the network
//! call; nothing already stored elsewhere is rolled back.

use std::path::PathBuf;
use std::sync::PoisonError;

use tokio::sync::{Mutex, watch};

use lintra_types::{Chunk, DEFAULT_CHUNK_SIZE, ModelParams, ProviderKind, SweepStrategy, chunk_lines};

use crate::{
    BackendError, ChatClient, ChatRequest, OLLAMA_API_URL, OPENAI_API_URL, ollama, openai, rules,
};

const CONNECT_TEST_SNIPPET: &str = "int main() { return 0; }";

/// Capability set of a text-generation backend.
///
/// The extraction engine is generic over this trait so tests can inject
/// stub providers without any network.
#[allow(async_fn_in_trait)]
pub trait AnalysisBackend {
    /// Establish readiness: load the system prompt, initialize the provider
    /// client, optionally run a connectivity self-test.
    async fn start(&mut self) -> Result<(), BackendError>;

    /// Run the configured sweep strategy over the document and return the
    /// concatenated raw provider text.
    ///
    /// `instruction` is attempt-scoped corrective text (empty on the first
    /// attempt); it is prepended to each request's query, never into the
    /// document body itself.
    async fn analyse_document(
        &self,
        uri: &str,
        text: &str,
        instruction: &str,
    ) -> Result<String, BackendError>;

    /// One request pairing `system_prompt` with the code prefix; the
    /// response is split into candidate completions.
    async fn complete_code(
        &self,
        uri: &str,
        prefix: &str,
        system_prompt: &str,
    ) -> Result<Vec<String>, BackendError>;
}

/// Explicit backend configuration, passed into the constructor.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub provider: ProviderKind,
    pub strategy: SweepStrategy,
    pub params: ModelParams,
    /// Path to the static system prompt, read once by `start()`.
    pub system_prompt_path: PathBuf,
    pub connect_test: bool,
    pub chunk_size: usize,
    pub openai_base_url: String,
    pub ollama_base_url: String,
}

impl BackendConfig {
    #[must_use]
    pub fn new(
        provider: ProviderKind,
        strategy: SweepStrategy,
        system_prompt_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            strategy,
            params: ModelParams::default(),
            system_prompt_path: system_prompt_path.into(),
            connect_test: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            openai_base_url: OPENAI_API_URL.to_string(),
            ollama_base_url: OLLAMA_API_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_connect_test(mut self, enabled: bool) -> Self {
        self.connect_test = enabled;
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_ollama_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.ollama_base_url = base_url.into();
        self
    }
}

/// Provider of "analyse" and "complete" operations over chunks and rules.
pub struct Backend {
    config: BackendConfig,
    system_prompt: String,
    client: Option<ChatClient>,
    /// Held for a full sweep, all chunks and rules included.
    sweep: Mutex<()>,
    /// Cancellation handle for the in-flight request, newest-request-wins.
    cancel: std::sync::Mutex<Option<watch::Sender<()>>>,
}

fn chunk_query(uri: &str, instruction: &str, index: usize, chunk: &Chunk) -> String {
    let query = format!(
        "FileName: {uri}\nSource Code (Chunk {}):\n{}",
        index + 1,
        chunk.text
    );
    if instruction.is_empty() {
        query
    } else {
        format!("{instruction}\n{query}")
    }
}

fn split_completions(response: &str) -> Vec<String> {
    response
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

impl Backend {
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            system_prompt: String::new(),
            client: None,
            sweep: Mutex::new(()),
            cancel: std::sync::Mutex::new(None),
        }
    }

    fn client(&self) -> Result<&ChatClient, BackendError> {
        self.client.as_ref().ok_or(BackendError::NotStarted)
    }

    /// Install a fresh cancellation handle, firing the previous one so any
    /// in-flight request on this instance aborts.
    fn claim_request_slot(&self) -> watch::Receiver<()> {
        let (tx, rx) = watch::channel(());
        let previous = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(tx);
        if let Some(previous) = previous {
            let _ = previous.send(());
        }
        rx
    }

    async fn request(
        &self,
        client: &ChatClient,
        cancel: &mut watch::Receiver<()>,
        system: &str,
        user: &str,
    ) -> Result<String, BackendError> {
        let request = ChatRequest {
            system,
            user,
            model: self.config.params.model_for(self.config.provider),
            max_tokens: self.config.params.max_tokens,
            temperature: self.config.params.temperature,
            seed: self.config.params.seed,
        };
        tokio::select! {
            _ = cancel.changed() => {
                tracing::debug!("in-flight request superseded by a newer one");
                Err(BackendError::Cancelled)
            }
            result = client.chat(&request) => result,
        }
    }
}

impl AnalysisBackend for Backend {
    async fn start(&mut self) -> Result<(), BackendError> {
        let path = &self.config.system_prompt_path;
        self.system_prompt =
            std::fs::read_to_string(path).map_err(|source| BackendError::Prompt {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            provider = %self.config.provider,
            strategy = %self.config.strategy,
            prompt = %path.display(),
            "backend starting"
        );

        let client = match self.config.provider {
            ProviderKind::OpenAi => {
                ChatClient::OpenAi(openai::Client::from_env(self.config.openai_base_url.clone())?)
            }
            ProviderKind::Ollama => {
                ChatClient::Ollama(ollama::Client::new(self.config.ollama_base_url.clone()))
            }
        };

        if self.config.connect_test {
            let request = ChatRequest {
                system: &self.system_prompt,
                user: CONNECT_TEST_SNIPPET,
                model: self.config.params.model_for(self.config.provider),
                max_tokens: self.config.params.max_tokens,
                temperature: self.config.params.temperature,
                seed: self.config.params.seed,
            };
            let response = client.chat(&request).await?;
            tracing::debug!(bytes = response.len(), "connectivity self-test passed");
        }

        self.client = Some(client);
        Ok(())
    }

    async fn analyse_document(
        &self,
        uri: &str,
        text: &str,
        instruction: &str,
    ) -> Result<String, BackendError> {
        let client = self.client()?;
        let mut cancel = self.claim_request_slot();
        let _sweep = self.sweep.lock().await;

        let chunks = chunk_lines(text, self.config.chunk_size);
        tracing::debug!(
            uri,
            chunks = chunks.len(),
            strategy = %self.config.strategy,
            "starting analysis sweep"
        );

        let mut raw = String::new();
        match self.config.strategy {
            SweepStrategy::WholeChunk => {
                for (index, chunk) in chunks.iter().enumerate() {
                    let query = chunk_query(uri, instruction, index, chunk);
                    let response = self
                        .request(client, &mut cancel, &self.system_prompt, &query)
                        .await?;
                    tracing::trace!(uri, chunk = index + 1, bytes = response.len(), "chunk response");
                    raw.push_str(&response);
                    raw.push('\n');
                }
            }
            SweepStrategy::RuleSweep => {
                for rule in rules::CODING_RULES {
                    let system = format!("{}\nRule: {rule}", self.system_prompt);
                    for (index, chunk) in chunks.iter().enumerate() {
                        let query = chunk_query(uri, instruction, index, chunk);
                        let response =
                            self.request(client, &mut cancel, &system, &query).await?;
                        raw.push_str(&response);
                        raw.push('\n');
                    }
                }
            }
        }

        Ok(raw)
    }

    async fn complete_code(
        &self,
        uri: &str,
        prefix: &str,
        system_prompt: &str,
    ) -> Result<Vec<String>, BackendError> {
        let client = self.client()?;
        let mut cancel = self.claim_request_slot();
        let _sweep = self.sweep.lock().await;

        tracing::debug!(uri, prefix_bytes = prefix.len(), "completion request");
        let query =
            format!("Complete the code following this prefix:\n{prefix}<PROVIDE_SUGGESTION_HERE>");
        let response = self
            .request(client, &mut cancel, system_prompt, &query)
            .await?;
        Ok(split_completions(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prompt_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    async fn started_backend(server: &MockServer, chunk_size: usize) -> (Backend, tempfile::NamedTempFile) {
        let prompt = prompt_file("you are a MISRA reviewer");
        let config = BackendConfig::new(
            ProviderKind::Ollama,
            SweepStrategy::WholeChunk,
            prompt.path(),
        )
        .with_chunk_size(chunk_size)
        .with_ollama_base_url(server.uri());
        let mut backend = Backend::new(config);
        backend.start().await.unwrap();
        (backend, prompt)
    }

    fn ollama_reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": { "role": "assistant", "content": content }
        }))
    }

    #[test]
    fn test_chunk_query_layout() {
        let chunk = Chunk {
            first_line: 1,
            last_line: 1,
            text: "Line 1: int x;\n".to_string(),
        };
        assert_eq!(
            chunk_query("file:///a.c", "", 0, &chunk),
            "FileName: file:///a.c\nSource Code (Chunk 1):\nLine 1: int x;\n"
        );
    }

    #[test]
    fn test_chunk_query_prepends_instruction() {
        let chunk = Chunk {
            first_line: 31,
            last_line: 31,
            text: "Line 31: int y;\n".to_string(),
        };
        let query = chunk_query("file:///a.c", "Answer ONLY with a JSON array.", 1, &chunk);
        assert!(query.starts_with("Answer ONLY with a JSON array.\n"));
        assert!(query.contains("Source Code (Chunk 2):"));
    }

    #[test]
    fn test_split_completions_drops_blank_lines() {
        assert_eq!(
            split_completions("foo();\n\n  \nbar();\n"),
            vec!["foo();".to_string(), "bar();".to_string()]
        );
        assert!(split_completions("\n\n").is_empty());
    }

    #[tokio::test]
    async fn analyse_before_start_is_rejected() {
        let config = BackendConfig::new(
            ProviderKind::Ollama,
            SweepStrategy::WholeChunk,
            "/nonexistent/prompt.txt",
        );
        let backend = Backend::new(config);
        let err = backend
            .analyse_document("file:///a.c", "int x;", "")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotStarted));
    }

    #[tokio::test]
    async fn start_reports_missing_prompt_file() {
        let config = BackendConfig::new(
            ProviderKind::Ollama,
            SweepStrategy::WholeChunk,
            "/nonexistent/prompt.txt",
        );
        let mut backend = Backend::new(config);
        let err = backend.start().await.unwrap_err();
        assert!(matches!(err, BackendError::Prompt { .. }));
    }

    #[tokio::test]
    async fn whole_chunk_sweep_concatenates_in_chunk_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ollama_reply("no findings"))
            .expect(2)
            .mount(&server)
            .await;

        // Two lines at chunk size 1 -> two requests
        let (backend, _prompt) = started_backend(&server, 1).await;
        let raw = backend
            .analyse_document("file:///a.c", "int x;\nint y;", "")
            .await
            .unwrap();
        assert_eq!(raw, "no findings\nno findings\n");
    }

    #[tokio::test]
    async fn complete_code_splits_response_lines() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ollama_reply("return 0;\n}\n"))
            .expect(1)
            .mount(&server)
            .await;

        let (backend, _prompt) = started_backend(&server, 30).await;
        let completions = backend
            .complete_code("file:///a.c", "int main() {\n", "complete the code")
            .await
            .unwrap();
        assert_eq!(completions, vec!["return 0;".to_string(), "}".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn newer_request_cancels_in_flight_sweep() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ollama_reply("slow answer").set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let (backend, _prompt) = started_backend(&server, 30).await;
        let backend = Arc::new(backend);

        let first = {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move {
                backend
                    .analyse_document("file:///a.c", "int x;", "")
                    .await
            })
        };
        // Let the first sweep get its request in flight
        tokio::time::sleep(Duration::from_millis(100)).await;

        let second = backend.analyse_document("file:///a.c", "int y;", "").await;
        assert!(second.is_ok());

        let first = first.await.unwrap();
        assert!(matches!(first, Err(BackendError::Cancelled)));
    }
}
