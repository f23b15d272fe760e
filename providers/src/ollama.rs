//! Ollama local daemon client.
//!
//! Talks to `POST {base}/api/chat` in non-streaming mode. No auth: the
//! daemon is assumed local. Model tuning goes through the `options` map.

use serde::Deserialize;
use serde_json::json;

use crate::{BackendError, ChatRequest, http_client, read_capped_error_body};

#[derive(Debug, Clone)]
pub(crate) struct Client {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl Client {
    pub(crate) fn new(base_url: String) -> Self {
        Self {
            http: http_client().clone(),
            base_url,
        }
    }

    pub(crate) async fn chat(&self, request: &ChatRequest<'_>) -> Result<String, BackendError> {
        let body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "stream": false,
            "options": {
                "num_predict": request.max_tokens,
                "temperature": request.temperature,
                "seed": request.seed,
            },
        });

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            return Err(BackendError::Api { status, body });
        }

        let completion: ChatResponse = response.json().await?;
        if completion.message.content.is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(completion.message.content)
    }
}
