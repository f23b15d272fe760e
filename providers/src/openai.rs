//! OpenAI Chat Completions client.
//!
//! Talks to `POST {base}/v1/chat/completions` with bearer auth. The base
//! URL is injectable so tests can point the client at a local mock.

use serde::Deserialize;
use serde_json::json;

use crate::{BackendError, ChatRequest, http_client, read_capped_error_body};

#[derive(Debug, Clone)]
pub(crate) struct Client {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl Client {
    /// Build a client from the environment; fails fast when the API key is
    /// missing so `start()` reports auth problems before the first sweep.
    pub(crate) fn from_env(base_url: String) -> Result<Self, BackendError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(BackendError::MissingApiKey)?;
        Ok(Self {
            http: http_client().clone(),
            api_key,
            base_url,
        })
    }

    pub(crate) async fn chat(&self, request: &ChatRequest<'_>) -> Result<String, BackendError> {
        let body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "seed": request.seed,
        });

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            return Err(BackendError::Api { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(BackendError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_request<'a>(system: &'a str, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            system,
            user,
            model: "gpt-4-1106-preview",
            max_tokens: 4096,
            temperature: 0.0,
            seed: 42,
        }
    }

    fn make_client(base_url: String) -> Client {
        Client {
            http: reqwest::Client::new(),
            api_key: "test-key".to_string(),
            base_url,
        }
    }

    #[tokio::test]
    async fn chat_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4-1106-preview",
                "seed": 42,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "looks fine" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(server.uri());
        let reply = client
            .chat(&make_request("you are a reviewer", "Line 1: int x;"))
            .await
            .unwrap();
        assert_eq!(reply, "looks fine");
    }

    #[tokio::test]
    async fn chat_surfaces_api_error_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = make_client(server.uri());
        let err = client
            .chat(&make_request("sys", "user"))
            .await
            .unwrap_err();
        match err {
            BackendError::Api { status, body } => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_rejects_empty_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "role": "assistant", "content": "" } } ]
            })))
            .mount(&server)
            .await;

        let client = make_client(server.uri());
        let err = client.chat(&make_request("sys", "user")).await.unwrap_err();
        assert!(matches!(err, BackendError::EmptyResponse));
    }
}
