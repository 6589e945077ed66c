//! OpenAI-compatible chat-completion client.
//!
//! Works against any `/chat/completions` endpoint, including the one Ollama
//! exposes under `/v1`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::Turn;
use crate::llm::error::{LlmError, LlmResult};
use crate::llm::{ChatModel, ModelFuture, ModelReply, NO_RESPONSE};

/// Default OpenAI-compatible endpoint (local Ollama).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434/v1";
/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama3.1:8b";
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default completion token limit.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Connect timeout for the model endpoint.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection and sampling settings for the model endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmConfig {
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Async client for OpenAI-compatible chat completions.
pub struct OpenAiChatClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiChatClient {
    /// Build a client for the given endpoint settings.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn post_completion(&self, messages: &[Turn]) -> LlmResult<ModelReply> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            "Sending chat completion"
        );
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        reply_from_completion(completion)
    }
}

fn reply_from_completion(completion: ChatCompletionResponse) -> LlmResult<ModelReply> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;
    let message = choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| NO_RESPONSE.to_string());
    Ok(ModelReply::text(message))
}

impl ChatModel for OpenAiChatClient {
    fn complete<'a>(&'a self, messages: &'a [Turn]) -> ModelFuture<'a, LlmResult<ModelReply>> {
        Box::pin(self.post_completion(messages))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> LlmResult<ModelReply> {
        reply_from_completion(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_request_body_shape() {
        let messages = [Turn::system("be brief"), Turn::user("hi")];
        let body = ChatCompletionRequest {
            model: "m",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 64,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 64);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_first_choice_is_returned() {
        let reply = parse(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}},
                           {"message":{"role":"assistant","content":"Other"}}]}"#,
        )
        .unwrap();
        assert_eq!(reply, ModelReply::text("Hello"));
    }

    #[test]
    fn test_missing_content_falls_back() {
        let reply = parse(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
            .unwrap();
        assert_eq!(reply.message, NO_RESPONSE);
    }

    #[test]
    fn test_no_choices_is_an_error() {
        assert!(matches!(
            parse(r#"{"choices":[]}"#),
            Err(LlmError::EmptyResponse)
        ));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = OpenAiChatClient::new(LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(client.model_name(), DEFAULT_MODEL);
    }
}
