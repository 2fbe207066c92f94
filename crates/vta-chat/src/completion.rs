//! Client for an OpenAI-compatible `chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use vta_core::config::CompletionConfig;
use vta_core::Message;

use crate::error::ChatError;

/// Turns a message list into the assistant's reply.
///
/// Implementations are stateless: each call is independent and the caller
/// owns the conversation history.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, ChatError>;
}

/// `CompletionClient` backed by HTTP.
///
/// The model and token limit come from configuration and are sent with
/// every request.
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl HttpCompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, ChatError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ChatError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            messages = messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| ChatError::Transport(format!("completion request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Protocol(format!(
                "HTTP error! status: {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| ChatError::Transport(format!("failed to read response: {err}")))?;

        parse_reply(&body)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Extract `choices[0].message.content` from a response body.
fn parse_reply(body: &[u8]) -> Result<String, ChatError> {
    let parsed: CompletionResponse = serde_json::from_slice(body)
        .map_err(|err| ChatError::Protocol(format!("malformed completion response: {err}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            ChatError::Protocol("response has no choices[0].message.content".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply_first_choice() {
        let body = br#"{
            "id": "cmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Office hours are Tuesday."}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        }"#;
        assert_eq!(parse_reply(body).unwrap(), "Office hours are Tuesday.");
    }

    #[test]
    fn test_parse_reply_empty_content_is_ok() {
        let body = br#"{"choices": [{"message": {"role": "assistant", "content": ""}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "");
    }

    #[test]
    fn test_parse_reply_no_choices() {
        let err = parse_reply(br#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, ChatError::Protocol(_)));
    }

    #[test]
    fn test_parse_reply_missing_choices_field() {
        let err = parse_reply(br#"{"object": "error"}"#).unwrap_err();
        assert!(matches!(err, ChatError::Protocol(_)));
    }

    #[test]
    fn test_parse_reply_null_content() {
        let body = br#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert!(matches!(parse_reply(body), Err(ChatError::Protocol(_))));
    }

    #[test]
    fn test_parse_reply_not_json() {
        let err = parse_reply(b"<html>Bad Gateway</html>").unwrap_err();
        assert!(err.to_string().contains("malformed completion response"));
    }

    #[test]
    fn test_request_wire_shape() {
        let messages = vec![Message::system(""), Message::user("hi")];
        let request = CompletionRequest {
            model: "meta/llama-3.1-8b-instruct",
            messages: &messages,
            max_tokens: 1024,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "meta/llama-3.1-8b-instruct",
                "messages": [
                    {"role": "system", "content": ""},
                    {"role": "user", "content": "hi"}
                ],
                "max_tokens": 1024
            })
        );
    }

    #[test]
    fn test_client_takes_settings_from_config() {
        let config = CompletionConfig {
            endpoint: "http://127.0.0.1:8000/v1/chat/completions".to_string(),
            timeout_secs: Some(5),
            ..CompletionConfig::default()
        };
        let client = HttpCompletionClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), config.endpoint);
        assert_eq!(client.model, "meta/llama-3.1-8b-instruct");
        assert_eq!(client.max_tokens, 1024);
    }
}
