//! GPT-4o backend using the Chat Completions API.
//!
//! Sends images as data URLs in the user message content array. The API key
//! is resolved from the environment at call time; absence surfaces as a
//! normal adapter failure rather than a pre-validated configuration error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::adapter::{RespondRequest, VisionBackend};
use crate::config::{resolve_env_var, Gpt4Config, LimitsConfig};
use crate::error::{BackendError, BackendResult};

pub struct Gpt4Backend {
    config: Gpt4Config,
    client: reqwest::Client,
    timeout: Duration,
}

impl Gpt4Backend {
    pub fn new(config: &Gpt4Config, limits: &LimitsConfig) -> Self {
        Self {
            config: config.clone(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(limits.request_timeout_secs),
        }
    }
}

// --- Wire types (shared with the Pixtral adapter) ---

#[derive(Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
pub(crate) enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
pub(crate) struct ImageUrl {
    pub url: String,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Deserialize)]
pub(crate) struct ChoiceMessage {
    pub content: Option<String>,
}

/// POST a Chat Completions request and extract the first choice's text.
///
/// Failures are tagged with the provider name so the adapter-local log entry
/// says which step failed, even though the dispatcher flattens the text.
pub(crate) async fn post_chat(
    client: &reqwest::Client,
    provider: &'static str,
    endpoint: &str,
    api_key: Option<&str>,
    body: &ChatRequest,
    timeout: Duration,
) -> BackendResult<Option<String>> {
    let mut request = client.post(endpoint).json(body).timeout(timeout);
    if let Some(key) = api_key {
        request = request.header("Authorization", format!("Bearer {key}"));
    }

    let resp = request.send().await.map_err(|e| BackendError::Api {
        provider,
        message: format!("request failed: {e}"),
        status_code: None,
    })?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(BackendError::Api {
            provider,
            message: format!("HTTP {status}: {text}"),
            status_code: Some(status.as_u16()),
        });
    }

    let chat_resp: ChatResponse = resp.json().await.map_err(|e| BackendError::Api {
        provider,
        message: format!("failed to parse response: {e}"),
        status_code: None,
    })?;

    Ok(chat_resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

#[async_trait]
impl VisionBackend for Gpt4Backend {
    fn name(&self) -> &'static str {
        "GPT-4"
    }

    async fn respond(&self, request: &RespondRequest) -> BackendResult<String> {
        let api_key = resolve_env_var(&self.config.api_key).ok_or_else(|| {
            let err = BackendError::Api {
                provider: "GPT-4",
                message: "OpenAI API key not set. Set OPENAI_API_KEY env var.".to_string(),
                status_code: None,
            };
            tracing::error!("Error in GPT-4 processing: {err}");
            err
        })?;

        let mut content = vec![ChatContent::Text {
            text: request.query.clone(),
        }];
        for image in &request.images {
            content.push(ChatContent::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            });
        }
        if content.len() == 1 {
            // Only text, no images
            return Err(BackendError::NoUsableImages);
        }

        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            max_tokens: self.config.max_tokens,
            temperature: None,
        };

        let text = post_chat(
            &self.client,
            "GPT-4",
            &self.config.endpoint,
            Some(&api_key),
            &body,
            self.timeout,
        )
        .await
        .inspect_err(|e| tracing::error!("Error in GPT-4 processing: {e}"))?;

        match text {
            Some(text) => {
                tracing::info!("Response generated using GPT-4 model.");
                Ok(text)
            }
            None => Err(BackendError::EmptyResponse { backend: "GPT-4" }),
        }
    }
}
