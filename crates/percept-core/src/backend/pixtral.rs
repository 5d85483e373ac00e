//! Pixtral backend (OpenAI-compatible serving endpoint).
//!
//! Pixtral runs behind a locally served Chat Completions endpoint, so this
//! reuses the GPT-4 wire types with the engine's sampling configuration and
//! no authentication. The native protocol takes one image per turn.

use async_trait::async_trait;
use std::time::Duration;

use super::adapter::{RespondRequest, VisionBackend};
use super::openai::{post_chat, ChatContent, ChatMessage, ChatRequest, ImageUrl};
use crate::config::{LimitsConfig, PixtralConfig};
use crate::error::{BackendError, BackendResult};

pub struct PixtralBackend {
    config: PixtralConfig,
    client: reqwest::Client,
    timeout: Duration,
}

impl PixtralBackend {
    pub fn new(config: &PixtralConfig, limits: &LimitsConfig) -> Self {
        Self {
            config: config.clone(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(limits.request_timeout_secs),
        }
    }
}

#[async_trait]
impl VisionBackend for PixtralBackend {
    fn name(&self) -> &'static str {
        "Pixtral"
    }

    // Single-image protocol.
    fn max_images(&self) -> Option<usize> {
        Some(1)
    }

    async fn respond(&self, request: &RespondRequest) -> BackendResult<String> {
        let image = request.images.first().ok_or(BackendError::NoUsableImages)?;

        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ChatContent::Text {
                        text: request.query.clone(),
                    },
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ],
            }],
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
        };

        let text = post_chat(
            &self.client,
            "Pixtral",
            &self.config.endpoint,
            None,
            &body,
            self.timeout,
        )
        .await
        .inspect_err(|e| tracing::error!("Error in Pixtral processing: {e}"))?;

        match text {
            Some(text) => {
                tracing::info!("Response generated using Pixtral model.");
                Ok(text)
            }
            None => Err(BackendError::EmptyResponse { backend: "Pixtral" }),
        }
    }
}
