//! Llama 3.2 Vision backend (local generation).
//!
//! The native chat protocol takes one image per turn, so only the first
//! image is consumed; the dispatcher discards the rest before resolution.

use async_trait::async_trait;
use std::sync::Arc;

use super::adapter::{Backend, RespondRequest, VisionBackend};
use super::local::run_generation;
use crate::config::LlamaConfig;
use crate::error::{BackendError, BackendResult};
use crate::provider::{GenerationOptions, HandleCache, PromptPart};

pub struct LlamaVisionBackend {
    config: LlamaConfig,
    cache: Arc<HandleCache>,
}

impl LlamaVisionBackend {
    pub fn new(config: LlamaConfig, cache: Arc<HandleCache>) -> Self {
        Self { config, cache }
    }
}

#[async_trait]
impl VisionBackend for LlamaVisionBackend {
    fn name(&self) -> &'static str {
        "Llama-Vision"
    }

    // Single-image protocol.
    fn max_images(&self) -> Option<usize> {
        Some(1)
    }

    async fn respond(&self, request: &RespondRequest) -> BackendResult<String> {
        let image = request.images.first().ok_or(BackendError::NoUsableImages)?;
        let pixels = image.decode().ok_or(BackendError::NoUsableImages)?;

        let parts = vec![
            PromptPart::Image {
                pixels,
                resized: None,
            },
            PromptPart::Text(request.query.clone()),
        ];
        let options = GenerationOptions {
            max_new_tokens: self.config.max_new_tokens,
            ..Default::default()
        };
        let text = run_generation(self.cache.clone(), Backend::LlamaVision, parts, options).await?;
        tracing::info!("Response generated using Llama-Vision model.");
        Ok(text)
    }
}
