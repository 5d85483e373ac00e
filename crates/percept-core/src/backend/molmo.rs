//! Molmo backend (local generation).
//!
//! Runs in half precision, consumes only the first image, and stops at the
//! configured end-of-text string. Decoded image buffers are owned by the
//! prompt parts and released on every exit path of the generation task.

use async_trait::async_trait;
use std::sync::Arc;

use super::adapter::{Backend, RespondRequest, VisionBackend};
use super::local::run_generation;
use crate::config::MolmoConfig;
use crate::error::{BackendError, BackendResult};
use crate::provider::{GenerationOptions, HandleCache, PromptPart};

pub struct MolmoBackend {
    config: MolmoConfig,
    cache: Arc<HandleCache>,
}

impl MolmoBackend {
    pub fn new(config: MolmoConfig, cache: Arc<HandleCache>) -> Self {
        Self { config, cache }
    }
}

#[async_trait]
impl VisionBackend for MolmoBackend {
    fn name(&self) -> &'static str {
        "Molmo"
    }

    // Single-image protocol for now.
    fn max_images(&self) -> Option<usize> {
        Some(1)
    }

    async fn respond(&self, request: &RespondRequest) -> BackendResult<String> {
        let mut parts = Vec::with_capacity(2);
        for image in request.images.iter().take(1) {
            if let Some(pixels) = image.decode() {
                parts.push(PromptPart::Image {
                    pixels,
                    resized: None,
                });
            }
        }
        if parts.is_empty() {
            return Err(BackendError::NoUsableImages);
        }
        parts.push(PromptPart::Text(request.query.clone()));

        let options = GenerationOptions {
            max_new_tokens: self.config.max_new_tokens,
            half_precision: true,
            stop: Some(self.config.stop.clone()),
        };
        let text = run_generation(self.cache.clone(), Backend::Molmo, parts, options).await?;
        tracing::info!("Response generated using Molmo model.");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SizingHints;
    use crate::provider::tests::FixedModel;
    use crate::provider::{
        Device, HandleLoader, LocalHandle, PreparedInputs, VisionModel, VisionProcessor,
    };
    use crate::resolver::ResolvedImage;
    use std::sync::Mutex;

    fn png_image(identifier: &str) -> ResolvedImage {
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(1, 1)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        ResolvedImage {
            identifier: identifier.to_string(),
            path: identifier.into(),
            bytes: buf.into_inner(),
        }
    }

    struct PlainProcessor;

    impl VisionProcessor for PlainProcessor {
        fn render(&self, parts: &[PromptPart]) -> BackendResult<PreparedInputs> {
            Ok(PreparedInputs {
                input_ids: vec![0; parts.len()],
                pixel_values: None,
            })
        }

        fn decode(&self, tokens: &[u32], _skip_special_tokens: bool) -> BackendResult<String> {
            Ok(format!("molmo:{}", tokens.len()))
        }
    }

    /// Model that records the options it was invoked with.
    struct OptionRecordingModel {
        seen: Arc<Mutex<Vec<GenerationOptions>>>,
        inner: FixedModel,
    }

    impl VisionModel for OptionRecordingModel {
        fn generate(
            &self,
            inputs: &PreparedInputs,
            device: &Device,
            options: &GenerationOptions,
        ) -> BackendResult<Vec<u32>> {
            self.seen.lock().unwrap().push(options.clone());
            self.inner.generate(inputs, device, options)
        }
    }

    struct OptionRecordingLoader {
        seen: Arc<Mutex<Vec<GenerationOptions>>>,
    }

    impl HandleLoader for OptionRecordingLoader {
        fn load(&self, _backend: Backend) -> BackendResult<LocalHandle> {
            Ok(LocalHandle {
                model: Arc::new(OptionRecordingModel {
                    seen: self.seen.clone(),
                    inner: FixedModel { new_tokens: 2 },
                }),
                processor: Arc::new(PlainProcessor),
                device: Device::Cpu,
            })
        }
    }

    fn backend_with_recorder() -> (MolmoBackend, Arc<Mutex<Vec<GenerationOptions>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let loader = Arc::new(OptionRecordingLoader { seen: seen.clone() });
        let cache = Arc::new(HandleCache::new(loader));
        (MolmoBackend::new(MolmoConfig::default(), cache), seen)
    }

    #[tokio::test]
    async fn test_half_precision_and_stop_string() {
        let (backend, seen) = backend_with_recorder();
        let request = RespondRequest {
            query: "describe".to_string(),
            images: vec![png_image("a.png")],
            hints: SizingHints::default(),
        };
        backend.respond(&request).await.unwrap();

        let options = seen.lock().unwrap()[0].clone();
        assert!(options.half_precision);
        assert_eq!(options.stop.as_deref(), Some("<|endoftext|>"));
        assert_eq!(options.max_new_tokens, 200);
    }

    #[tokio::test]
    async fn test_only_first_image_is_used() {
        let (backend, _seen) = backend_with_recorder();
        let request = RespondRequest {
            query: "q".to_string(),
            images: vec![png_image("a.png"), png_image("b.png")],
            hints: SizingHints::default(),
        };
        // PlainProcessor emits one token per part: 1 image + 1 text = 2.
        // FixedModel appends 2 more; the decoded suffix length is 2.
        let text = backend.respond(&request).await.unwrap();
        assert_eq!(text, "molmo:2");
    }

    #[tokio::test]
    async fn test_no_decodable_images_degrades_before_generation() {
        let (backend, seen) = backend_with_recorder();
        let request = RespondRequest {
            query: "q".to_string(),
            images: vec![ResolvedImage {
                identifier: "bad.jpg".to_string(),
                path: "bad.jpg".into(),
                bytes: b"garbage".to_vec(),
            }],
            hints: SizingHints::default(),
        };
        assert!(matches!(
            backend.respond(&request).await.unwrap_err(),
            BackendError::NoUsableImages
        ));
        // The model was never invoked.
        assert!(seen.lock().unwrap().is_empty());
    }
}
