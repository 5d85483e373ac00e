//! Qwen2-VL backend (local generation).
//!
//! Accepts any number of images per turn and a text-only prompt. The visual
//! tokenizer works on a fixed patch grid, so sizing hints are floored to the
//! configured alignment before they reach the preprocessor.

use async_trait::async_trait;
use std::sync::Arc;

use super::adapter::{Backend, RespondRequest, VisionBackend};
use super::local::run_generation;
use crate::config::QwenConfig;
use crate::error::BackendResult;
use crate::provider::{GenerationOptions, HandleCache, PromptPart};

pub struct QwenBackend {
    config: QwenConfig,
    cache: Arc<HandleCache>,
}

impl QwenBackend {
    pub fn new(config: QwenConfig, cache: Arc<HandleCache>) -> Self {
        Self { config, cache }
    }
}

#[async_trait]
impl VisionBackend for QwenBackend {
    fn name(&self) -> &'static str {
        "Qwen"
    }

    // Qwen tolerates a text-only prompt.
    fn requires_images(&self) -> bool {
        false
    }

    async fn respond(&self, request: &RespondRequest) -> BackendResult<String> {
        let hints = request.hints.aligned_down(self.config.alignment);

        let mut parts = Vec::with_capacity(request.images.len() + 1);
        for image in &request.images {
            if let Some(pixels) = image.decode() {
                parts.push(PromptPart::Image {
                    pixels,
                    resized: Some((hints.height, hints.width)),
                });
            }
        }
        parts.push(PromptPart::Text(request.query.clone()));

        let options = GenerationOptions {
            max_new_tokens: self.config.max_new_tokens,
            ..Default::default()
        };
        let text = run_generation(self.cache.clone(), Backend::Qwen, parts, options).await?;
        tracing::info!("Response generated using Qwen model.");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SizingHints;
    use crate::error::BackendError;
    use crate::provider::tests::FixedModel;
    use crate::provider::{
        Device, HandleLoader, LocalHandle, PreparedInputs, VisionProcessor,
    };
    use crate::resolver::ResolvedImage;
    use std::sync::Mutex;

    /// Processor that records the parts it was asked to render.
    struct RecordingProcessor {
        seen: Arc<Mutex<Vec<Vec<PartShape>>>>,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum PartShape {
        Image { resized: Option<(u32, u32)> },
        Text(String),
    }

    impl VisionProcessor for RecordingProcessor {
        fn render(&self, parts: &[PromptPart]) -> BackendResult<PreparedInputs> {
            let shapes = parts
                .iter()
                .map(|p| match p {
                    PromptPart::Image { resized, .. } => PartShape::Image { resized: *resized },
                    PromptPart::Text(t) => PartShape::Text(t.clone()),
                })
                .collect();
            self.seen.lock().unwrap().push(shapes);
            Ok(PreparedInputs {
                input_ids: vec![1, 2, 3],
                pixel_values: None,
            })
        }

        fn decode(&self, tokens: &[u32], _skip_special_tokens: bool) -> BackendResult<String> {
            Ok(format!("qwen:{}", tokens.len()))
        }
    }

    struct RecordingLoader {
        seen: Arc<Mutex<Vec<Vec<PartShape>>>>,
    }

    impl HandleLoader for RecordingLoader {
        fn load(&self, _backend: Backend) -> BackendResult<LocalHandle> {
            Ok(LocalHandle {
                model: Arc::new(FixedModel { new_tokens: 8 }),
                processor: Arc::new(RecordingProcessor {
                    seen: self.seen.clone(),
                }),
                device: Device::Cpu,
            })
        }
    }

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

    fn backend_with_recorder() -> (QwenBackend, Arc<Mutex<Vec<Vec<PartShape>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let loader = Arc::new(RecordingLoader { seen: seen.clone() });
        let cache = Arc::new(HandleCache::new(loader));
        (QwenBackend::new(QwenConfig::default(), cache), seen)
    }

    #[tokio::test]
    async fn test_images_precede_text_with_aligned_dims() {
        let (backend, seen) = backend_with_recorder();
        let request = RespondRequest {
            query: "compare".to_string(),
            images: vec![png_image("a.png"), png_image("b.png")],
            hints: SizingHints {
                height: 300,
                width: 300,
            },
        };
        backend.respond(&request).await.unwrap();

        let parts = seen.lock().unwrap()[0].clone();
        assert_eq!(
            parts,
            vec![
                PartShape::Image {
                    resized: Some((280, 280))
                },
                PartShape::Image {
                    resized: Some((280, 280))
                },
                PartShape::Text("compare".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_text_only_prompt_is_tolerated() {
        let (backend, seen) = backend_with_recorder();
        let request = RespondRequest {
            query: "just text".to_string(),
            images: vec![],
            hints: SizingHints::default(),
        };
        let text = backend.respond(&request).await.unwrap();
        assert!(text.starts_with("qwen:"));
        assert_eq!(
            seen.lock().unwrap()[0],
            vec![PartShape::Text("just text".to_string())]
        );
    }

    #[tokio::test]
    async fn test_malformed_image_is_skipped() {
        let (backend, seen) = backend_with_recorder();
        let request = RespondRequest {
            query: "q".to_string(),
            images: vec![ResolvedImage {
                identifier: "bad.jpg".to_string(),
                path: "bad.jpg".into(),
                bytes: b"not an image".to_vec(),
            }],
            hints: SizingHints::default(),
        };
        backend.respond(&request).await.unwrap();
        // Malformed image dropped, only the text part remains.
        assert_eq!(
            seen.lock().unwrap()[0],
            vec![PartShape::Text("q".to_string())]
        );
    }

    #[tokio::test]
    async fn test_generation_budget_is_bounded() {
        let (backend, _seen) = backend_with_recorder();
        let request = RespondRequest {
            query: "q".to_string(),
            images: vec![],
            hints: SizingHints::default(),
        };
        // FixedModel appends min(budget, 8) tokens; the qwen budget is 128,
        // so the decoded suffix is the model's own 8.
        let text = backend.respond(&request).await.unwrap();
        assert_eq!(text, "qwen:8");
    }

    #[tokio::test]
    async fn test_loader_failure_propagates_as_error() {
        struct FailingLoader;
        impl HandleLoader for FailingLoader {
            fn load(&self, backend: Backend) -> BackendResult<LocalHandle> {
                Err(BackendError::Handle {
                    backend: backend.as_str(),
                    message: "weights missing".to_string(),
                })
            }
        }
        let cache = Arc::new(HandleCache::new(Arc::new(FailingLoader)));
        let backend = QwenBackend::new(QwenConfig::default(), cache);
        let request = RespondRequest {
            query: "q".to_string(),
            images: vec![],
            hints: SizingHints::default(),
        };
        assert!(matches!(
            backend.respond(&request).await.unwrap_err(),
            BackendError::Handle { .. }
        ));
    }
}
