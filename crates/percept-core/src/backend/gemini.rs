//! Gemini backend using the generateContent API.
//!
//! Sends the text query first, then one inline base64 data part per image.
//! Images that fail to decode are dropped with a per-image error log; if
//! nothing survives, the adapter degrades without calling the endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::adapter::{RespondRequest, VisionBackend};
use crate::config::{resolve_env_var, GeminiConfig, LimitsConfig};
use crate::error::{BackendError, BackendResult};

pub struct GeminiBackend {
    config: GeminiConfig,
    client: reqwest::Client,
    timeout: Duration,
}

impl GeminiBackend {
    pub fn new(config: &GeminiConfig, limits: &LimitsConfig) -> Self {
        Self {
            config: config.clone(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(limits.request_timeout_secs),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, `None` when absent/empty.
    fn text(self) -> Option<String> {
        let text = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

#[async_trait]
impl VisionBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn respond(&self, request: &RespondRequest) -> BackendResult<String> {
        let api_key = resolve_env_var(&self.config.api_key).ok_or_else(|| {
            let err = BackendError::Api {
                provider: "Gemini",
                message: "Gemini API key not set. Set GOOGLE_API_KEY env var.".to_string(),
                status_code: None,
            };
            tracing::error!("Error in Gemini processing: {err}");
            err
        })?;

        // Text query first, then the images that decode cleanly.
        let mut parts = vec![Part::Text {
            text: request.query.clone(),
        }];
        for image in &request.images {
            if image.decode().is_some() {
                parts.push(Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.media_type().to_string(),
                        data: image.base64(),
                    },
                });
            }
        }
        if parts.len() == 1 {
            // Only text, no images
            return Err(BackendError::NoUsableImages);
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
            api_key
        );
        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let result = self.call(&url, &body).await;
        match result {
            Ok(Some(text)) => {
                tracing::info!("Response generated using Gemini model.");
                Ok(text)
            }
            Ok(None) => Err(BackendError::EmptyResponse { backend: "Gemini" }),
            Err(e) => {
                tracing::error!("Error in Gemini processing: {e}");
                Err(e)
            }
        }
    }
}

impl GeminiBackend {
    async fn call(
        &self,
        url: &str,
        body: &GenerateContentRequest,
    ) -> BackendResult<Option<String>> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| BackendError::Api {
                provider: "Gemini",
                message: format!("request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                provider: "Gemini",
                message: format!("HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let parsed: GenerateContentResponse =
            resp.json().await.map_err(|e| BackendError::Api {
                provider: "Gemini",
                message: format!("failed to parse response: {e}"),
                status_code: None,
            })?;

        Ok(parsed.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SizingHints;
    use crate::resolver::ResolvedImage;

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

    #[test]
    fn test_request_wire_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: "what is this?".to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".to_string(),
                            data: "abc".to_string(),
                        },
                    },
                ],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "what is this?");
        assert_eq!(
            json["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "image/png"
        );
    }

    #[test]
    fn test_response_text_extraction() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"a "},{"text":"cat"}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text().as_deref(), Some("a cat"));
    }

    #[test]
    fn test_response_empty_candidates() {
        let resp: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(resp.text().is_none());

        let resp: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(resp.text().is_none());
    }

    #[test]
    fn test_response_whitespace_only_text_is_empty() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(resp.text().is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_at_call_time() {
        let config = GeminiConfig {
            api_key: "${PERCEPT_TEST_UNSET_GEMINI_KEY}".to_string(),
            ..Default::default()
        };
        let backend = GeminiBackend::new(&config, &LimitsConfig::default());
        let request = RespondRequest {
            query: "q".to_string(),
            images: vec![png_image("a.png")],
            hints: SizingHints::default(),
        };
        assert!(matches!(
            backend.respond(&request).await.unwrap_err(),
            BackendError::Api {
                provider: "Gemini",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_images_degrade_without_network() {
        let config = GeminiConfig {
            api_key: "test-key".to_string(),
            endpoint: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let backend = GeminiBackend::new(&config, &LimitsConfig::default());
        let request = RespondRequest {
            query: "what is this?".to_string(),
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
    }
}
