//! Image resolution against the static asset root.
//!
//! Identifiers arrive as relative paths. Resolution joins them against the
//! configured asset root and reports absence instead of failing: a missing or
//! unreadable file is logged and skipped so the rest of the batch proceeds.

use base64::Engine;
use image::DynamicImage;
use std::path::{Path, PathBuf};

use crate::config::LimitsConfig;

/// Resolves relative image identifiers to loadable image resources.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    root: PathBuf,
    max_bytes: u64,
}

/// A resolved image: identifier, absolute path, and raw bytes.
///
/// Created per request and dropped when the adapter call returns. Pixel
/// decoding is deferred so adapters that only need a data URL never pay for
/// it.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// The identifier the caller supplied
    pub identifier: String,
    /// Absolute path under the asset root
    pub path: PathBuf,
    /// Raw file bytes
    pub bytes: Vec<u8>,
}

impl ImageResolver {
    /// Create a resolver rooted at the given static asset directory.
    pub fn new(root: impl Into<PathBuf>, limits: &LimitsConfig) -> Self {
        Self {
            root: root.into(),
            max_bytes: limits.max_image_size_mb * 1024 * 1024,
        }
    }

    /// Resolve an identifier to its bytes.
    ///
    /// Missing files yield `None` with a warning; unreadable or oversized
    /// files yield `None` with an error. Never panics, never aborts a batch.
    pub async fn resolve(&self, identifier: &str) -> Option<ResolvedImage> {
        let path = self.root.join(identifier);

        if !path.exists() {
            tracing::warn!("Image file not found: {}", path.display());
            return None;
        }

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.len() > self.max_bytes => {
                tracing::error!(
                    "Image {} exceeds size limit ({} > {} bytes)",
                    path.display(),
                    meta.len(),
                    self.max_bytes
                );
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Cannot stat image {}: {e}", path.display());
                return None;
            }
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(ResolvedImage {
                identifier: identifier.to_string(),
                path,
                bytes,
            }),
            Err(e) => {
                tracing::error!("Failed to read image {}: {e}", path.display());
                None
            }
        }
    }

    /// The asset root this resolver joins identifiers against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResolvedImage {
    /// MIME type sniffed from the file content, falling back to the
    /// extension, defaulting to JPEG for anything unrecognized.
    pub fn media_type(&self) -> &'static str {
        let format = image::guess_format(&self.bytes)
            .ok()
            .or_else(|| image::ImageFormat::from_path(&self.path).ok());
        match format {
            Some(image::ImageFormat::Png) => "image/png",
            Some(image::ImageFormat::WebP) => "image/webp",
            Some(image::ImageFormat::Gif) => "image/gif",
            _ => "image/jpeg",
        }
    }

    /// Base64 data URI for APIs that accept only URL/string image parts.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// Raw bytes as plain base64 (no URI prefix).
    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Decode to a pixel buffer.
    ///
    /// Malformed bytes are logged per image and yield absence, matching the
    /// resolver's not-found semantics.
    pub fn decode(&self) -> Option<DynamicImage> {
        match image::load_from_memory(&self.bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::error!("Error decoding image {}: {e}", self.path.display());
                None
            }
        }
    }
}
