//! Backend identifiers, the adapter trait, and the registry.
//!
//! The registry maps each member of the closed backend set to its adapter, so
//! adding a backend means registering one more `VisionBackend` rather than
//! growing a dispatch chain.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;
use crate::error::BackendResult;
use crate::provider::HandleCache;
use crate::resolver::ResolvedImage;

/// The closed set of selectable backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Qwen,
    Gemini,
    Gpt4,
    LlamaVision,
    Pixtral,
    Molmo,
}

impl Backend {
    /// All backends, in presentation order.
    pub const ALL: [Backend; 6] = [
        Backend::Qwen,
        Backend::Gemini,
        Backend::Gpt4,
        Backend::LlamaVision,
        Backend::Pixtral,
        Backend::Molmo,
    ];

    /// The configuration key for this backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Qwen => "qwen",
            Backend::Gemini => "gemini",
            Backend::Gpt4 => "gpt4",
            Backend::LlamaVision => "llama-vision",
            Backend::Pixtral => "pixtral",
            Backend::Molmo => "molmo",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown backend key. The dispatcher converts this to the fixed
/// invalid-backend sentinel; it never crosses the public boundary.
#[derive(Debug, Clone)]
pub struct UnknownBackend(pub String);

impl fmt::Display for UnknownBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown backend '{}'", self.0)
    }
}

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qwen" => Ok(Backend::Qwen),
            "gemini" => Ok(Backend::Gemini),
            "gpt4" => Ok(Backend::Gpt4),
            "llama-vision" => Ok(Backend::LlamaVision),
            "pixtral" => Ok(Backend::Pixtral),
            "molmo" => Ok(Backend::Molmo),
            other => Err(UnknownBackend(other.to_string())),
        }
    }
}

/// Target dimensions for the visual tokenizer, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingHints {
    pub height: u32,
    pub width: u32,
}

impl Default for SizingHints {
    fn default() -> Self {
        Self {
            height: 280,
            width: 280,
        }
    }
}

impl SizingHints {
    /// Floor both dimensions to the nearest multiple of `alignment`,
    /// but never below one alignment unit.
    pub fn aligned_down(self, alignment: u32) -> Self {
        let floor = |v: u32| {
            if v < alignment {
                tracing::warn!(
                    "Sizing hint {v}px is below the {alignment}px alignment; using {alignment}px"
                );
            }
            ((v / alignment) * alignment).max(alignment)
        };
        Self {
            height: floor(self.height),
            width: floor(self.width),
        }
    }
}

/// The normalized request handed to an adapter.
///
/// Images arrive already resolved (existence checked, bytes read) and
/// truncated to the adapter's image limit; adapters still decide how to
/// encode or decode them.
#[derive(Debug, Clone)]
pub struct RespondRequest {
    /// Non-empty text query
    pub query: String,
    /// Resolved images, in request order
    pub images: Vec<ResolvedImage>,
    /// Backend-specific sizing hints
    pub hints: SizingHints,
}

/// Trait that all backend adapters implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the registry needs `Box<dyn VisionBackend>` for dynamic dispatch).
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Human-readable backend name used in sentinel texts and logs.
    fn name(&self) -> &'static str;

    /// Images the native protocol accepts per turn, if bounded.
    fn max_images(&self) -> Option<usize> {
        None
    }

    /// Whether an empty resolved-image set should degrade to the no-images
    /// sentinel instead of invoking the backend.
    fn requires_images(&self) -> bool {
        true
    }

    /// Produce a text answer for the request.
    async fn respond(&self, request: &RespondRequest) -> BackendResult<String>;
}

/// Registry mapping backend identifier to adapter.
pub struct BackendRegistry {
    adapters: HashMap<Backend, Box<dyn VisionBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Create a registry with all six production adapters.
    ///
    /// Remote adapters are built from config; local adapters share the
    /// handle cache.
    pub fn with_defaults(config: &Config, cache: Arc<HandleCache>) -> Self {
        let mut registry = Self::new();
        registry.register(
            Backend::Qwen,
            Box::new(qwen_adapter(config, cache.clone())),
        );
        registry.register(
            Backend::LlamaVision,
            Box::new(llama_adapter(config, cache.clone())),
        );
        registry.register(Backend::Molmo, Box::new(molmo_adapter(config, cache)));
        registry.register(
            Backend::Gemini,
            Box::new(super::gemini::GeminiBackend::new(
                &config.backends.gemini,
                &config.limits,
            )),
        );
        registry.register(
            Backend::Gpt4,
            Box::new(super::openai::Gpt4Backend::new(
                &config.backends.gpt4,
                &config.limits,
            )),
        );
        registry.register(
            Backend::Pixtral,
            Box::new(super::pixtral::PixtralBackend::new(
                &config.backends.pixtral,
                &config.limits,
            )),
        );
        registry
    }

    /// Register (or replace) the adapter for a backend.
    pub fn register(&mut self, backend: Backend, adapter: Box<dyn VisionBackend>) {
        self.adapters.insert(backend, adapter);
    }

    /// Look up the adapter for a backend.
    pub fn get(&self, backend: Backend) -> Option<&dyn VisionBackend> {
        self.adapters.get(&backend).map(Box::as_ref)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn qwen_adapter(config: &Config, cache: Arc<HandleCache>) -> super::qwen::QwenBackend {
    super::qwen::QwenBackend::new(config.backends.qwen.clone(), cache)
}

fn llama_adapter(config: &Config, cache: Arc<HandleCache>) -> super::llama::LlamaVisionBackend {
    super::llama::LlamaVisionBackend::new(config.backends.llama.clone(), cache)
}

fn molmo_adapter(config: &Config, cache: Arc<HandleCache>) -> super::molmo::MolmoBackend {
    super::molmo::MolmoBackend::new(config.backends.molmo.clone(), cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_round_trip() {
        for backend in Backend::ALL {
            assert_eq!(backend.as_str().parse::<Backend>().unwrap(), backend);
        }
    }

    #[test]
    fn test_unknown_backend_key() {
        let err = "mystery".parse::<Backend>().unwrap_err();
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn test_aligned_down_multiple_stays() {
        let hints = SizingHints {
            height: 280,
            width: 280,
        };
        assert_eq!(
            hints.aligned_down(28),
            SizingHints {
                height: 280,
                width: 280
            }
        );
    }

    #[test]
    fn test_aligned_down_floors() {
        let hints = SizingHints {
            height: 300,
            width: 300,
        };
        assert_eq!(
            hints.aligned_down(28),
            SizingHints {
                height: 280,
                width: 280
            }
        );
    }

    #[test]
    fn test_aligned_down_never_zero() {
        let hints = SizingHints {
            height: 20,
            width: 300,
        };
        let aligned = hints.aligned_down(28);
        assert_eq!(aligned.height, 28);
        assert_eq!(aligned.width, 280);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = BackendRegistry::new();
        assert!(registry.get(Backend::Qwen).is_none());
    }
}
