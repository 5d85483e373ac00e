//! Sub-configuration structs with per-backend defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Static asset root that image identifiers are resolved against
    pub asset_root: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("./static"),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Remote API call timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum image file size in megabytes
    pub max_image_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            max_image_size_mb: 50,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Per-backend configurations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackendsConfig {
    /// Qwen2-VL (local generation)
    pub qwen: QwenConfig,

    /// Gemini (hosted API)
    pub gemini: GeminiConfig,

    /// GPT-4o (hosted API)
    pub gpt4: Gpt4Config,

    /// Llama 3.2 Vision (local generation)
    pub llama: LlamaConfig,

    /// Pixtral served through an OpenAI-compatible endpoint
    pub pixtral: PixtralConfig,

    /// Molmo (local generation)
    pub molmo: MolmoConfig,
}

/// Qwen2-VL settings.
///
/// The visual tokenizer works on a fixed patch grid, so sizing hints are
/// floored to a multiple of `alignment` before preprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QwenConfig {
    /// Patch-grid alignment in pixels
    pub alignment: u32,

    /// Generation budget
    pub max_new_tokens: u32,
}

impl Default for QwenConfig {
    fn default() -> Self {
        Self {
            alignment: 28,
            max_new_tokens: 128,
        }
    }
}

/// Gemini settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base endpoint
    pub endpoint: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "${GOOGLE_API_KEY}".to_string(),
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// GPT-4o settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Gpt4Config {
    /// API key (supports ${ENV_VAR} syntax, resolved at call time)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Chat Completions endpoint
    pub endpoint: String,

    /// Response token ceiling
    pub max_tokens: u32,
}

impl Default for Gpt4Config {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            max_tokens: 1024,
        }
    }
}

/// Llama 3.2 Vision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlamaConfig {
    /// Generation budget
    pub max_new_tokens: u32,
}

impl Default for LlamaConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
        }
    }
}

/// Pixtral settings (OpenAI-compatible serving endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PixtralConfig {
    /// Chat Completions endpoint of the serving engine
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Response token ceiling
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for PixtralConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/v1/chat/completions".to_string(),
            model: "mistralai/Pixtral-12B-2409".to_string(),
            max_tokens: 1024,
            temperature: 0.2,
        }
    }
}

/// Molmo settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MolmoConfig {
    /// Generation budget
    pub max_new_tokens: u32,

    /// Stop string terminating generation
    pub stop: String,
}

impl Default for MolmoConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            stop: "<|endoftext|>".to_string(),
        }
    }
}
