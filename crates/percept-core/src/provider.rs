//! Model provider seam for local-generation backends.
//!
//! Weight loading and the numerical internals of each model live behind the
//! `VisionModel`/`VisionProcessor` traits, supplied by a `HandleLoader` owned
//! by the embedding application. This crate only orchestrates: render the
//! prompt, run bounded generation on the handle's device, trim and decode.
//!
//! Handles are process-lifetime singletons. The `HandleCache` makes the
//! load-once contract explicit: one synchronized load per backend, shared
//! `Arc` thereafter. The cache gives no mutual exclusion over the model
//! itself; callers running concurrent generations against the same local
//! backend must serialize access.

use image::DynamicImage;
use ndarray::Array4;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::backend::Backend;
use crate::error::{BackendError, BackendResult};

/// Execution device for local generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda(usize),
    Metal,
}

/// One part of a structured multi-part prompt.
#[derive(Debug, Clone)]
pub enum PromptPart {
    /// An image, optionally tagged with the resized (height, width) the
    /// visual tokenizer should target.
    Image {
        pixels: DynamicImage,
        resized: Option<(u32, u32)>,
    },
    /// A text segment.
    Text(String),
}

/// Model inputs produced by a processor's template mechanism.
#[derive(Debug, Clone)]
pub struct PreparedInputs {
    /// Tokenized rendered prompt
    pub input_ids: Vec<u32>,
    /// Vision tensor in NCHW layout, absent for text-only prompts
    pub pixel_values: Option<Array4<f32>>,
}

/// Bounds and flags for a single generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Maximum new tokens to generate
    pub max_new_tokens: u32,
    /// Run the model in half precision
    pub half_precision: bool,
    /// Stop string terminating generation early
    pub stop: Option<String>,
}

/// Text/image preprocessor for a local backend.
pub trait VisionProcessor: Send + Sync {
    /// Render prompt parts through the chat template into model inputs
    /// (single textual prompt plus separately-prepared vision tensors).
    fn render(&self, parts: &[PromptPart]) -> BackendResult<PreparedInputs>;

    /// Decode generated token ids to text.
    fn decode(&self, tokens: &[u32], skip_special_tokens: bool) -> BackendResult<String>;
}

/// The inference object for a local backend.
pub trait VisionModel: Send + Sync {
    /// Run bounded generation on the given device.
    ///
    /// Returns the full token sequence including the input prefix; adapters
    /// trim the prefix before decoding.
    fn generate(
        &self,
        inputs: &PreparedInputs,
        device: &Device,
        options: &GenerationOptions,
    ) -> BackendResult<Vec<u32>>;
}

/// Everything needed to invoke one local backend.
#[derive(Clone)]
pub struct LocalHandle {
    pub model: Arc<dyn VisionModel>,
    pub processor: Arc<dyn VisionProcessor>,
    pub device: Device,
}

impl std::fmt::Debug for LocalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalHandle")
            .field("model", &"<dyn VisionModel>")
            .field("processor", &"<dyn VisionProcessor>")
            .field("device", &self.device)
            .finish()
    }
}

/// Builds a `LocalHandle` for a backend (weight loading, device selection).
///
/// Implementations are expected to be expensive on first call; the
/// `HandleCache` guarantees they run at most once per backend.
pub trait HandleLoader: Send + Sync {
    fn load(&self, backend: Backend) -> BackendResult<LocalHandle>;
}

/// Process-lifetime handle cache keyed by backend.
///
/// The mutex is held across the load so concurrent first calls for the same
/// backend block instead of loading twice. Repeat calls are a map lookup.
pub struct HandleCache {
    loader: Arc<dyn HandleLoader>,
    handles: Mutex<HashMap<Backend, Arc<LocalHandle>>>,
}

impl HandleCache {
    pub fn new(loader: Arc<dyn HandleLoader>) -> Self {
        Self {
            loader,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cached handle for a backend, loading it on first use.
    pub fn get(&self, backend: Backend) -> BackendResult<Arc<LocalHandle>> {
        let mut handles = self.handles.lock().map_err(|e| BackendError::Inference {
            message: format!("handle cache lock poisoned: {e}"),
        })?;

        if let Some(handle) = handles.get(&backend) {
            return Ok(handle.clone());
        }

        tracing::info!("Loading model handle for backend '{backend}'");
        let handle = Arc::new(self.loader.load(backend)?);
        handles.insert(backend, handle.clone());
        Ok(handle)
    }
}
