//! Shared orchestration for local-generation backends.
//!
//! All three local adapters follow the same shape: render a structured
//! multi-part prompt through the handle's preprocessor, run bounded
//! generation on the handle's device, trim the input prefix off the
//! generated sequence, and decode with special tokens stripped. Generation
//! is CPU/GPU-bound, so it runs under `spawn_blocking`.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{BackendError, BackendResult};
use crate::provider::{GenerationOptions, HandleCache, PromptPart};

pub(crate) async fn run_generation(
    cache: Arc<HandleCache>,
    backend: Backend,
    parts: Vec<PromptPart>,
    options: GenerationOptions,
) -> BackendResult<String> {
    tokio::task::spawn_blocking(move || {
        let handle = cache.get(backend)?;
        let inputs = handle.processor.render(&parts)?;
        let sequence = handle.model.generate(&inputs, &handle.device, &options)?;

        // Exclude the input prefix before decoding.
        let generated = sequence.get(inputs.input_ids.len()..).unwrap_or_default();
        let text = handle.processor.decode(generated, true)?;

        // Decoded image buffers in `parts` are released here on every exit
        // path, success or failure.
        drop(parts);
        Ok(text)
    })
    .await
    .map_err(|e| BackendError::Inference {
        message: format!("generation task failed: {e}"),
    })?
}
