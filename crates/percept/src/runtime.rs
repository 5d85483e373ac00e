//! Local model runtime wiring.
//!
//! The core crate treats local model handles as opaque: a `HandleLoader`
//! supplies the model, processor, and device for each in-process backend.
//! This binary does not link an inference runtime, so its loader reports the
//! backend as unprovisioned; the dispatcher flattens that to the generic
//! failure sentinel. Embedding applications provide their own loader.

use percept_core::backend::Backend;
use percept_core::error::{BackendError, BackendResult};
use percept_core::provider::{HandleLoader, LocalHandle};

/// Loader for builds without an in-process inference runtime.
pub struct UnprovisionedLoader;

impl HandleLoader for UnprovisionedLoader {
    fn load(&self, backend: Backend) -> BackendResult<LocalHandle> {
        Err(BackendError::Handle {
            backend: backend.as_str(),
            message: "no local inference runtime is provisioned in this build".to_string(),
        })
    }
}
