//! Backend adapters for the unified response-generation contract.
//!
//! Each adapter translates the normalized request (query + resolved images +
//! sizing hints) into one backend's native call contract and extracts plain
//! text from its native result. Local-generation adapters drive a cached
//! model handle; remote adapters speak a provider's HTTP API.

mod adapter;
pub(crate) mod gemini;
pub(crate) mod llama;
pub(crate) mod local;
pub(crate) mod molmo;
pub(crate) mod openai;
pub(crate) mod pixtral;
pub(crate) mod qwen;

pub use adapter::{Backend, BackendRegistry, RespondRequest, SizingHints, VisionBackend};
