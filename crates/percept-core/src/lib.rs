//! Percept Core - Embeddable visual question answering library.
//!
//! Percept generates natural-language answers about images by routing each
//! request to one of several vision-language backends: local models served
//! in-process (Qwen, Llama-Vision, Molmo), hosted APIs (Gemini, GPT-4), or a
//! locally served engine (Pixtral).
//!
//! # Architecture
//!
//! ```text
//! Query + Image IDs → Resolve → Backend Adapter → Response Text
//! ```
//!
//! Every failure mode is flattened to a fixed sentinel string by the
//! dispatcher, so callers always receive displayable text.
//!
//! # Usage
//!
//! ```rust,ignore
//! use percept_core::{Config, Responder, SizingHints};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load().unwrap_or_default();
//!     let responder = Responder::new(&config, loader);
//!
//!     let text = responder
//!         .generate(
//!             &["photos/cat.jpg".to_string()],
//!             "What breed is this?",
//!             "session-42",
//!             SizingHints::default(),
//!             "qwen",
//!         )
//!         .await;
//!     println!("{text}");
//! }
//! ```

// Module declarations
pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod provider;
pub mod resolver;

// Re-exports for convenient access
pub use backend::{Backend, BackendRegistry, RespondRequest, SizingHints, VisionBackend};
pub use config::Config;
pub use dispatcher::{Responder, GENERIC_FAILURE, INVALID_BACKEND, NO_IMAGES};
pub use error::{BackendError, BackendResult, ConfigError};
pub use provider::{Device, HandleCache, HandleLoader, LocalHandle};
pub use resolver::{ImageResolver, ResolvedImage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
