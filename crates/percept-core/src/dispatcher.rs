//! The dispatcher: backend selection and the uniform failure boundary.
//!
//! `Responder::generate` always returns a string. Expected degraded outcomes
//! come back from adapters as tagged `BackendError` values and are flattened
//! to their fixed sentinel texts here; truly unanticipated faults (panics
//! inside an adapter) are contained by running the adapter on its own task.
//! Nothing escapes to the caller.

use std::sync::Arc;

use crate::backend::{Backend, BackendRegistry, RespondRequest, SizingHints};
use crate::config::Config;
use crate::error::BackendError;
use crate::provider::{HandleCache, HandleLoader};
use crate::resolver::ImageResolver;

/// Returned for backend keys outside the closed set.
pub const INVALID_BACKEND: &str = "Invalid model selected.";

/// Returned when an image-requiring backend ends up with zero usable images.
pub const NO_IMAGES: &str = "No images could be loaded for analysis.";

/// Returned for any unanticipated failure.
pub const GENERIC_FAILURE: &str = "An error occurred while generating the response.";

/// The response generator: one synchronous request → response transaction
/// per call. No retries, no persisted state.
pub struct Responder {
    registry: Arc<BackendRegistry>,
    resolver: ImageResolver,
}

impl Responder {
    /// Build a responder with all six production adapters.
    ///
    /// The loader supplies local model handles on first use; remote adapters
    /// are configured from `config`.
    pub fn new(config: &Config, loader: Arc<dyn HandleLoader>) -> Self {
        let cache = Arc::new(HandleCache::new(loader));
        Self {
            registry: Arc::new(BackendRegistry::with_defaults(config, cache)),
            resolver: ImageResolver::new(config.asset_root(), &config.limits),
        }
    }

    /// Build a responder over an explicit registry and resolver.
    pub fn with_registry(registry: BackendRegistry, resolver: ImageResolver) -> Self {
        Self {
            registry: Arc::new(registry),
            resolver,
        }
    }

    /// Generate a response for `query` over `images` using `backend`.
    ///
    /// `images` are relative identifiers resolved against the static asset
    /// root. `session_id` is forwarded for collaborator bookkeeping only.
    /// Always returns a string; failures are flattened to sentinel texts.
    pub async fn generate(
        &self,
        images: &[String],
        query: &str,
        session_id: &str,
        hints: SizingHints,
        backend: &str,
    ) -> String {
        tracing::info!("Generating response using backend '{backend}' (session {session_id}).");

        let backend = match backend.parse::<Backend>() {
            Ok(backend) => backend,
            Err(e) => {
                tracing::error!("Invalid model choice: {e}");
                return INVALID_BACKEND.to_string();
            }
        };
        let Some(adapter) = self.registry.get(backend) else {
            tracing::error!("No adapter registered for backend '{backend}'");
            return INVALID_BACKEND.to_string();
        };

        // Truncate to the adapter's image limit before resolving, so
        // discarded identifiers are never read.
        let selected = match adapter.max_images() {
            Some(max) if images.len() > max => {
                tracing::warn!(
                    "{} accepts {max} image(s) per request; discarding {} extra",
                    adapter.name(),
                    images.len() - max
                );
                &images[..max]
            }
            _ => images,
        };

        let mut resolved = Vec::with_capacity(selected.len());
        for identifier in selected {
            if let Some(image) = self.resolver.resolve(identifier).await {
                resolved.push(image);
            }
        }
        if resolved.is_empty() && adapter.requires_images() {
            return NO_IMAGES.to_string();
        }

        let request = RespondRequest {
            query: query.to_string(),
            images: resolved,
            hints,
        };

        // Run the adapter on its own task so a panic is contained as a join
        // error instead of unwinding through the caller.
        let registry = self.registry.clone();
        let outcome = tokio::spawn(async move {
            let adapter = registry.get(backend).ok_or_else(|| BackendError::Inference {
                message: format!("no adapter registered for {backend}"),
            })?;
            adapter.respond(&request).await
        })
        .await;

        match outcome {
            Ok(Ok(text)) => text,
            Ok(Err(error)) => flatten_failure(error),
            Err(e) => {
                tracing::error!("Backend task failed: {e}");
                GENERIC_FAILURE.to_string()
            }
        }
    }

    /// The resolver this responder joins identifiers against.
    pub fn resolver(&self) -> &ImageResolver {
        &self.resolver
    }
}

/// Map a tagged adapter failure to its sentinel text.
fn flatten_failure(error: BackendError) -> String {
    match error {
        BackendError::NoUsableImages => NO_IMAGES.to_string(),
        BackendError::EmptyResponse { backend } => {
            format!("The {backend} model did not generate any text response.")
        }
        // Logged with provider context at the adapter boundary.
        BackendError::Api { message, .. } => {
            format!("An error occurred while processing the images: {message}")
        }
        other => {
            tracing::error!("Error generating response: {other}");
            GENERIC_FAILURE.to_string()
        }
    }
}
