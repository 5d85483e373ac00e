//! Logging initialization.
//!
//! The subscriber is built from the `[logging]` config table; the CLI's
//! `--verbose` and `--json-logs` flags override it per invocation. Output
//! goes to stderr, since stdout carries the response text.

use percept_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter directive for a base level.
///
/// HTTP client internals are capped at warn so a debug run shows adapter
/// activity instead of connection chatter from the remote backends.
fn directive(level: &str) -> String {
    format!("{level},hyper=warn,reqwest=warn")
}

/// The base level after applying the `--verbose` override.
fn effective_level(config: &Config, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    }
}

/// Initialize the logging subsystem.
///
/// The RUST_LOG environment variable, when set, replaces the configured
/// level and the HTTP-noise cap entirely.
pub fn init(config: &Config, verbose: bool, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(effective_level(config, verbose))));

    if json_logs || config.logging.format == "json" {
        // JSON format for machine parsing
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty format for humans
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}
