//! Percept CLI - Multi-backend visual question answering for images.
//!
//! Percept answers natural-language questions about images by routing each
//! request to a vision-language backend: hosted APIs (Gemini, GPT-4), a
//! locally served engine (Pixtral), or in-process models (Qwen, Llama-Vision,
//! Molmo) when a runtime is provisioned.
//!
//! # Usage
//!
//! ```bash
//! # Ask a question about an image
//! percept respond "What is in this photo?" --image photos/cat.jpg
//!
//! # Pick a backend
//! percept respond "Compare these" -i a.png -i b.png --backend gpt4
//!
//! # List backends
//! percept backends
//!
//! # View configuration
//! percept config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod runtime;

/// Percept - Multi-backend visual question answering for images.
#[derive(Parser, Debug)]
#[command(name = "percept")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a response for a query over one or more images
    Respond(cli::respond::RespondArgs),

    /// List the available backends and their image limits
    Backends(cli::backends::BackendsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match percept_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `percept config path`."
            );
            percept_core::Config::default()
        }
    };
    logging::init(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Percept v{}", percept_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Respond(args) => cli::respond::execute(args, &config).await,
        Commands::Backends(args) => cli::backends::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_respond_defaults() {
        let cli = Cli::parse_from(["percept", "respond", "what is this?", "-i", "a.png"]);
        match cli.command {
            Commands::Respond(args) => {
                assert_eq!(args.query, "what is this?");
                assert_eq!(args.images, vec!["a.png".to_string()]);
                assert_eq!(args.height, 280);
                assert_eq!(args.width, 280);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
