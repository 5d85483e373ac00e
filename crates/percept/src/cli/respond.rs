//! The `percept respond` command: one query, one response.

use clap::Args;
use percept_core::{Config, Responder, SizingHints};
use std::sync::Arc;

use crate::runtime::UnprovisionedLoader;

/// Arguments for the `respond` command.
#[derive(Args, Debug)]
pub struct RespondArgs {
    /// The question to ask about the images
    pub query: String,

    /// Image identifier, relative to the asset root (repeatable)
    #[arg(short = 'i', long = "image", value_name = "PATH")]
    pub images: Vec<String>,

    /// Backend to route the request to
    /// (qwen, gemini, gpt4, llama-vision, pixtral, molmo)
    #[arg(short, long, env = "PERCEPT_BACKEND", default_value = "qwen")]
    pub backend: String,

    /// Session identifier recorded in logs
    #[arg(long, default_value = "cli")]
    pub session_id: String,

    /// Target image height hint, in pixels
    #[arg(long, default_value_t = 280)]
    pub height: u32,

    /// Target image width hint, in pixels
    #[arg(long, default_value_t = 280)]
    pub width: u32,

    /// Print the response as a JSON object instead of plain text
    #[arg(long)]
    pub json: bool,
}

/// Execute the respond command.
///
/// The response is always printed: failures arrive as sentinel texts from the
/// dispatcher, never as process errors.
pub async fn execute(args: RespondArgs, config: &Config) -> anyhow::Result<()> {
    let responder = Responder::new(config, Arc::new(UnprovisionedLoader));
    let hints = SizingHints {
        height: args.height,
        width: args.width,
    };

    let text = responder
        .generate(
            &args.images,
            &args.query,
            &args.session_id,
            hints,
            &args.backend,
        )
        .await;

    if args.json {
        let out = serde_json::json!({
            "backend": args.backend,
            "session_id": args.session_id,
            "response": text,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{text}");
    }

    Ok(())
}
