//! The `percept backends` command: list the closed backend set.

use clap::Args;
use percept_core::backend::{Backend, BackendRegistry};
use percept_core::provider::HandleCache;
use percept_core::Config;
use std::sync::Arc;

use crate::runtime::UnprovisionedLoader;

/// Arguments for the `backends` command.
#[derive(Args, Debug)]
pub struct BackendsArgs {
    /// Print the backend list as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the backends command.
pub async fn execute(args: BackendsArgs, config: &Config) -> anyhow::Result<()> {
    let cache = Arc::new(HandleCache::new(Arc::new(UnprovisionedLoader)));
    let registry = BackendRegistry::with_defaults(config, cache);

    if args.json {
        let list: Vec<_> = Backend::ALL
            .iter()
            .filter_map(|&backend| {
                registry.get(backend).map(|adapter| {
                    serde_json::json!({
                        "key": backend.as_str(),
                        "name": adapter.name(),
                        "max_images": adapter.max_images(),
                        "requires_images": adapter.requires_images(),
                    })
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("{:<14} {:<14} {:<12} {}", "KEY", "NAME", "MAX IMAGES", "REQUIRES IMAGES");
    for backend in Backend::ALL {
        if let Some(adapter) = registry.get(backend) {
            let limit = adapter
                .max_images()
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string());
            println!(
                "{:<14} {:<14} {:<12} {}",
                backend.as_str(),
                adapter.name(),
                limit,
                if adapter.requires_images() { "yes" } else { "no" }
            );
        }
    }

    Ok(())
}
