//! The `percept config` command for configuration management.

use clap::{Args, Subcommand};
use percept_core::config::resolve_env_var;
use percept_core::Config;
use std::path::Path;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Write a commented starter config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Check the loaded config: asset root, API key resolution, endpoints
    Check,
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            init_at(&path, force)?;
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::Check => {
            let config = Config::load()?;
            print!("{}", render_check(&config));
        }
    }

    Ok(())
}

/// Write the starter config, refusing to clobber without `force`.
fn init_at(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, starter_toml()?)?;

    tracing::info!("Config file created at: {}", path.display());
    Ok(())
}

/// Default config as TOML with a header documenting the key indirection.
fn starter_toml() -> anyhow::Result<String> {
    let body = Config::default().to_toml()?;
    Ok(format!(
        "# Percept configuration.\n\
         #\n\
         # API keys support ${{ENV_VAR}} indirection: the variable is read from\n\
         # the environment each time the backend is called, so keys never need\n\
         # to live in this file.\n\
         #\n\
         # Image identifiers passed to `percept respond` are resolved relative\n\
         # to general.asset_root.\n\
         \n\
         {body}"
    ))
}

/// Human-readable report on the loaded configuration.
fn render_check(config: &Config) -> String {
    let root = config.asset_root();
    let mut out = format!(
        "asset root       {} ({})\n",
        root.display(),
        if root.is_dir() { "exists" } else { "missing" }
    );
    out.push_str(&format!(
        "gemini key       {}\n",
        key_status(&config.backends.gemini.api_key)
    ));
    out.push_str(&format!(
        "gpt4 key         {}\n",
        key_status(&config.backends.gpt4.api_key)
    ));
    out.push_str(&format!(
        "pixtral endpoint {}\n",
        config.backends.pixtral.endpoint
    ));
    out
}

/// Whether a configured key resolves, without echoing the secret itself.
fn key_status(configured: &str) -> String {
    let resolved = if resolve_env_var(configured).is_some() {
        "set"
    } else {
        "not set"
    };
    let source = if configured.starts_with("${") {
        configured
    } else if configured.is_empty() {
        "unconfigured"
    } else {
        "literal value"
    };
    format!("{resolved} ({source})")
}
