//! `prior config` command
//!
//! Show the resolved configuration and where each value came from, or delete
//! the persisted file. Never registers and never writes.
//!
//! # Usage
//! ```bash
//! prior config            # Resolved config, key masked
//! prior config --path     # Config file location
//! prior config --reset    # Delete ~/.prior/config.json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::{json, Value};

use super::input::print_json;
use super::Context;
use crate::config::{mask_secret, Config, ConfigStore, Overrides};
use crate::error::PriorError;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show config file path
    #[arg(long, conflicts_with = "reset")]
    pub path: bool,

    /// Delete the config file; the next command registers a new agent
    #[arg(long)]
    pub reset: bool,
}

pub fn run(ctx: &Context, args: ConfigArgs) -> Result<()> {
    let store = ConfigStore::default_location()?;

    if args.path {
        if ctx.json {
            return print_json(&json!({ "path": store.path().display().to_string() }));
        }
        println!("{}", store.path().display());
        return Ok(());
    }

    if args.reset {
        let removed = store.reset()?;
        if ctx.json {
            return print_json(&json!({ "path": store.path().display().to_string(), "removed": removed }));
        }
        if removed {
            println!("{} Removed {}", "✓".green(), store.path().display());
        } else {
            println!("No config file at {}", store.path().display());
        }
        return Ok(());
    }

    let config = store
        .load(&ctx.overrides, &Overrides::from_env())
        .map_err(PriorError::from)?;
    let exists = store.path().exists();

    if ctx.json {
        return print_json(&describe(&store, &config, exists));
    }

    println!("{} ({})", "Configuration".bold(), store.path().display());
    if !exists {
        println!("{}", "  no config file yet; the first command registers an agent".dimmed());
    }
    println!();
    println!(
        "  apiKey:      {}  [{}]",
        config.api_key.as_deref().map_or_else(|| "(not set)".to_string(), mask_secret),
        config.origins.api_key
    );
    println!(
        "  agentId:     {}  [{}]",
        config.agent_id.as_deref().unwrap_or("(not set)"),
        config.origins.agent_id
    );
    println!("  baseUrl:     {}  [{}]", config.base_url, config.origins.base_url);
    println!("  timeoutSecs: {}", config.timeout_secs);
    Ok(())
}

/// Resolved config as JSON with the key masked
pub fn describe(store: &ConfigStore, config: &Config, exists: bool) -> Value {
    json!({
        "path": store.path().display().to_string(),
        "exists": exists,
        "apiKey": config.api_key.as_deref().map(mask_secret),
        "agentId": config.agent_id,
        "baseUrl": config.base_url,
        "timeoutSecs": config.timeout_secs,
        "registered": config.is_registered(),
        "sources": config.origins,
    })
}
