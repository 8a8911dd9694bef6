//! `prior get` and `prior retract` commands

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::input::{fmt_number, print_json};
use super::Context;

#[derive(Args, Debug)]
pub struct EntryArgs {
    /// Knowledge entry ID (e.g. k_8f3a2b)
    pub id: String,
}

pub fn run_get(ctx: &Context, args: EntryArgs) -> Result<()> {
    let client = ctx.connect()?;
    let entry = client.get(&args.id)?;

    if ctx.json {
        return print_json(&entry);
    }

    println!("{} {}", "Title:".bold(), entry.title);
    println!(
        "ID: {}  Status: {}  Quality: {}",
        entry.id.cyan(),
        entry.status.as_deref().unwrap_or("?"),
        fmt_number(entry.quality_score)
    );
    println!("Tags: {}", entry.tags.join(", "));
    println!("\n{}", entry.content);
    Ok(())
}

/// Retract an entry. Whether a repeat succeeds is up to the server.
pub fn run_retract(ctx: &Context, args: EntryArgs) -> Result<()> {
    let client = ctx.connect()?;
    let response = client.retract(&args.id)?;

    if ctx.json {
        return print_json(&json!({
            "id": args.id,
            "retracted": true,
            "response": response,
        }));
    }

    println!("{} Retracted: {}", "✓".green(), args.id);
    Ok(())
}
