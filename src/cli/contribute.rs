//! `prior contribute` command
//!
//! Fields come from flags, from a JSON object piped on stdin, or both; flags
//! win. Required fields are checked before anything is sent.
//!
//! # Usage
//! ```bash
//! prior contribute --title "cargo test hangs on CI" --content "..." --tags rust,ci
//! cat entry.json | prior contribute --model gpt-4o
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use super::input::{canonicalize, fmt_number, override_field, print_json, read_stdin_object, JsonObject};
use super::Context;
use crate::client::{ContributionDraft, Ttl};
use crate::error::PriorError;

#[derive(Args, Debug, Default)]
pub struct ContributeArgs {
    /// Entry title (describe the symptom, not the diagnosis)
    #[arg(long)]
    pub title: Option<String>,

    /// Full content/explanation
    #[arg(long)]
    pub content: Option<String>,

    /// Comma-separated tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Model that produced the solution (default: unknown)
    #[arg(long)]
    pub model: Option<String>,

    /// Structured problem description
    #[arg(long)]
    pub problem: Option<String>,

    /// Structured solution description
    #[arg(long)]
    pub solution: Option<String>,

    /// Exact error messages encountered
    #[arg(long, num_args = 1..)]
    pub error_messages: Option<Vec<String>>,

    /// Approaches that did not work
    #[arg(long, num_args = 1..)]
    pub failed_approaches: Option<Vec<String>>,

    /// Environment as a JSON object, e.g. '{"os": "linux"}'
    #[arg(long)]
    pub environment: Option<String>,

    /// Tokens spent solving the problem
    #[arg(long)]
    pub effort_tokens: Option<u64>,

    /// Seconds spent solving the problem
    #[arg(long)]
    pub effort_duration: Option<u64>,

    /// Tool calls spent solving the problem
    #[arg(long)]
    pub effort_tool_calls: Option<u64>,

    /// Time to live: 30d, 60d, 90d, 365d or evergreen
    #[arg(long)]
    pub ttl: Option<Ttl>,
}

/// Merge stdin fields with flags into a validated draft
pub fn build_draft(args: ContributeArgs, stdin: Option<JsonObject>) -> Result<ContributionDraft, PriorError> {
    let mut map = stdin.unwrap_or_default();
    canonicalize(&mut map, "errorMessages", &["error_messages"]);
    canonicalize(&mut map, "failedApproaches", &["failed_approaches"]);

    // Piped tags may be a comma-separated string.
    let split_tags = match map.get("tags") {
        Some(Value::String(tags)) => Some(tags.split(',').map(|t| Value::from(t.trim())).collect()),
        _ => None,
    };
    if let Some(tags) = split_tags {
        map.insert("tags".to_string(), Value::Array(tags));
    }

    set(&mut map, "title", &[], args.title.map(Value::String));
    set(&mut map, "content", &[], args.content.map(Value::String));
    set(&mut map, "tags", &[], args.tags.map(Value::from));
    set(&mut map, "model", &[], args.model.map(Value::String));
    set(&mut map, "problem", &[], args.problem.map(Value::String));
    set(&mut map, "solution", &[], args.solution.map(Value::String));
    set(&mut map, "errorMessages", &["error_messages"], args.error_messages.map(Value::from));
    set(&mut map, "failedApproaches", &["failed_approaches"], args.failed_approaches.map(Value::from));
    set(&mut map, "ttl", &[], args.ttl.map(|t| Value::from(t.as_str())));
    if let Some(raw) = args.environment {
        set(&mut map, "environment", &[], Some(parse_environment(&raw)?));
    }

    let effort_flags = [
        ("tokensUsed", "tokens_used", args.effort_tokens),
        ("durationSeconds", "duration_seconds", args.effort_duration),
        ("toolCalls", "tool_calls", args.effort_tool_calls),
    ];
    if effort_flags.iter().any(|(_, _, v)| v.is_some()) {
        let mut effort = match map.remove("effort") {
            Some(Value::Object(existing)) => existing,
            _ => JsonObject::new(),
        };
        for (key, alias, value) in effort_flags {
            if let Some(value) = value {
                override_field(&mut effort, key, &[alias], Value::from(value));
            }
        }
        map.insert("effort".to_string(), Value::Object(effort));
    }

    let draft: ContributionDraft = serde_json::from_value(Value::Object(map))
        .map_err(|e| PriorError::validation(format!("invalid contribution: {}", e)))?;
    let draft = draft.normalized();
    draft.validate()?;
    Ok(draft)
}

fn set(map: &mut JsonObject, key: &str, aliases: &[&str], value: Option<Value>) {
    if let Some(value) = value {
        override_field(map, key, aliases, value);
    }
}

fn parse_environment(raw: &str) -> Result<Value, PriorError> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(Value::Object(map)),
        _ => Err(PriorError::validation("--environment must be a JSON object")),
    }
}

pub fn run(ctx: &Context, args: ContributeArgs) -> Result<()> {
    let draft = build_draft(args, read_stdin_object()?)?;

    let client = ctx.connect()?;
    let contribution = client.contribute(draft)?;

    if ctx.json {
        return print_json(&contribution);
    }

    println!("{} Contributed: {}", "✓".green(), contribution.id.cyan());
    println!("Credits earned: {}", fmt_number(contribution.credits_earned.or(Some(0.0))));
    if let Some(status) = &contribution.status {
        println!("Status: {}", status);
    }
    Ok(())
}
