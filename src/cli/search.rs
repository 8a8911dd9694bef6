//! `prior search` command
//!
//! # Usage
//! ```bash
//! prior search "FastAPI CORS preflight 400"
//! prior search cargo build hangs -n 5 --context-os windows
//! prior --json search "E0502 borrow" --tags rust
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::input::{fmt_number, preview, print_json};
use super::Context;
use crate::client::{SearchContext, SearchHit, SearchQuery, DEFAULT_MAX_RESULTS, DEFAULT_RUNTIME};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query; multiple words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Max results (1-10)
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: u32,

    /// Minimum quality score (0.0-1.0)
    #[arg(long)]
    pub min_quality: Option<f64>,

    /// Max tokens in the response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Filter by tags (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Runtime context (default: rust)
    #[arg(long)]
    pub runtime: Option<String>,

    /// Operating system context
    #[arg(long)]
    pub context_os: Option<String>,

    /// Shell context
    #[arg(long)]
    pub context_shell: Option<String>,

    /// Tools available in the environment
    #[arg(long, num_args = 1..)]
    pub context_tools: Vec<String>,
}

/// Turn command-line arguments into a search request
pub fn build_query(args: SearchArgs) -> SearchQuery {
    let context = SearchContext {
        runtime: args.runtime.unwrap_or_else(|| DEFAULT_RUNTIME.to_string()),
        os: args.context_os,
        shell: args.context_shell,
        tools: args.context_tools,
        ..SearchContext::default()
    };

    let mut query = SearchQuery::new(args.query.join(" "))
        .max_results(args.max_results)
        .context(context);
    query.min_quality = args.min_quality;
    query.max_tokens = args.max_tokens;
    query.tags = args.tags;
    query
}

pub fn run(ctx: &Context, args: SearchArgs) -> Result<()> {
    let query = build_query(args);
    query.validate()?;

    let client = ctx.connect()?;
    let results = client.search(&query)?;

    if ctx.json {
        return print_json(&results.into_value());
    }

    let cost = results.cost().clone();
    let charged = results.was_charged();
    let do_not_try = results.do_not_try().to_vec();
    let hits: Vec<SearchHit> = results.collect();

    if hits.is_empty() {
        println!("No results found.");
        if !charged {
            println!("{}", "(No charge for empty results)".dimmed());
        }
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        print_hit(i + 1, hit);
    }

    if !do_not_try.is_empty() {
        println!("\n{}", "⚠ Do NOT try:".yellow().bold());
        for approach in &do_not_try {
            println!("  • {}", approach);
        }
    }

    println!(
        "\nCost: {} credit(s)  Balance: {}",
        fmt_number(cost.credits_charged),
        fmt_number(cost.balance_remaining)
    );
    Ok(())
}

fn print_hit(n: usize, hit: &SearchHit) {
    println!("\n{}", "─".repeat(60).dimmed());
    println!("[{}] {}", n, hit.title.bold());
    println!(
        "    ID: {}  Score: {:.3}  Trust: {}",
        hit.id.cyan(),
        hit.relevance_score,
        hit.trust_level.as_deref().unwrap_or("?")
    );
    println!("    Tags: {}", hit.tags.join(", "));
    if let Some(problem) = &hit.problem {
        println!("    Problem: {}", preview(problem, 120));
    }
    if let Some(solution) = &hit.solution {
        println!("    Solution: {}", preview(solution, 120));
    }
    for message in hit.error_messages.iter().take(2) {
        println!("    Error: {}", preview(message, 100));
    }
    if !hit.failed_approaches.is_empty() {
        println!("    Failed approaches: {}", hit.failed_approaches.len());
    }
}
