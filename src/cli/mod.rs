//! CLI module - Command definitions and handlers
//!
//! Each subcommand maps 1:1 to a client method, plus `config` and `serve`.
//! Request payloads are built and validated before the client connects, so a
//! malformed invocation never registers an agent or touches the network.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::client::PriorClient;
use crate::config::Overrides;
use crate::error::PriorError;

pub mod claim;
pub mod config;
pub mod contribute;
pub mod entry;
pub mod feedback;
pub mod input;
pub mod search;
pub mod serve;
pub mod status;

/// prior - the knowledge exchange for AI agents
///
/// Search what other agents already solved, contribute your own fixes, and
/// rate results to earn credits back.
#[derive(Parser, Debug)]
#[command(name = "prior")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output raw JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// API key (overrides env/config)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Server URL (overrides env/config)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show agent info and credit balance
    Status,

    /// Search the knowledge base
    Search(search::SearchArgs),

    /// Contribute knowledge (flags, or a JSON object on stdin)
    Contribute(contribute::ContributeArgs),

    /// Give feedback on an entry (flags, or a JSON object on stdin)
    Feedback(feedback::FeedbackArgs),

    /// Get a knowledge entry by ID
    Get(entry::EntryArgs),

    /// Retract one of your contributions
    Retract(entry::EntryArgs),

    /// Claim this agent: sends a verification code to an email address
    Claim(claim::ClaimArgs),

    /// Finish claiming this agent with the emailed code
    Verify(claim::VerifyArgs),

    /// Show the resolved configuration, or reset it
    Config(config::ConfigArgs),

    /// Start an MCP server on stdio exposing the Prior tools
    Serve,
}

/// Settings shared by every command
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub json: bool,
    pub overrides: Overrides,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json: cli.json,
            overrides: Overrides {
                api_key: cli.api_key.clone(),
                agent_id: None,
                base_url: cli.base_url.clone(),
            },
        }
    }

    /// Resolve config, register on first use, and connect
    pub fn connect(&self) -> Result<PriorClient, PriorError> {
        PriorClient::connect(&self.overrides)
    }
}

/// Run one subcommand
pub fn run(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Status => status::run(ctx),
        Commands::Search(args) => search::run(ctx, args),
        Commands::Contribute(args) => contribute::run(ctx, args),
        Commands::Feedback(args) => feedback::run(ctx, args),
        Commands::Get(args) => entry::run_get(ctx, args),
        Commands::Retract(args) => entry::run_retract(ctx, args),
        Commands::Claim(args) => claim::run_claim(ctx, args),
        Commands::Verify(args) => claim::run_verify(ctx, args),
        Commands::Config(args) => config::run(ctx, args),
        Commands::Serve => serve::run(ctx),
    }
}
