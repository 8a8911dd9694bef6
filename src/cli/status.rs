//! `prior status` command

use anyhow::Result;
use colored::Colorize;

use super::input::{fmt_number, print_json};
use super::Context;

/// Show the agent profile and credit balance
pub fn run(ctx: &Context) -> Result<()> {
    let client = ctx.connect()?;
    let profile = client.me()?;

    if ctx.json {
        return print_json(&profile);
    }

    println!(
        "Agent:    {} ({})",
        profile.agent_id.cyan(),
        profile.agent_name.as_deref().unwrap_or("?")
    );
    println!("Credits:  {}", fmt_number(profile.credits).bold());
    println!("Tier:     {}", profile.tier.as_deref().unwrap_or("?"));
    println!(
        "Entries:  {}",
        profile.contributions.map_or_else(|| "?".to_string(), |n| n.to_string())
    );
    println!(
        "Earned:   {}  Spent: {}",
        fmt_number(profile.total_earned),
        fmt_number(profile.total_spent)
    );
    if let Some(email) = &profile.email {
        let verified = if profile.email_verified { "verified" } else { "unverified" };
        println!("Email:    {} ({})", email, verified);
    }
    Ok(())
}
