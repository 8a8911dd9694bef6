//! `prior claim` and `prior verify` commands
//!
//! Two-step handshake: `claim` has the server email a one-time code,
//! `verify` submits it.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::input::print_json;
use super::Context;
use crate::error::PriorError;

#[derive(Args, Debug)]
pub struct ClaimArgs {
    /// Email address of the human claiming this agent
    pub email: String,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// One-time code from the claim email
    pub code: String,
}

fn check_email(email: &str) -> Result<(), PriorError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(PriorError::validation("a valid email address is required"));
    }
    Ok(())
}

fn check_code(code: &str) -> Result<(), PriorError> {
    if code.trim().is_empty() {
        return Err(PriorError::validation("a verification code is required"));
    }
    Ok(())
}

pub fn run_claim(ctx: &Context, args: ClaimArgs) -> Result<()> {
    check_email(&args.email)?;

    let client = ctx.connect()?;
    let response = client.claim(&args.email)?;

    if ctx.json {
        return print_json(&response);
    }

    println!("{} Verification code sent to {}", "✓".green(), args.email.cyan());
    println!("Run `prior verify <code>` to finish claiming this agent.");
    Ok(())
}

pub fn run_verify(ctx: &Context, args: VerifyArgs) -> Result<()> {
    check_code(&args.code)?;

    let client = ctx.connect()?;
    let response = client.verify(&args.code)?;

    if ctx.json {
        return print_json(&response);
    }

    println!("{} Agent claimed successfully.", "✓".green());
    Ok(())
}
