//! `prior feedback` command
//!
//! # Usage
//! ```bash
//! prior feedback k_abc123 useful
//! prior feedback k_abc123 not_useful --reason "fails on 2.x"
//! echo '{"entryId": "k_1", "outcome": "useful"}' | prior feedback
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::{json, Value};

use super::input::{canonicalize, fmt_number, override_field, print_json, read_stdin_object, JsonObject};
use super::Context;
use crate::client::{FeedbackOutcome, FeedbackSubmission};
use crate::error::PriorError;
use crate::tools::args::FeedbackArgs as FeedbackInput;

const ID_ALIASES: &[&str] = &["entryId", "entry_id"];

#[derive(Args, Debug, Default)]
pub struct FeedbackArgs {
    /// Entry ID (e.g. k_abc123)
    pub id: Option<String>,

    /// Outcome: useful, not_useful, correction_verified or correction_rejected
    pub outcome: Option<FeedbackOutcome>,

    /// Why it was not useful (required for not_useful)
    #[arg(long)]
    pub reason: Option<String>,

    /// Additional notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Corrected content (100+ characters)
    #[arg(long)]
    pub correction: Option<String>,

    /// Title for the corrected content
    #[arg(long)]
    pub correction_title: Option<String>,

    /// Correction entry ID (for correction_verified/correction_rejected)
    #[arg(long)]
    pub correction_id: Option<String>,
}

/// Merge stdin fields with arguments into an entry id and a validated submission
pub fn build_submission(
    args: FeedbackArgs,
    stdin: Option<JsonObject>,
) -> Result<(String, FeedbackSubmission), PriorError> {
    let mut map = stdin.unwrap_or_default();
    canonicalize(&mut map, "id", ID_ALIASES);
    canonicalize(&mut map, "correctionId", &["correction_id"]);

    if let Some(id) = args.id {
        override_field(&mut map, "id", ID_ALIASES, Value::String(id));
    }
    if let Some(outcome) = args.outcome {
        map.insert("outcome".to_string(), Value::from(outcome.as_str()));
    }
    if let Some(reason) = args.reason {
        map.insert("reason".to_string(), Value::String(reason));
    }
    if let Some(notes) = args.notes {
        map.insert("notes".to_string(), Value::String(notes));
    }
    if let Some(correction_id) = args.correction_id {
        override_field(&mut map, "correctionId", &["correction_id"], Value::String(correction_id));
    }
    if let Some(content) = args.correction {
        let mut correction = json!({ "content": content });
        if let Some(title) = args.correction_title {
            correction["title"] = Value::String(title);
        }
        map.insert("correction".to_string(), correction);
    }

    if map.get("id").and_then(Value::as_str).map_or(true, |s| s.trim().is_empty()) {
        return Err(PriorError::validation("entry id is required"));
    }
    if !map.contains_key("outcome") {
        return Err(PriorError::validation("outcome is required"));
    }

    let input: FeedbackInput = serde_json::from_value(Value::Object(map))
        .map_err(|e| PriorError::validation(format!("invalid feedback: {}", e)))?;
    let (id, submission) = input.into_parts();
    submission.validate()?;
    Ok((id, submission))
}

pub fn run(ctx: &Context, args: FeedbackArgs) -> Result<()> {
    let (id, submission) = build_submission(args, read_stdin_object()?)?;

    let client = ctx.connect()?;
    let receipt = client.feedback(&id, &submission)?;

    if ctx.json {
        return print_json(&receipt);
    }

    println!(
        "{} Feedback recorded. Refund: {} credit(s)",
        "✓".green(),
        fmt_number(receipt.credits_refunded.or(Some(0.0)))
    );
    if let Some(previous) = &receipt.previous_outcome {
        println!("Replaced earlier feedback: {} → {}", previous, submission.outcome);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::error::ErrorKind;
    use clap::Parser;

    fn stdin(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    #[test]
    fn test_positional_args() {
        let cli = Cli::try_parse_from(["prior", "feedback", "k_abc", "useful"]).unwrap();
        let Some(Commands::Feedback(args)) = cli.command else {
            panic!("expected feedback");
        };
        let (id, submission) = build_submission(args, None).unwrap();
        assert_eq!(id, "k_abc");
        assert_eq!(submission.outcome, FeedbackOutcome::Useful);
    }

    #[test]
    fn test_invalid_outcome_rejected_by_parser() {
        assert!(Cli::try_parse_from(["prior", "feedback", "k_1", "bad"]).is_err());
    }

    #[test]
    fn test_stdin_provides_fields() {
        let (id, submission) = build_submission(
            FeedbackArgs::default(),
            stdin(json!({"entryId": "k_xyz", "outcome": "not_useful", "reason": "old"})),
        )
        .unwrap();
        assert_eq!(id, "k_xyz");
        assert_eq!(submission.outcome, FeedbackOutcome::NotUseful);
        assert_eq!(submission.reason.as_deref(), Some("old"));
    }

    #[test]
    fn test_args_override_stdin() {
        let args = FeedbackArgs {
            id: Some("k_new".into()),
            outcome: Some(FeedbackOutcome::NotUseful),
            reason: Some("broke on upgrade".into()),
            ..FeedbackArgs::default()
        };
        let (id, submission) =
            build_submission(args, stdin(json!({"entryId": "k_old", "outcome": "useful"}))).unwrap();
        assert_eq!(id, "k_new");
        assert_eq!(submission.outcome, FeedbackOutcome::NotUseful);
    }

    #[test]
    fn test_correction_from_stdin() {
        let (_, submission) = build_submission(
            FeedbackArgs::default(),
            stdin(json!({"entryId": "k_1", "outcome": "not_useful", "reason": "wrong flag",
                         "correction": {"content": "x".repeat(100), "title": "Fixed"}})),
        )
        .unwrap();
        let correction = submission.correction.unwrap();
        assert_eq!(correction.title.as_deref(), Some("Fixed"));
        assert_eq!(correction.content.len(), 100);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let err = build_submission(FeedbackArgs::default(), stdin(json!({"outcome": "useful"}))).unwrap_err();
        assert!(err.to_string().contains("entry id"));

        let err = build_submission(FeedbackArgs::default(), stdin(json!({"entryId": "k_1"}))).unwrap_err();
        assert!(err.to_string().contains("outcome"));

        let args = FeedbackArgs {
            id: Some("k_1".into()),
            outcome: Some(FeedbackOutcome::NotUseful),
            ..FeedbackArgs::default()
        };
        assert_eq!(build_submission(args, None).unwrap_err().kind(), ErrorKind::Validation);
    }
}
