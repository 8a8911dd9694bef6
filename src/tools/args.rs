//! Tool input shapes
//!
//! Field names are camelCase like the wire format; the snake_case spellings
//! agent frameworks tend to emit are accepted as aliases.

use serde::Deserialize;

use crate::client::{Correction, FeedbackOutcome, FeedbackSubmission, SearchContext, SearchQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArgs {
    pub query: String,
    #[serde(default, alias = "max_results")]
    pub max_results: Option<u32>,
    #[serde(default, alias = "min_quality")]
    pub min_quality: Option<f64>,
    #[serde(default, alias = "max_tokens")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: Option<SearchContext>,
}

impl From<SearchArgs> for SearchQuery {
    fn from(args: SearchArgs) -> Self {
        let mut query = SearchQuery::new(args.query);
        if let Some(n) = args.max_results {
            query.max_results = n;
        }
        // 0.0 is "no filter"
        query.min_quality = args.min_quality.filter(|q| *q > 0.0);
        query.max_tokens = args.max_tokens;
        query.tags = args.tags;
        if let Some(context) = args.context {
            query.context = context;
        }
        query
    }
}

/// A correction given either as plain text or as a full object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CorrectionArg {
    Text(String),
    Full(Correction),
}

impl From<CorrectionArg> for Correction {
    fn from(arg: CorrectionArg) -> Self {
        match arg {
            CorrectionArg::Text(content) => Correction {
                content,
                title: None,
                tags: Vec::new(),
            },
            CorrectionArg::Full(correction) => correction,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackArgs {
    #[serde(alias = "entryId", alias = "entry_id")]
    pub id: String,
    pub outcome: FeedbackOutcome,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub correction: Option<CorrectionArg>,
    #[serde(default, alias = "correction_id")]
    pub correction_id: Option<String>,
}

impl FeedbackArgs {
    pub fn into_parts(self) -> (String, FeedbackSubmission) {
        let submission = FeedbackSubmission {
            outcome: self.outcome,
            notes: self.notes,
            reason: self.reason,
            correction: self.correction.map(Correction::from),
            correction_id: self.correction_id,
        };
        (self.id, submission)
    }
}

/// Input naming a single knowledge entry
#[derive(Debug, Deserialize)]
pub struct EntryArgs {
    #[serde(alias = "entryId", alias = "entry_id")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaimArgs {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyArgs {
    pub code: String,
}
