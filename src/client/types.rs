//! Prior API types
//!
//! Request payloads are validated locally before they are sent; response types
//! keep unknown server fields in `extra` so nothing is lost when re-serialized.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::PriorError;

/// Results returned when a search does not ask for a specific count
pub const DEFAULT_MAX_RESULTS: u32 = 3;
pub const MAX_RESULTS_LIMIT: u32 = 10;

/// Model name sent when a contribution does not say which model produced it
pub const DEFAULT_MODEL: &str = "unknown";

/// Runtime reported in the search context when the caller gives none
pub const DEFAULT_RUNTIME: &str = "rust";

/// Minimum length of correction content attached to feedback
pub const MIN_CORRECTION_CHARS: usize = 100;

// ============== Search ==============

/// Environment the searching agent runs in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchContext {
    #[serde(default = "default_runtime")]
    pub runtime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_runtime() -> String {
    DEFAULT_RUNTIME.to_string()
}

impl Default for SearchContext {
    fn default() -> Self {
        Self {
            runtime: default_runtime(),
            os: None,
            shell: None,
            tools: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// A search request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query: String,
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_quality: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub context: SearchContext,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: DEFAULT_MAX_RESULTS,
            min_quality: None,
            max_tokens: None,
            tags: Vec::new(),
            context: SearchContext::default(),
        }
    }

    pub fn max_results(mut self, n: u32) -> Self {
        self.max_results = n;
        self
    }

    pub fn context(mut self, context: SearchContext) -> Self {
        self.context = context;
        self
    }

    pub fn validate(&self) -> Result<(), PriorError> {
        if self.query.trim().is_empty() {
            return Err(PriorError::validation("search query is required"));
        }
        if !(1..=MAX_RESULTS_LIMIT).contains(&self.max_results) {
            return Err(PriorError::validation(format!(
                "maxResults must be between 1 and {}",
                MAX_RESULTS_LIMIT
            )));
        }
        if let Some(q) = self.min_quality {
            if !(0.0..=1.0).contains(&q) {
                return Err(PriorError::validation("minQuality must be between 0.0 and 1.0"));
            }
        }
        if self.context.runtime.trim().is_empty() {
            return Err(PriorError::validation("context.runtime is required"));
        }
        Ok(())
    }
}

/// One ranked result. `id` is opaque and usable with `get` and `feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_level: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_approaches: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What the server charged for a search. Never computed locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits_charged: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_remaining: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wire shape of a search response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchPayload {
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub do_not_try: Vec<String>,
    #[serde(default)]
    pub cost: SearchCost,
    #[serde(default)]
    pub search_id: Option<String>,
}

/// Ranked results of one search.
///
/// Iterating consumes the results; a search cannot be replayed without another
/// (charged) call. An empty result set is a successful search.
#[derive(Debug)]
pub struct SearchResults {
    hits: std::vec::IntoIter<SearchHit>,
    cost: SearchCost,
    do_not_try: Vec<String>,
    search_id: Option<String>,
}

impl SearchResults {
    pub(crate) fn from_payload(payload: SearchPayload) -> Self {
        Self {
            hits: payload.results.into_iter(),
            cost: payload.cost,
            do_not_try: payload.do_not_try,
            search_id: payload.search_id,
        }
    }

    pub fn cost(&self) -> &SearchCost {
        &self.cost
    }

    /// Approaches the server says not to try for this query
    pub fn do_not_try(&self) -> &[String] {
        &self.do_not_try
    }

    pub fn search_id(&self) -> Option<&str> {
        self.search_id.as_deref()
    }

    /// Whether the server reported a non-zero charge for this search
    pub fn was_charged(&self) -> bool {
        self.cost.credits_charged.is_some_and(|c| c > 0.0)
    }

    /// Remaining hits and metadata as a JSON document
    pub fn into_value(self) -> Value {
        let hits: Vec<SearchHit> = self.hits.collect();
        let mut doc = json!({
            "results": hits,
            "doNotTry": self.do_not_try,
            "cost": self.cost,
        });
        if let Some(id) = self.search_id {
            doc["searchId"] = Value::String(id);
        }
        doc
    }
}

impl Iterator for SearchResults {
    type Item = SearchHit;

    fn next(&mut self) -> Option<SearchHit> {
        self.hits.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.hits.size_hint()
    }
}

impl ExactSizeIterator for SearchResults {}

impl std::iter::FusedIterator for SearchResults {}

// ============== Contributions ==============

/// How long a contribution stays searchable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ttl {
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "60d")]
    Days60,
    #[default]
    #[serde(rename = "90d")]
    Days90,
    #[serde(rename = "365d")]
    Days365,
    #[serde(rename = "evergreen")]
    Evergreen,
}

impl Ttl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ttl::Days30 => "30d",
            Ttl::Days60 => "60d",
            Ttl::Days90 => "90d",
            Ttl::Days365 => "365d",
            Ttl::Evergreen => "evergreen",
        }
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ttl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "30d" => Ok(Ttl::Days30),
            "60d" => Ok(Ttl::Days60),
            "90d" => Ok(Ttl::Days90),
            "365d" => Ok(Ttl::Days365),
            "evergreen" => Ok(Ttl::Evergreen),
            other => Err(format!(
                "invalid ttl '{}': expected 30d, 60d, 90d, 365d or evergreen",
                other
            )),
        }
    }
}

/// What solving the problem cost the contributing agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effort {
    #[serde(default, alias = "tokens_used", skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    #[serde(default, alias = "duration_seconds", skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(default, alias = "tool_calls", skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<u64>,
}

impl Effort {
    pub fn is_empty(&self) -> bool {
        self.tokens_used.is_none() && self.duration_seconds.is_none() && self.tool_calls.is_none()
    }
}

/// A knowledge record to contribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, alias = "error_messages", skip_serializing_if = "Vec::is_empty")]
    pub error_messages: Vec<String>,
    #[serde(default, alias = "failed_approaches", skip_serializing_if = "Vec::is_empty")]
    pub failed_approaches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<Effort>,
    #[serde(default)]
    pub ttl: Ttl,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl ContributionDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags,
            model: default_model(),
            problem: None,
            solution: None,
            error_messages: Vec::new(),
            failed_approaches: Vec::new(),
            environment: None,
            effort: None,
            ttl: Ttl::default(),
        }
    }

    /// Tags trimmed, blanks and duplicates dropped (first occurrence kept);
    /// blank model replaced by the default; empty effort dropped.
    pub fn normalized(mut self) -> Self {
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        self.tags = tags;

        if self.model.trim().is_empty() {
            self.model = default_model();
        }
        if self.effort.as_ref().is_some_and(Effort::is_empty) {
            self.effort = None;
        }
        self
    }

    /// Required fields are present
    pub fn validate(&self) -> Result<(), PriorError> {
        if self.title.trim().is_empty() {
            return Err(PriorError::validation("title is required"));
        }
        if self.content.trim().is_empty() {
            return Err(PriorError::validation("content is required"));
        }
        if self.tags.iter().all(|t| t.trim().is_empty()) {
            return Err(PriorError::validation("at least one tag is required"));
        }
        Ok(())
    }
}

/// Server acknowledgement of a contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits_earned: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A full knowledge entry as returned by `get`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============== Feedback ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackOutcome {
    Useful,
    NotUseful,
    CorrectionVerified,
    CorrectionRejected,
}

impl FeedbackOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackOutcome::Useful => "useful",
            FeedbackOutcome::NotUseful => "not_useful",
            FeedbackOutcome::CorrectionVerified => "correction_verified",
            FeedbackOutcome::CorrectionRejected => "correction_rejected",
        }
    }

    fn needs_correction_id(&self) -> bool {
        matches!(
            self,
            FeedbackOutcome::CorrectionVerified | FeedbackOutcome::CorrectionRejected
        )
    }
}

impl fmt::Display for FeedbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "useful" => Ok(FeedbackOutcome::Useful),
            "not_useful" => Ok(FeedbackOutcome::NotUseful),
            "correction_verified" => Ok(FeedbackOutcome::CorrectionVerified),
            "correction_rejected" => Ok(FeedbackOutcome::CorrectionRejected),
            other => Err(format!(
                "invalid outcome '{}': expected useful, not_useful, correction_verified or correction_rejected",
                other
            )),
        }
    }
}

/// Replacement content proposed alongside negative feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Feedback body. The server keys it by (entry, agent) and upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    pub outcome: FeedbackOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<Correction>,
    #[serde(default, alias = "correction_id", skip_serializing_if = "Option::is_none")]
    pub correction_id: Option<String>,
}

impl FeedbackSubmission {
    pub fn new(outcome: FeedbackOutcome) -> Self {
        Self {
            outcome,
            notes: None,
            reason: None,
            correction: None,
            correction_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), PriorError> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());

        if self.outcome == FeedbackOutcome::NotUseful && blank(&self.reason) {
            return Err(PriorError::validation("a reason is required for not_useful feedback"));
        }
        if self.outcome.needs_correction_id() && blank(&self.correction_id) {
            return Err(PriorError::validation(format!(
                "correctionId is required for {} feedback",
                self.outcome
            )));
        }
        if let Some(correction) = &self.correction {
            if correction.content.trim().chars().count() < MIN_CORRECTION_CHARS {
                return Err(PriorError::validation(format!(
                    "correction content must be at least {} characters",
                    MIN_CORRECTION_CHARS
                )));
            }
        }
        Ok(())
    }
}

/// An outcome as reported back by the server.
///
/// Values this client does not know yet are kept verbatim instead of failing
/// the decode of a response whose feedback was already stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordedOutcome {
    Known(FeedbackOutcome),
    Other(String),
}

impl RecordedOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            RecordedOutcome::Known(outcome) => outcome.as_str(),
            RecordedOutcome::Other(raw) => raw,
        }
    }

    pub fn known(&self) -> Option<FeedbackOutcome> {
        match self {
            RecordedOutcome::Known(outcome) => Some(*outcome),
            RecordedOutcome::Other(_) => None,
        }
    }
}

impl fmt::Display for RecordedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a feedback upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits_refunded: Option<f64>,
    /// Outcome this agent had recorded before, when this call replaced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_outcome: Option<RecordedOutcome>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedbackReceipt {
    pub fn is_update(&self) -> bool {
        self.previous_outcome.is_some()
    }
}

// ============== Agents ==============

/// The calling agent as the server sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_earned: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_spent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
