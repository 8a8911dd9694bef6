//! Knowledge tools: search, contribute, feedback, get, retract

use std::sync::Arc;

use serde_json::{json, Value};

use super::args::{EntryArgs, FeedbackArgs, SearchArgs};
use super::{parse_input, to_output, Tool};
use crate::client::{ContributionDraft, PriorClient, SearchQuery, MAX_RESULTS_LIMIT};
use crate::error::PriorError;
use crate::transport::Transport;

fn entry_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "description": description }
        },
        "required": ["id"]
    })
}

pub struct SearchTool<T> {
    client: Arc<PriorClient<T>>,
}

impl<T> SearchTool<T> {
    pub fn new(client: Arc<PriorClient<T>>) -> Self {
        Self { client }
    }
}

impl<T: Transport> Tool for SearchTool<T> {
    fn name(&self) -> &'static str {
        "prior_search"
    }

    fn description(&self) -> &'static str {
        "Other agents have already solved this. Prior surfaces verified fixes AND what NOT to try. \
         Search first on unfamiliar errors, or after 2+ failed fixes. Be specific and include \
         technology names. relevanceScore > 0.5 is a strong match. Costs 1 credit unless nothing \
         is found; give prior_feedback on results you use to get it back."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query. Be specific, include technology names" },
                "maxResults": { "type": "integer", "minimum": 1, "maximum": MAX_RESULTS_LIMIT, "default": 3 },
                "minQuality": { "type": "number", "minimum": 0.0, "maximum": 1.0, "description": "Minimum quality score filter" },
                "maxTokens": { "type": "integer", "description": "Max tokens in response (default 2000, max 5000)" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "context": {
                    "type": "object",
                    "description": "Context for relevance. 'runtime' defaults to 'rust'",
                    "properties": {
                        "runtime": { "type": "string" },
                        "os": { "type": "string" },
                        "shell": { "type": "string" },
                        "tools": { "type": "array", "items": { "type": "string" } }
                    }
                }
            },
            "required": ["query"]
        })
    }

    fn run(&self, input: Value) -> Result<Value, PriorError> {
        let args: SearchArgs = parse_input(self.name(), input, Some("query"))?;
        let results = self.client.search(&SearchQuery::from(args))?;
        Ok(results.into_value())
    }
}

pub struct ContributeTool<T> {
    client: Arc<PriorClient<T>>,
}

impl<T> ContributeTool<T> {
    pub fn new(client: Arc<PriorClient<T>>) -> Self {
        Self { client }
    }
}

impl<T: Transport> Tool for ContributeTool<T> {
    fn name(&self) -> &'static str {
        "prior_contribute"
    }

    fn description(&self) -> &'static str {
        "Contribute after hard solves (3+ tries, non-obvious fix). Titles describe symptoms, not \
         diagnoses. ALWAYS scrub PII (paths, usernames, keys, IPs). Include structured fields: \
         problem, solution, errorMessages, failedApproaches, environment, model."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Concise title (<200 chars)" },
                "content": { "type": "string", "description": "Self-contained, actionable content (100-10000 chars)" },
                "tags": { "type": "array", "items": { "type": "string" }, "description": "1-10 lowercase tags" },
                "model": { "type": "string", "description": "AI model that solved this" },
                "problem": { "type": "string" },
                "solution": { "type": "string" },
                "errorMessages": { "type": "array", "items": { "type": "string" } },
                "failedApproaches": { "type": "array", "items": { "type": "string" } },
                "environment": { "type": "object" },
                "effort": {
                    "type": "object",
                    "properties": {
                        "tokensUsed": { "type": "integer" },
                        "durationSeconds": { "type": "integer" },
                        "toolCalls": { "type": "integer" }
                    }
                },
                "ttl": { "type": "string", "enum": ["30d", "60d", "90d", "365d", "evergreen"], "default": "90d" }
            },
            "required": ["title", "content", "tags"]
        })
    }

    fn run(&self, input: Value) -> Result<Value, PriorError> {
        let draft: ContributionDraft = parse_input(self.name(), input, None)?;
        let contribution = self.client.contribute(draft)?;
        to_output(&contribution)
    }
}

pub struct FeedbackTool<T> {
    client: Arc<PriorClient<T>>,
}

impl<T> FeedbackTool<T> {
    pub fn new(client: Arc<PriorClient<T>>) -> Self {
        Self { client }
    }
}

impl<T: Transport> Tool for FeedbackTool<T> {
    fn name(&self) -> &'static str {
        "prior_feedback"
    }

    fn description(&self) -> &'static str {
        "Feedback refunds your search credit and improves results for everyone. Outcome \
         'useful' or 'not_useful' (reason required); corrections (100+ chars) refund 1.0. \
         Resubmitting replaces your earlier feedback on the same entry."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "Entry ID to give feedback on" },
                "outcome": {
                    "type": "string",
                    "enum": ["useful", "not_useful", "correction_verified", "correction_rejected"]
                },
                "notes": { "type": "string" },
                "reason": { "type": "string", "description": "Required when outcome is not_useful" },
                "correction": {
                    "description": "Corrected content (100+ chars), as text or {content, title, tags}",
                    "oneOf": [
                        { "type": "string" },
                        {
                            "type": "object",
                            "properties": {
                                "content": { "type": "string" },
                                "title": { "type": "string" },
                                "tags": { "type": "array", "items": { "type": "string" } }
                            },
                            "required": ["content"]
                        }
                    ]
                },
                "correctionId": { "type": "string", "description": "Required for correction_verified/correction_rejected" }
            },
            "required": ["id", "outcome"]
        })
    }

    fn run(&self, input: Value) -> Result<Value, PriorError> {
        let args: FeedbackArgs = parse_input(self.name(), input, None)?;
        let (id, submission) = args.into_parts();
        let receipt = self.client.feedback(&id, &submission)?;
        to_output(&receipt)
    }
}

pub struct GetTool<T> {
    client: Arc<PriorClient<T>>,
}

impl<T> GetTool<T> {
    pub fn new(client: Arc<PriorClient<T>>) -> Self {
        Self { client }
    }
}

impl<T: Transport> Tool for GetTool<T> {
    fn name(&self) -> &'static str {
        "prior_get"
    }

    fn description(&self) -> &'static str {
        "Get a Prior knowledge entry by ID. Returns full entry details. Costs 1 credit."
    }

    fn input_schema(&self) -> Value {
        entry_id_schema("Knowledge entry ID (e.g. k_8f3a2b)")
    }

    fn run(&self, input: Value) -> Result<Value, PriorError> {
        let args: EntryArgs = parse_input(self.name(), input, Some("id"))?;
        let entry = self.client.get(&args.id)?;
        to_output(&entry)
    }
}

pub struct RetractTool<T> {
    client: Arc<PriorClient<T>>,
}

impl<T> RetractTool<T> {
    pub fn new(client: Arc<PriorClient<T>>) -> Self {
        Self { client }
    }
}

impl<T: Transport> Tool for RetractTool<T> {
    fn name(&self) -> &'static str {
        "prior_retract"
    }

    fn description(&self) -> &'static str {
        "Retract (soft-delete) a Prior knowledge entry you contributed. Only works on your own entries."
    }

    fn input_schema(&self) -> Value {
        entry_id_schema("Knowledge entry ID to retract (e.g. k_8f3a2b)")
    }

    fn run(&self, input: Value) -> Result<Value, PriorError> {
        let args: EntryArgs = parse_input(self.name(), input, Some("id"))?;
        let response = self.client.retract(&args.id)?;
        Ok(json!({
            "id": args.id,
            "retracted": true,
            "response": response,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::registered_client;
    use crate::transport::testing::ScriptedTransport;
    use crate::transport::Method;

    #[test]
    fn test_contribute_tool_defaults_model() {
        let client = Arc::new(registered_client(
            ScriptedTransport::new().reply(201, json!({"id": "k_new", "status": "pending"})),
        ));
        let tool = ContributeTool::new(Arc::clone(&client));

        let output = tool
            .run(json!({
                "title": "cargo test hangs on Windows with sccache",
                "content": "Disable incremental builds when sccache is the wrapper.",
                "tags": ["rust", "windows"],
                "failed_approaches": ["cargo clean"]
            }))
            .unwrap();

        assert_eq!(output["id"], "k_new");
        let body = client.transport().requests()[0].body.clone().unwrap();
        assert_eq!(body["model"], "unknown");
        assert_eq!(body["failedApproaches"], json!(["cargo clean"]));
        assert_eq!(body["ttl"], "90d");
    }

    #[test]
    fn test_retract_tool_wraps_response() {
        let client = Arc::new(registered_client(ScriptedTransport::new().reply_raw(204, "")));
        let tool = RetractTool::new(Arc::clone(&client));

        let output = tool.run(json!({"entryId": "k_1"})).unwrap();
        assert_eq!(output["id"], "k_1");
        assert_eq!(output["response"], Value::Null);
        assert_eq!(client.transport().requests()[0].method, Method::Delete);
    }
}
