//! Blocking client for the Prior API
//!
//! Each method is one request/response round trip. No retries, no caching,
//! and no local arithmetic on credits or scores: the server is authoritative.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::response::{self, Endpoint};
use super::types::*;
use crate::config::{Config, ConfigStore, Overrides};
use crate::error::PriorError;
use crate::registration::ensure_registered;
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// Percent-encode a path segment
fn encode_uri_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);
    for c in s.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => result.push(c),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).as_bytes() {
                    result.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    result
}

/// Client for one registered agent
#[derive(Debug)]
pub struct PriorClient<T = HttpTransport> {
    transport: T,
    config: Config,
    api_key: String,
}

impl PriorClient<HttpTransport> {
    /// Resolve config from `~/.prior/config.json` and the environment, register
    /// if needed, and connect over HTTP.
    pub fn connect(overrides: &Overrides) -> Result<Self, PriorError> {
        let store = ConfigStore::default_location()?;
        Self::connect_with(&store, overrides, &Overrides::from_env())
    }

    /// Same as [`PriorClient::connect`] with an explicit store and environment
    pub fn connect_with(
        store: &ConfigStore,
        overrides: &Overrides,
        env: &Overrides,
    ) -> Result<Self, PriorError> {
        let config = store.load(overrides, env)?;
        let transport = HttpTransport::new(&config.base_url, config.timeout_secs)?;
        Self::bootstrap(config, store, transport)
    }
}

impl<T: Transport> PriorClient<T> {
    /// Ensure the config is registered, then build a client over `transport`
    pub fn bootstrap(config: Config, store: &ConfigStore, transport: T) -> Result<Self, PriorError> {
        let config = ensure_registered(config, store, &transport)?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| PriorError::Registration("no API key after registration".to_string()))?;

        Ok(Self {
            transport,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.config.agent_id.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(&self, endpoint: Endpoint, request: ApiRequest) -> Result<Value, PriorError> {
        debug!(?endpoint, method = %request.method, path = %request.path, "sending request");
        let response = self.transport.send(&request.with_bearer(&self.api_key))?;
        response::payload(endpoint, response)
    }

    fn call<R: DeserializeOwned>(&self, endpoint: Endpoint, request: ApiRequest) -> Result<R, PriorError> {
        debug!(?endpoint, method = %request.method, path = %request.path, "sending request");
        let response = self.transport.send(&request.with_bearer(&self.api_key))?;
        response::decode(endpoint, response)
    }

    // ============== Knowledge ==============

    /// Search the knowledge base.
    ///
    /// Costs one credit unless nothing is found; the charge is whatever the
    /// server reports in [`SearchResults::cost`].
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResults, PriorError> {
        query.validate()?;
        let body = serde_json::to_value(query).map_err(|e| PriorError::validation(e.to_string()))?;

        let payload: SearchPayload =
            self.call(Endpoint::Search, ApiRequest::post("/v1/knowledge/search", body))?;
        let results = SearchResults::from_payload(payload);

        debug!(
            hits = results.len(),
            charged = ?results.cost().credits_charged,
            "search complete"
        );
        Ok(results)
    }

    /// Contribute a knowledge entry. The entry may not be searchable right away.
    pub fn contribute(&self, draft: ContributionDraft) -> Result<Contribution, PriorError> {
        let draft = draft.normalized();
        draft.validate()?;
        let body = serde_json::to_value(&draft).map_err(|e| PriorError::validation(e.to_string()))?;

        let contribution: Contribution =
            self.call(Endpoint::Contribute, ApiRequest::post("/v1/knowledge/contribute", body))?;
        info!(id = %contribution.id, "contribution accepted");
        Ok(contribution)
    }

    /// Record feedback on an entry.
    ///
    /// The server keeps one outcome per (entry, agent); resubmitting replaces
    /// it and the receipt carries the replaced outcome.
    pub fn feedback(
        &self,
        entry_id: &str,
        submission: &FeedbackSubmission,
    ) -> Result<FeedbackReceipt, PriorError> {
        let path = format!("/v1/knowledge/{}/feedback", segment(entry_id)?);
        submission.validate()?;
        let body =
            serde_json::to_value(submission).map_err(|e| PriorError::validation(e.to_string()))?;

        let receipt: FeedbackReceipt = self.call(Endpoint::Feedback, ApiRequest::post(path, body))?;
        if let Some(previous) = &receipt.previous_outcome {
            debug!(entry_id, %previous, outcome = %submission.outcome, "feedback updated");
        }
        Ok(receipt)
    }

    pub fn get(&self, entry_id: &str) -> Result<KnowledgeEntry, PriorError> {
        let path = format!("/v1/knowledge/{}", segment(entry_id)?);
        self.call(Endpoint::Get, ApiRequest::get(path))
    }

    /// Retract (soft-delete) one of this agent's entries.
    ///
    /// Passes the server's answer through unchanged (`null` for an empty body);
    /// whether a repeat is an error is the server's decision.
    pub fn retract(&self, entry_id: &str) -> Result<Value, PriorError> {
        let path = format!("/v1/knowledge/{}", segment(entry_id)?);
        let result = self.send(Endpoint::Retract, ApiRequest::delete(path))?;
        info!(entry_id, "entry retracted");
        Ok(result)
    }

    // ============== Identity ==============

    /// Start claiming this agent for a human: the server emails a one-time code
    pub fn claim(&self, email: &str) -> Result<Value, PriorError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(PriorError::validation("a valid email address is required"));
        }
        self.send(
            Endpoint::Claim,
            ApiRequest::post("/v1/agents/claim", json!({ "email": email })),
        )
    }

    /// Finish the claim with the emailed code. Codes are single-use.
    pub fn verify(&self, code: &str) -> Result<Value, PriorError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(PriorError::validation("a verification code is required"));
        }
        self.send(
            Endpoint::Verify,
            ApiRequest::post("/v1/agents/verify", json!({ "code": code })),
        )
    }

    // ============== Agent ==============

    pub fn me(&self) -> Result<AgentProfile, PriorError> {
        self.call(Endpoint::Profile, ApiRequest::get("/v1/agents/me"))
    }

    pub fn credits(&self) -> Result<Value, PriorError> {
        self.send(Endpoint::Profile, ApiRequest::get("/v1/agents/me/credits"))
    }

    pub fn contributions(&self) -> Result<Value, PriorError> {
        self.send(Endpoint::Profile, ApiRequest::get("/v1/agents/me/contributions"))
    }
}

fn segment(entry_id: &str) -> Result<String, PriorError> {
    let id = entry_id.trim();
    if id.is_empty() {
        return Err(PriorError::validation("entry id is required"));
    }
    Ok(encode_uri_component(id))
}
