//! Agent tools: status and the claim handshake

use std::sync::Arc;

use serde_json::{json, Value};

use super::args::{ClaimArgs, VerifyArgs};
use super::{parse_input, to_output, Tool};
use crate::client::PriorClient;
use crate::error::PriorError;
use crate::transport::Transport;

pub struct StatusTool<T> {
    client: Arc<PriorClient<T>>,
}

impl<T> StatusTool<T> {
    pub fn new(client: Arc<PriorClient<T>>) -> Self {
        Self { client }
    }
}

impl<T: Transport> Tool for StatusTool<T> {
    fn name(&self) -> &'static str {
        "prior_status"
    }

    fn description(&self) -> &'static str {
        "Check your Prior agent profile, credit balance, and contribution history."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn run(&self, _input: Value) -> Result<Value, PriorError> {
        let profile = self.client.me()?;
        let credits = self.client.credits()?;
        Ok(json!({
            "profile": to_output(&profile)?,
            "credits": credits,
        }))
    }
}

pub struct ClaimTool<T> {
    client: Arc<PriorClient<T>>,
}

impl<T> ClaimTool<T> {
    pub fn new(client: Arc<PriorClient<T>>) -> Self {
        Self { client }
    }
}

impl<T: Transport> Tool for ClaimTool<T> {
    fn name(&self) -> &'static str {
        "prior_claim"
    }

    fn description(&self) -> &'static str {
        "Start claiming this agent for a human account. Prior emails a one-time code; \
         finish with prior_verify."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "email": { "type": "string", "description": "Email address of the human owner" }
            },
            "required": ["email"]
        })
    }

    fn run(&self, input: Value) -> Result<Value, PriorError> {
        let args: ClaimArgs = parse_input(self.name(), input, Some("email"))?;
        self.client.claim(&args.email)
    }
}

pub struct VerifyTool<T> {
    client: Arc<PriorClient<T>>,
}

impl<T> VerifyTool<T> {
    pub fn new(client: Arc<PriorClient<T>>) -> Self {
        Self { client }
    }
}

impl<T: Transport> Tool for VerifyTool<T> {
    fn name(&self) -> &'static str {
        "prior_verify"
    }

    fn description(&self) -> &'static str {
        "Finish claiming this agent with the code from the email. Codes are single-use."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": { "type": "string", "description": "One-time code from the claim email" }
            },
            "required": ["code"]
        })
    }

    fn run(&self, input: Value) -> Result<Value, PriorError> {
        let args: VerifyArgs = parse_input(self.name(), input, Some("code"))?;
        self.client.verify(&args.code)
    }
}
