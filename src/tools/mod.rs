//! Tool façade
//!
//! Each Prior capability as a self-describing tool an agent framework can
//! call with a JSON input. All tools share one client.
//!
//! # Tools
//! - `prior_search` - Search the knowledge base
//! - `prior_contribute` - Contribute a solved problem
//! - `prior_feedback` - Rate a result (refunds credit)
//! - `prior_get` - Fetch one entry
//! - `prior_retract` - Retract one of your entries
//! - `prior_status` - Profile and credit balance
//! - `prior_claim` / `prior_verify` - Claim the agent for a human

mod agent;
pub mod args;
mod knowledge;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::client::PriorClient;
use crate::error::PriorError;
use crate::transport::{Transport, TransportError};

pub use agent::{ClaimTool, StatusTool, VerifyTool};
pub use knowledge::{ContributeTool, FeedbackTool, GetTool, RetractTool, SearchTool};

/// A single agent-callable capability
pub trait Tool {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema of the accepted input object
    fn input_schema(&self) -> Value;

    /// Run the tool. Client errors are returned unchanged.
    fn run(&self, input: Value) -> Result<Value, PriorError>;
}

/// Every tool, wired to one shared client
pub struct Toolkit {
    tools: Vec<Box<dyn Tool>>,
}

impl Toolkit {
    pub fn new<T: Transport + 'static>(client: Arc<PriorClient<T>>) -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(SearchTool::new(Arc::clone(&client))),
            Box::new(ContributeTool::new(Arc::clone(&client))),
            Box::new(FeedbackTool::new(Arc::clone(&client))),
            Box::new(GetTool::new(Arc::clone(&client))),
            Box::new(RetractTool::new(Arc::clone(&client))),
            Box::new(StatusTool::new(Arc::clone(&client))),
            Box::new(ClaimTool::new(Arc::clone(&client))),
            Box::new(VerifyTool::new(client)),
        ];
        Self { tools }
    }

    pub fn tools(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|t| t.as_ref())
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools().find(|t| t.name() == name)
    }

    pub fn call(&self, name: &str, input: Value) -> Result<Value, PriorError> {
        let tool = self
            .find(name)
            .ok_or_else(|| PriorError::validation(format!("unknown tool: {}", name)))?;
        tool.run(input)
    }

    /// Tool listing in MCP shape: `name`, `description`, `inputSchema`
    pub fn describe(&self) -> Vec<Value> {
        self.tools()
            .map(|t| {
                json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": t.input_schema(),
                })
            })
            .collect()
    }
}

/// Decode a tool input. A bare string is accepted as `bare_field` when given.
fn parse_input<A: DeserializeOwned>(
    tool: &str,
    input: Value,
    bare_field: Option<&str>,
) -> Result<A, PriorError> {
    let input = match (input, bare_field) {
        (Value::String(s), Some(field)) => {
            let mut map = Map::new();
            map.insert(field.to_string(), Value::String(s));
            Value::Object(map)
        }
        (Value::Null, _) => Value::Object(Map::new()),
        (other, _) => other,
    };
    serde_json::from_value(input)
        .map_err(|e| PriorError::validation(format!("invalid input for {}: {}", tool, e)))
}

fn to_output<S: Serialize>(value: &S) -> Result<Value, PriorError> {
    serde_json::to_value(value).map_err(|e| PriorError::Transport(TransportError::Decode(e.to_string())))
}
