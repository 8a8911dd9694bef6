//! MCP server over the Prior toolkit
//!
//! Implements the Model Context Protocol (JSON-RPC 2.0, one message per line)
//! directly without external SDK dependencies.

use std::io::{BufRead, BufReader, Write};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::jsonrpc::*;
use crate::error::PriorError;
use crate::tools::Toolkit;

const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP request handler
pub struct McpServer {
    toolkit: Toolkit,
    initialized: bool,
}

impl McpServer {
    pub fn new(toolkit: Toolkit) -> Self {
        Self {
            toolkit,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Handle one request. Notifications (no `id` member) get no response.
    pub fn handle_request(&mut self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            match request.method.as_str() {
                "notifications/initialized" => {
                    self.initialized = true;
                    info!("MCP client initialized");
                }
                "notifications/cancelled" => debug!("MCP request cancelled"),
                other => debug!(method = other, "ignoring MCP notification"),
            }
            return None;
        };

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "tools/list" => Ok(self.handle_list_tools()),
            "tools/call" => self.handle_call_tool(&request.params),
            "ping" => Ok(json!({})),
            _ => Err((METHOD_NOT_FOUND, format!("Method not found: {}", request.method))),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err((code, msg)) => JsonRpcResponse::error(id, code, msg),
        })
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": "prior",
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": "Prior is a knowledge exchange for AI agents. Use prior_search before \
                             debugging unfamiliar errors, prior_feedback after using a result, and \
                             prior_contribute after a hard-won fix."
        })
    }

    fn handle_list_tools(&self) -> Value {
        json!({ "tools": self.toolkit.describe() })
    }

    fn handle_call_tool(&self, params: &Value) -> Result<Value, (i64, String)> {
        let name = params["name"]
            .as_str()
            .ok_or((INVALID_PARAMS, "Missing tool name".to_string()))?;
        if self.toolkit.find(name).is_none() {
            return Err((INVALID_PARAMS, format!("Unknown tool: {}", name)));
        }
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        debug!(tool = name, "tool call");
        Ok(match self.toolkit.call(name, arguments) {
            Ok(output) => {
                let text = serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string());
                json!({
                    "content": [{ "type": "text", "text": text }],
                    "structuredContent": output
                })
            }
            Err(e) => {
                warn!(tool = name, kind = %e.kind(), error = %e, "tool call failed");
                tool_error(&e)
            }
        })
    }

    /// Serve newline-delimited requests from `reader` until EOF
    pub fn serve<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> anyhow::Result<()> {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            debug!(received = %truncate(&line, 100), "MCP message");

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(req) => req,
                Err(e) => {
                    let response =
                        JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("Parse error: {}", e));
                    writeln!(writer, "{}", serde_json::to_string(&response)?)?;
                    writer.flush()?;
                    continue;
                }
            };

            if let Some(response) = self.handle_request(&request) {
                let json = serde_json::to_string(&response)?;
                debug!(sending = %truncate(&json, 100), "MCP message");
                writeln!(writer, "{}", json)?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

/// Tool failure as MCP content, carrying the error kind
fn tool_error(err: &PriorError) -> Value {
    let mut text = format!("Error ({}): {}", err.kind(), err);
    if let Some(hint) = err.hint() {
        text.push_str(&format!("\nHint: {}", hint));
    }
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": true,
        "_meta": {
            "errorKind": err.kind(),
            "retryable": err.kind().is_retryable()
        }
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Run the MCP server with STDIO transport
pub fn run_mcp_server(toolkit: Toolkit) -> anyhow::Result<()> {
    info!("prior MCP server starting");

    let mut server = McpServer::new(toolkit);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    server.serve(BufReader::new(stdin.lock()), stdout.lock())?;

    info!("prior MCP server stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::registered_client;
    use crate::transport::testing::ScriptedTransport;
    use std::io::Cursor;
    use std::sync::Arc;

    fn server(transport: ScriptedTransport) -> McpServer {
        McpServer::new(Toolkit::new(Arc::new(registered_client(transport))))
    }

    fn request(id: Option<Value>, method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }

    fn roundtrip(server: &mut McpServer, input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        server.serve(Cursor::new(input.to_string()), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_initialize_and_list() {
        let mut server = server(ScriptedTransport::new());

        let init = server
            .handle_request(&request(Some(json!(1)), "initialize", json!({})))
            .unwrap();
        let result = init.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "prior");

        assert!(server
            .handle_request(&request(None, "notifications/initialized", Value::Null))
            .is_none());
        assert!(server.is_initialized());

        let list = server
            .handle_request(&request(Some(json!(2)), "tools/list", json!({})))
            .unwrap();
        assert_eq!(list.result.unwrap()["tools"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_unknown_method() {
        let mut server = server(ScriptedTransport::new());
        let response = server
            .handle_request(&request(Some(json!("a")), "resources/list", json!({})))
            .unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
        assert_eq!(response.id, json!("a"));
    }

    #[test]
    fn test_tool_call_success() {
        let mut server = server(ScriptedTransport::new().reply(
            200,
            json!({"results": [{"id": "k_1", "title": "Fix"}], "cost": {"creditsCharged": 1}}),
        ));

        let response = server
            .handle_request(&request(
                Some(json!(3)),
                "tools/call",
                json!({"name": "prior_search", "arguments": {"query": "tokio runtime panic"}}),
            ))
            .unwrap();

        let result = response.result.unwrap();
        assert!(result.get("isError").is_none());
        assert_eq!(result["structuredContent"]["results"][0]["id"], "k_1");
        assert!(result["content"][0]["text"].as_str().unwrap().contains("k_1"));
    }

    #[test]
    fn test_tool_failure_carries_kind() {
        let mut server =
            server(ScriptedTransport::new().reply(401, json!({"error": "Invalid API key"})));

        let response = server
            .handle_request(&request(
                Some(json!(4)),
                "tools/call",
                json!({"name": "prior_get", "arguments": "k_1"}),
            ))
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["_meta"]["errorKind"], "auth");
        assert!(result["content"][0]["text"].as_str().unwrap().contains("auth_error"));
    }

    #[test]
    fn test_unknown_tool_is_invalid_params() {
        let mut server = server(ScriptedTransport::new());
        let response = server
            .handle_request(&request(Some(json!(5)), "tools/call", json!({"name": "kb_search"})))
            .unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[test]
    fn test_serve_stream() {
        let mut server = server(ScriptedTransport::new());
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "\n",
            "not json\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n",
        );

        let responses = roundtrip(&mut server, input);

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"], json!({}));
        assert_eq!(responses[1]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[2]["id"], 2);
    }

    #[test]
    fn test_null_id_is_answered() {
        let mut server = server(ScriptedTransport::new());
        let responses = roundtrip(
            &mut server,
            "{\"jsonrpc\":\"2.0\",\"id\":null,\"method\":\"ping\"}\n",
        );

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["result"], json!({}));
    }
}
