//! MCP (Model Context Protocol) server
//!
//! Exposes the Prior tools over JSON-RPC 2.0 on stdio so MCP-capable agents
//! can search and contribute without a framework plugin.

mod jsonrpc;
mod server;

pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::{run_mcp_server, McpServer};
