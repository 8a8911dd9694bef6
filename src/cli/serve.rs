//! Serve command - Start MCP server

use std::sync::Arc;

use anyhow::Result;

use super::Context;
use crate::mcp::run_mcp_server;
use crate::tools::Toolkit;

/// Serve the Prior tools over MCP on stdio until stdin closes
pub fn run(ctx: &Context) -> Result<()> {
    // Register before the first request so a failure is reported at startup.
    let client = Arc::new(ctx.connect()?);
    run_mcp_server(Toolkit::new(client))
}
