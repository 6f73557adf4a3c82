use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use memos_mcp::config::{Config, Transport, DEFAULT_LOG_LEVEL};
use memos_mcp::handlers::{run_http_mcp_server, run_stdio_mcp_server, Dispatcher};
use memos_mcp::mcp::Registry;
use memos_mcp::services::MemosClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env();

    // Logs go to stderr; stdout carries the JSON-RPC stream
    let level = config.as_ref().map_or(DEFAULT_LOG_LEVEL, |c| c.log_level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config.context("Configuration error. Please check your .env file or environment variables")?;

    let client = MemosClient::new(&config).context("Failed to build Memos client")?;
    info!("Starting Memos MCP server...");
    info!("Connected to Memos instance: {}", config.base_url);

    let registry = Arc::new(Registry::new());
    let dispatcher = Dispatcher::new(Arc::new(client), registry);

    match config.transport {
        Transport::Stdio => run_stdio_mcp_server(&dispatcher).await?,
        Transport::Http => run_http_mcp_server(Arc::new(dispatcher), config.port).await?,
    }

    Ok(())
}
