use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use super::mcp_handler::Dispatcher;
use crate::mcp::{MCPError, MCPResponse};
use crate::services::MemosApi;

/// Resolves on the first Ctrl-C; never resolves if the handler cannot be installed
pub(crate) async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Server stopped by user"),
        Err(e) => {
            warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Serve newline-delimited JSON-RPC on stdin/stdout until EOF or Ctrl-C
pub async fn run_stdio_mcp_server<T: MemosApi>(dispatcher: &Dispatcher<T>) -> anyhow::Result<()> {
    info!("Starting Memos MCP server with stdio transport...");
    serve_lines(dispatcher, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Read one request per line, write one response per line, until EOF or Ctrl-C
pub async fn serve_lines<T, R, W>(dispatcher: &Dispatcher<T>, reader: R, writer: W) -> anyhow::Result<()>
where
    T: MemosApi,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    serve_lines_until(dispatcher, reader, writer, shutdown_signal()).await
}

/// Read one request per line, write one response per line, until EOF or
/// `shutdown` completes.
///
/// Requests are handled strictly one at a time. `shutdown` is polled before
/// each read, so a signal that arrives mid-dispatch stops the loop once the
/// current response has been written.
pub async fn serve_lines_until<T, R, W, S>(
    dispatcher: &Dispatcher<T>,
    reader: R,
    mut writer: W,
    shutdown: S,
) -> anyhow::Result<()>
where
    T: MemosApi,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = reader.lines();
    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            biased;
            () = &mut shutdown => break,
            line = lines.next_line() => line?,
        };

        let Some(line) = next else {
            info!("Server connection closed");
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(response) = dispatcher.handle_line(line).await else {
            continue;
        };

        let mut encoded = serde_json::to_string(&response).unwrap_or_else(|e| {
            error!("Failed to serialize response: {}", e);
            let fallback = MCPResponse::failure(
                response.id.clone(),
                MCPError::new(-32603, "Internal error: response could not be serialized"),
            );
            serde_json::to_string(&fallback).unwrap_or_default()
        });
        debug!("Sending response: {}", encoded);
        encoded.push('\n');

        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}
