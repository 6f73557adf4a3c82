mod mcp_handler;
mod stdio_handler;

pub use mcp_handler::{mcp_handler, mcp_router, run_http_mcp_server, Dispatcher, PROTOCOL_VERSION, SERVER_NAME};
pub use stdio_handler::{run_stdio_mcp_server, serve_lines, serve_lines_until};
