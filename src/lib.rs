//! Model Context Protocol server for a Memos note-taking instance.
//!
//! Exposes the Memos REST API as MCP tools, resources and prompts over
//! newline-delimited JSON-RPC, normalizing the legacy and current API
//! response shapes into one note representation.

pub mod config;
pub mod error;
pub mod handlers;
pub mod mcp;
pub mod models;
pub mod services;
pub mod utils;
