//! Error types for the Memos MCP server
//!
//! Three families of failure exist: startup configuration problems, upstream
//! Memos API failures, and routing failures at the JSON-RPC layer. Only the
//! last family ever reaches the top-level `error` field of an envelope.

use thiserror::Error;

/// Configuration could not be loaded or validated at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is required. Please set it in your environment or .env file")]
    Missing(&'static str),

    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },

    #[error("MCP_TRANSPORT must be 'stdio' or 'http', got {0:?}")]
    UnknownTransport(String),
}

/// Failure talking to the upstream Memos REST API
#[derive(Error, Debug)]
pub enum MemosApiError {
    /// Non-2xx response
    #[error("Memos API error: {status} - {body}")]
    Status { status: u16, body: String },

    /// Connection failure or timeout
    #[error("Failed to connect to Memos: {0}")]
    Transport(String),

    /// 2xx response whose body was not JSON
    #[error("Unexpected response from Memos: {0}")]
    Decode(String),
}

impl MemosApiError {
    /// HTTP status code, when the upstream produced one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            MemosApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MemosApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MemosApiError::Transport(format!("request timed out: {}", err))
        } else {
            MemosApiError::Transport(err.to_string())
        }
    }
}

/// Failure inside a single tool invocation, reported in the tool result payload
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Api(#[from] MemosApiError),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: &'static str, message: String },

    #[error("{0}")]
    Other(String),
}

impl ToolError {
    pub fn invalid(tool: &'static str, message: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            tool,
            message: message.into(),
        }
    }
}

/// Routing failure, reported through the envelope's top-level `error`
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),

    #[error("Unknown resource URI: {0}")]
    UnknownResource(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// JSON-RPC error code for this failure
    pub fn code(&self) -> i32 {
        match self {
            DispatchError::Parse(_) => -32700,
            DispatchError::InvalidRequest(_) => -32600,
            DispatchError::MethodNotFound(_) => -32601,
            DispatchError::UnknownTool(_)
            | DispatchError::UnknownPrompt(_)
            | DispatchError::UnknownResource(_)
            | DispatchError::InvalidParams(_) => -32602,
            DispatchError::Internal(_) => -32603,
        }
    }
}
