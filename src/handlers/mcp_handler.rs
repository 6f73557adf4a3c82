use axum::{extract::State, routing::post, Json, Router};
use futures::FutureExt;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::stdio_handler::shutdown_signal;
use crate::error::DispatchError;
use crate::mcp::registry::{PromptName, Registry, ResourceRoute, ToolName};
use crate::mcp::server::{render_prompt, MemosMcpServer};
use crate::mcp::{MCPError, MCPRequest, MCPResponse, McpMethod};
use crate::services::MemosApi;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "memos-mcp-server";

/// Routes JSON-RPC requests to the registry and tool handlers.
///
/// Holds no per-request state; one call in, one envelope out.
pub struct Dispatcher<T: MemosApi> {
    server: MemosMcpServer<T>,
    registry: Arc<Registry>,
}

impl<T: MemosApi> Dispatcher<T> {
    pub fn new(api: Arc<T>, registry: Arc<Registry>) -> Self {
        Self {
            server: MemosMcpServer::new(api),
            registry,
        }
    }

    /// Handle one raw input line; `None` only when the line is not valid JSON
    pub async fn handle_line(&self, line: &str) -> Option<MCPResponse> {
        match serde_json::from_str::<Value>(line) {
            Ok(message) => Some(self.handle_message(message).await),
            Err(e) => {
                error!("Invalid JSON: {} ({})", line, e);
                None
            }
        }
    }

    /// Handle a decoded JSON message.
    ///
    /// A message that is valid JSON but not a well-formed request (no string
    /// `method`, wrong field types) still gets an envelope echoing its `id`.
    pub async fn handle_message(&self, message: Value) -> MCPResponse {
        let id = message.get("id").filter(|id| !id.is_null()).cloned();
        match serde_json::from_value::<MCPRequest>(message) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                warn!("Invalid request: {}", e);
                MCPResponse::failure(id, DispatchError::InvalidRequest(e.to_string()).into())
            }
        }
    }

    pub async fn dispatch(&self, request: MCPRequest) -> MCPResponse {
        let id = request.id.clone();
        let method = request.method.clone();
        debug!("Handling {}", method);

        let outcome = AssertUnwindSafe(self.route(request)).catch_unwind().await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Internal(format!("handler for {} panicked", method))),
        };

        match result {
            Ok(result) => MCPResponse::success(id, result),
            Err(e) => {
                warn!("Error handling {}: {}", method, e);
                MCPResponse::failure(id, MCPError::from(e))
            }
        }
    }

    async fn route(&self, request: MCPRequest) -> Result<Value, DispatchError> {
        let method = McpMethod::from_name(&request.method)
            .ok_or_else(|| DispatchError::MethodNotFound(request.method.clone()))?;
        let params = params_object(request.params)?;

        match method {
            McpMethod::Initialize => Ok(self.initialize()),
            McpMethod::ToolsList => Ok(json!({"tools": self.registry.tools()})),
            McpMethod::ToolsCall => self.call_tool(params).await,
            McpMethod::ResourcesList => Ok(json!({"resources": self.registry.resources()})),
            McpMethod::ResourcesRead => self.read_resource(params).await,
            McpMethod::PromptsList => Ok(json!({"prompts": self.registry.prompts()})),
            McpMethod::PromptsGet => self.get_prompt(params),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": true},
                "resources": {"subscribe": false, "listChanged": true},
                "prompts": {"listChanged": true},
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    async fn call_tool(&self, params: Map<String, Value>) -> Result<Value, DispatchError> {
        let name = required_str(&params, "name")?;
        let tool = ToolName::from_name(name).ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let payload = self.server.call_tool(tool, arguments).await;
        let text = serde_json::to_string(&payload).map_err(|e| DispatchError::Internal(e.to_string()))?;

        Ok(json!({
            "content": [{"type": "text", "text": text}],
            "isError": payload.get("error").is_some(),
        }))
    }

    async fn read_resource(&self, params: Map<String, Value>) -> Result<Value, DispatchError> {
        let uri = required_str(&params, "uri")?;
        let route = ResourceRoute::parse(uri).ok_or_else(|| DispatchError::UnknownResource(uri.to_string()))?;

        let payload = self.server.read_resource(&route).await;
        let text = serde_json::to_string(&payload).map_err(|e| DispatchError::Internal(e.to_string()))?;

        Ok(json!({
            "contents": [{"uri": uri, "mimeType": "application/json", "text": text}],
        }))
    }

    fn get_prompt(&self, params: Map<String, Value>) -> Result<Value, DispatchError> {
        let name = required_str(&params, "name")?;
        let prompt = PromptName::from_name(name).ok_or_else(|| DispatchError::UnknownPrompt(name.to_string()))?;
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        Ok(json!({
            "description": prompt.description(),
            "messages": [{
                "role": "user",
                "content": {"type": "text", "text": render_prompt(prompt, &arguments)},
            }],
        }))
    }
}

// Missing params behave like an empty object
fn params_object(params: Value) -> Result<Map<String, Value>, DispatchError> {
    match params {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        _ => Err(DispatchError::InvalidParams("params must be an object".to_string())),
    }
}

fn required_str<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str, DispatchError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| DispatchError::InvalidParams(format!("missing '{}' field", key)))
}

// Handler for MCP requests posted over HTTP; the body is decoded here so
// malformed input still gets a JSON-RPC envelope
pub async fn mcp_handler<T: MemosApi + 'static>(
    State(dispatcher): State<Arc<Dispatcher<T>>>,
    body: String,
) -> Json<MCPResponse> {
    let response = match serde_json::from_str::<Value>(&body) {
        Ok(message) => dispatcher.handle_message(message).await,
        Err(e) => {
            error!("Invalid JSON body: {}", e);
            MCPResponse::failure(None, DispatchError::Parse(e.to_string()).into())
        }
    };
    Json(response)
}

pub fn mcp_router<T: MemosApi + 'static>(dispatcher: Arc<Dispatcher<T>>) -> Router {
    Router::new()
        .route("/mcp", post(mcp_handler::<T>))
        .with_state(dispatcher)
}

pub async fn run_http_mcp_server<T: MemosApi + 'static>(
    dispatcher: Arc<Dispatcher<T>>,
    port: u16,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("MCP endpoint available at http://{}/mcp", addr);

    axum::serve(listener, mcp_router(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
