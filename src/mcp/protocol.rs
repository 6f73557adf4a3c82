use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;

pub const JSONRPC_VERSION: &str = "2.0";

// MCP Protocol structs for requests and responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// One response envelope per request; exactly one of `result` or `error` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

impl MCPResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: MCPError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MCPError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<DispatchError> for MCPError {
    fn from(err: DispatchError) -> Self {
        MCPError::new(err.code(), err.to_string())
    }
}

/// The RPC methods this server answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpMethod {
    Initialize,
    ToolsList,
    ToolsCall,
    ResourcesList,
    ResourcesRead,
    PromptsList,
    PromptsGet,
}

impl McpMethod {
    pub const ALL: [McpMethod; 7] = [
        McpMethod::Initialize,
        McpMethod::ToolsList,
        McpMethod::ToolsCall,
        McpMethod::ResourcesList,
        McpMethod::ResourcesRead,
        McpMethod::PromptsList,
        McpMethod::PromptsGet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            McpMethod::Initialize => "initialize",
            McpMethod::ToolsList => "tools/list",
            McpMethod::ToolsCall => "tools/call",
            McpMethod::ResourcesList => "resources/list",
            McpMethod::ResourcesRead => "resources/read",
            McpMethod::PromptsList => "prompts/list",
            McpMethod::PromptsGet => "prompts/get",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_params_or_jsonrpc() {
        let request: MCPRequest = serde_json::from_str(r#"{"id": 7, "method": "tools/list"}"#).unwrap();
        assert_eq!(request.id, Some(json!(7)));
        assert!(request.params.is_null());
        assert!(request.jsonrpc.is_none());
    }

    #[test]
    fn test_success_envelope_shape() {
        let value = serde_json::to_value(MCPResponse::success(Some(json!("a")), json!({"ok": true}))).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": "a", "result": {"ok": true}}));
    }

    #[test]
    fn test_error_envelope_keeps_null_id() {
        let response = MCPResponse::failure(None, DispatchError::MethodNotFound("foo/bar".into()).into());
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32601, "message": "Method not found: foo/bar"}
            })
        );
    }

    #[test]
    fn test_method_names_round_trip() {
        for method in McpMethod::ALL {
            assert_eq!(McpMethod::from_name(method.as_str()), Some(method));
        }
        assert_eq!(McpMethod::from_name("tools/List"), None);
        assert_eq!(McpMethod::from_name("foo/bar"), None);
    }
}
