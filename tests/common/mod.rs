#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use memos_mcp::error::MemosApiError;
use memos_mcp::handlers::Dispatcher;
use memos_mcp::mcp::{MCPRequest, MCPResponse, Registry};
use memos_mcp::models::Visibility;
use memos_mcp::services::{ListQuery, MemoPatch, MemosApi};
use memos_mcp::utils::normalize_identifier;

/// Upstream call as seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { content: String, visibility: Visibility },
    List(ListQuery),
    Search { query: String, page: u32, page_size: u32 },
    Get(String),
    Update { identifier: String, patch: MemoPatch },
    Delete(String),
}

/// In-memory Memos instance speaking the current API generation.
///
/// Individual operations can be scripted to return a fixed body or error.
#[derive(Default)]
pub struct FakeMemos {
    calls: Mutex<Vec<Call>>,
    store: Mutex<HashMap<String, Value>>,
    scripted: Mutex<HashMap<&'static str, Result<Value, (Option<u16>, String)>>>,
}

impl FakeMemos {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `operation` answer with `body`
    pub fn respond(&self, operation: &'static str, body: Value) {
        self.scripted.lock().unwrap().insert(operation, Ok(body));
    }

    /// Make `operation` fail with an HTTP status
    pub fn fail_status(&self, operation: &'static str, status: u16, body: &str) {
        self.scripted
            .lock()
            .unwrap()
            .insert(operation, Err((Some(status), body.to_string())));
    }

    /// Make `operation` fail as if the connection dropped
    pub fn fail_transport(&self, operation: &'static str, message: &str) {
        self.scripted
            .lock()
            .unwrap()
            .insert(operation, Err((None, message.to_string())));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted(&self, operation: &'static str) -> Option<Result<Value, MemosApiError>> {
        self.scripted.lock().unwrap().get(operation).map(|outcome| match outcome {
            Ok(body) => Ok(body.clone()),
            Err((Some(status), body)) => Err(MemosApiError::Status {
                status: *status,
                body: body.clone(),
            }),
            Err((None, message)) => Err(MemosApiError::Transport(message.clone())),
        })
    }

    fn not_found(identifier: &str) -> MemosApiError {
        MemosApiError::Status {
            status: 404,
            body: format!("{{\"message\":\"memo {} not found\"}}", identifier),
        }
    }
}

#[async_trait]
impl MemosApi for FakeMemos {
    async fn create_memo(&self, content: &str, visibility: Visibility) -> Result<Value, MemosApiError> {
        self.record(Call::Create {
            content: content.to_string(),
            visibility,
        });
        if let Some(outcome) = self.scripted("create") {
            return outcome;
        }

        let mut store = self.store.lock().unwrap();
        let name = format!("memos/fake{}", store.len() + 1);
        let memo = json!({
            "name": name,
            "content": content,
            "visibility": visibility.as_str(),
            "createTime": "2026-01-31T07:04:05Z",
            "updateTime": "2026-01-31T07:04:05Z",
            "creator": "users/1",
            "tags": [],
        });
        store.insert(normalize_identifier(&name), memo.clone());
        Ok(memo)
    }

    async fn list_memos(&self, query: &ListQuery) -> Result<Value, MemosApiError> {
        self.record(Call::List(query.clone()));
        if let Some(outcome) = self.scripted("list") {
            return outcome;
        }
        let memos: Vec<Value> = self.store.lock().unwrap().values().cloned().collect();
        Ok(json!({"memos": memos}))
    }

    async fn search_memos(&self, query: &str, page: u32, page_size: u32) -> Result<Value, MemosApiError> {
        self.record(Call::Search {
            query: query.to_string(),
            page,
            page_size,
        });
        if let Some(outcome) = self.scripted("search") {
            return outcome;
        }
        let memos: Vec<Value> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|memo| memo["content"].as_str().is_some_and(|c| c.contains(query)))
            .cloned()
            .collect();
        Ok(json!({"memos": memos}))
    }

    async fn get_memo(&self, identifier: &str) -> Result<Value, MemosApiError> {
        self.record(Call::Get(identifier.to_string()));
        if let Some(outcome) = self.scripted("get") {
            return outcome;
        }
        self.store
            .lock()
            .unwrap()
            .get(&normalize_identifier(identifier))
            .cloned()
            .ok_or_else(|| Self::not_found(identifier))
    }

    async fn update_memo(&self, identifier: &str, patch: &MemoPatch) -> Result<Value, MemosApiError> {
        self.record(Call::Update {
            identifier: identifier.to_string(),
            patch: patch.clone(),
        });
        if let Some(outcome) = self.scripted("update") {
            return outcome;
        }
        let mut store = self.store.lock().unwrap();
        let memo = store
            .get_mut(&normalize_identifier(identifier))
            .ok_or_else(|| Self::not_found(identifier))?;
        if let (Some(memo), Value::Object(changes)) = (memo.as_object_mut(), patch.to_body()) {
            memo.extend(changes);
        }
        Ok(memo.clone())
    }

    async fn delete_memo(&self, identifier: &str) -> Result<Value, MemosApiError> {
        self.record(Call::Delete(identifier.to_string()));
        if let Some(outcome) = self.scripted("delete") {
            return outcome;
        }
        self.store
            .lock()
            .unwrap()
            .remove(&normalize_identifier(identifier))
            .map(|_| Value::Object(Map::new()))
            .ok_or_else(|| Self::not_found(identifier))
    }
}

pub fn dispatcher() -> (Arc<FakeMemos>, Dispatcher<FakeMemos>) {
    let fake = Arc::new(FakeMemos::new());
    let dispatcher = Dispatcher::new(Arc::clone(&fake), Arc::new(Registry::new()));
    (fake, dispatcher)
}

pub async fn send(dispatcher: &Dispatcher<FakeMemos>, request: Value) -> Value {
    let request: MCPRequest = serde_json::from_value(request).expect("valid request");
    let response: MCPResponse = dispatcher.dispatch(request).await;
    serde_json::to_value(response).expect("serializable response")
}

pub async fn call_tool(dispatcher: &Dispatcher<FakeMemos>, name: &str, arguments: Value) -> Value {
    let response = send(
        dispatcher,
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {"name": name, "arguments": arguments}}),
    )
    .await;
    assert!(response.get("error").is_none(), "unexpected top-level error: {response}");
    tool_payload(&response)
}

/// Decode the JSON text carried in a tools/call result
pub fn tool_payload(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .expect("text content");
    serde_json::from_str(text).expect("JSON payload")
}

/// Decode the JSON text carried in a resources/read result
pub fn resource_payload(response: &Value) -> Value {
    let text = response["result"]["contents"][0]["text"]
        .as_str()
        .expect("text contents");
    serde_json::from_str(text).expect("JSON payload")
}
