// src/mcp/server.rs
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ToolError;
use crate::mcp::conversion::{
    extract_note_list, to_canonical_note, to_canonical_notes, to_create_response, unwrap_note_payload,
};
use crate::mcp::registry::{PromptName, ResourceRoute, ToolName, LIST_RESOURCE_PAGE_SIZE, SEARCH_RESOURCE_PAGE_SIZE};
use crate::models::Visibility;
use crate::services::{ListQuery, MemoPatch, MemosApi};
use crate::utils::normalize_identifier;

const DEFAULT_MEMO_COUNT: u64 = 5;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

// Tool argument types
#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct CreateMemoRequest {
    #[schemars(description = "The content of the memo")]
    pub content: String,

    #[serde(default)]
    #[schemars(description = "Visibility level")]
    pub visibility: Visibility,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct ListMemosRequest {
    #[serde(default = "default_page")]
    #[schemars(description = "Page number, starting at 1")]
    pub page: u32,

    #[serde(default = "default_page_size")]
    #[schemars(description = "Number of memos per page")]
    pub page_size: u32,

    #[schemars(description = "Only list memos with this visibility")]
    pub visibility: Option<String>,

    #[schemars(description = "Only list memos carrying this tag")]
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct GetMemoRequest {
    #[serde(alias = "name")]
    #[schemars(description = "The memo identifier (e.g. memos/xxxxx)")]
    pub identifier: String,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct UpdateMemoRequest {
    #[serde(alias = "name")]
    #[schemars(description = "The memo identifier (e.g. memos/xxxxx)")]
    pub identifier: String,

    #[schemars(description = "New content")]
    pub content: Option<String>,

    #[schemars(description = "New visibility level")]
    pub visibility: Option<String>,

    #[schemars(description = "New row status (e.g. ARCHIVED)")]
    pub row_status: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct DeleteMemoRequest {
    #[serde(alias = "name")]
    #[schemars(description = "The memo identifier (e.g. memos/xxxxx)")]
    pub identifier: String,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct SearchMemosRequest {
    #[schemars(description = "Text the memo content must contain")]
    pub query: String,

    #[serde(default = "default_page")]
    #[schemars(description = "Page number, starting at 1")]
    pub page: u32,

    #[serde(default = "default_page_size")]
    #[schemars(description = "Number of memos per page")]
    pub page_size: u32,
}

/// Tool handlers, resource readers and prompt rendering on top of a Memos API.
///
/// Handlers never fail outward: every outcome, including upstream errors, is
/// a JSON payload the dispatcher wraps in a successful envelope.
pub struct MemosMcpServer<T: MemosApi> {
    api: Arc<T>,
}

impl<T: MemosApi> Clone for MemosMcpServer<T> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<T: MemosApi> MemosMcpServer<T> {
    pub fn new(api: Arc<T>) -> Self {
        Self { api }
    }

    /// Run one tool and return its result payload
    pub async fn call_tool(&self, tool: ToolName, arguments: Value) -> Value {
        let outcome = match tool {
            ToolName::CreateMemo => match parse_arguments(tool, arguments) {
                Ok(args) => self.create_memo(args).await,
                Err(e) => Err(e),
            },
            ToolName::ListMemos => match parse_arguments(tool, arguments) {
                Ok(args) => self.list_memos(args).await,
                Err(e) => Err(e),
            },
            ToolName::GetMemo => match parse_arguments::<GetMemoRequest>(tool, arguments) {
                Ok(args) => self.get_memo(&args.identifier).await,
                Err(e) => Err(e),
            },
            ToolName::UpdateMemo => match parse_arguments(tool, arguments) {
                Ok(args) => self.update_memo(args).await,
                Err(e) => Err(e),
            },
            ToolName::DeleteMemo => match parse_arguments::<DeleteMemoRequest>(tool, arguments) {
                Ok(args) => self.delete_memo(&args.identifier).await,
                Err(e) => Err(e),
            },
            ToolName::SearchMemos => match parse_arguments::<SearchMemosRequest>(tool, arguments) {
                Ok(args) => self.search_memos(&args.query, args.page, args.page_size).await,
                Err(e) => Err(e),
            },
        };

        outcome.unwrap_or_else(|e| {
            error!("Error executing {}: {}", tool.as_str(), e);
            error_payload(&e)
        })
    }

    /// Read one resource and return its payload
    pub async fn read_resource(&self, route: &ResourceRoute) -> Value {
        let outcome = match route {
            ResourceRoute::Note(identifier) => self.get_memo(identifier).await,
            ResourceRoute::List => {
                self.list_memos(ListMemosRequest {
                    page: default_page(),
                    page_size: LIST_RESOURCE_PAGE_SIZE,
                    visibility: None,
                    tag: None,
                })
                .await
            }
            ResourceRoute::Search(query) => {
                self.search_memos(query, default_page(), SEARCH_RESOURCE_PAGE_SIZE)
                    .await
            }
        };

        outcome.unwrap_or_else(|e| {
            error!("Error reading resource {:?}: {}", route, e);
            error_payload(&e)
        })
    }

    async fn create_memo(&self, args: CreateMemoRequest) -> Result<Value, ToolError> {
        let response = self.api.create_memo(&args.content, args.visibility).await?;

        let memo = Value::Object(unwrap_note_payload(&response));
        if memo.as_object().map_or(true, |m| m.is_empty()) {
            return Ok(json!({"success": false, "error": "No memo in response"}));
        }

        let created = to_create_response(&memo);
        info!("Created memo {}", created.identifier);
        Ok(json!({"success": true, "note": created}))
    }

    async fn list_memos(&self, args: ListMemosRequest) -> Result<Value, ToolError> {
        let query = ListQuery {
            page: args.page,
            page_size: args.page_size,
            visibility: args.visibility,
            tag: args.tag,
        };
        let response = self.api.list_memos(&query).await?;

        let notes = to_canonical_notes(extract_note_list(&response));
        Ok(json!({"count": notes.len(), "notes": notes}))
    }

    async fn get_memo(&self, identifier: &str) -> Result<Value, ToolError> {
        require_identifier(ToolName::GetMemo, identifier)?;
        let response = self.api.get_memo(identifier).await?;

        let memo = Value::Object(unwrap_note_payload(&response));
        if memo.as_object().map_or(true, |m| m.is_empty()) {
            return Ok(json!({"error": format!("Memo {:?} not found.", identifier), "found": false}));
        }

        serde_json::to_value(to_canonical_note(&memo)).map_err(|e| ToolError::Other(e.to_string()))
    }

    async fn update_memo(&self, args: UpdateMemoRequest) -> Result<Value, ToolError> {
        require_identifier(ToolName::UpdateMemo, &args.identifier)?;
        let patch = MemoPatch {
            content: args.content,
            visibility: args.visibility,
            row_status: args.row_status,
        };
        self.api.update_memo(&args.identifier, &patch).await?;

        Ok(json!({"success": true, "identifier": args.identifier}))
    }

    async fn delete_memo(&self, identifier: &str) -> Result<Value, ToolError> {
        require_identifier(ToolName::DeleteMemo, identifier)?;
        self.api.delete_memo(identifier).await?;

        Ok(json!({"success": true, "identifier": identifier}))
    }

    async fn search_memos(&self, query: &str, page: u32, page_size: u32) -> Result<Value, ToolError> {
        let response = self.api.search_memos(query, page, page_size).await?;

        let notes = to_canonical_notes(extract_note_list(&response));
        Ok(json!({"count": notes.len(), "notes": notes, "query": query}))
    }
}

/// Prompt text with the caller's arguments substituted in
pub fn render_prompt(prompt: PromptName, arguments: &Value) -> String {
    match prompt {
        PromptName::MemoSummary => {
            let memo_count = arguments
                .get("memo_count")
                .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
                .unwrap_or(DEFAULT_MEMO_COUNT);
            format!(
                "Please summarize the most recent {memo_count} memos from my Memos instance.\n\n\
                 Focus on:\n\
                 1. Key themes and topics\n\
                 2. Action items or tasks mentioned\n\
                 3. Important insights or decisions\n\
                 4. Any patterns or trends\n\n\
                 Use the list_memos tool with page_size {memo_count} to retrieve the recent memos, \
                 then provide a comprehensive summary."
            )
        }
        PromptName::MemoOrganization => {
            let tag = arguments
                .get("tag")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty());
            match tag {
                Some(tag) => format!(
                    "Help me organize and analyze my memos tagged with '{tag}'.\n\n\
                     Please:\n\
                     1. Retrieve all memos with this tag using the list_memos tool (tag: \"{tag}\")\n\
                     2. Identify common themes and patterns\n\
                     3. Suggest better organization or additional tags\n\
                     4. Highlight any important action items or follow-ups"
                ),
                None => "Help me organize my memos.\n\n\
                         Please:\n\
                         1. Retrieve recent memos using the list_memos tool (each memo has a tags field)\n\
                         2. Analyze the current organization and tags used\n\
                         3. Suggest improvements to tagging and structure\n\
                         4. Identify any memos that need better organization"
                    .to_string(),
            }
        }
    }
}

fn parse_arguments<A: DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<A, ToolError> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid(tool.as_str(), e.to_string()))
}

fn require_identifier(tool: ToolName, identifier: &str) -> Result<(), ToolError> {
    if normalize_identifier(identifier).is_empty() {
        return Err(ToolError::invalid(tool.as_str(), "identifier must not be empty"));
    }
    Ok(())
}

/// `{error, statusCode?}` payload for a failed tool or resource call
pub fn error_payload(err: &ToolError) -> Value {
    match err {
        ToolError::Api(api_err) => match api_err.status_code() {
            Some(status) => json!({"error": api_err.to_string(), "statusCode": status}),
            None => json!({"error": api_err.to_string()}),
        },
        other => json!({"error": other.to_string()}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemosApiError;

    #[test]
    fn test_summary_prompt_defaults_to_five() {
        let text = render_prompt(PromptName::MemoSummary, &json!({}));
        assert!(text.contains("most recent 5 memos"));
        assert!(text.contains("list_memos"));

        let text = render_prompt(PromptName::MemoSummary, &json!({"memo_count": "12"}));
        assert!(text.contains("most recent 12 memos"));
    }

    #[test]
    fn test_organization_prompt_variants() {
        let tagged = render_prompt(PromptName::MemoOrganization, &json!({"tag": "work"}));
        assert!(tagged.contains("tagged with 'work'"));
        assert!(tagged.contains("list_memos"));

        let untagged = render_prompt(PromptName::MemoOrganization, &json!({"tag": "  "}));
        assert!(untagged.starts_with("Help me organize my memos."));
        assert!(untagged.contains("list_memos"));
    }

    #[test]
    fn test_error_payload_shapes() {
        let status = ToolError::Api(MemosApiError::Status {
            status: 404,
            body: "not found".into(),
        });
        assert_eq!(
            error_payload(&status),
            json!({"error": "Memos API error: 404 - not found", "statusCode": 404})
        );

        let transport = ToolError::Api(MemosApiError::Transport("timed out".into()));
        assert_eq!(error_payload(&transport), json!({"error": "Failed to connect to Memos: timed out"}));

        let args = ToolError::invalid("create_memo", "missing field `content`");
        assert_eq!(
            error_payload(&args),
            json!({"error": "Invalid arguments for create_memo: missing field `content`"})
        );
    }

    #[test]
    fn test_parse_arguments_defaults() {
        let args: ListMemosRequest = parse_arguments(ToolName::ListMemos, Value::Null).unwrap();
        assert_eq!((args.page, args.page_size), (1, 20));
        assert!(args.visibility.is_none() && args.tag.is_none());

        let args: CreateMemoRequest = parse_arguments(ToolName::CreateMemo, json!({"content": "x"})).unwrap();
        assert_eq!(args.visibility, Visibility::Private);

        let args: GetMemoRequest = parse_arguments(ToolName::GetMemo, json!({"name": "memos/a"})).unwrap();
        assert_eq!(args.identifier, "memos/a");
    }
}
