//! Fixed capability surface: tools, resources and prompts.
//!
//! Descriptors are built once at startup and only read afterwards. Names map
//! onto the `ToolName` / `PromptName` enums so the dispatcher's match over
//! them stays exhaustive.

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{json, Value};

use crate::mcp::server::{
    CreateMemoRequest, DeleteMemoRequest, GetMemoRequest, ListMemosRequest, SearchMemosRequest,
    UpdateMemoRequest,
};

pub const NOTE_URI_PREFIX: &str = "note://";
pub const LIST_URI: &str = "notes://list";
pub const SEARCH_URI_PREFIX: &str = "notes://search/";

/// Page size used by the `notes://list` resource
pub const LIST_RESOURCE_PAGE_SIZE: u32 = 50;
/// Page size used by the `notes://search/{query}` resource
pub const SEARCH_RESOURCE_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    CreateMemo,
    ListMemos,
    GetMemo,
    UpdateMemo,
    DeleteMemo,
    SearchMemos,
}

impl ToolName {
    pub const ALL: [ToolName; 6] = [
        ToolName::CreateMemo,
        ToolName::ListMemos,
        ToolName::GetMemo,
        ToolName::UpdateMemo,
        ToolName::DeleteMemo,
        ToolName::SearchMemos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CreateMemo => "create_memo",
            ToolName::ListMemos => "list_memos",
            ToolName::GetMemo => "get_memo",
            ToolName::UpdateMemo => "update_memo",
            ToolName::DeleteMemo => "delete_memo",
            ToolName::SearchMemos => "search_memos",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            ToolName::CreateMemo => "Create a new memo in Memos",
            ToolName::ListMemos => "List memos from Memos with optional filters",
            ToolName::GetMemo => "Get a specific memo by identifier (e.g. memos/xxxxx)",
            ToolName::UpdateMemo => "Update an existing memo by identifier (e.g. memos/xxxxx)",
            ToolName::DeleteMemo => "Delete a memo by identifier (e.g. memos/xxxxx)",
            ToolName::SearchMemos => "Search memos by content",
        }
    }

    fn input_schema(&self) -> Value {
        match self {
            ToolName::CreateMemo => input_schema::<CreateMemoRequest>(),
            ToolName::ListMemos => input_schema::<ListMemosRequest>(),
            ToolName::GetMemo => input_schema::<GetMemoRequest>(),
            ToolName::UpdateMemo => input_schema::<UpdateMemoRequest>(),
            ToolName::DeleteMemo => input_schema::<DeleteMemoRequest>(),
            ToolName::SearchMemos => input_schema::<SearchMemosRequest>(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptName {
    MemoSummary,
    MemoOrganization,
}

impl PromptName {
    pub const ALL: [PromptName; 2] = [PromptName::MemoSummary, PromptName::MemoOrganization];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptName::MemoSummary => "memo_summary",
            PromptName::MemoOrganization => "memo_organization",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|prompt| prompt.as_str() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            PromptName::MemoSummary => "Generate a prompt for summarizing recent memos",
            PromptName::MemoOrganization => "Generate a prompt for helping organize memos",
        }
    }

    fn arguments(&self) -> Vec<PromptArgument> {
        match self {
            PromptName::MemoSummary => vec![PromptArgument {
                name: "memo_count",
                description: "Number of recent memos to summarize (default 5)",
                required: false,
            }],
            PromptName::MemoOrganization => vec![PromptArgument {
                name: "tag",
                description: "Specific tag to focus on (optional)",
                required: false,
            }],
        }
    }
}

/// A resource URI resolved to what it addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRoute {
    Note(String),
    List,
    Search(String),
}

impl ResourceRoute {
    /// Match a URI by scheme and prefix; `None` for anything unrecognised
    pub fn parse(uri: &str) -> Option<Self> {
        if let Some(identifier) = uri.strip_prefix(NOTE_URI_PREFIX) {
            return Some(ResourceRoute::Note(identifier.to_string()));
        }
        if let Some(query) = uri.strip_prefix(SEARCH_URI_PREFIX) {
            let decoded = urlencoding::decode(query)
                .map(|q| q.into_owned())
                .unwrap_or_else(|_| query.to_string());
            return Some(ResourceRoute::Search(decoded));
        }
        if uri.trim_end_matches('/') == LIST_URI {
            return Some(ResourceRoute::List);
        }
        None
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<PromptArgument>,
}

/// Everything the server advertises, owned for the process lifetime
#[derive(Debug, Clone)]
pub struct Registry {
    tools: Vec<ToolDescriptor>,
    resources: Vec<ResourceDescriptor>,
    prompts: Vec<PromptDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        let tools = ToolName::ALL
            .iter()
            .map(|tool| ToolDescriptor {
                name: tool.as_str(),
                description: tool.description(),
                input_schema: tool.input_schema(),
            })
            .collect();

        let resources = vec![
            ResourceDescriptor {
                uri: "note://{id}",
                name: "Individual memo",
                description: "Access individual memo content (id e.g. memos/xxxxx)",
                mime_type: "application/json",
            },
            ResourceDescriptor {
                uri: LIST_URI,
                name: "Recent memos list",
                description: "Access list of recent memos",
                mime_type: "application/json",
            },
            ResourceDescriptor {
                uri: "notes://search/{query}",
                name: "Memos search",
                description: "Access search results",
                mime_type: "application/json",
            },
        ];

        let prompts = PromptName::ALL
            .iter()
            .map(|prompt| PromptDescriptor {
                name: prompt.as_str(),
                description: prompt.description(),
                arguments: prompt.arguments(),
            })
            .collect();

        Self {
            tools,
            resources,
            prompts,
        }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    pub fn prompts(&self) -> &[PromptDescriptor] {
        &self.prompts
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// JSON schema for a tool's arguments, with sub-schemas inlined
fn input_schema<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();

    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(object) = value.as_object_mut() {
        object.remove("title");
        object.remove("definitions");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_schema<'a>(registry: &'a Registry, name: &str) -> &'a Value {
        &registry
            .tools()
            .iter()
            .find(|tool| tool.name == name)
            .unwrap()
            .input_schema
    }

    fn required(schema: &Value) -> Vec<&str> {
        schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_six_tools_registered() {
        let registry = Registry::new();
        let names: Vec<_> = registry.tools().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["create_memo", "list_memos", "get_memo", "update_memo", "delete_memo", "search_memos"]
        );
    }

    #[test]
    fn test_lookup_is_exact_match() {
        assert_eq!(ToolName::from_name("get_memo"), Some(ToolName::GetMemo));
        assert_eq!(ToolName::from_name("GET_MEMO"), None);
        assert_eq!(ToolName::from_name("get_memo "), None);
        assert_eq!(ToolName::from_name("get_tags"), None);
        assert_eq!(PromptName::from_name("memo_summary"), Some(PromptName::MemoSummary));
        assert_eq!(PromptName::from_name("summary"), None);
    }

    #[test]
    fn test_every_tool_name_is_advertised() {
        let registry = Registry::new();
        for tool in ToolName::ALL {
            let descriptor = tool_schema(&registry, tool.as_str());
            assert_eq!(descriptor["type"], "object", "{}", tool.as_str());
        }
    }

    #[test]
    fn test_create_schema_contract() {
        let registry = Registry::new();
        let schema = tool_schema(&registry, "create_memo");
        assert_eq!(schema["type"], "object");
        assert_eq!(required(schema), vec!["content"]);

        let visibility = &schema["properties"]["visibility"];
        assert_eq!(visibility["default"], "PRIVATE");
        let allowed: Vec<_> = visibility["enum"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(allowed, vec!["PUBLIC", "PRIVATE", "PROTECTED"]);
    }

    #[test]
    fn test_list_and_search_defaults() {
        let registry = Registry::new();
        let list = tool_schema(&registry, "list_memos");
        assert!(required(list).is_empty());
        assert_eq!(list["properties"]["page"]["default"], 1);
        assert_eq!(list["properties"]["page_size"]["default"], 20);

        let search = tool_schema(&registry, "search_memos");
        assert_eq!(required(search), vec!["query"]);
        assert_eq!(search["properties"]["page_size"]["default"], 20);
    }

    #[test]
    fn test_identifier_tools_require_identifier() {
        let registry = Registry::new();
        for name in ["get_memo", "update_memo", "delete_memo"] {
            let schema = tool_schema(&registry, name);
            assert_eq!(required(schema), vec!["identifier"], "{name}");
        }
    }

    #[test]
    fn test_resource_routes() {
        assert_eq!(
            ResourceRoute::parse("note://memos/abc"),
            Some(ResourceRoute::Note("memos/abc".into()))
        );
        assert_eq!(ResourceRoute::parse("notes://list"), Some(ResourceRoute::List));
        assert_eq!(
            ResourceRoute::parse("notes://search/team%20meeting"),
            Some(ResourceRoute::Search("team meeting".into()))
        );
        assert_eq!(ResourceRoute::parse("notes://archive"), None);
        assert_eq!(ResourceRoute::parse("memo://1"), None);
    }

    #[test]
    fn test_resource_and_prompt_listing() {
        let registry = Registry::new();
        let uris: Vec<_> = registry.resources().iter().map(|r| r.uri).collect();
        assert_eq!(uris, vec!["note://{id}", "notes://list", "notes://search/{query}"]);

        let prompts: Vec<_> = registry.prompts().iter().map(|p| p.name).collect();
        assert_eq!(prompts, vec!["memo_summary", "memo_organization"]);
    }
}
