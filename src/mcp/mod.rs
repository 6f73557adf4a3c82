pub mod conversion;
pub mod protocol;
pub mod registry;
pub mod server;

// Re-export key components for easier imports
pub use protocol::{MCPError, MCPRequest, MCPResponse, McpMethod};
pub use registry::{PromptName, Registry, ResourceRoute, ToolName};
pub use server::MemosMcpServer;
