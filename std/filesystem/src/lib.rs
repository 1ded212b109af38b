//! MCP server providing sandboxed filesystem tools.
//!
//! All operations are restricted to a set of allowed directories configured
//! at server startup. Tool calls are routed through [`ToolDispatcher`], which
//! runs the blocking filesystem work and reports every failure as text.

use rmcp::{
    ErrorData, RoleServer, ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};

pub mod config;
pub mod diff;
pub mod dispatch;
pub mod error;
pub mod exclude;
pub mod info;
pub mod search;
pub mod tools;
pub mod validate;

pub use config::ServerConfig;
pub use dispatch::ToolDispatcher;
pub use error::Error;

/// MCP filesystem server with directory-level access control.
#[derive(Debug, Clone)]
pub struct FilesystemServer {
    dispatcher: ToolDispatcher,
}

impl FilesystemServer {
    /// Create a server for the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            dispatcher: ToolDispatcher::new(config),
        }
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }
}

impl ServerHandler for FilesystemServer {
    fn get_info(&self) -> ServerInfo {
        let mode = if self.dispatcher.config().read_only {
            "read-only"
        } else {
            "read-write"
        };
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-filesystem".into(),
                title: Some("MCP Filesystem Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(format!(
                "Filesystem server providing {mode} access to the allowed directories. \
                 Call list_allowed_directories to see them."
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: tools::catalogue(),
            next_cursor: None,
            meta: None,
        })
    }

    /// Filesystem work is blocking, so each call runs on the blocking pool.
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let dispatcher = self.dispatcher.clone();
        let name = request.name.into_owned();
        let arguments = request.arguments.unwrap_or_default();
        tokio::task::spawn_blocking(move || dispatcher.dispatch(&name, arguments))
            .await
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))
    }
}
