//! Tool catalogue for the filesystem MCP server.
//!
//! Each tool has a typed argument struct whose JSON schema is advertised to
//! clients; [`ToolName`] maps wire names to tools.

use crate::error::Error;
use rmcp::{
    model::{JsonObject, Tool},
    schemars::{self, JsonSchema},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Parameters for reading a single file.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ReadFileParams {
    /// Path to the file to read.
    pub path: String,
}

/// Parameters for writing a file.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct WriteFileParams {
    /// Path to the file to write.
    pub path: String,
    /// Content to write to the file.
    pub content: String,
}

/// Parameters for listing a directory.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ListDirectoryParams {
    /// Path to the directory to list.
    pub path: String,
}

/// Parameters for moving a file or directory.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct MoveFileParams {
    /// Source path.
    pub source: String,
    /// Destination path. Must not exist.
    pub destination: String,
}

/// Parameters for searching files.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SearchFilesParams {
    /// Directory to search from.
    pub root_path: String,
    /// Shell-style pattern matched against entry names, ignoring case
    /// (e.g. "*.rs").
    pub pattern: String,
    /// Search subdirectories too. Defaults to true.
    #[serde(default)]
    pub recursive: Option<bool>,
}

/// A single text edit operation.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct EditOperation {
    /// The text to search for.
    pub old_text: String,
    /// The replacement text.
    pub new_text: String,
}

/// Parameters for editing a file.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct EditFileParams {
    /// Path to the file to edit.
    pub path: String,
    /// List of edit operations to apply sequentially.
    pub edits: Vec<EditOperation>,
    /// If true, return the diff without writing changes.
    #[serde(default)]
    pub dry_run: Option<bool>,
}

/// Parameters for getting file info.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetFileInfoParams {
    /// Path to the file or directory.
    pub path: String,
}

/// `list_allowed_directories` takes no arguments.
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct NoParams {}

/// Every tool the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    ReadFile,
    WriteFile,
    ListDirectory,
    MoveFile,
    SearchFiles,
    EditFile,
    GetFileInfo,
    ListAllowedDirectories,
}

impl ToolName {
    pub const ALL: [ToolName; 8] = [
        ToolName::ReadFile,
        ToolName::WriteFile,
        ToolName::ListDirectory,
        ToolName::MoveFile,
        ToolName::SearchFiles,
        ToolName::EditFile,
        ToolName::GetFileInfo,
        ToolName::ListAllowedDirectories,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::ReadFile => "read_file",
            ToolName::WriteFile => "write_file",
            ToolName::ListDirectory => "list_directory",
            ToolName::MoveFile => "move_file",
            ToolName::SearchFiles => "search_files",
            ToolName::EditFile => "edit_file",
            ToolName::GetFileInfo => "get_file_info",
            ToolName::ListAllowedDirectories => "list_allowed_directories",
        }
    }

    fn description(self) -> &'static str {
        match self {
            ToolName::ReadFile => "Read the complete contents of a text file",
            ToolName::WriteFile => {
                "Create a new file or overwrite an existing file with the given content, \
                 creating parent directories as needed"
            }
            ToolName::ListDirectory => {
                "List a directory recursively as a JSON tree with size, timestamps and permissions"
            }
            ToolName::MoveFile => {
                "Move or rename a file or directory. Fails if the destination exists"
            }
            ToolName::SearchFiles => {
                "Search for files whose name matches a pattern, case-insensitively"
            }
            ToolName::EditFile => {
                "Replace text in a file and return a unified diff. Set dry_run to true to \
                 preview changes without writing"
            }
            ToolName::GetFileInfo => "Get metadata about a single file or directory",
            ToolName::ListAllowedDirectories => {
                "List the directories that this server is allowed to access"
            }
        }
    }

    fn input_schema(self) -> Arc<JsonObject> {
        match self {
            ToolName::ReadFile => schema::<ReadFileParams>(),
            ToolName::WriteFile => schema::<WriteFileParams>(),
            ToolName::ListDirectory => schema::<ListDirectoryParams>(),
            ToolName::MoveFile => schema::<MoveFileParams>(),
            ToolName::SearchFiles => schema::<SearchFilesParams>(),
            ToolName::EditFile => schema::<EditFileParams>(),
            ToolName::GetFileInfo => schema::<GetFileInfoParams>(),
            ToolName::ListAllowedDirectories => schema::<NoParams>(),
        }
    }

    /// The descriptor advertised in `tools/list`.
    pub fn descriptor(self) -> Tool {
        Tool::new(self.as_str(), self.description(), self.input_schema())
    }
}

impl FromStr for ToolName {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }
}

/// Descriptors for every tool.
pub fn catalogue() -> Vec<Tool> {
    ToolName::ALL.into_iter().map(ToolName::descriptor).collect()
}

fn schema<T: JsonSchema>() -> Arc<JsonObject> {
    match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(serde_json::Value::Object(map)) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::tools::{ToolName, catalogue};

    #[test]
    fn names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "delete_everything".parse::<ToolName>().unwrap_err();
        assert!(matches!(err, Error::UnknownTool(ref name) if name == "delete_everything"));
    }

    #[test]
    fn catalogue_has_object_schemas() {
        let tools = catalogue();
        assert_eq!(tools.len(), ToolName::ALL.len());
        for tool in &tools {
            assert_eq!(
                tool.input_schema.get("type").and_then(|t| t.as_str()),
                Some("object"),
                "{}",
                tool.name
            );
        }
        let search = tools.iter().find(|t| t.name == "search_files").unwrap();
        let required = search.input_schema["required"].as_array().unwrap();
        assert!(required.iter().any(|r| r == "root_path"));
        assert!(!required.iter().any(|r| r == "recursive"));
    }
}
