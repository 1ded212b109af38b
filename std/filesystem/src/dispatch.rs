//! The single entry point for tool calls.
//!
//! [`ToolDispatcher::dispatch`] never fails: every error is rendered as one
//! `Error: <message>` text item on a result flagged as an error.

use crate::config::ServerConfig;
use crate::diff::unified_diff;
use crate::error::{Error, Result};
use crate::tools::{
    EditFileParams, GetFileInfoParams, ListDirectoryParams, MoveFileParams, NoParams,
    ReadFileParams, SearchFilesParams, ToolName, WriteFileParams,
};
use crate::{info, search};
use rmcp::model::{CallToolResult, Content, JsonObject};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Routes tool calls to filesystem operations under a fixed configuration.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    config: Arc<ServerConfig>,
}

impl ToolDispatcher {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the tool `name` with `arguments`.
    pub fn dispatch(&self, name: &str, arguments: JsonObject) -> CallToolResult {
        tracing::debug!(tool = name, "tool call");
        match self.run(name, arguments) {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                CallToolResult::error(vec![Content::text(format!("Error: {e}"))])
            }
        }
    }

    fn run(&self, name: &str, arguments: JsonObject) -> Result<String> {
        let tool: ToolName = name.parse()?;
        match tool {
            ToolName::ReadFile => self.read_file(parse(tool, arguments)?),
            ToolName::WriteFile => self.write_file(parse(tool, arguments)?),
            ToolName::ListDirectory => self.list_directory(parse(tool, arguments)?),
            ToolName::MoveFile => self.move_file(parse(tool, arguments)?),
            ToolName::SearchFiles => self.search_files(parse(tool, arguments)?),
            ToolName::EditFile => self.edit_file(parse(tool, arguments)?),
            ToolName::GetFileInfo => self.get_file_info(parse(tool, arguments)?),
            ToolName::ListAllowedDirectories => {
                let NoParams {} = parse(tool, arguments)?;
                Ok(self.list_allowed_directories())
            }
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.config.read_only {
            return Err(Error::ReadOnlyMode);
        }
        Ok(())
    }

    /// Read a validated path as text, honouring the size limit.
    fn read_text(&self, path: &Path) -> Result<String> {
        let meta = fs::metadata(path).map_err(|e| Error::io("read", path, e))?;
        if meta.len() > self.config.max_file_size {
            return Err(Error::FileTooLarge {
                path: path.to_path_buf(),
                size: meta.len(),
                max: self.config.max_file_size,
            });
        }
        fs::read_to_string(path).map_err(|e| Error::io("read", path, e))
    }

    /// Read the complete contents of a text file.
    pub fn read_file(&self, params: ReadFileParams) -> Result<String> {
        let path = self.config.roots.validate(&params.path)?;
        self.read_text(&path)
    }

    /// Create or overwrite a file, creating missing parent directories.
    pub fn write_file(&self, params: WriteFileParams) -> Result<String> {
        self.ensure_writable()?;
        let path = self.config.roots.validate(&params.path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
        }
        fs::write(&path, &params.content).map_err(|e| Error::io("write", &path, e))?;
        Ok(format!("Successfully wrote to {}", path.display()))
    }

    /// Recursive JSON listing of a directory.
    pub fn list_directory(&self, params: ListDirectoryParams) -> Result<String> {
        let path = self.config.roots.validate(&params.path)?;
        let listing = info::describe(&path, &self.config.exclusions)?;
        Ok(serde_json::to_string_pretty(&listing)?)
    }

    /// Move or rename a file or directory; the destination must not exist.
    ///
    /// An allowed root itself cannot be moved.
    pub fn move_file(&self, params: MoveFileParams) -> Result<String> {
        self.ensure_writable()?;
        let source = self.config.roots.validate(&params.source)?;
        if self.config.roots.iter().any(|root| root == source.as_path()) {
            return Err(Error::AccessDenied {
                path: source,
                reason: "cannot move an allowed directory",
            });
        }
        let dest = self.config.roots.validate(&params.destination)?;
        if fs::symlink_metadata(&dest).is_ok() {
            return Err(Error::AlreadyExists(dest));
        }
        move_path(&source, &dest)?;
        Ok(format!("Moved {} to {}", source.display(), dest.display()))
    }

    /// Names matching a pattern, as a JSON array of absolute paths.
    pub fn search_files(&self, params: SearchFilesParams) -> Result<String> {
        let root = self.config.roots.validate(&params.root_path)?;
        let found = search::search(
            &root,
            &params.pattern,
            params.recursive.unwrap_or(true),
            &self.config.exclusions,
        )?;
        let found: Vec<String> = found
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        Ok(serde_json::to_string_pretty(&found)?)
    }

    /// Apply sequential replacements and return the resulting diff.
    ///
    /// A dry run only reads, so it is allowed in read-only mode.
    pub fn edit_file(&self, params: EditFileParams) -> Result<String> {
        let dry_run = params.dry_run.unwrap_or(false);
        if !dry_run {
            self.ensure_writable()?;
        }
        let path = self.config.roots.validate(&params.path)?;
        let original = self.read_text(&path)?;

        let mut content = original.clone();
        for edit in &params.edits {
            if !content.contains(&edit.old_text) {
                return Err(Error::EditNotFound(edit.old_text.clone()));
            }
            content = content.replacen(&edit.old_text, &edit.new_text, 1);
        }

        let diff = unified_diff(&original, &content, &self.label(&path));
        if !dry_run && content != original {
            fs::write(&path, &content).map_err(|e| Error::io("write", &path, e))?;
        }
        if diff.is_empty() {
            Ok("No changes".into())
        } else {
            Ok(diff)
        }
    }

    /// Metadata of a single path.
    pub fn get_file_info(&self, params: GetFileInfoParams) -> Result<String> {
        let path = self.config.roots.validate(&params.path)?;
        let entry = info::stat(&path)?;
        Ok(serde_json::to_string_pretty(&entry)?)
    }

    /// The canonical allowed roots, one per line.
    pub fn list_allowed_directories(&self) -> String {
        self.config
            .roots
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Diff label for a validated path: relative to its root when possible.
    fn label(&self, path: &Path) -> String {
        self.config
            .roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .filter(|relative| !relative.as_os_str().is_empty())
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn parse<T: DeserializeOwned>(tool: ToolName, arguments: JsonObject) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(arguments)).map_err(|source| {
        Error::InvalidArguments {
            tool: tool.as_str().to_string(),
            source,
        }
    })
}

/// Rename, falling back to copy and remove for a file on another filesystem.
fn move_path(source: &Path, dest: &Path) -> Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices && source.is_file() => {
            fs::copy(source, dest).map_err(|e| Error::io("copy", source, e))?;
            fs::remove_file(source).map_err(|e| Error::io("remove", source, e))
        }
        Err(e) => Err(Error::io("move", source, e)),
    }
}
