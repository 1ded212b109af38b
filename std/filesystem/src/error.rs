//! Error type shared by every filesystem operation.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by path validation and the filesystem tools.
///
/// The dispatcher renders every variant as a single `Error: <message>` text
/// item, so the messages are written for the calling model to read.
#[derive(Error, Debug)]
pub enum Error {
    /// The path, or what it resolves to, lies outside every allowed root.
    #[error("Access denied - {reason}: {}", path.display())]
    AccessDenied { path: PathBuf, reason: &'static str },

    /// The path is malformed or its parent directory does not exist.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A mutating tool was called while the server is read-only.
    #[error("Server is in read-only mode")]
    ReadOnlyMode,

    /// The destination of a move is already occupied.
    #[error("Destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// The path does not exist.
    #[error("No such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    /// Any other I/O failure, tagged with the operation and path.
    #[error("Failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exceeds the configured read limit.
    #[error("File is too large ({size} bytes; max {max} bytes): {}", path.display())]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    /// A search or exclusion glob could not be compiled.
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// An `edit_file` search text was not present in the file.
    #[error("Text not found in file: {0:?}")]
    EditNotFound(String),

    /// The arguments of a tool call did not match its schema.
    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    /// No tool with this name exists.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A configured allowed directory is missing or not a directory.
    #[error("{}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Map an I/O error for `path`, splitting out `NotFound`.
    pub(crate) fn io(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.to_path_buf())
        } else {
            Error::Io {
                op,
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
