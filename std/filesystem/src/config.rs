//! Immutable server configuration.

use crate::exclude::ExclusionPatterns;
use crate::validate::AllowedRoots;

/// Default read limit for `read_file` and `edit_file`: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Everything a tool call may consult. Built once at startup and shared.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub roots: AllowedRoots,
    /// Refuse every tool that would modify the filesystem.
    pub read_only: bool,
    pub exclusions: ExclusionPatterns,
    /// Largest file, in bytes, that will be read into memory.
    pub max_file_size: u64,
}

impl ServerConfig {
    /// Writable configuration with the default exclusions and read limit.
    pub fn new(roots: AllowedRoots) -> Self {
        Self {
            roots,
            read_only: false,
            exclusions: ExclusionPatterns::defaults(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionPatterns) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }
}
