//! Name-based exclusion rules for listings and searches.

use crate::error::{Error, Result};
use glob::Pattern;
use std::ffi::OsStr;

/// Patterns excluded unless the server is started with
/// `--no-default-excludes`.
pub const DEFAULT_EXCLUDES: &[&str] = &["*.pyc", "__pycache__", ".git"];

/// Glob patterns matched against a single entry name.
///
/// A matching entry is dropped from listings and search results, and a
/// matching directory is never descended into.
#[derive(Debug, Clone, Default)]
pub struct ExclusionPatterns {
    patterns: Vec<Pattern>,
}

impl ExclusionPatterns {
    /// Compile the given patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|source| Error::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// The built-in set: bytecode files, `__pycache__` and `.git`.
    pub fn defaults() -> Self {
        Self {
            patterns: DEFAULT_EXCLUDES
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
        }
    }

    /// Whether an entry with this name is excluded.
    pub fn is_excluded(&self, name: &OsStr) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let name = name.to_string_lossy();
        self.patterns.iter().any(|p| p.matches(&name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }
}
