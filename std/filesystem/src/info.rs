//! File metadata and recursive directory trees.
//!
//! Tree building is best-effort: a child that cannot be inspected is dropped
//! and a directory that cannot be listed is kept without children. Both are
//! reported in [`Listing::skipped`] rather than failing the whole call.

use crate::error::{Error, Result};
use crate::exclude::ExclusionPatterns;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Whether an entry is a directory or anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Metadata for one file or directory, with its subtree for directories.
#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes; files only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    /// `rwxrwxrwx` layout, `-` for each missing bit.
    pub permissions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileEntry>>,
}

/// An entry left out of a listing because it could not be read.
#[derive(Debug, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a recursive listing.
#[derive(Debug, Serialize)]
pub struct Listing {
    #[serde(flatten)]
    pub root: FileEntry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedEntry>,
}

/// Describe a single path without descending into it.
pub fn stat(path: &Path) -> Result<FileEntry> {
    let meta = fs::metadata(path).map_err(|e| Error::io("read metadata of", path, e))?;
    Ok(entry(path, &meta))
}

/// Describe `path` and, for a directory, everything below it that is not
/// excluded.
///
/// Only a failure to inspect `path` itself is an error.
pub fn describe(path: &Path, exclusions: &ExclusionPatterns) -> Result<Listing> {
    let meta = fs::metadata(path).map_err(|e| Error::io("read metadata of", path, e))?;
    let mut skipped = Vec::new();
    let root = build(path, &meta, exclusions, &mut skipped);
    Ok(Listing { root, skipped })
}

fn build(
    path: &Path,
    meta: &Metadata,
    exclusions: &ExclusionPatterns,
    skipped: &mut Vec<SkippedEntry>,
) -> FileEntry {
    let mut node = entry(path, meta);
    if meta.is_dir() {
        node.children = Some(children(path, exclusions, skipped));
    }
    node
}

fn children(
    dir: &Path,
    exclusions: &ExclusionPatterns,
    skipped: &mut Vec<SkippedEntry>,
) -> Vec<FileEntry> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            skip(skipped, dir, &e);
            return Vec::new();
        }
    };

    let mut children = Vec::new();
    for item in read_dir {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                skip(skipped, dir, &e);
                continue;
            }
        };
        if exclusions.is_excluded(&item.file_name()) {
            continue;
        }
        let child = item.path();
        match fs::metadata(&child) {
            Ok(meta) => children.push(build(&child, &meta, exclusions, skipped)),
            Err(e) => skip(skipped, &child, &e),
        }
    }
    children.sort_by(|a, b| a.name.cmp(&b.name));
    children
}

fn skip(skipped: &mut Vec<SkippedEntry>, path: &Path, err: &std::io::Error) {
    tracing::debug!(path = %path.display(), error = %err, "skipping unreadable entry");
    skipped.push(SkippedEntry {
        path: path.to_path_buf(),
        reason: err.to_string(),
    });
}

fn entry(path: &Path, meta: &Metadata) -> FileEntry {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let is_dir = meta.is_dir();

    FileEntry {
        name,
        kind: if is_dir {
            EntryKind::Directory
        } else {
            EntryKind::File
        },
        size: (!is_dir).then_some(meta.len()),
        created_at: rfc3339(meta.created()).or_else(|| changed_at(meta)),
        modified_at: rfc3339(meta.modified()),
        permissions: permissions(meta),
        children: None,
    }
}

fn rfc3339(time: std::io::Result<SystemTime>) -> Option<String> {
    time.ok().map(|t| DateTime::<Utc>::from(t).to_rfc3339())
}

/// Inode change time, for filesystems that do not record a birth time.
#[cfg(unix)]
fn changed_at(meta: &Metadata) -> Option<String> {
    use std::os::unix::fs::MetadataExt;
    DateTime::from_timestamp(meta.ctime(), meta.ctime_nsec() as u32).map(|dt| dt.to_rfc3339())
}

#[cfg(not(unix))]
fn changed_at(_meta: &Metadata) -> Option<String> {
    None
}

#[cfg(unix)]
fn permissions(meta: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    mode_string(meta.permissions().mode())
}

#[cfg(not(unix))]
fn permissions(meta: &Metadata) -> String {
    if meta.permissions().readonly() {
        "r--r--r--".into()
    } else {
        "rw-rw-rw-".into()
    }
}

/// Render the nine permission bits of a Unix mode.
#[cfg(unix)]
fn mode_string(mode: u32) -> String {
    const BITS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    BITS.iter()
        .map(|&(bit, c)| if mode & bit != 0 { c } else { '-' })
        .collect()
}
