//! Path validation and security for the filesystem MCP server.
//!
//! Every tool resolves its path arguments through [`AllowedRoots::validate`]
//! before touching the filesystem. Containment is checked twice: once on the
//! lexical absolute path, so obviously-outside requests never reach the
//! filesystem, and once on the symlink-resolved path, so a link inside a root
//! cannot point the operation somewhere else.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Upper bound on dangling links followed while resolving a new path.
const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
struct AllowedRoot {
    /// Absolute, lexically normalized form as configured.
    configured: PathBuf,
    /// Fully resolved form.
    canonical: PathBuf,
}

/// The directories the server may touch, fixed at construction.
#[derive(Debug, Clone)]
pub struct AllowedRoots {
    roots: Vec<AllowedRoot>,
}

impl AllowedRoots {
    /// Resolve the configured directories.
    ///
    /// Fails if the list is empty or any entry is missing or not a directory.
    pub fn new<I, P>(dirs: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut roots: Vec<AllowedRoot> = Vec::new();
        for dir in dirs {
            let dir = dir.as_ref();
            let invalid = |reason: String| Error::InvalidRoot {
                path: dir.to_path_buf(),
                reason,
            };
            let configured = absolute(dir).map_err(|e| invalid(e.to_string()))?;
            let canonical = configured
                .canonicalize()
                .map_err(|e| invalid(e.to_string()))?;
            if !canonical.is_dir() {
                return Err(invalid("not a directory".into()));
            }
            if roots.iter().all(|root| root.canonical != canonical) {
                roots.push(AllowedRoot {
                    configured,
                    canonical,
                });
            }
        }
        if roots.is_empty() {
            return Err(Error::InvalidRoot {
                path: PathBuf::new(),
                reason: "at least one allowed directory is required".into(),
            });
        }
        Ok(Self { roots })
    }

    /// Canonical form of each root, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(|root| root.canonical.as_path())
    }

    fn contains_lexically(&self, path: &Path) -> bool {
        self.roots
            .iter()
            .any(|root| path.starts_with(&root.configured) || path.starts_with(&root.canonical))
    }

    fn contains_canonical(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(&root.canonical))
    }

    /// Validate that a path is within the allowed directories.
    ///
    /// Steps:
    /// 1. Reject empty paths and paths containing null bytes
    /// 2. Make the path absolute and fold `.` and `..` lexically
    /// 3. Require the absolute path to start with one of the roots
    /// 4. If the path exists, canonicalize it and re-check containment
    ///    - Otherwise resolve the nearest existing ancestor instead, check
    ///      its containment, and append the missing components
    ///
    /// Returns the canonical path, or for a path that does not exist yet the
    /// canonical ancestor joined with the remaining components.
    pub fn validate(&self, requested: &str) -> Result<PathBuf> {
        if requested.is_empty() {
            return Err(Error::InvalidPath("path is empty".into()));
        }
        if requested.contains('\0') {
            return Err(Error::InvalidPath("path contains null byte".into()));
        }

        let path = absolute(Path::new(requested))
            .map_err(|e| Error::InvalidPath(format!("{requested}: {e}")))?;
        if !self.contains_lexically(&path) {
            return Err(Error::AccessDenied {
                path,
                reason: "path outside allowed directories",
            });
        }

        match path.canonicalize() {
            Ok(canonical) => {
                if !self.contains_canonical(&canonical) {
                    return Err(Error::AccessDenied {
                        path,
                        reason: "symlink target outside allowed directories",
                    });
                }
                Ok(canonical)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                ) =>
            {
                self.resolve_missing(&path)
            }
            Err(e) => Err(Error::io("resolve", &path, e)),
        }
    }

    /// Resolve a path that does not exist through its nearest existing
    /// ancestor.
    ///
    /// Dangling links are followed the way the kernel would on create, so
    /// their targets must stay inside the roots, but the path returned names
    /// the first link itself under its canonical parent.
    fn resolve_missing(&self, requested: &Path) -> Result<PathBuf> {
        let mut current = requested.to_path_buf();
        let mut link_path: Option<PathBuf> = None;

        for _ in 0..MAX_SYMLINK_HOPS {
            let (existing, tail) = split_existing(&current)?;
            let meta = fs::symlink_metadata(&existing)
                .map_err(|e| Error::io("resolve", &existing, e))?;

            if meta.file_type().is_symlink() {
                let target = fs::read_link(&existing)
                    .map_err(|e| Error::io("read link", &existing, e))?;
                let base = match existing.parent() {
                    Some(parent) => parent
                        .canonicalize()
                        .map_err(|e| Error::io("resolve", parent, e))?,
                    None => PathBuf::from(Component::RootDir.as_os_str()),
                };
                if link_path.is_none() {
                    let name = existing.file_name().unwrap_or_default();
                    link_path = Some(base.join(name).join(&tail));
                }
                current = normalize_lexically(&base.join(target)).join(tail);
                continue;
            }

            let canonical = existing
                .canonicalize()
                .map_err(|e| Error::io("resolve", &existing, e))?;
            if !self.contains_canonical(&canonical) {
                return Err(Error::AccessDenied {
                    path: requested.to_path_buf(),
                    reason: if link_path.is_some() {
                        "symlink target outside allowed directories"
                    } else {
                        "parent directory outside allowed directories"
                    },
                });
            }
            if !meta.is_dir() {
                return Err(Error::InvalidPath(format!(
                    "parent directory does not exist: {}",
                    current.parent().unwrap_or(&current).display()
                )));
            }
            return Ok(link_path.unwrap_or_else(|| canonical.join(tail)));
        }

        Err(Error::InvalidPath(format!(
            "too many levels of symbolic links: {}",
            requested.display()
        )))
    }
}

/// Split `path` into its deepest existing ancestor (not following a final
/// link) and the components below it.
fn split_existing(path: &Path) -> Result<(PathBuf, PathBuf)> {
    for ancestor in path.ancestors() {
        if fs::symlink_metadata(ancestor).is_ok() {
            let tail = path.strip_prefix(ancestor).unwrap_or(Path::new(""));
            return Ok((ancestor.to_path_buf(), tail.to_path_buf()));
        }
    }
    Err(Error::InvalidPath(format!(
        "parent directory does not exist: {}",
        path.display()
    )))
}

/// Absolute form of `path` against the working directory, with `.` and `..`
/// folded.
fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    Ok(normalize_lexically(&std::path::absolute(path)?))
}

/// Fold `.` and `..` without touching the filesystem. `..` never climbs
/// above the root.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut prefix: Vec<OsString> = Vec::new();
    let mut parts: Vec<OsString> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                prefix.push(component.as_os_str().to_os_string())
            }
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(part) => parts.push(part.to_os_string()),
        }
    }
    prefix.into_iter().chain(parts).collect()
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::validate::{AllowedRoots, normalize_lexically};
    use std::fs;
    use std::path::{Path, PathBuf};

    fn roots(dir: &Path) -> AllowedRoots {
        AllowedRoots::new([dir]).expect("valid root")
    }

    fn s(path: &Path) -> &str {
        path.to_str().expect("utf-8 path")
    }

    #[test]
    fn allows_path_within_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("notes.txt");
        fs::write(&file, "test").unwrap();
        let allowed = roots(tmp.path());
        let result = allowed.validate(s(&file)).expect("inside root");
        assert_eq!(result, file.canonicalize().unwrap());
        assert!(allowed.iter().any(|root| result.starts_with(root)));
    }

    #[test]
    fn allows_root_itself() {
        let tmp = tempfile::tempdir().unwrap();
        let allowed = roots(tmp.path());
        let result = allowed.validate(s(tmp.path())).expect("root");
        assert_eq!(result, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn rejects_path_outside_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("secret.txt");
        fs::write(&target, "secret").unwrap();
        let result = roots(tmp.path()).validate(s(&target));
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
    }

    #[test]
    fn rejects_sibling_sharing_a_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("data");
        let sibling = tmp.path().join("data2");
        fs::create_dir(&root).unwrap();
        fs::create_dir(&sibling).unwrap();
        let result = roots(&root).validate(s(&sibling.join("x.txt")));
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
    }

    #[test]
    fn rejects_parent_dir_escape() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(tmp.path().join("outside.txt"), "x").unwrap();
        let escape = format!("{}/../outside.txt", s(&root));
        let result = roots(&root).validate(&escape);
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
    }

    #[test]
    fn rejects_null_byte() {
        let tmp = tempfile::tempdir().unwrap();
        let path = format!("{}/foo\0bar", s(tmp.path()));
        let result = roots(tmp.path()).validate(&path);
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }

    #[test]
    fn allows_nonexistent_file_in_allowed_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("new.txt");
        let result = roots(tmp.path()).validate(s(&path)).expect("new file");
        assert_eq!(result, tmp.path().canonicalize().unwrap().join("new.txt"));
    }

    #[test]
    fn allows_nested_nonexistent_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a/b/c.txt");
        let result = roots(tmp.path()).validate(s(&path)).expect("nested");
        assert_eq!(result, tmp.path().canonicalize().unwrap().join("a/b/c.txt"));
    }

    #[test]
    fn rejects_child_of_regular_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("file.txt"), "x").unwrap();
        let path = tmp.path().join("file.txt/child");
        let result = roots(tmp.path()).validate(s(&path));
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_escape() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let allowed = roots(tmp.path());
        let result = allowed.validate(s(&link.join("secret.txt")));
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
        let result = allowed.validate(s(&link.join("new.txt")));
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_dangling_symlink_escape() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let link = tmp.path().join("dangling");
        std::os::unix::fs::symlink(outside.path().join("not-yet.txt"), &link).unwrap();
        let result = roots(tmp.path()).validate(s(&link));
        assert!(matches!(result, Err(Error::AccessDenied { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_inside_root_resolves_to_the_link() {
        let tmp = tempfile::tempdir().unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(tmp.path().join("target.txt"), &link).unwrap();
        let result = roots(tmp.path()).validate(s(&link)).expect("link inside root");
        assert_eq!(result, tmp.path().canonicalize().unwrap().join("link"));
        assert!(fs::symlink_metadata(&result).unwrap().file_type().is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn allows_symlink_inside_root() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("real")).unwrap();
        fs::write(tmp.path().join("real/file.txt"), "x").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("alias")).unwrap();
        let result = roots(tmp.path())
            .validate(s(&tmp.path().join("alias/file.txt")))
            .expect("link inside root");
        assert_eq!(
            result,
            tmp.path().canonicalize().unwrap().join("real/file.txt")
        );
    }

    #[test]
    fn new_rejects_missing_or_file_roots() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            AllowedRoots::new([tmp.path().join("missing")]),
            Err(Error::InvalidRoot { .. })
        ));
        assert!(matches!(
            AllowedRoots::new([&file]),
            Err(Error::InvalidRoot { .. })
        ));
        assert!(AllowedRoots::new(Vec::<PathBuf>::new()).is_err());
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize_lexically(Path::new("/../x")), PathBuf::from("/x"));
    }
}
