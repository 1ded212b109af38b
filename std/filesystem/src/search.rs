//! Case-insensitive name search below a directory.

use crate::error::{Error, Result};
use crate::exclude::ExclusionPatterns;
use glob::{MatchOptions, Pattern};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Find entries under `root` whose name matches the shell glob `pattern`.
///
/// Recursive searches return files only, in depth-first order sorted by
/// name, skipping excluded names and never entering an excluded directory.
/// Non-recursive searches return every matching immediate entry of any
/// type, sorted by name; exclusions do not apply there.
pub fn search(
    root: &Path,
    pattern: &str,
    recursive: bool,
    exclusions: &ExclusionPatterns,
) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    if recursive {
        Ok(walk(root, &pattern, exclusions))
    } else {
        shallow(root, &pattern)
    }
}

fn matches(pattern: &Pattern, name: &OsStr) -> bool {
    pattern.matches_with(&name.to_string_lossy(), NAME_MATCH)
}

fn walk(root: &Path, pattern: &Pattern, exclusions: &ExclusionPatterns) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !exclusions.is_excluded(entry.file_name()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry during search");
                None
            }
        })
        .filter(|entry| entry.depth() > 0 && !is_dir(entry))
        .filter(|entry| matches(pattern, entry.file_name()))
        .map(DirEntry::into_path)
        .collect()
}

/// Links to directories count as directories, as they would for a shell.
fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
}

fn shallow(root: &Path, pattern: &Pattern) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for item in fs::read_dir(root).map_err(|e| Error::io("list", root, e))? {
        let item = item.map_err(|e| Error::io("list", root, e))?;
        if matches(pattern, &item.file_name()) {
            found.push(item.path());
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use crate::exclude::ExclusionPatterns;
    use crate::search::search;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn tree() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir(root.join("docs.txt")).unwrap();
        fs::write(root.join("a.txt"), "").unwrap();
        fs::write(root.join("B.TXT"), "").unwrap();
        fs::write(root.join("c.rs"), "").unwrap();
        fs::write(root.join("sub/d.Txt"), "").unwrap();
        fs::write(root.join("sub/deeper/e.txt"), "").unwrap();
        fs::write(root.join(".git/notes.txt"), "").unwrap();
        fs::write(root.join(".git/objects/pack.txt"), "").unwrap();
        tmp
    }

    fn names(root: &Path, found: &[PathBuf]) -> Vec<String> {
        found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn recursive_matches_files_case_insensitively() {
        let tmp = tree();
        let found = search(tmp.path(), "*.txt", true, &ExclusionPatterns::defaults()).unwrap();
        assert_eq!(
            names(tmp.path(), &found),
            ["B.TXT", "a.txt", "sub/d.Txt", "sub/deeper/e.txt"]
        );
        assert!(found.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn recursive_without_exclusions_enters_vcs_dirs() {
        let tmp = tree();
        let found = search(tmp.path(), "*.txt", true, &ExclusionPatterns::default()).unwrap();
        let found = names(tmp.path(), &found);
        assert!(found.contains(&".git/notes.txt".to_string()));
        assert!(found.contains(&".git/objects/pack.txt".to_string()));
    }

    #[test]
    fn shallow_matches_immediate_entries_only() {
        let tmp = tree();
        let found = search(tmp.path(), "*.TXT", false, &ExclusionPatterns::defaults()).unwrap();
        assert_eq!(names(tmp.path(), &found), ["B.TXT", "a.txt", "docs.txt"]);
    }

    #[test]
    fn shallow_ignores_exclusions() {
        let tmp = tree();
        fs::write(tmp.path().join("m.pyc"), "").unwrap();
        let found = search(tmp.path(), "*", false, &ExclusionPatterns::defaults()).unwrap();
        assert_eq!(
            names(tmp.path(), &found),
            [".git", "B.TXT", "a.txt", "c.rs", "docs.txt", "m.pyc", "sub"]
        );
    }

    #[test]
    fn supports_wildcards_and_classes() {
        let tmp = tree();
        let ex = ExclusionPatterns::defaults();
        let found = search(tmp.path(), "?.rs", true, &ex).unwrap();
        assert_eq!(names(tmp.path(), &found), ["c.rs"]);
        let found = search(tmp.path(), "[ab].txt", false, &ex).unwrap();
        assert_eq!(names(tmp.path(), &found), ["B.TXT", "a.txt"]);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let tmp = tree();
        assert!(search(tmp.path(), "[", true, &ExclusionPatterns::defaults()).is_err());
    }
}
