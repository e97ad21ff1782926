//! Discovery of archives below a root directory.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// File extension recognized as an archive (compared case-insensitively).
pub const ARCHIVE_EXTENSION: &str = "zip";

/// A finite, re-iterable sequence of archive paths.
///
/// Each call to [`ArchiveSource::archives`] starts a fresh pass, so a source
/// can be consumed any number of times.
pub trait ArchiveSource {
    fn archives(&self) -> Box<dyn Iterator<Item = PathBuf> + '_>;
}

/// Recursive filesystem scan for `.zip` files.
///
/// Entries are visited in file-name order. Hidden entries (names starting
/// with `.`) are not descended into and unreadable directories are logged
/// and skipped. Symlinked directories are not followed, but a symlink whose
/// target is a file is reported like a regular archive.
#[derive(Debug, Clone)]
pub struct DirectoryScan {
    root: PathBuf,
}

impl DirectoryScan {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArchiveSource for DirectoryScan {
    fn archives(&self) -> Box<dyn Iterator<Item = PathBuf> + '_> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        Box::new(walker.filter_map(|result| match result {
            Ok(entry) if is_file_like(&entry) && is_archive_name(entry.path()) => {
                Some(entry.into_path())
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable path during scan");
                None
            }
        }))
    }
}

impl ArchiveSource for [PathBuf] {
    fn archives(&self) -> Box<dyn Iterator<Item = PathBuf> + '_> {
        Box::new(self.iter().cloned())
    }
}

impl ArchiveSource for Vec<PathBuf> {
    fn archives(&self) -> Box<dyn Iterator<Item = PathBuf> + '_> {
        self.as_slice().archives()
    }
}

/// Whether a path names an archive by extension.
pub fn is_archive_name(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}

fn is_file_like(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_is_archive_name() {
        assert!(is_archive_name(Path::new("a.zip")));
        assert!(is_archive_name(Path::new("dir/A.ZIP")));
        assert!(is_archive_name(Path::new("x.tar.zip")));
        assert!(!is_archive_name(Path::new("a.zipx")));
        assert!(!is_archive_name(Path::new("zip")));
        assert!(!is_archive_name(Path::new("a.tar.gz")));
    }

    #[test]
    fn test_scan_finds_nested_archives_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("b.zip"));
        touch(&root.join("a.zip"));
        touch(&root.join("notes.txt"));
        touch(&root.join("deep/er/still/c.zip"));
        touch(&root.join("deep/d.Zip"));

        let found: Vec<PathBuf> = DirectoryScan::new(root).archives().collect();

        assert_eq!(
            found,
            vec![
                root.join("a.zip"),
                root.join("b.zip"),
                root.join("deep/d.Zip"),
                root.join("deep/er/still/c.zip"),
            ]
        );
    }

    #[test]
    fn test_scan_skips_hidden_entries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join(".hidden.zip"));
        touch(&root.join(".cache/inner.zip"));
        touch(&root.join("visible.zip"));

        let found: Vec<PathBuf> = DirectoryScan::new(root).archives().collect();
        assert_eq!(found, vec![root.join("visible.zip")]);
    }

    #[test]
    fn test_scan_ignores_directories_named_like_archives() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("folder.zip")).unwrap();
        touch(&root.join("folder.zip/real.zip"));

        let found: Vec<PathBuf> = DirectoryScan::new(root).archives().collect();
        assert_eq!(found, vec![root.join("folder.zip/real.zip")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_reports_symlinked_archives() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        let store = temp_dir.path().join("store");
        touch(&store.join("real.zip"));
        touch(&store.join("sub/inner.zip"));
        fs::create_dir_all(&root).unwrap();

        symlink(store.join("real.zip"), root.join("linked.zip")).unwrap();
        symlink(store.join("sub"), root.join("dir.zip")).unwrap();
        symlink(store.join("missing.zip"), root.join("dangling.zip")).unwrap();

        let found: Vec<PathBuf> = DirectoryScan::new(&root).archives().collect();
        assert_eq!(found, vec![root.join("linked.zip")]);
    }

    #[test]
    fn test_scan_is_restartable() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("one.zip"));

        let scan = DirectoryScan::new(root);
        assert_eq!(scan.archives().count(), 1);

        touch(&root.join("two.zip"));
        assert_eq!(scan.archives().count(), 2);
    }

    #[test]
    fn test_hidden_root_is_still_scanned() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join(".downloads");
        touch(&root.join("x.zip"));

        let found: Vec<PathBuf> = DirectoryScan::new(&root).archives().collect();
        assert_eq!(found, vec![root.join("x.zip")]);
    }

    #[test]
    fn test_path_list_source() {
        let paths = vec![PathBuf::from("a.zip"), PathBuf::from("b.zip")];
        assert_eq!(paths.archives().collect::<Vec<_>>(), paths);
        assert_eq!(paths.archives().count(), 2);
    }
}
