//! Security and safety checks for archive extraction.
//!
//! Entry names inside a ZIP are untrusted input. Everything written during
//! extraction goes through [`sanitize_entry_name`] so that no entry can land
//! outside the target directory (zip-slip), and through [`check_size_limits`]
//! so that a single archive cannot fill the disk.

use crate::error::{ExtractError, SecurityError};
use std::path::PathBuf;

/// Entry type for filtering special file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
}

impl EntryType {
    /// Classify an entry from its header flags.
    pub fn from_flags(is_dir: bool, is_symlink: bool) -> Self {
        if is_dir {
            EntryType::Directory
        } else if is_symlink {
            EntryType::Symlink
        } else {
            EntryType::File
        }
    }

    /// Symlinks are written as regular files holding the link target, so
    /// only directories need special handling.
    pub fn is_dir(self) -> bool {
        matches!(self, EntryType::Directory)
    }
}

/// Turns a ZIP entry name into a relative path inside the target.
///
/// Both `/` and `\` are treated as separators, since archives built on
/// Windows frequently use the latter. A drive prefix (`C:`), leading
/// separators, and `.` / `..` components are dropped, so `/etc/passwd`
/// becomes `etc/passwd` and `../up.txt` becomes `up.txt`.
///
/// Fails for names containing NUL bytes and for names with no components
/// left after cleaning (`..`, `/`).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use unzipper::safety::sanitize_entry_name;
///
/// let path = sanitize_entry_name("dir/file.txt").unwrap();
/// assert_eq!(path, Path::new("dir/file.txt"));
///
/// assert_eq!(sanitize_entry_name("../../etc/passwd").unwrap(), Path::new("etc/passwd"));
/// assert_eq!(sanitize_entry_name("/abs.txt").unwrap(), Path::new("abs.txt"));
/// assert!(sanitize_entry_name("..").is_err());
/// ```
pub fn sanitize_entry_name(name: &str) -> Result<PathBuf, SecurityError> {
    if name.contains('\0') {
        return Err(SecurityError::InvalidName(format!(
            "Entry name contains NUL byte: {:?}",
            name
        )));
    }

    let without_drive = strip_drive_prefix(name);
    let mut normalized = PathBuf::new();

    for part in without_drive.split(['/', '\\']) {
        match part {
            "" | "." | ".." => continue,
            _ => normalized.push(part),
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(SecurityError::EmptyName(name.to_string()));
    }

    Ok(normalized)
}

fn strip_drive_prefix(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        &name[2..]
    } else {
        name
    }
}

/// Checks if the extracted size so far exceeds the configured limit.
///
/// # Examples
///
/// ```
/// use unzipper::safety::check_size_limits;
///
/// assert!(check_size_limits(1000, Some(2000)).is_ok());
/// assert!(check_size_limits(3000, Some(2000)).is_err());
/// assert!(check_size_limits(999_999_999, None).is_ok());
/// ```
pub fn check_size_limits(current_bytes: u64, limit: Option<u64>) -> Result<(), ExtractError> {
    match limit {
        Some(max_bytes) if current_bytes > max_bytes => Err(ExtractError::SizeLimitExceeded {
            current: current_bytes,
            limit: max_bytes,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_sanitize_entry_name_valid() {
        assert_eq!(sanitize_entry_name("file.txt").unwrap(), Path::new("file.txt"));
        assert_eq!(
            sanitize_entry_name("dir/subdir/file.txt").unwrap(),
            Path::new("dir/subdir/file.txt")
        );
        assert_eq!(
            sanitize_entry_name("./dir/file.txt").unwrap(),
            Path::new("dir/file.txt")
        );
    }

    #[test]
    fn test_sanitize_entry_name_backslashes() {
        assert_eq!(
            sanitize_entry_name("dir\\sub\\file.txt").unwrap(),
            Path::new("dir/sub/file.txt")
        );
        assert_eq!(
            sanitize_entry_name("dir\\..\\..\\evil").unwrap(),
            Path::new("dir/evil")
        );
    }

    #[test]
    fn test_sanitize_entry_name_strips_roots() {
        assert_eq!(sanitize_entry_name("/etc/passwd").unwrap(), Path::new("etc/passwd"));
        assert_eq!(
            sanitize_entry_name("\\\\server\\share\\x").unwrap(),
            Path::new("server/share/x")
        );
        assert_eq!(
            sanitize_entry_name("C:\\Windows\\system.ini").unwrap(),
            Path::new("Windows/system.ini")
        );
        assert_eq!(sanitize_entry_name("c:/x.txt").unwrap(), Path::new("x.txt"));
    }

    #[test]
    fn test_sanitize_entry_name_drops_parent_components() {
        for (name, expected) in [
            ("../etc/passwd", "etc/passwd"),
            ("../../etc/passwd", "etc/passwd"),
            ("dir/../etc/passwd", "dir/etc/passwd"),
            ("./../../etc/passwd", "etc/passwd"),
            ("safe/../../etc/passwd", "safe/etc/passwd"),
        ] {
            assert_eq!(sanitize_entry_name(name).unwrap(), Path::new(expected), "{}", name);
        }
    }

    #[test]
    fn test_sanitize_entry_name_edge_cases() {
        assert_eq!(
            sanitize_entry_name("dir//file.txt").unwrap(),
            Path::new("dir/file.txt")
        );
        assert_eq!(
            sanitize_entry_name("./././file.txt").unwrap(),
            Path::new("file.txt")
        );
        assert_eq!(
            sanitize_entry_name("dir/subdir/").unwrap(),
            Path::new("dir/subdir")
        );
        // Dots inside a component are just part of the name
        assert_eq!(
            sanitize_entry_name("..hidden/file..txt").unwrap(),
            Path::new("..hidden/file..txt")
        );
    }

    #[test]
    fn test_sanitize_entry_name_rejects() {
        for name in ["", ".", "..", "/", "../..", "C:"] {
            assert!(
                matches!(sanitize_entry_name(name), Err(SecurityError::EmptyName(_))),
                "{:?} should be rejected",
                name
            );
        }
        assert!(matches!(
            sanitize_entry_name("bad\0name"),
            Err(SecurityError::InvalidName(_))
        ));
    }

    #[test]
    fn test_sanitize_entry_name_unicode() {
        assert!(sanitize_entry_name("日本語/ファイル.txt").is_ok());
        assert!(sanitize_entry_name("folder/файл-file-文件.txt").is_ok());
        assert_eq!(
            sanitize_entry_name("日本語/../etc/passwd").unwrap(),
            Path::new("日本語/etc/passwd")
        );
    }

    #[test]
    fn test_check_size_limits_boundary() {
        assert!(check_size_limits(1000, Some(1000)).is_ok());
        assert!(matches!(
            check_size_limits(1001, Some(1000)),
            Err(ExtractError::SizeLimitExceeded {
                current: 1001,
                limit: 1000
            })
        ));

        let gb_20 = 20 * 1024 * 1024 * 1024u64;
        assert!(check_size_limits(gb_20, Some(gb_20)).is_ok());
        assert!(check_size_limits(gb_20 + 1, Some(gb_20)).is_err());
        assert!(check_size_limits(u64::MAX, None).is_ok());
    }

    #[test]
    fn test_entry_type_from_flags() {
        assert_eq!(EntryType::from_flags(true, false), EntryType::Directory);
        assert_eq!(EntryType::from_flags(false, true), EntryType::Symlink);
        assert_eq!(EntryType::from_flags(false, false), EntryType::File);

        assert!(EntryType::Directory.is_dir());
        assert!(!EntryType::Symlink.is_dir());
    }
}
