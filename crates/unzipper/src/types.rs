//! Type definitions for bulk archive extraction.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Suffix appended to an archive's stem to name its output directory.
pub const TARGET_SUFFIX: &str = "_unzipped";

/// Options for extracting a single archive.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum total extracted size in bytes (default: 20 GB)
    pub size_limit_bytes: Option<u64>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            size_limit_bytes: Some(20 * 1024 * 1024 * 1024), // 20 GB
        }
    }
}

/// Configuration for a bulk run over a directory tree.
#[derive(Debug, Clone)]
pub struct BulkConfig {
    /// Directory to search recursively for archives
    pub root: PathBuf,

    /// Remove each archive once it has been extracted successfully
    pub delete_after_extract: bool,

    /// Limits applied to every archive
    pub options: ExtractOptions,
}

impl BulkConfig {
    pub fn new(root: impl Into<PathBuf>, delete_after_extract: bool) -> Self {
        Self {
            root: root.into(),
            delete_after_extract,
            options: ExtractOptions::default(),
        }
    }
}

/// One archive found during a scan, with its derived output location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTask {
    /// Path of the archive file
    pub source_path: PathBuf,

    /// Directory holding the archive
    pub containing_dir: PathBuf,

    /// File name of the archive, extension included
    pub archive_name: OsString,

    /// `<stem>_unzipped` next to the archive
    pub target_dir: PathBuf,
}

impl ArchiveTask {
    /// Derive a task from an archive path.
    ///
    /// Returns `None` for paths without a file name (e.g. `/` or `..`).
    pub fn from_path(source_path: &Path) -> Option<Self> {
        let archive_name = source_path.file_name()?.to_os_string();
        let stem = source_path.file_stem()?;
        let containing_dir = source_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut target_name = stem.to_os_string();
        target_name.push(TARGET_SUFFIX);
        let target_dir = containing_dir.join(target_name);

        Some(Self {
            source_path: source_path.to_path_buf(),
            containing_dir,
            archive_name,
            target_dir,
        })
    }

    /// Archive file name for display.
    pub fn display_name(&self) -> String {
        self.archive_name.to_string_lossy().into_owned()
    }
}

/// Statistics about a completed extraction operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractStats {
    /// Number of files successfully extracted
    pub files_extracted: u64,

    /// Number of directories created inside the target
    pub dirs_created: u64,

    /// Total bytes written to disk
    pub bytes_written: u64,

    /// Entries whose stored name was rewritten to stay inside the target
    /// (absolute paths, drive prefixes, `..` components)
    pub entries_renamed: u64,

    /// Duration of the extraction operation (in milliseconds)
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// Why an archive could not be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadArchiveKind {
    /// Malformed central directory, bad CRC, truncated data
    Corrupted,

    /// Uncompressed contents exceed the configured size limit
    Oversized,

    /// Encrypted entries or unknown compression methods
    Unsupported,

    /// An entry name that cannot be placed inside the target
    Unsafe,

    /// Any other failure while reading or writing
    Io,
}

impl BadArchiveKind {
    pub fn from_error(error: &ExtractError) -> Self {
        match error {
            ExtractError::Corrupted(_) => BadArchiveKind::Corrupted,
            ExtractError::SizeLimitExceeded { .. } => BadArchiveKind::Oversized,
            ExtractError::UnsupportedFormat(_) => BadArchiveKind::Unsupported,
            ExtractError::Security(_) => BadArchiveKind::Unsafe,
            ExtractError::NotFound(_)
            | ExtractError::InvalidRoot(_)
            | ExtractError::TargetExists(_)
            | ExtractError::Io(_) => BadArchiveKind::Io,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            BadArchiveKind::Corrupted => "bad zip file",
            BadArchiveKind::Oversized => "zip file too large",
            BadArchiveKind::Unsupported => "unsupported zip file",
            BadArchiveKind::Unsafe => "unsafe zip file",
            BadArchiveKind::Io => "unreadable zip file",
        }
    }
}

/// Terminal state of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The `_unzipped` directory was already present; nothing touched
    SkippedAlreadyExists,

    /// Extraction succeeded and the archive was removed
    Deleted,

    /// Extraction succeeded and the archive was kept (delete flag off)
    Kept,

    /// Extraction succeeded but the archive could not be removed
    DeleteFailed { reason: String },

    /// The archive could not be extracted; it was left in place
    SkippedBadArchive { kind: BadArchiveKind, reason: String },
}

impl TaskOutcome {
    /// Whether the task passed through the extracted state.
    pub fn is_extracted(&self) -> bool {
        matches!(
            self,
            TaskOutcome::Deleted | TaskOutcome::Kept | TaskOutcome::DeleteFailed { .. }
        )
    }
}

/// Event emitted to the caller as a task moves through its states.
#[derive(Debug)]
pub enum TaskEvent<'a> {
    /// Target directory exists, task skipped.
    AlreadyExists { task: &'a ArchiveTask },

    /// Archive contents written to the target directory.
    Extracted {
        task: &'a ArchiveTask,
        stats: &'a ExtractStats,
    },

    /// Archive removed after extraction.
    Deleted { task: &'a ArchiveTask },

    /// Archive could not be removed after extraction.
    DeleteFailed {
        task: &'a ArchiveTask,
        error: &'a std::io::Error,
    },

    /// Archive could not be extracted and was skipped.
    Skipped {
        task: &'a ArchiveTask,
        kind: BadArchiveKind,
        error: &'a ExtractError,
    },
}

/// Record of one processed archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub source_path: PathBuf,
    pub target_dir: PathBuf,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
}

/// Tally of a bulk run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Archives that reached the extracted state
    pub extracted: u64,

    /// Archives skipped because their target already existed
    pub skipped_existing: u64,

    /// Archives skipped because extraction failed
    pub skipped_bad: u64,

    /// Archives removed after extraction
    pub deleted: u64,

    /// Archives that could not be removed after extraction
    pub delete_failures: u64,

    /// Per-archive outcomes in processing order
    pub tasks: Vec<TaskRecord>,
}

impl RunSummary {
    pub(crate) fn record(&mut self, task: &ArchiveTask, outcome: TaskOutcome) {
        match &outcome {
            TaskOutcome::SkippedAlreadyExists => self.skipped_existing += 1,
            TaskOutcome::SkippedBadArchive { .. } => self.skipped_bad += 1,
            TaskOutcome::Deleted => {
                self.extracted += 1;
                self.deleted += 1;
            }
            TaskOutcome::Kept => self.extracted += 1,
            TaskOutcome::DeleteFailed { .. } => {
                self.extracted += 1;
                self.delete_failures += 1;
            }
        }

        self.tasks.push(TaskRecord {
            source_path: task.source_path.clone(),
            target_dir: task.target_dir.clone(),
            outcome,
        });
    }
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
