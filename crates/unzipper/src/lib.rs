//! # Unzipper
//!
//! Recursive bulk extraction of ZIP archives.
//!
//! Every `*.zip` below a root directory is extracted into a sibling folder
//! named `<stem>_unzipped`. Archives whose folder already exists are left
//! alone, archives that cannot be read are skipped, and successfully
//! extracted archives can optionally be deleted.
//!
//! ## Example
//!
//! ```rust,no_run
//! use unzipper::{run, BulkConfig, TaskEvent};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BulkConfig::new("/srv/incoming", false);
//!
//! let summary = run(&config, &mut |event| {
//!     if let TaskEvent::Extracted { task, .. } = event {
//!         println!("{} -> {}", task.source_path.display(), task.target_dir.display());
//!     }
//! })?;
//!
//! println!("{} zip files extracted", summary.extracted);
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod error;
pub mod extract;
pub mod safety;
pub mod scan;
pub mod types;

// Re-export main types
pub use bulk::{run, run_with_source, EventCallback};
pub use error::{ExtractError, SecurityError};
pub use safety::EntryType;
pub use scan::{ArchiveSource, DirectoryScan};
pub use types::{
    ArchiveTask, BadArchiveKind, BulkConfig, ExtractOptions, ExtractStats, RunSummary, TaskEvent,
    TaskOutcome, TaskRecord,
};

use std::path::Path;

/// Extract a single archive into a directory that must not exist yet.
///
/// # Arguments
///
/// * `archive_path` - Path to the ZIP file
/// * `output_dir` - Directory to create with the archive's contents
/// * `options` - Extraction limits
///
/// # Returns
///
/// Returns `ExtractStats` with extraction statistics on success.
///
/// # Errors
///
/// Returns an error if:
/// - The archive file doesn't exist or is corrupted
/// - `output_dir` already exists
/// - The contents exceed the size limit
/// - I/O errors occur
pub fn extract(
    archive_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<ExtractStats, ExtractError> {
    extract::extract_archive(archive_path, output_dir, options)
}
