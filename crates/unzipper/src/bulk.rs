//! Sequential bulk extraction over every archive found below a root.

use crate::error::ExtractError;
use crate::extract::extract_archive;
use crate::scan::{ArchiveSource, DirectoryScan};
use crate::types::{ArchiveTask, BadArchiveKind, BulkConfig, RunSummary, TaskEvent, TaskOutcome};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Type alias for event callbacks.
///
/// Invoked once per state transition, in processing order.
pub type EventCallback<'cb> = dyn FnMut(&TaskEvent<'_>) + 'cb;

/// Extract every archive below `config.root`.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidRoot`] if the root is not an existing
/// directory. Nothing is scanned or written in that case. Per-archive
/// failures never abort the run; they are reported through `on_event` and
/// tallied in the returned [`RunSummary`].
pub fn run(config: &BulkConfig, on_event: &mut EventCallback<'_>) -> Result<RunSummary, ExtractError> {
    validate_root(&config.root)?;
    let scan = DirectoryScan::new(&config.root);
    Ok(process_all(config, &scan, on_event))
}

/// Like [`run`], but takes archive paths from an arbitrary source.
///
/// The root is still validated first.
pub fn run_with_source(
    config: &BulkConfig,
    source: &dyn ArchiveSource,
    on_event: &mut EventCallback<'_>,
) -> Result<RunSummary, ExtractError> {
    validate_root(&config.root)?;
    Ok(process_all(config, source, on_event))
}

fn validate_root(root: &Path) -> Result<(), ExtractError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(ExtractError::InvalidRoot(root.to_path_buf()))
    }
}

fn process_all(
    config: &BulkConfig,
    source: &dyn ArchiveSource,
    on_event: &mut EventCallback<'_>,
) -> RunSummary {
    info!(root = %config.root.display(), "Scanning for zip archives");

    let mut summary = RunSummary::default();

    for path in source.archives() {
        let Some(task) = ArchiveTask::from_path(&path) else {
            warn!(path = %path.display(), "Ignoring path without a file name");
            continue;
        };

        let outcome = process_task(config, &task, on_event);
        summary.record(&task, outcome);
    }

    info!(
        extracted = summary.extracted,
        skipped_existing = summary.skipped_existing,
        skipped_bad = summary.skipped_bad,
        "Run finished"
    );
    summary
}

/// Drive one task to a terminal state.
fn process_task(
    config: &BulkConfig,
    task: &ArchiveTask,
    on_event: &mut EventCallback<'_>,
) -> TaskOutcome {
    if fs::symlink_metadata(&task.target_dir).is_ok() {
        on_event(&TaskEvent::AlreadyExists { task });
        return TaskOutcome::SkippedAlreadyExists;
    }

    let stats = match extract_archive(&task.source_path, &task.target_dir, &config.options) {
        Ok(stats) => stats,
        // Lost a race with something else creating the target.
        Err(ExtractError::TargetExists(_)) => {
            on_event(&TaskEvent::AlreadyExists { task });
            return TaskOutcome::SkippedAlreadyExists;
        }
        Err(error) => {
            let kind = BadArchiveKind::from_error(&error);
            warn!(
                archive = %task.source_path.display(),
                error = %error,
                "Archive skipped"
            );
            on_event(&TaskEvent::Skipped {
                task,
                kind,
                error: &error,
            });
            return TaskOutcome::SkippedBadArchive {
                kind,
                reason: error.to_string(),
            };
        }
    };

    info!(
        archive = %task.source_path.display(),
        files = stats.files_extracted,
        bytes = stats.bytes_written,
        "Archive extracted"
    );
    on_event(&TaskEvent::Extracted {
        task,
        stats: &stats,
    });

    if !config.delete_after_extract {
        return TaskOutcome::Kept;
    }

    match fs::remove_file(&task.source_path) {
        Ok(()) => {
            on_event(&TaskEvent::Deleted { task });
            TaskOutcome::Deleted
        }
        Err(error) => {
            warn!(
                archive = %task.source_path.display(),
                error = %error,
                "Extracted archive could not be deleted"
            );
            on_event(&TaskEvent::DeleteFailed {
                task,
                error: &error,
            });
            TaskOutcome::DeleteFailed {
                reason: error.to_string(),
            }
        }
    }
}
