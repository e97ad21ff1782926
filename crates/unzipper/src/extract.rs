//! Single-archive extraction with staging and safety checks.

use crate::error::{map_read_error, ExtractError, SecurityError};
use crate::safety::{check_size_limits, sanitize_entry_name, EntryType};
use crate::types::{ExtractOptions, ExtractStats};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, Write};
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, warn};

/// Extract a ZIP archive into a directory that does not exist yet.
///
/// This function performs extraction with the following guarantees:
/// - Entries are unpacked into a hidden staging directory next to
///   `output_dir` and renamed into place only once every entry is written,
///   so `output_dir` either appears complete or not at all
/// - Entry names are cleaned so every entry lands inside `output_dir`:
///   roots, drive prefixes and `..` are dropped (counted in `entries_renamed`)
/// - Symlink entries are written as regular files holding the link target
/// - Declared and actual decompressed sizes are held to
///   `options.size_limit_bytes`
///
/// # Arguments
///
/// * `archive_path` - Path to the ZIP file
/// * `output_dir` - Directory to create with the archive's contents
/// * `options` - Extraction limits
///
/// # Errors
///
/// - [`ExtractError::NotFound`] if the archive does not exist
/// - [`ExtractError::TargetExists`] if `output_dir` already exists
/// - [`ExtractError::Corrupted`] for malformed archives and CRC mismatches
/// - [`ExtractError::UnsupportedFormat`] for encrypted entries or unknown compression
/// - [`ExtractError::SizeLimitExceeded`] when the contents are too large
/// - [`ExtractError::Security`] for a file entry whose name cannot be placed
///   inside `output_dir`
/// - [`ExtractError::Io`] for filesystem failures
pub fn extract_archive(
    archive_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<ExtractStats, ExtractError> {
    let start_time = Instant::now();

    if !archive_path.is_file() {
        return Err(ExtractError::NotFound(archive_path.to_path_buf()));
    }

    if path_occupied(output_dir) {
        return Err(ExtractError::TargetExists(output_dir.to_path_buf()));
    }

    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    debug!(
        archive = %archive_path.display(),
        entries = archive.len(),
        "Opened archive"
    );

    let staging = create_staging_dir(output_dir)?;
    let mut stats = ExtractStats::default();

    unpack_entries(&mut archive, staging.path(), options, &mut stats)?;

    // Something may have appeared at the target while we were unpacking.
    if path_occupied(output_dir) {
        return Err(ExtractError::TargetExists(output_dir.to_path_buf()));
    }
    fs::rename(staging.path(), output_dir)?;

    stats.duration = start_time.elapsed();
    Ok(stats)
}

/// Write every entry of `archive` below `dest`.
fn unpack_entries<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    dest: &Path,
    options: &ExtractOptions,
    stats: &mut ExtractStats,
) -> Result<(), ExtractError> {
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        let entry_type = EntryType::from_flags(entry.is_dir(), entry.is_symlink());

        let relative = match sanitize_entry_name(&name) {
            Ok(path) => path,
            // "./" and friends name the target itself, which already exists.
            Err(SecurityError::EmptyName(_)) if entry_type.is_dir() => continue,
            Err(e) => return Err(e.into()),
        };

        if is_renamed(&name, &relative) {
            warn!(
                entry = %name,
                path = %relative.display(),
                "Entry name rewritten to stay inside target"
            );
            stats.entries_renamed += 1;
        }

        let out_path = dest.join(&relative);

        if entry_type.is_dir() {
            fs::create_dir_all(&out_path)?;
            stats.dirs_created += 1;
            continue;
        }

        // Declared size first; the bounded copy below catches entries that lie.
        check_size_limits(
            stats.bytes_written.saturating_add(entry.size()),
            options.size_limit_bytes,
        )?;

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if entry_type == EntryType::Symlink {
            debug!(entry = %name, "Writing symlink entry as a regular file");
        }

        let mut outfile = File::create(&out_path)?;
        let written = copy_bounded(
            &mut entry,
            &mut outfile,
            stats.bytes_written,
            options.size_limit_bytes,
        )?;
        outfile.flush()?;

        stats.bytes_written += written;
        stats.files_extracted += 1;
        debug!(entry = %name, bytes = written, "Extracted entry");
    }

    Ok(())
}

/// Whether cleaning dropped anything beyond `.` parts, repeated or trailing
/// separators.
fn is_renamed(name: &str, relative: &Path) -> bool {
    let kept: Vec<&str> = name
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    kept.len() != relative.components().count()
        || name.starts_with(['/', '\\'])
        || kept.first().is_some_and(|first| {
            let bytes = first.as_bytes();
            bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
        })
}

/// Copy `reader` into `writer`, failing once the running total passes `limit`.
///
/// Returns the number of bytes copied.
fn copy_bounded<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    already_written: u64,
    limit: Option<u64>,
) -> Result<u64, ExtractError> {
    let Some(limit) = limit else {
        return io::copy(reader, writer).map_err(map_read_error);
    };

    let remaining = limit.saturating_sub(already_written);
    // One byte past the budget is enough to know the entry is too big.
    let mut bounded = reader.take(remaining.saturating_add(1));
    let copied = io::copy(&mut bounded, writer).map_err(map_read_error)?;

    check_size_limits(already_written + copied, Some(limit))?;
    Ok(copied)
}

/// Create the hidden staging directory in the same parent as `output_dir`,
/// so the final rename never crosses filesystems.
fn create_staging_dir(output_dir: &Path) -> Result<TempDir, ExtractError> {
    let parent = match output_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let prefix = match output_dir.file_name() {
        Some(name) => format!(".{}.", name.to_string_lossy()),
        None => ".unzip.".to_string(),
    };

    let staging = tempfile::Builder::new()
        .prefix(&prefix)
        .tempdir_in(parent)?;
    Ok(staging)
}

/// True if anything (file, directory, dangling symlink) sits at `path`.
fn path_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
