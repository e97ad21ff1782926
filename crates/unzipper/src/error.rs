//! Error types for archive extraction operations.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for extraction operations.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Archive file not found at the specified path.
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),

    /// The scan root does not exist or is not a directory.
    #[error("Invalid root directory: {0}")]
    InvalidRoot(PathBuf),

    /// The output directory for an archive already exists.
    #[error("Target already exists: {0}")]
    TargetExists(PathBuf),

    /// The archive uses a feature this build cannot read (encryption, unknown compression).
    #[error("Unsupported archive: {0}")]
    UnsupportedFormat(String),

    /// A security violation was detected during extraction.
    #[error("Security violation: {0}")]
    Security(#[from] SecurityError),

    /// The extraction size limit was exceeded.
    #[error("Size limit exceeded: {current} bytes > {limit} bytes")]
    SizeLimitExceeded {
        /// Extracted size in bytes at the point the limit was hit
        current: u64,
        /// Configured size limit in bytes
        limit: u64,
    },

    /// The archive is corrupted or malformed.
    #[error("Corrupted archive: {0}")]
    Corrupted(String),

    /// An I/O error occurred during extraction.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(e: zip::result::ZipError) -> Self {
        use zip::result::ZipError;

        match e {
            ZipError::Io(io) => map_read_error(io),
            ZipError::UnsupportedArchive(msg) => ExtractError::UnsupportedFormat(msg.to_string()),
            other => ExtractError::Corrupted(other.to_string()),
        }
    }
}

/// Classify an I/O error raised while reading archive data.
///
/// CRC mismatches and truncated streams surface from the zip reader as
/// `InvalidData` / `UnexpectedEof`; those describe the archive, not the disk.
pub(crate) fn map_read_error(e: std::io::Error) -> ExtractError {
    match e.kind() {
        std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => {
            ExtractError::Corrupted(e.to_string())
        }
        // Some zip releases report CRC failures as ErrorKind::Other
        _ if e.to_string().to_lowercase().contains("checksum") => {
            ExtractError::Corrupted(e.to_string())
        }
        _ => ExtractError::Io(e),
    }
}

/// Security-related errors during extraction.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Entry name that can never be a file name (e.g. contains NUL).
    #[error("Invalid entry name: {0}")]
    InvalidName(String),

    /// File entry whose name has no components left once roots and `..`
    /// are removed (e.g. "..").
    #[error("Entry name has no usable path: {0:?}")]
    EmptyName(String),
}
