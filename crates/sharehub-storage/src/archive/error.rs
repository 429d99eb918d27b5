//! Archive export error type.

use thiserror::Error;

use sharehub_core::error::{AppError, ErrorKind};

/// Errors that abort an export.
///
/// Per-file read failures are not errors; they are reported as skipped
/// entries in the manifest.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Writing to the output sink failed (client gone, encoder failure).
    #[error("archive sink failed: {0}")]
    Sink(#[source] std::io::Error),

    /// The export was cancelled before completion.
    #[error("archive export cancelled")]
    Cancelled,

    /// A walker or worker thread panicked.
    #[error("archive worker panicked")]
    WorkerPanicked,
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        Self::Sink(err)
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Self::Sink(e),
            other => Self::Sink(std::io::Error::other(other)),
        }
    }
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        AppError::with_source(ErrorKind::Archive, err.to_string(), err)
    }
}
