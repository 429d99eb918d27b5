//! Streaming ZIP export of shared directories.

pub mod error;
pub mod exporter;
pub mod manifest;
pub mod pipe;
pub mod walker;

pub use error::ArchiveError;
pub use exporter::{ArchiveExporter, ExportOptions};
pub use manifest::{ArchivedEntry, ExportManifest, SkippedFile};
pub use pipe::{ArchiveBody, ChannelWriter, archive_pipe};
pub use walker::{ArchiveJob, FileWalker};
