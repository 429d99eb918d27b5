//! # sharehub-storage
//!
//! Filesystem side of ShareHub: resolving request paths under a share,
//! directory listings, multipart upload sinks, and the concurrent streaming
//! ZIP exporter.

pub mod archive;
pub mod providers;

pub use archive::{ArchiveError, ArchiveExporter, ExportManifest, ExportOptions};
pub use providers::LocalShareProvider;
