//! Storage provider implementations.

pub mod local;

pub use local::{DirEntryInfo, LocalShareProvider, ResolvedEntry, StoredFile, sanitize_file_name};
