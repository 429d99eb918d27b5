//! Export results.

/// A file written to the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedEntry {
    /// Entry name, `/`-separated and relative to the exported root.
    pub path: String,
    /// Uncompressed size in bytes.
    pub size: u64,
}

/// A file (or directory) that could not be archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Path relative to the exported root.
    pub path: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Summary of a finished export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportManifest {
    /// Entries written, in completion order.
    pub entries: Vec<ArchivedEntry>,
    /// Files left out.
    pub skipped: Vec<SkippedFile>,
    /// Bytes handed to the sink, including ZIP framing.
    pub bytes_written: u64,
}

impl ExportManifest {
    /// Sum of the uncompressed entry sizes.
    pub fn content_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}
