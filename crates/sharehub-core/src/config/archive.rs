//! ZIP export configuration.

use serde::{Deserialize, Serialize};

/// Compression applied to archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    /// DEFLATE compression.
    #[default]
    Deflated,
    /// No compression.
    Stored,
}

/// Streaming archive exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Worker threads per export (0 = available parallelism minus one).
    #[serde(default)]
    pub workers: usize,
    /// Capacity of the job queue between walker and workers (0 = 2 x workers).
    #[serde(default)]
    pub queue_depth: usize,
    /// Size of each chunk handed to the HTTP body.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,
    /// Number of chunks buffered between the archive writer and the client.
    #[serde(default = "default_sink_buffer_chunks")]
    pub sink_buffer_chunks: usize,
    /// Files up to this size are spooled in memory, larger ones on disk.
    #[serde(default = "default_spool_threshold")]
    pub spool_threshold_bytes: usize,
    /// Entry compression method.
    #[serde(default)]
    pub compression: ArchiveCompression,
    /// Abort exports running longer than this (0 = unbounded).
    #[serde(default)]
    pub max_duration_seconds: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_depth: 0,
            chunk_size_bytes: default_chunk_size(),
            sink_buffer_chunks: default_sink_buffer_chunks(),
            spool_threshold_bytes: default_spool_threshold(),
            compression: ArchiveCompression::default(),
            max_duration_seconds: 0,
        }
    }
}

impl ArchiveConfig {
    /// Number of workers to run, never less than one.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .saturating_sub(1)
            .max(1)
    }

    /// Job queue capacity, never less than one.
    pub fn effective_queue_depth(&self) -> usize {
        if self.queue_depth > 0 {
            self.queue_depth
        } else {
            self.effective_workers() * 2
        }
    }
}

fn default_chunk_size() -> usize {
    64 * 1024
}

fn default_sink_buffer_chunks() -> usize {
    16
}

fn default_spool_threshold() -> usize {
    8 * 1024 * 1024
}
