//! Directory download as a streamed ZIP archive.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sharehub_core::config::archive::ArchiveConfig;
use sharehub_storage::archive::{ArchiveBody, ArchiveExporter, ExportOptions, archive_pipe};

/// Starts archive exports and hands back their body streams.
#[derive(Debug, Clone)]
pub struct ArchiveService {
    config: ArchiveConfig,
    exporter: ArchiveExporter,
    /// Parent of every export's cancellation token.
    shutdown: CancellationToken,
}

impl ArchiveService {
    /// Creates a new archive service. Cancelling `shutdown` aborts every
    /// running export.
    pub fn new(config: ArchiveConfig, shutdown: CancellationToken) -> Self {
        let exporter = ArchiveExporter::new(ExportOptions::from(&config));
        Self {
            config,
            exporter,
            shutdown,
        }
    }

    /// Begin exporting `root` and return the body the archive streams into.
    ///
    /// Dropping the body cancels the export.
    pub fn stream_directory(&self, root: PathBuf) -> ArchiveBody {
        let cancel = self.shutdown.child_token();
        let (mut writer, body) = archive_pipe(
            self.config.chunk_size_bytes,
            self.config.sink_buffer_chunks,
            cancel.clone(),
        );

        if self.config.max_duration_seconds > 0 {
            let limit = Duration::from_secs(self.config.max_duration_seconds);
            let timer = cancel.clone();
            let root = root.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = timer.cancelled() => {}
                    _ = tokio::time::sleep(limit) => {
                        warn!(root = %root.display(), limit_secs = limit.as_secs(), "Archive export timed out");
                        timer.cancel();
                    }
                }
            });
        }

        let exporter = self.exporter.clone();
        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            match exporter.export(&root, &mut writer, &cancel) {
                Ok(manifest) => info!(
                    root = %root.display(),
                    entries = manifest.entries.len(),
                    skipped = manifest.skipped.len(),
                    bytes = manifest.bytes_written,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Archive export complete"
                ),
                Err(err) => {
                    warn!(root = %root.display(), error = %err, "Archive export aborted");
                    writer.fail(std::io::Error::other(err.to_string()));
                }
            }
            // Releases the timeout task.
            cancel.cancel();
        });

        body
    }
}
