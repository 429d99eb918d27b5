//! Concurrent streaming ZIP exporter.
//!
//! One walker thread feeds a bounded job queue drained by a pool of worker
//! threads. Each worker spools its file completely before taking the archive
//! lock, so a read failure halfway through a file never leaves a partial
//! entry behind; the entry is simply reported as skipped. Spooling checks the
//! cancellation token between chunks, so an abandoned export releases its
//! workers without reading the rest of a large file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread;

use tempfile::SpooledTempFile;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::{SimpleFileOptions, StreamWriter};

use sharehub_core::config::archive::{ArchiveCompression, ArchiveConfig};

use super::error::ArchiveError;
use super::manifest::{ArchivedEntry, ExportManifest, SkippedFile};
use super::walker::{ArchiveJob, FileWalker};

/// Entries at or above this size need ZIP64 extensions.
const ZIP64_THRESHOLD: u64 = 0xFFFF_FFFF;

/// Read size while spooling a source file.
const SPOOL_CHUNK_BYTES: usize = 64 * 1024;

/// Tuning for a single export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Worker thread count (at least one).
    pub workers: usize,
    /// Job queue capacity between walker and workers.
    pub queue_depth: usize,
    /// Entry compression method.
    pub compression: ArchiveCompression,
    /// Files up to this size are spooled in memory.
    pub spool_threshold_bytes: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from(&ArchiveConfig::default())
    }
}

impl From<&ArchiveConfig> for ExportOptions {
    fn from(config: &ArchiveConfig) -> Self {
        Self {
            workers: config.effective_workers(),
            queue_depth: config.effective_queue_depth(),
            compression: config.compression,
            spool_threshold_bytes: config.spool_threshold_bytes,
        }
    }
}

/// Writes a directory tree to a sink as a ZIP archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveExporter {
    options: ExportOptions,
}

type SharedZip<'a, W> = Mutex<ZipWriter<StreamWriter<CountingWriter<'a, W>>>>;

#[derive(Default)]
struct WorkerOutput {
    entries: Vec<ArchivedEntry>,
    skipped: Vec<SkippedFile>,
}

impl ArchiveExporter {
    /// Create an exporter.
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// The options in effect.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export every visible regular file below `root` into `sink`.
    ///
    /// Blocks until the archive is complete. Cancelling `cancel` stops the
    /// export between spool chunks; a sink failure cancels it as well.
    #[instrument(skip(self, sink, cancel), fields(root = %root.display(), workers = self.options.workers))]
    pub fn export<W: Write + Send>(
        &self,
        root: &Path,
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> Result<ExportManifest, ArchiveError> {
        let written = AtomicU64::new(0);
        let zip: SharedZip<'_, W> = Mutex::new(ZipWriter::new_stream(CountingWriter {
            inner: &mut *sink,
            written: &written,
        }));
        let failure: Mutex<Option<ArchiveError>> = Mutex::new(None);
        let (tx, rx) = sync_channel::<ArchiveJob>(self.options.queue_depth.max(1));
        let rx = Mutex::new(rx);

        let (walked, worked) = thread::scope(|scope| {
            let walker = scope.spawn(move || walk(root, tx, cancel));

            let (rx, zip, failure) = (&rx, &zip, &failure);
            let workers: Vec<_> = (0..self.options.workers.max(1))
                .map(|_| scope.spawn(move || self.work(rx, zip, failure, cancel)))
                .collect();

            let walked = walker.join();
            let worked: Vec<_> = workers.into_iter().map(|w| w.join()).collect();
            (walked, worked)
        });

        let mut manifest = ExportManifest {
            skipped: walked.map_err(|_| ArchiveError::WorkerPanicked)?,
            ..ExportManifest::default()
        };
        for output in worked {
            let output = output.map_err(|_| ArchiveError::WorkerPanicked)?;
            manifest.entries.extend(output.entries);
            manifest.skipped.extend(output.skipped);
        }

        if let Some(err) = failure.into_inner().ok().flatten() {
            return Err(err);
        }
        if cancel.is_cancelled() {
            return Err(ArchiveError::Cancelled);
        }

        let zip = zip.into_inner().map_err(|_| ArchiveError::WorkerPanicked)?;
        zip.finish()?;
        sink.flush()?;

        manifest.bytes_written = written.load(Ordering::Relaxed);
        Ok(manifest)
    }

    fn work<W: Write>(
        &self,
        rx: &Mutex<Receiver<ArchiveJob>>,
        zip: &SharedZip<'_, W>,
        failure: &Mutex<Option<ArchiveError>>,
        cancel: &CancellationToken,
    ) -> WorkerOutput {
        let mut output = WorkerOutput::default();

        loop {
            let job = match rx.lock() {
                Ok(rx) => rx.recv(),
                Err(_) => break,
            };
            let Ok(job) = job else { break };

            // Keep draining after cancellation so the walker never blocks.
            if cancel.is_cancelled() {
                continue;
            }

            let (mut spool, size) = match self.spool(&job.source, cancel) {
                Ok(spooled) => spooled,
                // Abandoned mid-file; not a skip.
                Err(_) if cancel.is_cancelled() => continue,
                Err(err) => {
                    warn!(path = %job.name, error = %err, "Skipping unreadable file");
                    output.skipped.push(SkippedFile {
                        path: job.name,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            match self.append(zip, &job.name, size, &mut spool) {
                Ok(()) => {
                    debug!(path = %job.name, size, "Archived file");
                    output.entries.push(ArchivedEntry {
                        path: job.name,
                        size,
                    });
                }
                Err(err) => {
                    if let Ok(mut slot) = failure.lock() {
                        slot.get_or_insert(err);
                    }
                    cancel.cancel();
                }
            }
        }

        output
    }

    fn spool(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> io::Result<(SpooledTempFile, u64)> {
        let mut file = File::open(path)?;
        let mut spool = SpooledTempFile::new(self.options.spool_threshold_bytes);
        let mut buf = vec![0u8; SPOOL_CHUNK_BYTES];
        let mut size = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "export cancelled"));
            }
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            spool.write_all(&buf[..n])?;
            size += n as u64;
        }

        spool.seek(SeekFrom::Start(0))?;
        Ok((spool, size))
    }

    fn append<W: Write>(
        &self,
        zip: &SharedZip<'_, W>,
        name: &str,
        size: u64,
        spool: &mut SpooledTempFile,
    ) -> Result<(), ArchiveError> {
        let method = match self.options.compression {
            ArchiveCompression::Deflated => CompressionMethod::Deflated,
            ArchiveCompression::Stored => CompressionMethod::Stored,
        };
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .unix_permissions(0o644)
            .large_file(size >= ZIP64_THRESHOLD);

        let mut zip = zip.lock().map_err(|_| ArchiveError::WorkerPanicked)?;
        zip.start_file(name, options)?;
        io::copy(spool, &mut *zip)?;
        Ok(())
    }
}

fn walk(
    root: &Path,
    tx: SyncSender<ArchiveJob>,
    cancel: &CancellationToken,
) -> Vec<SkippedFile> {
    let mut skipped = Vec::new();

    for item in FileWalker::new(root) {
        if cancel.is_cancelled() {
            break;
        }
        match item {
            Ok(job) => {
                if tx.send(job).is_err() {
                    break;
                }
            }
            Err(skip) => {
                warn!(path = %skip.path, reason = %skip.reason, "Skipping unreadable entry");
                skipped.push(skip);
            }
        }
    }

    skipped
}

/// Counts bytes on their way to the sink.
struct CountingWriter<'a, W> {
    inner: &'a mut W,
    written: &'a AtomicU64,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
